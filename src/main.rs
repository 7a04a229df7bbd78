//! Command line front end: cluster a questionnaire with tangles.
//!
//! The input has one point per line and one 0/1 answer per question.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use tangles::predict::{build_tree, compute_hard_predictions};
use tangles::{AnswerMatrix, TanglesConfig};

#[derive(Parser)]
#[command(name = "tangles")]
#[command(version)]
#[command(about = "Clustering with tangles")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cluster of every point
    Cluster {
        #[command(flatten)]
        input: InputArgs,

        /// Print labels and soft predictions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the contracted tangle tree
    Tree {
        #[command(flatten)]
        input: InputArgs,

        /// Print the tree in Graphviz DOT format
        #[arg(long)]
        dot: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Answers, one point per line
    answers: PathBuf,

    /// JSON file with agreement, prune_depth and max_clusters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum number of points any three oriented cuts share
    #[arg(short, long)]
    agreement: Option<u16>,

    /// Remove leaves at most this many cuts below their split
    #[arg(short, long)]
    prune_depth: Option<usize>,

    /// Stop the search at this many active tangles, 0 for no limit
    #[arg(short, long)]
    max_clusters: Option<usize>,
}

impl InputArgs {
    fn load(&self) -> anyhow::Result<(AnswerMatrix, TanglesConfig)> {
        let mut config = match &self.config {
            Some(path) => TanglesConfig::from_json_file(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => TanglesConfig::default(),
        };
        if let Some(agreement) = self.agreement {
            config.agreement = agreement;
        }
        if let Some(prune_depth) = self.prune_depth {
            config.prune_depth = prune_depth;
        }
        if let Some(max_clusters) = self.max_clusters {
            config.max_clusters = (max_clusters > 0).then_some(max_clusters);
        }

        let answers = AnswerMatrix::read(&self.answers)
            .with_context(|| format!("failed to read answers {}", self.answers.display()))?;
        tracing::debug!(
            ?config,
            points = answers.num_points(),
            questions = answers.num_questions(),
            "loaded input"
        );
        Ok((answers, config))
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Cluster { input, json } => {
            let (answers, config) = input.load()?;
            let (_, tree) = build_tree(&answers, &config)?;
            let clustering = compute_hard_predictions(&tree)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&clustering)?);
            } else {
                for label in &clustering.labels {
                    println!("{}", label);
                }
            }
        }
        Commands::Tree { input, dot } => {
            let (answers, config) = input.load()?;
            let (_, tree) = build_tree(&answers, &config)?;
            if dot {
                print!("{}", tree.to_dot());
            } else {
                println!("{}", tree);
                println!();
                print!("{}", tree.to_string_tree_like());
            }
        }
    }
    Ok(())
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
