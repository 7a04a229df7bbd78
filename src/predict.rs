use serde::Serialize;
use tracing::info;

pub use crate::config::{TanglesConfig, MAX_CLUSTERS};
use crate::contracted::ContractedTanglesTree;
use crate::cost::{cut_weights, BipartitionSimilarity};
use crate::cuts::Cuts;
use crate::dataset::AnswerMatrix;
use crate::error::Result;
use crate::tangles::tangle_computation;

/// Hard and soft cluster assignment of every point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    pub num_clusters: usize,
    /// Cluster of every point.
    pub labels: Vec<usize>,
    /// `probabilities[c][i]`: how much point `i` belongs to cluster `c`.
    pub probabilities: Vec<Vec<f64>>,
}

/// Assigns every point to the leaf with the highest soft prediction.
/// On ties the leftmost leaf wins.
pub fn compute_hard_predictions(contracted: &ContractedTanglesTree) -> Result<Clustering> {
    let probabilities = (0..contracted.num_clusters())
        .map(|leaf| contracted.probabilities(leaf))
        .collect::<Result<Vec<_>>>()?;

    let num_points = probabilities.first().map_or(0, Vec::len);
    let labels = (0..num_points)
        .map(|point| {
            let mut best = 0;
            for (cluster, p) in probabilities.iter().enumerate() {
                if p[point] > probabilities[best][point] {
                    best = cluster;
                }
            }
            best
        })
        .collect();

    Ok(Clustering {
        num_clusters: probabilities.len(),
        labels,
        probabilities,
    })
}

/// Runs the tangles pipeline up to the contracted tree with soft predictions.
///
/// Every question is a cut. Cuts are ranked by [`BipartitionSimilarity`] and
/// weighted by `exp(-normalized cost)` in the soft predictions.
pub fn build_tree(answers: &AnswerMatrix, config: &TanglesConfig) -> Result<(Cuts, ContractedTanglesTree)> {
    let mut cuts = Cuts::from_answers(answers)?;
    let cost_function = BipartitionSimilarity::new(answers);
    cuts.compute_cost_and_order_cuts(&cost_function);

    let tree = tangle_computation(&cuts, config);
    let mut contracted = ContractedTanglesTree::new(&tree);
    contracted.prune(config.prune_depth);
    contracted.calculate_characterizing_cuts();

    let weights = cut_weights(cuts.costs());
    contracted.compute_soft_predictions(&cuts, &weights)?;
    Ok((cuts, contracted))
}

pub fn cluster(answers: &AnswerMatrix, config: &TanglesConfig) -> Result<Clustering> {
    let (_, contracted) = build_tree(answers, config)?;
    let clustering = compute_hard_predictions(&contracted)?;
    info!(
        num_points = answers.num_points(),
        num_clusters = clustering.num_clusters,
        "clustered points"
    );
    Ok(clustering)
}

/// Hard cluster labels for a points x questions answer matrix.
pub fn get_hard_predictions(answers: &AnswerMatrix, agreement: u16) -> Result<Vec<usize>> {
    let config = TanglesConfig {
        agreement,
        prune_depth: 1,
        max_clusters: None,
    };
    Ok(cluster(answers, &config)?.labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_groups() -> AnswerMatrix {
        AnswerMatrix::parse(
            "1 0 0\n1 0 0\n1 0 0\n\
             0 1 0\n0 1 0\n0 1 0\n\
             0 0 1\n0 0 1\n0 0 1\n",
        )
        .unwrap()
    }

    #[test]
    fn test_hard_predictions_three_groups() {
        let labels = get_hard_predictions(&three_groups(), 3).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_cluster_probabilities() {
        let clustering = cluster(&three_groups(), &TanglesConfig::new(3)).unwrap();
        assert_eq!(clustering.num_clusters, 3);
        assert_eq!(clustering.probabilities.len(), 3);
        assert_eq!(clustering.probabilities[1][4], 1.0);
        assert_eq!(clustering.probabilities[1][0], 0.0);
    }

    #[test]
    fn test_agreement_too_large_gives_one_cluster() {
        let labels = get_hard_predictions(&three_groups(), 4).unwrap();
        assert_eq!(labels, vec![0; 9]);
    }
}
