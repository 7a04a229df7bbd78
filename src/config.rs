use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Leaves allowed in the search tree before the search gives up.
pub const MAX_CLUSTERS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TanglesConfig {
    /// Minimum number of points any three cuts of a tangle have in common.
    pub agreement: u16,
    /// Leaves this many cuts or fewer below their split are noise.
    pub prune_depth: usize,
    pub max_clusters: Option<usize>,
}

impl Default for TanglesConfig {
    fn default() -> Self {
        TanglesConfig {
            agreement: 5,
            prune_depth: 1,
            max_clusters: Some(MAX_CLUSTERS),
        }
    }
}

impl TanglesConfig {
    pub fn new(agreement: u16) -> TanglesConfig {
        TanglesConfig {
            agreement,
            ..TanglesConfig::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<TanglesConfig> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}
