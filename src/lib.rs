//! Clustering with tangles (Klepper et al., arXiv:2006.14444).
//!
//! Cuts are bipartitions of a dataset. A tangle orients every cut up to some
//! order such that any three oriented cuts share at least `agreement` points.
//! The search tree of all tangles is contracted to its splits and leaves; the
//! leaves are the clusters, and the cuts that tell two subtrees apart yield
//! soft and hard cluster assignments.
//!
//! Modules:
//! - `cuts`: oriented cuts, consistency checks, cuts sorted by cost.
//! - `cost`: cost functions ranking the cuts.
//! - `tangles`: the tangle search tree.
//! - `contracted`: contraction, pruning and soft predictions.
//! - `config`: search parameters, loadable from JSON.
//! - `predict`: the end to end pipeline and hard predictions.
//! - `python`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod config;
pub mod contracted;
pub mod cost;
pub mod cuts;
pub mod dataset;
pub mod error;
pub mod predict;
pub mod tangles;

#[cfg(feature = "python")]
mod python;

pub use crate::config::TanglesConfig;
pub use crate::contracted::ContractedTanglesTree;
pub use crate::cost::{BipartitionSimilarity, CostFunction};
pub use crate::cuts::{Cut, CutOrientation, Cuts};
pub use crate::dataset::AnswerMatrix;
pub use crate::error::{Result, TanglesError};
pub use crate::predict::{cluster, get_hard_predictions, Clustering};
pub use crate::tangles::{tangle_computation, tangle_search_tree, TanglesTree};
