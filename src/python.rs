use bitvec::prelude::BitVec;
use numpy::{PyReadonlyArray1, PyReadonlyArray2};
use pyo3::prelude::*;

use crate::config::TanglesConfig;
use crate::contracted::ContractedTanglesTree;
use crate::cost::cut_weights;
use crate::cuts::Cuts;
use crate::dataset::AnswerMatrix;
use crate::error::TanglesError;
use crate::tangles::tangle_computation;

impl From<TanglesError> for PyErr {
    fn from(err: TanglesError) -> PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[pyclass(name = "TanglesTree", unsendable)]
struct ContractedTanglesTreePy {
    internal: ContractedTanglesTree,
}

#[pymethods]
impl ContractedTanglesTreePy {
    /// Builds the contracted tangle tree from a cuts x points boolean array
    /// and one cost per cut.
    #[new]
    fn new(
        cuts: PyReadonlyArray2<bool>,
        costs: PyReadonlyArray1<f64>,
        agreement: u16,
        prune: usize,
    ) -> PyResult<ContractedTanglesTreePy> {
        let cut_array = cuts.as_array();
        let cost_array = costs.as_array();
        if cut_array.shape()[0] != cost_array.shape()[0] {
            return Err(pyo3::exceptions::PyValueError::new_err(
                format!(
                "Number of cuts must be equal to length of cost array. Got cuts with shape {:?} and cost array with shape {:?}",
                cut_array.shape(), cost_array.shape())
            ));
        }
        let cuts_bitvec: Vec<BitVec> = cut_array
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        let cost_vec = cost_array.iter().copied().collect();

        let cuts = Cuts::with_costs(cuts_bitvec, cost_vec)?;
        let config = TanglesConfig {
            agreement,
            prune_depth: prune,
            max_clusters: None,
        };
        let tree = tangle_computation(&cuts, &config);
        let mut contracted = ContractedTanglesTree::new(&tree);
        contracted.prune(config.prune_depth);
        contracted.calculate_characterizing_cuts();
        contracted.compute_soft_predictions(&cuts, &cut_weights(cuts.costs()))?;
        Ok(ContractedTanglesTreePy {
            internal: contracted,
        })
    }

    fn probabilities(&self, v: usize) -> PyResult<Vec<f64>> {
        Ok(self.internal.probabilities(v)?)
    }

    fn num_clusters(&self) -> usize {
        self.internal.num_clusters()
    }

    fn to_dot(&self) -> String {
        self.internal.to_dot()
    }

    fn __str__(&self) -> String {
        self.internal.to_string()
    }
}

/// Hard cluster labels for a points x questions array, where 1 means yes.
#[pyfunction]
fn get_hard_predictions(x: PyReadonlyArray2<i64>, agreement: u16) -> PyResult<Vec<usize>> {
    let rows = x
        .as_array()
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|&answer| answer == 1).collect())
        .collect();
    let answers = AnswerMatrix::from_bit_rows(rows)?;
    Ok(crate::predict::get_hard_predictions(&answers, agreement)?)
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn tangles(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<ContractedTanglesTreePy>()?;
    m.add_function(wrap_pyfunction!(get_hard_predictions, m)?)?;
    Ok(())
}
