use std::ops::{Not, Range};

use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;

use crate::cost::CostFunction;
use crate::dataset::AnswerMatrix;
use crate::error::{Result, TanglesError};

/// A cut is a bipartition of the points of a dataset.
/// If `cut[i] == 1`, the i-th point lies on the left side of the bipartition.
pub type CutValue = BitVec;

/// We describe cuts with a combination of their ID (which can be used to get the
/// actual value from the Cut Pool) and the orientation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cut(pub CutId, pub CutOrientation);

impl std::fmt::Debug for Cut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.1 {
            CutOrientation::Normal => write!(f, "Cut({})", self.0),
            CutOrientation::Inverted => write!(f, "-Cut({})", self.0),
        }
    }
}

/// Index into the cost-sorted array of all cuts.
pub type CutId = u16;

/// Holds all the cuts underlying a Tangle Tree, in both orientations.
/// The Cut Indices refer to the positions of the cuts in the CutPool
#[derive(Debug, Clone, PartialEq)]
pub struct CutPool {
    normal: Vec<CutValue>,
    inverted: Vec<CutValue>,
}

impl CutPool {
    pub fn new(normal_pool: Vec<CutValue>) -> CutPool {
        let inverted = normal_pool.iter().map(|cut| cut.clone().not()).collect();
        CutPool {
            normal: normal_pool,
            inverted,
        }
    }

    pub fn cut_value(&self, cut: Cut) -> &CutValue {
        match cut.1 {
            CutOrientation::Normal => &self.normal[cut.0 as usize],
            CutOrientation::Inverted => &self.inverted[cut.0 as usize],
        }
    }

    pub fn len(&self) -> usize {
        self.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty()
    }
}

/// Holds all the cuts that are relevant for consistency
pub type Core = Vec<Cut>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutOrientation {
    /// Also called Left
    Normal,
    /// Also called Right
    Inverted,
}

impl CutOrientation {
    /// Single letter label used when rendering trees.
    pub fn label(self) -> &'static str {
        match self {
            CutOrientation::Normal => "T",
            CutOrientation::Inverted => "F",
        }
    }

    /// Applies the orientation to a cut value.
    pub fn orient(self, cut: &BitSlice) -> CutValue {
        match self {
            CutOrientation::Normal => cut.to_bitvec(),
            CutOrientation::Inverted => cut.to_bitvec().not(),
        }
    }
}

impl std::fmt::Display for CutOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CutOrientation::Normal => write!(f, "left"),
            CutOrientation::Inverted => write!(f, "right"),
        }
    }
}

/// Checks if a cut is consistent with the given core.
/// CutPool is used to determine the cut values.
/// A cut C is consistent with a core, if for all A, B in the core, we have that
///     |A ^ B ^ C| >= agreement
pub fn is_consistent(cut: Cut, core: &Core, pool: &CutPool, agreement: u16) -> bool {
    let cut_a = pool.cut_value(cut);
    let agreement = agreement as usize;
    if core.is_empty() {
        return cut_a.count_ones() >= agreement;
    }
    if core.len() == 1 {
        let cut_b = pool.cut_value(core[0]);
        return intersection(cut_a, cut_b).count_ones() >= agreement;
    }
    for i in 0..core.len() {
        let cut_b = pool.cut_value(core[i]);
        let intersection_a_b = intersection(cut_a, cut_b);
        for j in i..core.len() {
            let cut_c = pool.cut_value(core[j]);
            // count_ones gives cardinality of bitvec
            if intersection(&intersection_a_b, cut_c).count_ones() < agreement {
                return false;
            }
        }
    }
    true
}

/// Returns the core with the cut added, dropping members that became redundant.
/// Doesn't check for consistency.
pub fn new_core(pool: &CutPool, core: &Core, cut: Cut) -> Core {
    let candidate_cut = pool.cut_value(cut);
    let mut indices_to_remove = Vec::new();

    for i in (0..core.len()).rev() {
        let core_cut = pool.cut_value(core[i]);
        if is_subset(core_cut, candidate_cut) {
            return core.clone();
        } else if is_subset(candidate_cut, core_cut) {
            indices_to_remove.push(i);
        }
    }

    let mut new_core = core.clone();
    // Indices are in decreasing order, so swap_remove never moves an
    // element that is still to be removed.
    for j in indices_to_remove {
        new_core.swap_remove(j);
    }
    new_core.push(cut);
    new_core
}

pub fn intersection(a: &BitSlice, b: &BitSlice) -> BitVec {
    let mut out = a.to_bitvec();
    out &= b;
    out
}

pub fn is_subset(a: &BitSlice, b: &BitSlice) -> bool {
    intersection(a, b).as_bitslice() == a
}

/// The cuts of a dataset together with their costs.
///
/// After [`Cuts::compute_cost_and_order_cuts`] the cuts are sorted by
/// ascending cost, and a [`CutId`] refers to the position in that order.
/// [`Cuts::unsorted_id`] maps back to the position the cut was given at.
#[derive(Debug, Clone, PartialEq)]
pub struct Cuts {
    values: Vec<CutValue>,
    costs: Vec<f64>,
    order: Vec<usize>,
    num_points: usize,
}

impl Cuts {
    pub fn new(values: Vec<CutValue>) -> Result<Cuts> {
        let num_cuts = values.len();
        Cuts::with_costs(values, vec![0.0; num_cuts])
    }

    /// Builds cuts with precomputed costs and sorts them by cost.
    pub fn with_costs(values: Vec<CutValue>, costs: Vec<f64>) -> Result<Cuts> {
        if values.is_empty() {
            return Err(TanglesError::NoCuts);
        }
        if values.len() > CutId::MAX as usize {
            return Err(TanglesError::TooManyCuts(values.len()));
        }
        if values.len() != costs.len() {
            return Err(TanglesError::CostLengthMismatch {
                num_cuts: values.len(),
                num_costs: costs.len(),
            });
        }
        let num_points = values[0].len();
        if num_points == 0 {
            return Err(TanglesError::NoPoints);
        }
        if let Some((index, cut)) = values
            .iter()
            .enumerate()
            .find(|(_, cut)| cut.len() != num_points)
        {
            return Err(TanglesError::CutLengthMismatch {
                index,
                expected: num_points,
                found: cut.len(),
            });
        }

        let order = (0..values.len()).collect();
        let mut cuts = Cuts {
            values,
            costs,
            order,
            num_points,
        };
        cuts.sort_by_cost();
        Ok(cuts)
    }

    /// Every question becomes one cut: the points that answered it with yes.
    pub fn from_answers(answers: &AnswerMatrix) -> Result<Cuts> {
        let values = (0..answers.num_questions())
            .map(|question| answers.column(question))
            .collect();
        Cuts::new(values)
    }

    pub fn compute_cost_and_order_cuts<C: CostFunction + ?Sized>(&mut self, cost_function: &C) {
        self.costs = self
            .values
            .iter()
            .map(|cut| cost_function.cost(cut))
            .collect();
        self.sort_by_cost();
        tracing::debug!(
            num_cuts = self.len(),
            min_cost = self.costs.first().copied().unwrap_or_default(),
            max_cost = self.costs.last().copied().unwrap_or_default(),
            "computed and sorted cut costs"
        );
    }

    fn sort_by_cost(&mut self) {
        let mut permutation: Vec<usize> = (0..self.values.len()).collect();
        permutation.sort_by(|&a, &b| self.costs[a].total_cmp(&self.costs[b]));

        self.values = permutation.iter().map(|&i| self.values[i].clone()).collect();
        self.costs = permutation.iter().map(|&i| self.costs[i]).collect();
        self.order = permutation.iter().map(|&i| self.order[i]).collect();
    }

    pub fn cut_at(&self, id: CutId) -> &CutValue {
        &self.values[id as usize]
    }

    /// Position the cut with the given sorted id had before sorting.
    pub fn unsorted_id(&self, id: CutId) -> usize {
        self.order[id as usize]
    }

    pub fn values(&self) -> &[CutValue] {
        &self.values
    }

    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Groups the sorted cuts by their cost. Each entry is the cost of an
    /// order together with the ids of the cuts that have exactly that cost.
    pub fn orders(&self) -> Vec<(f64, Range<usize>)> {
        let mut orders: Vec<(f64, Range<usize>)> = Vec::new();
        for (idx, &cost) in self.costs.iter().enumerate() {
            match orders.last_mut() {
                Some((order, range)) if *order == cost => range.end = idx + 1,
                _ => orders.push((cost, idx..idx + 1)),
            }
        }
        orders
    }
}
