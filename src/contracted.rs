//! The contracted tangle tree keeps only the root, the splitting tangles and
//! the maximal tangles of a search tree. Its leaves are the clusters.

use std::fmt::Write as _;

use tracing::{debug, info};

use crate::cuts::{Cut, CutId, Cuts};
use crate::error::{Result, TanglesError};
use crate::tangles::{Specification, TanglesTree, UTreeSize};

#[derive(Debug, Clone, PartialEq)]
pub struct ContractedTanglesTreeNode {
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    /// Node of the search tree this node was contracted from.
    origin: UTreeSize,
    last_cut: Option<Cut>,
    specification: Specification,
    characterizing_cuts: Specification,
    characterizing_cuts_left: Specification,
    characterizing_cuts_right: Specification,
    p: Option<Vec<f64>>,
}

impl ContractedTanglesTreeNode {
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn left(&self) -> Option<usize> {
        self.left
    }

    pub fn right(&self) -> Option<usize> {
        self.right
    }

    pub fn origin(&self) -> UTreeSize {
        self.origin
    }

    pub fn last_cut(&self) -> Option<Cut> {
        self.last_cut
    }

    /// Id of the last added cut, `-1` for the root of the search tree.
    pub fn last_cut_id(&self) -> i32 {
        self.last_cut.map_or(-1, |cut| i32::from(cut.0))
    }

    pub fn specification(&self) -> &Specification {
        &self.specification
    }

    /// Cuts oriented the same way by both subtrees of this node.
    pub fn characterizing_cuts(&self) -> &Specification {
        &self.characterizing_cuts
    }

    /// Cuts telling the left subtree apart from the right one, as the left
    /// subtree orients them.
    pub fn characterizing_cuts_left(&self) -> &Specification {
        &self.characterizing_cuts_left
    }

    pub fn characterizing_cuts_right(&self) -> &Specification {
        &self.characterizing_cuts_right
    }

    /// Soft membership of every point in the tangle of this node.
    pub fn p(&self) -> Option<&[f64]> {
        self.p.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn is_splitting(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    fn label(&self) -> String {
        match self.last_cut {
            None => "Root".to_string(),
            Some(Cut(id, orientation)) => format!("{}{}", id, orientation.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractedTanglesTree {
    nodes: Vec<ContractedTanglesTreeNode>,
    root: usize,
    is_empty: bool,
    characterized: bool,
    processed_soft_predictions: bool,
}

impl ContractedTanglesTree {
    pub fn new(tree: &TanglesTree) -> ContractedTanglesTree {
        let mut contracted = ContractedTanglesTree {
            nodes: Vec::new(),
            root: 0,
            is_empty: tree.is_empty(),
            characterized: false,
            processed_soft_predictions: false,
        };
        contracted.contract(tree);
        debug!(
            num_nodes = contracted.nodes.len(),
            num_leaves = contracted.leaves().len(),
            "contracted tangle tree"
        );
        contracted
    }

    /// Follows chains of single children until the next leaf or split.
    fn contract(&mut self, tree: &TanglesTree) {
        let mut stack = vec![(tree.root_idx(), None)];
        while let Some((at, parent)) = stack.pop() {
            let mut current = tree.node(at);
            while let (Some(child), None) | (None, Some(child)) = (current.left(), current.right()) {
                current = tree.node(child);
            }

            let idx = self.nodes.len();
            self.nodes.push(ContractedTanglesTreeNode {
                parent: parent.map(|(parent, _)| parent),
                left: None,
                right: None,
                origin: current.id(),
                last_cut: current.cut(),
                specification: tree.specification(current.id()),
                characterizing_cuts: Specification::new(),
                characterizing_cuts_left: Specification::new(),
                characterizing_cuts_right: Specification::new(),
                p: None,
            });
            match parent {
                None => self.root = idx,
                Some((parent, true)) => self.nodes[parent].left = Some(idx),
                Some((parent, false)) => self.nodes[parent].right = Some(idx),
            }
            if let (Some(left), Some(right)) = (current.left(), current.right()) {
                stack.push((right, Some((idx, false))));
                stack.push((left, Some((idx, true))));
            }
        }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn node(&self, idx: usize) -> &ContractedTanglesTreeNode {
        &self.nodes[idx]
    }

    /// True if the search tree could not orient a single cut.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    pub fn processed_soft_predictions(&self) -> bool {
        self.processed_soft_predictions
    }

    /// Leaves reachable from the root, left subtrees first.
    /// Every leaf is a cluster.
    pub fn leaves(&self) -> Vec<usize> {
        self.collect(|node| node.is_leaf())
    }

    /// Alias of [`ContractedTanglesTree::leaves`]: the maximal tangles.
    pub fn maximals(&self) -> Vec<usize> {
        self.leaves()
    }

    pub fn splitting(&self) -> Vec<usize> {
        self.collect(|node| node.is_splitting())
    }

    pub fn num_clusters(&self) -> usize {
        self.leaves().len()
    }

    fn collect(&self, keep: impl Fn(&ContractedTanglesTreeNode) -> bool) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if keep(node) {
                found.push(idx);
            }
            stack.extend(node.right);
            stack.extend(node.left);
        }
        found
    }

    /// Nodes below the root, every parent before its children.
    fn preorder(&self) -> Vec<usize> {
        self.collect(|_| true)
    }

    /// Removes noise clusters: leaves that are at most `depth` cuts away
    /// from the split they hang off. Splits that lose a side are contracted.
    pub fn prune(&mut self, depth: usize) {
        if depth > 0 {
            self.characterized = false;
            self.processed_soft_predictions = false;
            for node in &mut self.nodes {
                node.p = None;
            }
            self.prune_below_root(depth);
        }
        info!(
            num_clusters = self.num_clusters(),
            "clusters after cutting out short paths"
        );
    }

    fn prune_below_root(&mut self, depth: usize) {
        // What takes the place of each node after pruning, if anything.
        let mut replacement = vec![None; self.nodes.len()];
        for idx in self.preorder().into_iter().rev() {
            let (left, right) = (self.nodes[idx].left, self.nodes[idx].right);
            if let (Some(left), Some(right)) = (left, right) {
                match (replacement[left], replacement[right]) {
                    (Some(left), Some(right)) => {
                        self.nodes[idx].left = Some(left);
                        self.nodes[idx].right = Some(right);
                        self.nodes[left].parent = Some(idx);
                        self.nodes[right].parent = Some(idx);
                        replacement[idx] = Some(idx);
                        continue;
                    }
                    (Some(survivor), None) | (None, Some(survivor)) => {
                        self.nodes[survivor].parent = self.nodes[idx].parent;
                        replacement[idx] = Some(survivor);
                        continue;
                    }
                    (None, None) => {
                        self.nodes[idx].left = None;
                        self.nodes[idx].right = None;
                    }
                }
            }
            replacement[idx] = self.prune_leaf(idx, depth);
        }

        if let Some(root) = replacement[self.root] {
            self.root = root;
            self.nodes[root].parent = None;
        }
    }

    fn prune_leaf(&self, idx: usize, depth: usize) -> Option<usize> {
        let node = &self.nodes[idx];
        let Some(parent) = node.parent else {
            // the root stays, even if it is the only node left
            return Some(idx);
        };
        let diff = node.last_cut_id() - self.nodes[parent].last_cut_id();
        if diff <= depth as i32 {
            debug!(leaf = %node.label(), diff, "pruned noise cluster");
            None
        } else {
            Some(idx)
        }
    }

    /// Computes for every split which cuts tell its two subtrees apart.
    pub fn calculate_characterizing_cuts(&mut self) {
        for idx in self.preorder().into_iter().rev() {
            self.characterize(idx);
        }
        self.characterized = true;
    }

    /// Expects the characterizing cuts of both children to be known.
    fn characterize(&mut self, idx: usize) {
        let (Some(left), Some(right)) = (self.nodes[idx].left, self.nodes[idx].right) else {
            let node = &mut self.nodes[idx];
            node.characterizing_cuts = Specification::new();
            node.characterizing_cuts_left = Specification::new();
            node.characterizing_cuts_right = Specification::new();
            return;
        };

        let first_new_cut = self.nodes[idx].last_cut_id() + 1;
        let mut cuts_left = self.oriented_since(left, first_new_cut);
        let mut cuts_right = self.oriented_since(right, first_new_cut);

        cuts_left.retain(|id, _| cuts_right.contains_key(id));
        cuts_right.retain(|id, _| cuts_left.contains_key(id));

        // Cuts oriented the same way do not tell the sides apart, but they
        // may still tell this node apart from its sibling.
        let mut characterizing_cuts = Specification::new();
        for (id, orientation) in &cuts_left {
            if cuts_right.get(id) == Some(orientation) {
                characterizing_cuts.insert(*id, *orientation);
            }
        }
        for id in characterizing_cuts.keys() {
            cuts_left.remove(id);
            cuts_right.remove(id);
        }

        let node = &mut self.nodes[idx];
        node.characterizing_cuts = characterizing_cuts;
        node.characterizing_cuts_left = cuts_left;
        node.characterizing_cuts_right = cuts_right;
    }

    /// The child's characterizing cuts together with every cut the child
    /// oriented from `first_cut` on.
    fn oriented_since(&self, child: usize, first_cut: i32) -> Specification {
        let node = &self.nodes[child];
        let mut cuts = node.characterizing_cuts.clone();
        let first_cut = first_cut.max(0) as CutId;
        cuts.extend(
            node.specification
                .range(first_cut..)
                .filter(|(id, _)| i32::from(**id) <= node.last_cut_id())
                .map(|(id, orientation)| (*id, *orientation)),
        );
        cuts
    }

    /// Propagates soft cluster memberships from the root down to the leaves.
    ///
    /// `weights` holds one weight per cut, in the order of `cuts`.
    pub fn compute_soft_predictions(&mut self, cuts: &Cuts, weights: &[f64]) -> Result<()> {
        if weights.len() != cuts.len() {
            return Err(TanglesError::CostLengthMismatch {
                num_cuts: cuts.len(),
                num_costs: weights.len(),
            });
        }
        if !self.characterized {
            self.calculate_characterizing_cuts();
        }

        let root = self.root;
        self.nodes[root].p = Some(vec![1.0; cuts.num_points()]);
        for idx in self.preorder() {
            self.soft_predictions_children(idx, cuts, weights);
        }
        self.processed_soft_predictions = true;
        Ok(())
    }

    /// Splits the prediction of a node between its children.
    fn soft_predictions_children(&mut self, idx: usize, cuts: &Cuts, weights: &[f64]) {
        let (Some(left), Some(right)) = (self.nodes[idx].left, self.nodes[idx].right) else {
            return;
        };
        let node = &self.nodes[idx];
        let p = node.p.clone().unwrap_or_else(|| vec![1.0; cuts.num_points()]);
        let score_left = side_score(&node.characterizing_cuts_left, cuts, weights);
        let score_right = side_score(&node.characterizing_cuts_right, cuts, weights);

        let mut p_left = Vec::with_capacity(p.len());
        let mut p_right = Vec::with_capacity(p.len());
        for ((p, l), r) in p.iter().zip(&score_left).zip(&score_right) {
            let total = l + r;
            if total > 0.0 {
                p_left.push(l / total * p);
                p_right.push(r / total * p);
            } else {
                p_left.push(0.5 * p);
                p_right.push(0.5 * p);
            }
        }

        self.nodes[left].p = Some(p_left);
        self.nodes[right].p = Some(p_right);
    }

    /// Soft prediction of the `leaf`-th cluster.
    pub fn probabilities(&self, leaf: usize) -> Result<Vec<f64>> {
        if !self.processed_soft_predictions {
            return Err(TanglesError::PredictionsMissing);
        }
        let leaves = self.leaves();
        let idx = leaves.get(leaf).ok_or(TanglesError::UnknownLeaf(leaf))?;
        self.nodes[*idx]
            .p
            .clone()
            .ok_or(TanglesError::PredictionsMissing)
    }

    /// Indented listing of every node with its characterizing cuts.
    pub fn to_string_tree_like(&self) -> String {
        let fmt_cuts = |cuts: &Specification| {
            cuts.iter()
                .map(|(id, orientation)| format!("{} -> {}", id, orientation))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut out = String::from("Root\n");
        let mut stack = vec![(self.root, 0usize)];
        while let Some((idx, height)) = stack.pop() {
            let node = &self.nodes[idx];
            if height > 0 {
                out.push('\n');
            }
            let padding = "  ".repeat(height);
            let _ = writeln!(
                out,
                "{}{} left: [{}]",
                padding,
                node.last_cut_id(),
                fmt_cuts(&node.characterizing_cuts_left)
            );
            let _ = writeln!(
                out,
                "{}{} right: [{}]",
                padding,
                node.last_cut_id(),
                fmt_cuts(&node.characterizing_cuts_right)
            );
            stack.extend(node.right.map(|child| (child, height + 1)));
            stack.extend(node.left.map(|child| (child, height + 1)));
        }
        out
    }

    /// Graphviz rendering of the tree, labelled like `3T` / `5F`.
    pub fn to_dot(&self) -> String {
        let dot_id = |idx: usize| {
            if idx == self.root {
                "root".to_string()
            } else {
                format!("n{}", idx)
            }
        };

        let mut out = String::from("graph tangles {\n    node [shape=circle, style=filled, fillcolor=\"#80b9f2\"];\n");
        for idx in self.preorder() {
            let node = &self.nodes[idx];
            let id = dot_id(idx);
            let label = if idx == self.root {
                "Root".to_string()
            } else {
                node.label()
            };
            let _ = writeln!(out, "    {} [label=\"{}\"];", id, label);
            if let Some(parent) = node.parent {
                let _ = writeln!(out, "    {} -- {};", dot_id(parent), id);
            }
        }
        out.push_str("}\n");
        out
    }
}

impl std::fmt::Display for ContractedTanglesTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stack = vec![(self.root, 0usize)];
        let mut first = true;
        while let Some((idx, height)) = stack.pop() {
            let node = &self.nodes[idx];
            if !first {
                writeln!(f)?;
            }
            first = false;
            if height == 0 {
                write!(f, "Root")?;
            } else {
                write!(f, "{}{}", " ".repeat(height), node.label())?;
            }
            stack.extend(node.right.map(|child| (child, height + 1)));
            stack.extend(node.left.map(|child| (child, height + 1)));
        }
        Ok(())
    }
}

/// Weighted share of the characterizing cuts that contain each point.
fn side_score(characterizing_cuts: &Specification, cuts: &Cuts, weights: &[f64]) -> Vec<f64> {
    let mut score = vec![0.0; cuts.num_points()];
    for (&id, &orientation) in characterizing_cuts {
        let cut = cuts.cut_at(id);
        let weight = weights[id as usize];
        let oriented = orientation.orient(cut);
        for point in oriented.iter_ones() {
            score[point] += weight;
        }
    }
    score
}

impl TanglesTree {
    /// Contracts the tree and computes its soft predictions in one go.
    pub fn contract_tree(&self, cuts: &Cuts, weights: &[f64]) -> Result<ContractedTanglesTree> {
        let mut contracted = ContractedTanglesTree::new(self);
        contracted.calculate_characterizing_cuts();
        contracted.compute_soft_predictions(cuts, weights)?;
        Ok(contracted)
    }
}

#[cfg(test)]
mod tests {
    use bitvec::bits;
    use bitvec::prelude::Lsb0;

    use super::*;
    use crate::cuts::{CutOrientation, CutValue};
    use crate::tangles::tangle_search_tree;

    fn three_clusters() -> Vec<CutValue> {
        let cut_1 = bits![1, 1, 1, 0, 0, 0, 0, 0, 0];
        let cut_2 = bits![0, 0, 0, 1, 1, 1, 0, 0, 0];
        let cut_3 = bits![0, 0, 0, 0, 0, 0, 1, 1, 1];
        vec![cut_1.into(), cut_2.into(), cut_3.into()]
    }

    fn contracted(cuts: Vec<CutValue>, agreement: u16) -> ContractedTanglesTree {
        ContractedTanglesTree::new(&tangle_search_tree(cuts, agreement).unwrap())
    }

    #[test]
    fn test_contraction_keeps_splits_and_leaves() {
        let tree = contracted(three_clusters(), 3);
        // Root splits on c0, the -c0 side splits on c1; the chains below
        // are contracted away.
        assert_eq!(tree.leaves().len(), 3);
        assert_eq!(tree.splitting().len(), 2);
        let root = tree.node(tree.root());
        assert!(root.last_cut().is_none());

        let left_leaf = tree.node(root.left().unwrap());
        assert_eq!(left_leaf.last_cut(), Some(Cut(2, CutOrientation::Inverted)));
        assert!(left_leaf.is_leaf());
        assert_eq!(
            tree.node(root.right().unwrap()).last_cut(),
            Some(Cut(0, CutOrientation::Inverted))
        );
    }

    #[test]
    fn test_contracted_display() {
        let tree = contracted(three_clusters(), 3);
        assert_eq!(tree.to_string(), "Root\n 2F\n 0F\n  2F\n  2T");
    }

    #[test]
    fn test_characterizing_cuts() {
        let mut tree = contracted(three_clusters(), 3);
        tree.calculate_characterizing_cuts();
        let root = tree.node(tree.root());

        let left: Specification = [(0, CutOrientation::Normal)].into();
        let right: Specification = [(0, CutOrientation::Inverted)].into();
        assert_eq!(root.characterizing_cuts_left(), &left);
        assert_eq!(root.characterizing_cuts_right(), &right);
        // c2 is oriented away on the left side, but the right side splits on it.
        assert!(root.characterizing_cuts().is_empty());

        let split = tree.node(root.right().unwrap());
        let left: Specification = [(1, CutOrientation::Normal), (2, CutOrientation::Inverted)].into();
        let right: Specification = [(1, CutOrientation::Inverted), (2, CutOrientation::Normal)].into();
        assert_eq!(split.characterizing_cuts_left(), &left);
        assert_eq!(split.characterizing_cuts_right(), &right);
    }

    #[test]
    fn test_soft_predictions_sum_to_one() {
        let cuts = Cuts::new(three_clusters()).unwrap();
        let weights = vec![1.0; cuts.len()];
        let search = tangle_search_tree(three_clusters(), 3).unwrap();
        let tree = search.contract_tree(&cuts, &weights).unwrap();

        let leaves: Vec<Vec<f64>> = (0..tree.num_clusters())
            .map(|leaf| tree.probabilities(leaf).unwrap())
            .collect();
        for point in 0..cuts.num_points() {
            let total: f64 = leaves.iter().map(|p| p[point]).sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        // first cluster holds the first three points
        assert_eq!(&leaves[0][..3], &[1.0, 1.0, 1.0]);
        assert_eq!(&leaves[0][3..], &[0.0; 6]);
        assert_eq!(&leaves[1][3..6], &[1.0, 1.0, 1.0]);
        assert_eq!(&leaves[2][6..], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_probabilities_errors() {
        let tree = contracted(three_clusters(), 3);
        assert!(matches!(tree.probabilities(0), Err(TanglesError::PredictionsMissing)));

        let cuts = Cuts::new(three_clusters()).unwrap();
        let tree = tangle_search_tree(three_clusters(), 3)
            .unwrap()
            .contract_tree(&cuts, &[1.0, 1.0, 1.0])
            .unwrap();
        assert!(matches!(tree.probabilities(3), Err(TanglesError::UnknownLeaf(3))));
    }

    fn noisy_cuts() -> Vec<CutValue> {
        // c0 separates two clusters, c1 only splits off a couple of points
        // from the right side, c2 and c3 are oriented the same everywhere.
        vec![
            bits![1, 1, 1, 1, 0, 0, 0, 0, 0, 0].into(),
            bits![0, 0, 0, 0, 1, 1, 0, 0, 0, 0].into(),
            bits![1, 1, 1, 1, 1, 1, 1, 1, 1, 0].into(),
            bits![1, 1, 1, 1, 1, 1, 1, 1, 1, 1].into(),
        ]
    }

    #[test]
    fn test_prune_removes_short_branches() {
        let mut tree = contracted(noisy_cuts(), 2);
        assert_eq!(tree.num_clusters(), 3);

        tree.prune(0);
        assert_eq!(tree.num_clusters(), 3);
        tree.prune(2);
        assert_eq!(tree.num_clusters(), 3);

        // c1 splits -c0 into two leaves, both ending at c3, three cuts below
        // the split. Depth 3 removes both, the split becomes a leaf one cut
        // below the root and goes as well. The left leaf becomes the root.
        tree.prune(3);
        assert_eq!(tree.num_clusters(), 1);
        let root = tree.node(tree.root());
        assert!(root.is_leaf());
        assert!(root.parent().is_none());
        assert_eq!(root.last_cut(), Some(Cut(3, CutOrientation::Normal)));
    }

    #[test]
    fn test_prune_contracts_one_sided_split() {
        let mut tree = contracted(noisy_cuts(), 2);
        let split = tree.node(tree.root()).right().unwrap();
        let split_right = tree.node(split).right().unwrap();
        // make the right leaf look like noise and keep the left one
        tree.nodes[split_right].last_cut = Some(Cut(1, CutOrientation::Inverted));
        tree.prune(1);

        assert_eq!(tree.num_clusters(), 2);
        let root = tree.node(tree.root());
        let survivor = tree.node(root.right().unwrap());
        assert_eq!(survivor.parent(), Some(tree.root()));
        assert_eq!(survivor.last_cut(), Some(Cut(3, CutOrientation::Normal)));
    }

    #[test]
    fn test_empty_tree_is_single_leaf() {
        let cuts = Cuts::new(three_clusters()).unwrap();
        let tree = tangle_search_tree(three_clusters(), 10)
            .unwrap()
            .contract_tree(&cuts, &[1.0; 3])
            .unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.num_clusters(), 1);
        assert_eq!(tree.probabilities(0).unwrap(), vec![1.0; 9]);
    }

    #[test]
    fn test_dot_export() {
        let tree = contracted(vec![bits![1, 1, 0, 0].into()], 2);
        let dot = tree.to_dot();
        assert!(dot.starts_with("graph tangles {"));
        assert!(dot.contains("root [label=\"Root\"];"));
        assert!(dot.contains("n1 [label=\"0T\"];"));
        assert!(dot.contains("n2 [label=\"0F\"];"));
        assert!(dot.contains("root -- n2;"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_zero_scores_split_evenly() {
        let cuts = Cuts::new(three_clusters()).unwrap();
        // only c0 counts, so the split on c1 cannot tell its sides apart
        let tree = tangle_search_tree(three_clusters(), 3)
            .unwrap()
            .contract_tree(&cuts, &[1.0, 0.0, 0.0])
            .unwrap();

        let parent = tree.node(tree.node(tree.root()).right().unwrap());
        let p_parent = parent.p().unwrap().to_vec();
        assert_eq!(p_parent, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);

        let half: Vec<f64> = p_parent.iter().map(|p| 0.5 * p).collect();
        assert_eq!(tree.node(parent.left().unwrap()).p().unwrap(), &half[..]);
        assert_eq!(tree.node(parent.right().unwrap()).p().unwrap(), &half[..]);
        assert_eq!(tree.probabilities(1).unwrap(), half);
        assert_eq!(tree.probabilities(2).unwrap(), half);
    }

    #[test]
    fn test_prune_drops_stale_predictions() {
        let cuts = Cuts::new(three_clusters()).unwrap();
        let mut tree = tangle_search_tree(three_clusters(), 3)
            .unwrap()
            .contract_tree(&cuts, &[1.0; 3])
            .unwrap();
        assert_eq!(&tree.probabilities(0).unwrap()[3..], &[0.0; 6]);

        // the split on c0 and its leaves are noise at depth 2
        tree.prune(2);
        assert_eq!(tree.num_clusters(), 1);
        assert!(!tree.processed_soft_predictions());
        assert!(matches!(tree.probabilities(0), Err(TanglesError::PredictionsMissing)));
        assert!(tree.node(tree.root()).p().is_none());

        tree.compute_soft_predictions(&cuts, &[1.0; 3]).unwrap();
        assert_eq!(tree.probabilities(0).unwrap(), vec![1.0; 9]);
    }

    /// A tree where every split has a leaf on the left and the next split
    /// on the right.
    fn spine(num_splits: usize) -> ContractedTanglesTree {
        let node = |parent| ContractedTanglesTreeNode {
            parent,
            left: None,
            right: None,
            origin: 0,
            last_cut: parent.map(|_| Cut(0, CutOrientation::Normal)),
            specification: Specification::new(),
            characterizing_cuts: Specification::new(),
            characterizing_cuts_left: Specification::new(),
            characterizing_cuts_right: Specification::new(),
            p: None,
        };
        let mut nodes = vec![node(None)];
        let mut split = 0;
        for _ in 0..num_splits {
            let (left, right) = (nodes.len(), nodes.len() + 1);
            nodes.push(node(Some(split)));
            nodes.push(node(Some(split)));
            nodes[split].left = Some(left);
            nodes[split].right = Some(right);
            split = right;
        }
        ContractedTanglesTree {
            nodes,
            root: 0,
            is_empty: false,
            characterized: false,
            processed_soft_predictions: false,
        }
    }

    #[test]
    fn test_deep_tree() {
        let num_splits = 50_000;
        let mut tree = spine(num_splits);
        assert_eq!(tree.num_clusters(), num_splits + 1);

        let cuts = Cuts::new(vec![bits![1, 0].to_bitvec()]).unwrap();
        tree.compute_soft_predictions(&cuts, &[1.0]).unwrap();
        let total: f64 = tree
            .leaves()
            .into_iter()
            .map(|leaf| tree.node(leaf).p().unwrap()[0])
            .sum();
        assert!((total - 1.0).abs() < 1e-12);

        let dot = tree.to_dot();
        assert_eq!(dot.lines().count(), 2 + (2 * num_splits + 1) + 2 * num_splits + 1);

        // every node is one cut below its parent, so everything goes
        tree.prune(1);
        assert_eq!(tree.num_clusters(), 1);
        assert!(tree.node(tree.root()).is_leaf());
    }
}
