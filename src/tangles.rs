use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::TanglesConfig;
use crate::cuts::{is_consistent, new_core, Core, Cut, CutId, CutOrientation, CutPool, CutValue, Cuts};
use crate::error::Result;

/// Index of a node in the arena of a [`TanglesTree`].
pub type UTreeSize = u32;

/// Which cuts every tangle of a node orients, and how.
pub type Specification = BTreeMap<CutId, CutOrientation>;

enum Side {
    Left,
    Right,
}

// Arena based implementation of trees
#[derive(Clone, PartialEq)]
pub struct TanglesTree {
    nodes: Vec<TanglesTreeNode>,
    pool: CutPool,
    agreement: u16,
    max_clusters: Option<usize>,
    /// Nodes that received the most recently added cut.
    active: Vec<UTreeSize>,
    /// Leaves that could not be extended by any later cut.
    maximals: Vec<UTreeSize>,
    is_empty: bool,
}

impl std::fmt::Debug for TanglesTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TanglesTree {{ nodes: [")?;
        for (i, node) in self.nodes.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{}. {:?}", node.id, node)?;
            if i != self.nodes.len() - 1 {
                write!(f, ",")?;
            }
        }
        write!(
            f,
            "], active: {:?}, maximals: {:?}, agreement: {:?} }}",
            self.active, self.maximals, self.agreement
        )
    }
}

#[derive(Clone, PartialEq)]
pub struct TanglesTreeNode {
    left: Option<UTreeSize>,
    right: Option<UTreeSize>,
    parent: Option<UTreeSize>,
    id: UTreeSize,
    value: Option<Cut>,
    core: Core,
    /// Set when the parent could be extended in both orientations.
    did_split: bool,
    splitting: bool,
}

impl std::fmt::Debug for TanglesTreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |idx: Option<UTreeSize>| match idx {
            Some(id) => format!("{}", id),
            None => "-".to_string(),
        };
        let val = match self.value {
            Some(cut) => format!("{:?}", cut),
            None => "-".to_string(),
        };
        write!(
            f,
            "TanglesTreeNode {{ children: ({},{}), parent: {}, id: {:?}, value: {}, core: {:?} }}",
            show(self.left),
            show(self.right),
            show(self.parent),
            self.id,
            val,
            self.core
        )
    }
}

impl TanglesTreeNode {
    fn new(
        parent: Option<UTreeSize>,
        id: UTreeSize,
        value: Option<Cut>,
        core: Core,
    ) -> TanglesTreeNode {
        TanglesTreeNode {
            left: None,
            right: None,
            parent,
            id,
            value,
            core,
            did_split: false,
            splitting: false,
        }
    }

    pub fn id(&self) -> UTreeSize {
        self.id
    }

    pub fn left(&self) -> Option<UTreeSize> {
        self.left
    }

    pub fn right(&self) -> Option<UTreeSize> {
        self.right
    }

    pub fn parent(&self) -> Option<UTreeSize> {
        self.parent
    }

    /// The oriented cut that was added last on the way to this node.
    /// `None` for the root.
    pub fn cut(&self) -> Option<Cut> {
        self.value
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn did_split(&self) -> bool {
        self.did_split
    }

    pub fn is_splitting(&self) -> bool {
        self.splitting
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Id of the last added cut, `-1` for the root.
    pub fn last_cut_id(&self) -> i32 {
        self.value.map_or(-1, |cut| i32::from(cut.0))
    }
}

impl TanglesTree {
    /// The cuts are expected to be validated already, see [`Cuts`].
    pub(crate) fn new(cuts: Vec<CutValue>, agreement: u16) -> TanglesTree {
        let root_node = TanglesTreeNode::new(None, 0, None, Vec::new());
        TanglesTree {
            nodes: vec![root_node],
            pool: CutPool::new(cuts),
            agreement,
            max_clusters: None,
            active: vec![0],
            maximals: Vec::new(),
            is_empty: true,
        }
    }

    /// Stop growing once this many tangles are active at the same time.
    pub fn with_max_clusters(mut self, max_clusters: Option<usize>) -> TanglesTree {
        self.max_clusters = max_clusters;
        self
    }

    pub fn root_idx(&self) -> UTreeSize {
        0
    }

    /// Inserts a node at the node indicated by the at argument.
    /// The node is inserted as left or right children, depending on
    /// the side argument.
    /// The cut argument denotes the cut that the node is associated with.
    /// The core argument indicates which core the new node should hold.
    fn insert_node(&mut self, at: UTreeSize, side: Side, cut: Cut, core: Core) -> UTreeSize {
        let new_node_idx = self.nodes.len() as UTreeSize;
        let new_node = TanglesTreeNode::new(Some(at), new_node_idx, Some(cut), core);
        match side {
            Side::Left => {
                debug_assert!(cut.1 == CutOrientation::Normal);
                self.nodes[at as usize].left = Some(new_node_idx);
            }
            Side::Right => {
                debug_assert!(cut.1 == CutOrientation::Inverted);
                self.nodes[at as usize].right = Some(new_node_idx);
            }
        }
        self.nodes.push(new_node);
        new_node_idx
    }

    pub fn node(&self, at: UTreeSize) -> &TanglesTreeNode {
        &self.nodes[at as usize]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn pool(&self) -> &CutPool {
        &self.pool
    }

    pub fn agreement(&self) -> u16 {
        self.agreement
    }

    pub fn active(&self) -> &[UTreeSize] {
        &self.active
    }

    pub fn maximals(&self) -> &[UTreeSize] {
        &self.maximals
    }

    /// True as long as no cut could be oriented at all.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    fn insert_node_if_consistent(
        &mut self,
        node: UTreeSize,
        current_cut_id: CutId,
        orientation: CutOrientation,
    ) -> Option<UTreeSize> {
        let side = match orientation {
            CutOrientation::Normal => Side::Left,
            CutOrientation::Inverted => Side::Right,
        };
        let candidate_cut = Cut(current_cut_id, orientation);
        if self.consistent(node, candidate_cut) {
            let new_core = new_core(&self.pool, &self.node(node).core, candidate_cut);
            Some(self.insert_node(node, side, candidate_cut, new_core))
        } else {
            None
        }
    }

    /// Checks if the node at the index given via the at argument is consistent
    /// with the given oriented cut.
    fn consistent(&self, at: UTreeSize, cut: Cut) -> bool {
        is_consistent(cut, &self.node(at).core, &self.pool, self.agreement)
    }

    /// Tries to orient the cut with the given id in every active tangle.
    ///
    /// Returns false if the cut could not be added to any of them, if the id
    /// is not in the pool, or if the tree already holds `max_clusters` active
    /// tangles.
    pub fn add_cut(&mut self, cut_id: CutId) -> bool {
        if cut_id as usize >= self.pool.len() {
            warn!(cut_id, num_cuts = self.pool.len(), "cut id out of range");
            return false;
        }
        if let Some(max_clusters) = self.max_clusters {
            if self.active.len() >= max_clusters {
                warn!(
                    active = self.active.len(),
                    max_clusters, "stopped since there are too many leaves already"
                );
                return false;
            }
        }

        let current_active = std::mem::take(&mut self.active);
        let mut could_add_one = false;

        for node in current_active {
            let left = self.insert_node_if_consistent(node, cut_id, CutOrientation::Normal);
            let right = self.insert_node_if_consistent(node, cut_id, CutOrientation::Inverted);

            match (left, right) {
                (Some(left), Some(right)) => {
                    self.nodes[node as usize].splitting = true;
                    self.nodes[left as usize].did_split = true;
                    self.nodes[right as usize].did_split = true;
                }
                (None, None) => self.maximals.push(node),
                _ => {}
            }

            for child in [left, right].into_iter().flatten() {
                could_add_one = true;
                self.active.push(child);
            }
        }

        if could_add_one {
            self.is_empty = false;
        }
        could_add_one
    }

    /// Ends the search: tangles still active are maximal as well.
    fn finish(&mut self) {
        let active = self.active.clone();
        self.maximals.extend(active);
    }

    /// All oriented cuts on the path from the root to the node.
    pub fn specification(&self, at: UTreeSize) -> Specification {
        let mut specification = Specification::new();
        let mut current = Some(at);
        while let Some(idx) = current {
            let node = self.node(idx);
            if let Some(Cut(id, orientation)) = node.value {
                specification.insert(id, orientation);
            }
            current = node.parent;
        }
        specification
    }

    /// Prints one line per layer of the tree, one entry per node.
    pub fn pretty_print(&self) {
        print!("{}", self.layers());
    }

    fn layers(&self) -> String {
        let mut out = String::new();
        let mut nodes_at_i = vec![self.node(self.root_idx())];
        while !nodes_at_i.is_empty() {
            let mut children = Vec::new();
            for node in nodes_at_i {
                if let Some(Cut(id, orientation)) = node.value {
                    match orientation {
                        CutOrientation::Normal => out.push_str(&format!(" c{} ", id)),
                        CutOrientation::Inverted => out.push_str(&format!("-c{} ", id)),
                    }
                }
                children.extend(node.left.map(|idx| self.node(idx)));
                children.extend(node.right.map(|idx| self.node(idx)));
            }
            out.push('\n');
            nodes_at_i = children;
        }
        out
    }
}

impl std::fmt::Display for TanglesTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // A chain of cuts is as deep as there are cuts, so walk it with an
        // explicit stack.
        let mut stack = vec![(self.root_idx(), 0usize)];
        while let Some((at, height)) = stack.pop() {
            let node = self.node(at);
            match node.value {
                None => write!(f, "Root")?,
                Some(Cut(id, orientation)) => write!(
                    f,
                    "\n{}{} -> {}",
                    " ".repeat(height),
                    id,
                    orientation.label()
                )?,
            }
            stack.extend(node.right.map(|child| (child, height + 1)));
            stack.extend(node.left.map(|child| (child, height + 1)));
        }
        Ok(())
    }
}

/// Algorithm 1 in the paper of Klepper et al.
/// We assume that the set of cuts is already sorted by the cut cost
pub fn tangle_search_tree(cuts: Vec<CutValue>, agreement: u16) -> Result<TanglesTree> {
    let cuts = Cuts::new(cuts)?;
    let mut tree = TanglesTree::new(cuts.values().to_vec(), agreement);

    for cut_id in 0..cuts.len() {
        if !tree.add_cut(cut_id as CutId) {
            break;
        }
    }
    tree.finish();
    Ok(tree)
}

/// Builds the tangle search tree order by order.
///
/// All cuts sharing the same cost form one order. The search stops at the
/// first cut that no active tangle can orient.
pub fn tangle_computation(cuts: &Cuts, config: &TanglesConfig) -> TanglesTree {
    info!(
        agreement = config.agreement,
        num_cuts = cuts.len(),
        "start tangle computation"
    );

    let mut tree = TanglesTree::new(cuts.values().to_vec(), config.agreement)
        .with_max_clusters(config.max_clusters);
    let max_order = cuts.costs().last().copied().unwrap_or_default();
    let mut old_order = None;

    'orders: for (order, ids) in cuts.orders() {
        debug!(order, num_new_cuts = ids.len(), "compute tangles of order");

        for cut_id in ids {
            if !tree.add_cut(cut_id as CutId) {
                info!(
                    reached = ?old_order,
                    max_order,
                    "could not add any new cuts due to inconsistency, stopping"
                );
                break 'orders;
            }
        }

        debug!(
            order,
            num_tangles = tree.active.len(),
            "found tangles of order less or equal"
        );
        old_order = Some(order);
    }

    tree.finish();
    info!(
        num_leaves = tree.maximals.len(),
        "leaves before cutting out short paths"
    );
    tree
}
