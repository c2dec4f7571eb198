//! Vtrees: full binary trees over the variable set.
//!
//! Every decomposition node of an SDD is normalized for one internal vtree
//! node `v`: primes live under `v.left`, subs under `v.right`.
//!
//! Nodes are stored by their in-order position, which is the id used in the
//! libsdd file formats. For a vtree whose leaves are read left to right,
//! leaves occupy the even positions and every internal node sits on the odd
//! position between the last leaf of its left subtree and the first leaf of
//! its right subtree.

use crate::types::VtreeId;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VtreeNode {
    Leaf { var: u32 },
    Internal { left: VtreeId, right: VtreeId },
}

#[derive(Debug, Clone)]
pub struct Vtree {
    nodes: Vec<VtreeNode>,
    parents: Vec<Option<VtreeId>>,
    /// Number of variables below each node.
    var_counts: Vec<u32>,
    /// Leaf of each variable, indexed by variable (index 0 unused).
    var_to_vtree: Vec<VtreeId>,
    root: VtreeId,
}

impl Vtree {
    /// Balanced vtree over variables `1..=num_vars`.
    pub fn balanced(num_vars: u32) -> Self {
        Self::build(num_vars, |lo, hi| (lo + hi) / 2)
    }

    /// Right-linear vtree: every left child is a leaf.
    pub fn right_linear(num_vars: u32) -> Self {
        Self::build(num_vars, |lo, _| lo + 1)
    }

    /// Left-linear vtree: every right child is a leaf.
    pub fn left_linear(num_vars: u32) -> Self {
        Self::build(num_vars, |_, hi| hi - 1)
    }

    /// Builds a vtree over leaves `x1..xn` (in this order), splitting the leaf
    /// range `[lo, hi)` at `split(lo, hi)`.
    fn build(num_vars: u32, split: impl Fn(usize, usize) -> usize) -> Self {
        assert!(num_vars > 0, "Vtree needs at least one variable");
        let n = num_vars as usize;

        let position = |lo: usize, hi: usize| -> VtreeId {
            if hi - lo == 1 {
                VtreeId::new((2 * lo) as u32)
            } else {
                VtreeId::new((2 * split(lo, hi) - 1) as u32)
            }
        };

        let mut nodes = vec![None; 2 * n - 1];
        let mut stack = vec![(0, n)];
        while let Some((lo, hi)) = stack.pop() {
            let here = position(lo, hi);
            if hi - lo == 1 {
                nodes[here.index()] = Some(VtreeNode::Leaf { var: (lo + 1) as u32 });
            } else {
                let mid = split(lo, hi);
                debug_assert!(lo < mid && mid < hi);
                nodes[here.index()] = Some(VtreeNode::Internal {
                    left: position(lo, mid),
                    right: position(mid, hi),
                });
                stack.push((lo, mid));
                stack.push((mid, hi));
            }
        }

        let nodes = nodes.into_iter().map(|n| n.expect("every position is filled")).collect();
        Self::from_nodes(nodes, position(0, n)).expect("generated vtree is well-formed")
    }

    /// Assembles a vtree from nodes indexed by position.
    ///
    /// Checks that the structure is a tree rooted at `root` covering all nodes
    /// and that leaf variables are exactly `1..=num_leaves`.
    pub(crate) fn from_nodes(nodes: Vec<VtreeNode>, root: VtreeId) -> Result<Self, String> {
        let count = nodes.len();
        if root.index() >= count {
            return Err(format!("root {} out of range", root));
        }

        let mut parents: Vec<Option<VtreeId>> = vec![None; count];
        for (i, node) in nodes.iter().enumerate() {
            if let VtreeNode::Internal { left, right } = *node {
                for child in [left, right] {
                    if child.index() >= count {
                        return Err(format!("child {} of v{} out of range", child, i));
                    }
                    if parents[child.index()].is_some() || child == root {
                        return Err(format!("vtree node {} has more than one parent", child));
                    }
                    parents[child.index()] = Some(VtreeId::new(i as u32));
                }
            }
        }

        // Post-order pass computing variable counts; also detects unreachable nodes.
        let mut var_counts = vec![0u32; count];
        let mut num_leaves = 0usize;
        let mut visited = 0usize;
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            match nodes[id.index()] {
                VtreeNode::Leaf { .. } => {
                    var_counts[id.index()] = 1;
                    num_leaves += 1;
                    visited += 1;
                }
                VtreeNode::Internal { left, right } => {
                    if expanded {
                        var_counts[id.index()] = var_counts[left.index()] + var_counts[right.index()];
                        visited += 1;
                    } else {
                        stack.push((id, true));
                        stack.push((right, false));
                        stack.push((left, false));
                    }
                }
            }
        }
        if visited != count {
            return Err(format!("{} vtree nodes are not reachable from the root", count - visited));
        }

        let mut var_to_vtree: Vec<Option<VtreeId>> = vec![None; num_leaves + 1];
        for (i, node) in nodes.iter().enumerate() {
            if let VtreeNode::Leaf { var } = *node {
                let var = var as usize;
                if var == 0 || var > num_leaves {
                    return Err(format!("variable {} out of range 1..={}", var, num_leaves));
                }
                if var_to_vtree[var].is_some() {
                    return Err(format!("variable {} appears in more than one leaf", var));
                }
                var_to_vtree[var] = Some(VtreeId::new(i as u32));
            }
        }
        let var_to_vtree = std::iter::once(root)
            .chain(var_to_vtree.into_iter().skip(1).map(|v| v.expect("all variables are present")))
            .collect();

        Ok(Self {
            nodes,
            parents,
            var_counts,
            var_to_vtree,
            root,
        })
    }

    pub fn root(&self) -> VtreeId {
        self.root
    }

    pub fn node(&self, id: VtreeId) -> VtreeNode {
        self.nodes[id.index()]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_vars(&self) -> u32 {
        self.var_counts[self.root.index()]
    }

    /// Looks up a node by its file id, if it exists.
    pub fn get(&self, position: u32) -> Option<VtreeId> {
        ((position as usize) < self.nodes.len()).then(|| VtreeId::new(position))
    }

    pub fn parent(&self, id: VtreeId) -> Option<VtreeId> {
        self.parents[id.index()]
    }

    pub fn left(&self, id: VtreeId) -> Option<VtreeId> {
        match self.node(id) {
            VtreeNode::Internal { left, .. } => Some(left),
            VtreeNode::Leaf { .. } => None,
        }
    }

    pub fn right(&self, id: VtreeId) -> Option<VtreeId> {
        match self.node(id) {
            VtreeNode::Internal { right, .. } => Some(right),
            VtreeNode::Leaf { .. } => None,
        }
    }

    pub fn is_leaf(&self, id: VtreeId) -> bool {
        matches!(self.node(id), VtreeNode::Leaf { .. })
    }

    /// Variable of a leaf, `None` for internal nodes.
    pub fn var(&self, id: VtreeId) -> Option<u32> {
        match self.node(id) {
            VtreeNode::Leaf { var } => Some(var),
            VtreeNode::Internal { .. } => None,
        }
    }

    /// Leaf holding `var`.
    ///
    /// # Panics
    ///
    /// Panics if `var` is not in `1..=num_vars`.
    pub fn var_vtree(&self, var: u32) -> VtreeId {
        assert!(var >= 1 && var <= self.num_vars(), "Variable {} is not in the vtree", var);
        self.var_to_vtree[var as usize]
    }

    /// Number of variables below (and including) `id`.
    pub fn var_count(&self, id: VtreeId) -> u32 {
        self.var_counts[id.index()]
    }

    /// Returns true if `id` is `ancestor` or lies below it.
    pub fn is_under(&self, id: VtreeId, ancestor: VtreeId) -> bool {
        let mut current = Some(id);
        while let Some(v) = current {
            if v == ancestor {
                return true;
            }
            current = self.parent(v);
        }
        false
    }

    /// All node ids in position order.
    pub fn ids(&self) -> impl Iterator<Item = VtreeId> + '_ {
        (0..self.nodes.len() as u32).map(VtreeId::new)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_balanced_positions() {
        let vtree = Vtree::balanced(4);
        assert_eq!(vtree.num_nodes(), 7);
        assert_eq!(vtree.num_vars(), 4);
        assert_eq!(vtree.root(), VtreeId::new(3));
        for var in 1..=4 {
            assert_eq!(vtree.var_vtree(var), VtreeId::new(2 * (var - 1)));
        }
        assert_eq!(vtree.left(vtree.root()), Some(VtreeId::new(1)));
        assert_eq!(vtree.right(vtree.root()), Some(VtreeId::new(5)));
        assert_eq!(vtree.parent(VtreeId::new(0)), Some(VtreeId::new(1)));
        assert_eq!(vtree.parent(vtree.root()), None);
    }

    #[test]
    fn test_right_linear() {
        let vtree = Vtree::right_linear(3);
        // x1 at 0, root at 1, x2 at 2, inner at 3, x3 at 4
        assert_eq!(vtree.root(), VtreeId::new(1));
        assert_eq!(vtree.left(VtreeId::new(1)), Some(VtreeId::new(0)));
        assert_eq!(vtree.right(VtreeId::new(1)), Some(VtreeId::new(3)));
        assert!(vtree.is_leaf(VtreeId::new(0)));
        assert_eq!(vtree.var_count(VtreeId::new(3)), 2);
    }

    #[test]
    fn test_left_linear() {
        let vtree = Vtree::left_linear(3);
        assert_eq!(vtree.root(), VtreeId::new(3));
        assert_eq!(vtree.right(vtree.root()), Some(VtreeId::new(4)));
        assert_eq!(vtree.var(VtreeId::new(4)), Some(3));
    }

    #[test]
    fn test_single_variable() {
        let vtree = Vtree::balanced(1);
        assert_eq!(vtree.num_nodes(), 1);
        assert_eq!(vtree.root(), VtreeId::new(0));
        assert_eq!(vtree.var(vtree.root()), Some(1));
    }

    #[test]
    fn test_is_under() {
        let vtree = Vtree::balanced(4);
        assert!(vtree.is_under(VtreeId::new(0), VtreeId::new(1)));
        assert!(vtree.is_under(VtreeId::new(0), vtree.root()));
        assert!(!vtree.is_under(VtreeId::new(0), VtreeId::new(5)));
        assert!(vtree.is_under(VtreeId::new(5), VtreeId::new(5)));
    }

    #[test]
    fn test_from_nodes_rejects_shared_child() {
        let leaf = VtreeId::new(0);
        let nodes = vec![
            VtreeNode::Leaf { var: 1 },
            VtreeNode::Internal { left: leaf, right: leaf },
        ];
        assert!(Vtree::from_nodes(nodes, VtreeId::new(1)).is_err());
    }

    #[test]
    fn test_from_nodes_rejects_duplicate_var() {
        let nodes = vec![
            VtreeNode::Leaf { var: 1 },
            VtreeNode::Internal {
                left: VtreeId::new(0),
                right: VtreeId::new(2),
            },
            VtreeNode::Leaf { var: 1 },
        ];
        assert!(Vtree::from_nodes(nodes, VtreeId::new(1)).is_err());
    }
}
