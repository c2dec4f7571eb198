//! Traversal orders over a shared DAG.
//!
//! [`Indexing`] assigns every node reachable from a root a dense index in
//! post-order: children (primes before subs, elements in order) strictly
//! before their parents, root last. Each node is visited once no matter how
//! many parents reference it. The traversal keeps an explicit stack, so deep
//! diagrams do not grow the call stack.
//!
//! The index table is a side structure owned by the caller and scoped to one
//! write; nodes never store their index.

use std::collections::HashMap;

use crate::manager::SddManager;
use crate::node::Element;
use crate::reference::SddId;

/// Dense post-order numbering of the nodes reachable from a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexing {
    order: Vec<SddId>,
    index: HashMap<SddId, usize>,
}

impl Indexing {
    pub fn new(mgr: &SddManager, root: SddId) -> Self {
        let (order, index) = post_order(root, |id| mgr.elements(id));
        Self { order, index }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Index assigned to `id`, if it is reachable from the root.
    pub fn index_of(&self, id: SddId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Nodes in index order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = SddId> + '_ {
        self.order.iter().copied()
    }

    pub fn order(&self) -> &[SddId] {
        &self.order
    }
}

/// Post-order over the nodes reachable from `root` through positive elements,
/// skipping false-SDD nodes. Both passes of the circuit compiler iterate this
/// one materialized list.
pub fn positive_order(mgr: &SddManager, root: SddId) -> Vec<SddId> {
    if mgr.is_false_sdd(root) {
        return Vec::new();
    }
    post_order(root, |id| mgr.positive_elements(id)).0
}

fn post_order(root: SddId, elements: impl Fn(SddId) -> Vec<Element>) -> (Vec<SddId>, HashMap<SddId, usize>) {
    let mut order = Vec::new();
    let mut index = HashMap::new();
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if index.contains_key(&id) {
            continue;
        }
        if expanded {
            index.insert(id, order.len());
            order.push(id);
            continue;
        }
        stack.push((id, true));
        for e in elements(id).iter().rev() {
            stack.push((e.sub, false));
            stack.push((e.prime, false));
        }
    }

    (order, index)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    /// x1 ∧ x2 and x1 ∨ x2 sharing the literal x1, under one root.
    fn shared(mgr: &SddManager) -> SddId {
        let v = mgr.vtree();
        let inner = v.left(v.root()).unwrap();
        let (x1, x2) = (mgr.literal(1), mgr.literal(2));
        let and = mgr.lookup_node(
            vec![Element::new(x1, x2), Element::new(mgr.literal(-1), mgr.false_sdd())],
            inner,
        );
        let or = mgr.lookup_node(
            vec![Element::new(x1, mgr.true_sdd()), Element::new(mgr.literal(-1), x2)],
            inner,
        );
        mgr.lookup_node(
            vec![Element::new(and, mgr.literal(3)), Element::new(or, mgr.literal(-3))],
            v.root(),
        )
    }

    #[test]
    fn test_children_before_parents() {
        let mgr = SddManager::new(4);
        let root = shared(&mgr);
        let indexing = Indexing::new(&mgr, root);

        assert_eq!(indexing.iter().last(), Some(root));
        for id in indexing.iter() {
            let i = indexing.index_of(id).unwrap();
            for e in mgr.elements(id) {
                assert!(indexing.index_of(e.prime).unwrap() < i);
                assert!(indexing.index_of(e.sub).unwrap() < i);
            }
        }
    }

    #[test]
    fn test_shared_nodes_visited_once() {
        let mgr = SddManager::new(4);
        let root = shared(&mgr);
        let indexing = Indexing::new(&mgr, root);
        // x1, x2, ¬x1, ⊥, and, x3, ⊤, or, ¬x3, root
        assert_eq!(indexing.len(), 10);
        let mut ids = indexing.order().to_vec();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_idempotent() {
        let mgr = SddManager::new(4);
        let root = shared(&mgr);
        assert_eq!(Indexing::new(&mgr, root), Indexing::new(&mgr, root));
    }

    #[test]
    fn test_positive_order_skips_false() {
        let mgr = SddManager::new(4);
        let root = shared(&mgr);
        let order = positive_order(&mgr, root);
        assert!(!order.contains(&mgr.false_sdd()));
        assert_eq!(order.last(), Some(&root));
        assert!(positive_order(&mgr, mgr.false_sdd()).is_empty());
    }

    #[test]
    fn test_terminal_root() {
        let mgr = SddManager::new(2);
        let indexing = Indexing::new(&mgr, mgr.true_sdd());
        assert_eq!(indexing.order(), &[mgr.true_sdd()]);
        assert_eq!(indexing.index_of(mgr.true_sdd()), Some(0));
    }
}
