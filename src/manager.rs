//! The SDD manager: owns all nodes.
//!
//! The manager provides what the readers, writers and compiler need from a
//! node store:
//! - the FALSE and TRUE singletons,
//! - a table of canonical literal nodes, one per signed literal,
//! - [`lookup_node`][SddManager::lookup_node], a hash-consing constructor for
//!   decomposition nodes,
//! - fresh probabilistic TRUE and decomposition nodes carrying weights.
//!
//! `lookup_node` only shares structurally identical nodes. It performs no
//! trimming or compression, so callers are responsible for handing it
//! normalized element lists.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;

use log::{debug, trace};
use num_bigint::BigUint;

use crate::node::{Element, Sdd, SddNode, Theta};
use crate::reference::SddId;
use crate::traversal::Indexing;
use crate::types::{Literal, VtreeId};
use crate::vtree::Vtree;

pub struct SddManager {
    vtree: Vtree,
    /// Node storage. Index 0 = FALSE, index 1 = TRUE.
    nodes: RefCell<Vec<SddNode>>,
    /// Whether each node represents the false function, fixed at creation.
    false_sdd: RefCell<Vec<bool>>,
    /// Unique table for decomposition nodes.
    unique: RefCell<HashMap<(VtreeId, Vec<Element>), SddId>>,
    /// Canonical literals: `+v` at `v - 1`, `-v` at `n + v - 1`.
    literals: Vec<SddId>,
}

impl Debug for SddManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SddManager")
            .field("vars", &self.var_count())
            .field("nodes", &self.nodes.borrow().len())
            .field("unique", &self.unique.borrow().len())
            .finish()
    }
}

impl SddManager {
    /// Creates a manager with a balanced vtree over `num_vars` variables.
    pub fn new(num_vars: u32) -> Self {
        Self::with_vtree(Vtree::balanced(num_vars))
    }

    pub fn with_vtree(vtree: Vtree) -> Self {
        let n = vtree.num_vars();
        let mut nodes = vec![SddNode::new(Sdd::False), SddNode::new(Sdd::True { vtree: None })];
        let mut literals = Vec::with_capacity(2 * n as usize);
        for lit in (1..=n as i32).chain((1..=n as i32).map(|v| -v)) {
            literals.push(SddId::new(nodes.len() as u32));
            nodes.push(SddNode::new(Sdd::Literal(Literal::new(lit))));
        }
        let mut false_sdd = vec![false; nodes.len()];
        false_sdd[SddId::FALSE.index()] = true;

        Self {
            vtree,
            nodes: RefCell::new(nodes),
            false_sdd: RefCell::new(false_sdd),
            unique: RefCell::new(HashMap::new()),
            literals,
        }
    }

    pub fn vtree(&self) -> &Vtree {
        &self.vtree
    }

    pub fn var_count(&self) -> u32 {
        self.vtree.num_vars()
    }

    pub fn false_sdd(&self) -> SddId {
        SddId::FALSE
    }

    pub fn true_sdd(&self) -> SddId {
        SddId::TRUE
    }

    /// Canonical node of a signed literal, or `None` if the variable is unknown.
    pub fn get_literal(&self, lit: i32) -> Option<SddId> {
        let n = self.var_count() as usize;
        let var = lit.unsigned_abs() as usize;
        if lit == 0 || var > n {
            return None;
        }
        let index = if lit > 0 { var - 1 } else { n + var - 1 };
        Some(self.literals[index])
    }

    /// Canonical node of a signed literal.
    ///
    /// # Panics
    ///
    /// Panics if the variable is not in the vtree.
    pub fn literal(&self, lit: i32) -> SddId {
        self.get_literal(lit)
            .unwrap_or_else(|| panic!("Literal {} is out of range for {} variables", lit, self.var_count()))
    }

    /// Positive literal of `var`.
    pub fn var(&self, var: u32) -> SddId {
        self.literal(var as i32)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn node(&self, id: SddId) -> SddNode {
        self.nodes.borrow()[id.index()].clone()
    }

    pub fn kind(&self, id: SddId) -> Sdd {
        self.nodes.borrow()[id.index()].kind.clone()
    }

    pub fn theta(&self, id: SddId) -> Option<Theta> {
        self.nodes.borrow()[id.index()].theta.clone()
    }

    pub fn elements(&self, id: SddId) -> Vec<Element> {
        self.nodes.borrow()[id.index()].elements().to_vec()
    }

    pub fn is_decision(&self, id: SddId) -> bool {
        self.nodes.borrow()[id.index()].is_decision()
    }

    /// True if `id` represents the false function: the FALSE terminal, or a
    /// decomposition none of whose elements is positive.
    pub fn is_false_sdd(&self, id: SddId) -> bool {
        self.false_sdd.borrow()[id.index()]
    }

    /// Elements whose prime and sub are both satisfiable.
    pub fn positive_elements(&self, id: SddId) -> Vec<Element> {
        let false_sdd = self.false_sdd.borrow();
        self.nodes.borrow()[id.index()]
            .elements()
            .iter()
            .filter(|e| !false_sdd[e.prime.index()] && !false_sdd[e.sub.index()])
            .copied()
            .collect()
    }

    /// Vtree node a node is normalized for; `None` for the unbound terminals.
    pub fn vtree_of(&self, id: SddId) -> Option<VtreeId> {
        match self.nodes.borrow()[id.index()].kind {
            Sdd::False => None,
            Sdd::True { vtree } => vtree,
            Sdd::Literal(lit) => Some(self.vtree.var_vtree(lit.var())),
            Sdd::Decision { vtree, .. } => Some(vtree),
        }
    }

    fn push(&self, node: SddNode) -> SddId {
        let is_false = match &node.kind {
            Sdd::False => true,
            Sdd::Decision { elements, .. } => {
                let false_sdd = self.false_sdd.borrow();
                elements.iter().all(|e| false_sdd[e.prime.index()] || false_sdd[e.sub.index()])
            }
            _ => false,
        };
        let mut nodes = self.nodes.borrow_mut();
        let id = SddId::new(nodes.len() as u32);
        nodes.push(node);
        self.false_sdd.borrow_mut().push(is_false);
        id
    }

    /// Returns the decomposition node with these elements at `vtree`,
    /// creating it if no identical node exists yet.
    pub fn lookup_node(&self, elements: Vec<Element>, vtree: VtreeId) -> SddId {
        debug_assert!(!self.vtree.is_leaf(vtree), "decomposition at leaf {}", vtree);
        let key = (vtree, elements);
        if let Some(&id) = self.unique.borrow().get(&key) {
            trace!("lookup_node({}, {} elements) => {} (existing)", vtree, key.1.len(), id);
            return id;
        }
        let (vtree, elements) = key;
        let id = self.push(SddNode::new(Sdd::Decision {
            vtree,
            elements: elements.clone(),
        }));
        trace!("lookup_node({}, {} elements) => {} (new)", vtree, elements.len(), id);
        self.unique.borrow_mut().insert((vtree, elements), id);
        id
    }

    /// Creates a fresh PSDD TRUE node over `var` with weights `[Pr(¬x), Pr(x)]`.
    pub fn new_psdd_true(&self, var: u32, theta: Theta) -> SddId {
        assert_eq!(theta.len(), 2, "TRUE node needs exactly two weights");
        let vtree = self.vtree.var_vtree(var);
        self.push(SddNode::with_theta(Sdd::True { vtree: Some(vtree) }, theta))
    }

    /// Creates a fresh PSDD decomposition node; `theta` is aligned with `elements`.
    pub fn new_psdd_decision(&self, elements: Vec<Element>, vtree: VtreeId, theta: Theta) -> SddId {
        assert_eq!(theta.len(), elements.len(), "one weight per element");
        debug_assert!(!self.vtree.is_leaf(vtree), "decomposition at leaf {}", vtree);
        self.push(SddNode::with_theta(Sdd::Decision { vtree, elements }, theta))
    }

    /// Number of nodes reachable from `root`.
    pub fn size(&self, root: SddId) -> usize {
        Indexing::new(self, root).len()
    }

    /// Number of models of `root` over all variables of the manager.
    pub fn model_count(&self, root: SddId) -> BigUint {
        let order = Indexing::new(self, root);
        debug!("model_count(root = {}, nodes = {})", root, order.len());

        let scope = |id: SddId| self.vtree_of(id).map_or(0, |v| self.vtree.var_count(v));
        let mut counts: HashMap<SddId, BigUint> = HashMap::with_capacity(order.len());
        // Count of `id` over the variables of `target`.
        let lift = |counts: &HashMap<SddId, BigUint>, id: SddId, target: VtreeId| -> BigUint {
            let gap = self.vtree.var_count(target) - scope(id);
            &counts[&id] << gap
        };

        for id in order.iter() {
            let count = match self.kind(id) {
                Sdd::False => BigUint::from(0u32),
                Sdd::True { vtree: None } => BigUint::from(1u32),
                Sdd::True { vtree: Some(_) } => BigUint::from(2u32),
                Sdd::Literal(_) => BigUint::from(1u32),
                Sdd::Decision { vtree, elements } => {
                    let (left, right) = match (self.vtree.left(vtree), self.vtree.right(vtree)) {
                        (Some(l), Some(r)) => (l, r),
                        _ => unreachable!("decomposition at leaf {}", vtree),
                    };
                    elements
                        .iter()
                        .map(|e| lift(&counts, e.prime, left) * lift(&counts, e.sub, right))
                        .sum()
                }
            };
            counts.insert(id, count);
        }

        lift(&counts, root, self.vtree.root())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_literal_table() {
        let mgr = SddManager::new(3);
        let a = mgr.literal(2);
        let b = mgr.literal(2);
        assert_eq!(a, b);
        assert_ne!(mgr.literal(2), mgr.literal(-2));
        assert_eq!(mgr.kind(mgr.literal(-3)), Sdd::Literal(Literal::new(-3)));
        assert_eq!(mgr.get_literal(4), None);
        assert_eq!(mgr.get_literal(0), None);
    }

    #[test]
    fn test_lookup_node_shares() {
        let mgr = SddManager::new(2);
        let root = mgr.vtree().root();
        let elements = vec![
            Element::new(mgr.literal(1), mgr.literal(2)),
            Element::new(mgr.literal(-1), mgr.false_sdd()),
        ];
        let f = mgr.lookup_node(elements.clone(), root);
        let g = mgr.lookup_node(elements, root);
        assert_eq!(f, g);
        assert!(mgr.is_decision(f));
        assert_eq!(mgr.positive_elements(f).len(), 1);
    }

    #[test]
    fn test_false_sdd() {
        let mgr = SddManager::new(2);
        let root = mgr.vtree().root();
        let f = mgr.lookup_node(
            vec![
                Element::new(mgr.literal(1), mgr.false_sdd()),
                Element::new(mgr.literal(-1), mgr.false_sdd()),
            ],
            root,
        );
        assert!(mgr.is_false_sdd(f));
        assert!(!mgr.is_false_sdd(mgr.literal(1)));
        assert!(mgr.is_false_sdd(mgr.false_sdd()));
    }

    #[test]
    fn test_model_count() {
        let mgr = SddManager::new(2);
        let root = mgr.vtree().root();
        // x1 ∧ x2
        let and = mgr.lookup_node(
            vec![
                Element::new(mgr.literal(1), mgr.literal(2)),
                Element::new(mgr.literal(-1), mgr.false_sdd()),
            ],
            root,
        );
        assert_eq!(mgr.model_count(and), BigUint::from(1u32));
        // x1 ∨ x2
        let or = mgr.lookup_node(
            vec![
                Element::new(mgr.literal(1), mgr.true_sdd()),
                Element::new(mgr.literal(-1), mgr.literal(2)),
            ],
            root,
        );
        assert_eq!(mgr.model_count(or), BigUint::from(3u32));
        assert_eq!(mgr.model_count(mgr.true_sdd()), BigUint::from(4u32));
        assert_eq!(mgr.model_count(mgr.literal(-2)), BigUint::from(2u32));
    }

    #[test]
    fn test_psdd_nodes_are_fresh() {
        let mgr = SddManager::new(2);
        let t1 = mgr.new_psdd_true(1, Theta::bernoulli(0.3));
        let t2 = mgr.new_psdd_true(1, Theta::bernoulli(0.3));
        assert_ne!(t1, t2);
        assert_eq!(mgr.vtree_of(t1), Some(mgr.vtree().var_vtree(1)));
        assert!(!mgr.is_false_sdd(t1));
    }
}
