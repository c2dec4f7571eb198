//! PSDD to arithmetic circuit compilation.
//!
//! The compiler flattens a PSDD into a list of NNF opcodes in two passes over
//! one materialized [`positive_order`]:
//!
//! 1. [`count_nodes_edges`] allocates circuit ids. The first `2n` ids are the
//!    indicator literals (`+1..+n`, then `-n..-1`); every TRUE node takes 5 ids
//!    and every decomposition with `k` positive elements takes `1 + 2k`. The
//!    last id of a node's block is its *head*.
//! 2. [`ArithmeticCircuit::compile`] emits the opcodes, numbering parameter
//!    literals from `n + 1` upward and recording their weights in a
//!    [`WeightTable`].
//!
//! Emission must land on exactly the ids and edge count the first pass
//! predicted; any divergence is a bug and panics.
//!
//! ```text
//! TRUE over x, head h:          decomposition, k elements, head h:
//!   h-4: l θ(¬x)                  l θ1
//!   h-3: l θ(x)                   * 3 (param) (prime) (sub)
//!   h-2: * 2 (h-4) (¬x)           ...
//!   h-1: * 2 (h-3) (x)            l θk
//!   h:   + 2 (h-2) (h-1)          * 3 (param) (prime) (sub)
//!                                 + k (products)
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Write as _};
use std::fs;
use std::path::Path;

use log::{debug, trace};

use crate::error::CompileError;
use crate::lmap::WeightTable;
use crate::manager::SddManager;
use crate::node::Sdd;
use crate::reference::SddId;
use crate::traversal::positive_order;

/// Sizes and head ids predicted by the counting pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitCounts {
    pub node_count: usize,
    pub edge_count: usize,
    pub literal_count: usize,
    heads: HashMap<SddId, usize>,
}

impl CircuitCounts {
    /// Circuit id computing the value of `id`.
    pub fn head(&self, id: SddId) -> Option<usize> {
        self.heads.get(&id).copied()
    }

    fn head_of(&self, id: SddId) -> usize {
        match self.heads.get(&id) {
            Some(&h) => h,
            None => panic!("node {} has no circuit id yet", id),
        }
    }
}

/// Indicator literals in circuit id order: `+1..+n`, then `-n..-1`.
fn indicators(var_count: u32) -> impl Iterator<Item = i32> {
    let n = var_count as i32;
    (1..=n).chain((1..=n).rev().map(|v| -v))
}

/// Counting pass over `order`, which must be a [`positive_order`].
///
/// Fails on nodes the emission pass could not compile, so that emission
/// itself never fails.
///
/// Indicators cover every variable of the manager, not only those of the
/// root's vtree node, so `literal_count` starts at the manager's variable
/// count. The `nnf` header and the LMAP then describe the same literals even
/// for a root normalized below the vtree root.
pub fn count_nodes_edges(mgr: &SddManager, order: &[SddId]) -> Result<CircuitCounts, CompileError> {
    let n = mgr.var_count();
    let mut heads = HashMap::with_capacity(2 * n as usize + order.len());
    let mut node_count = 0;
    let mut edge_count = 0;
    let mut literal_count = n as usize;

    for lit in indicators(n) {
        heads.insert(mgr.literal(lit), node_count);
        node_count += 1;
    }

    for &id in order {
        let node = mgr.node(id);
        match &node.kind {
            Sdd::True { vtree: None } => return Err(CompileError::UnboundTrue(id)),
            Sdd::True { vtree: Some(_) } => {
                if node.theta.is_none() {
                    return Err(CompileError::MissingTheta(id));
                }
                node_count += 5;
                edge_count += 6;
                literal_count += 2;
            }
            Sdd::Decision { .. } => {
                if node.theta.is_none() {
                    return Err(CompileError::MissingTheta(id));
                }
                let k = mgr.positive_elements(id).len();
                node_count += 1 + 2 * k;
                edge_count += 4 * k;
                literal_count += k;
            }
            Sdd::False | Sdd::Literal(_) => continue,
        }
        heads.insert(id, node_count - 1);
    }

    debug!(
        "count_nodes_edges: {} nodes, {} edges, {} literals",
        node_count, edge_count, literal_count
    );
    Ok(CircuitCounts {
        node_count,
        edge_count,
        literal_count,
        heads,
    })
}

/// A single NNF line. Operands are circuit ids of earlier opcodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opcode {
    Literal(i64),
    Product(Vec<usize>),
    Sum(Vec<usize>),
}

impl Opcode {
    pub fn operands(&self) -> &[usize] {
        match self {
            Opcode::Literal(_) => &[],
            Opcode::Product(ids) | Opcode::Sum(ids) => ids,
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (tag, ids) = match self {
            Opcode::Literal(lit) => return write!(f, "l {}", lit),
            Opcode::Product(ids) => ('*', ids),
            Opcode::Sum(ids) => ('+', ids),
        };
        write!(f, "{} {}", tag, ids.len())?;
        for id in ids {
            write!(f, " {}", id)?;
        }
        Ok(())
    }
}

/// Flattened circuit with its parameter weights.
#[derive(Debug, Clone)]
pub struct ArithmeticCircuit {
    var_count: u32,
    ops: Vec<Opcode>,
    weights: WeightTable,
    literal_count: usize,
    root: Option<usize>,
}

impl ArithmeticCircuit {
    /// Compiles the PSDD rooted at `root`.
    pub fn compile(mgr: &SddManager, root: SddId) -> Result<Self, CompileError> {
        let order = positive_order(mgr, root);
        debug!("compile(root = {}, {} positive nodes)", root, order.len());
        let counts = count_nodes_edges(mgr, &order)?;

        let n = mgr.var_count();
        let mut ops = Vec::with_capacity(counts.node_count);
        let mut weights = WeightTable::new();
        let mut next_param = n as i64 + 1;

        for lit in indicators(n) {
            ops.push(Opcode::Literal(lit as i64));
        }

        for &id in &order {
            let node = mgr.node(id);
            let theta = match (&node.kind, &node.theta) {
                (Sdd::True { .. } | Sdd::Decision { .. }, Some(theta)) => theta,
                _ => continue,
            };
            match &node.kind {
                Sdd::True { vtree: Some(v) } => {
                    let var = match mgr.vtree().var(*v) {
                        Some(var) => var as i32,
                        None => panic!("TRUE node {} is bound to internal vtree {}", id, v),
                    };
                    let h = ops.len() + 4;
                    weights.set(next_param, theta.weight(0));
                    weights.set(next_param + 1, theta.weight(1));
                    ops.push(Opcode::Literal(next_param));
                    ops.push(Opcode::Literal(next_param + 1));
                    ops.push(Opcode::Product(vec![h - 4, counts.head_of(mgr.literal(-var))]));
                    ops.push(Opcode::Product(vec![h - 3, counts.head_of(mgr.literal(var))]));
                    ops.push(Opcode::Sum(vec![h - 2, h - 1]));
                    next_param += 2;
                }
                Sdd::Decision { .. } => {
                    let elements = mgr.positive_elements(id);
                    let mut products = Vec::with_capacity(elements.len());
                    for e in &elements {
                        let weight = match node.element_weight(e) {
                            Some(w) => w,
                            None => return Err(CompileError::MissingTheta(id)),
                        };
                        let param = ops.len();
                        weights.set(next_param, weight);
                        ops.push(Opcode::Literal(next_param));
                        ops.push(Opcode::Product(vec![
                            param,
                            counts.head_of(e.prime),
                            counts.head_of(e.sub),
                        ]));
                        products.push(param + 1);
                        next_param += 1;
                    }
                    ops.push(Opcode::Sum(products));
                }
                _ => unreachable!(),
            }
            trace!("{} => circuit id {}", id, ops.len() - 1);
            assert_eq!(Some(ops.len() - 1), counts.head(id), "head of {} diverged from the counting pass", id);
        }

        let circuit = Self {
            var_count: n,
            ops,
            weights,
            literal_count: (next_param - 1) as usize,
            root: if mgr.is_false_sdd(root) { None } else { counts.head(root) },
        };
        assert_eq!(circuit.node_count(), counts.node_count, "node count diverged from the counting pass");
        assert_eq!(circuit.edge_count(), counts.edge_count, "edge count diverged from the counting pass");
        assert_eq!(circuit.literal_count, counts.literal_count, "literal count diverged from the counting pass");
        debug!(
            "compiled {} nodes, {} edges, {} literals",
            circuit.node_count(),
            circuit.edge_count(),
            circuit.literal_count
        );
        Ok(circuit)
    }

    pub fn var_count(&self) -> u32 {
        self.var_count
    }

    pub fn ops(&self) -> &[Opcode] {
        &self.ops
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Circuit id of the root, `None` for an unsatisfiable PSDD.
    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.ops.len()
    }

    pub fn edge_count(&self) -> usize {
        self.ops.iter().map(|op| op.operands().len()).sum()
    }

    /// Indicators (one pair per manager variable) plus parameter literals.
    pub fn literal_count(&self) -> usize {
        self.literal_count
    }

    pub fn to_nnf_string(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        writeln!(out, "nnf {} {} {}", self.node_count(), self.edge_count(), self.literal_count)?;
        for op in &self.ops {
            writeln!(out, "{}", op)?;
        }
        Ok(out)
    }

    pub fn to_lmap_string(&self) -> Result<String, fmt::Error> {
        self.weights.to_lmap_string(self.var_count)
    }

    /// Writes the NNF circuit to `ac_path` and its literal map to `lmap_path`.
    pub fn save_ac<P: AsRef<Path>, Q: AsRef<Path>>(&self, ac_path: P, lmap_path: Q) -> Result<(), CompileError> {
        fs::write(ac_path, self.to_nnf_string()?)?;
        fs::write(lmap_path, self.to_lmap_string()?)?;
        Ok(())
    }

    /// Evaluates the circuit bottom-up.
    ///
    /// `evidence` holds observed literals; an indicator is 0 when the
    /// opposite literal is observed and 1 otherwise. Parameters take their
    /// weights from the table.
    pub fn evaluate(&self, evidence: &[i32]) -> f64 {
        let observed: HashSet<i64> = evidence.iter().map(|&lit| lit as i64).collect();
        let mut values = Vec::with_capacity(self.ops.len());
        for op in &self.ops {
            let value = match op {
                Opcode::Literal(lit) if lit.unsigned_abs() <= self.var_count as u64 => {
                    if observed.contains(&-lit) {
                        0.0
                    } else {
                        1.0
                    }
                }
                Opcode::Literal(lit) => self.weights.get(*lit),
                Opcode::Product(ids) => ids.iter().map(|&i| values[i]).product(),
                Opcode::Sum(ids) => ids.iter().map(|&i| values[i]).sum(),
            };
            values.push(value);
        }
        self.root.map_or(0.0, |r| values[r])
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::node::{Element, Theta};

    /// (x1 ∧ Pr(x2)) ∨ (¬x1 ∧ Pr'(x2)) with two TRUE nodes over x2.
    fn two_true(mgr: &SddManager) -> SddId {
        let ta = mgr.new_psdd_true(2, Theta::new(vec![0.3, 0.7]));
        let tb = mgr.new_psdd_true(2, Theta::new(vec![0.3, 0.7]));
        mgr.new_psdd_decision(
            vec![Element::new(mgr.literal(1), ta), Element::new(mgr.literal(-1), tb)],
            mgr.vtree().root(),
            Theta::new(vec![0.4, 0.6]),
        )
    }

    #[test]
    fn test_counts() {
        let mgr = SddManager::new(2);
        let root = two_true(&mgr);
        let counts = count_nodes_edges(&mgr, &positive_order(&mgr, root)).unwrap();
        assert_eq!(counts.node_count, 2 * 2 + 2 * 5 + (1 + 2 * 2));
        assert_eq!(counts.edge_count, 2 * 6 + 4 * 2);
        assert_eq!(counts.literal_count, 2 + 2 * 2 + 2);
        assert_eq!(counts.head(root), Some(counts.node_count - 1));
        assert_eq!(counts.head(mgr.literal(1)), Some(0));
        assert_eq!(counts.head(mgr.literal(-2)), Some(2));
        assert_eq!(counts.head(mgr.literal(-1)), Some(3));
    }

    #[test]
    fn test_emission_layout() {
        let mgr = SddManager::new(2);
        let root = two_true(&mgr);
        let ac = ArithmeticCircuit::compile(&mgr, root).unwrap();
        let nnf = ac.to_nnf_string().unwrap();
        let lines: Vec<&str> = nnf.lines().collect();
        assert_eq!(lines[0], "nnf 19 20 8");
        assert_eq!(&lines[1..5], ["l 1", "l 2", "l -2", "l -1"]);
        // First TRUE node, head 8.
        assert_eq!(&lines[5..10], ["l 3", "l 4", "* 2 4 2", "* 2 5 1", "+ 2 6 7"]);
        // Root: elements (x1, head 8) and (¬x1, head 13).
        assert_eq!(&lines[15..20], ["l 7", "* 3 14 0 8", "l 8", "* 3 16 3 13", "+ 2 15 17"]);
        assert_eq!(ac.root(), Some(18));
    }

    #[test]
    fn test_root_below_vtree_root() {
        let mgr = SddManager::new(4);
        let v = mgr.vtree();
        let left = v.left(v.root()).unwrap();
        let ta = mgr.new_psdd_true(2, Theta::bernoulli(0.2));
        let tb = mgr.new_psdd_true(2, Theta::bernoulli(0.9));
        let root = mgr.new_psdd_decision(
            vec![Element::new(mgr.literal(1), ta), Element::new(mgr.literal(-1), tb)],
            left,
            Theta::new(vec![0.5, 0.5]),
        );

        let ac = ArithmeticCircuit::compile(&mgr, root).unwrap();
        // x3 and x4 keep their indicators
        assert_eq!(ac.literal_count(), 4 + 2 * 2 + 2);
        assert_eq!(ac.to_nnf_string().unwrap().lines().next(), Some("nnf 23 20 10"));
        let lmap = ac.to_lmap_string().unwrap();
        assert!(lmap.contains("cc$I$4$"));
        assert!(lmap.contains("cc$I$-4$"));
    }

    #[test]
    fn test_weights_recorded() {
        let mgr = SddManager::new(2);
        let root = two_true(&mgr);
        let ac = ArithmeticCircuit::compile(&mgr, root).unwrap();
        let params: Vec<(i64, f64)> = ac.weights().iter().collect();
        assert_eq!(params, [(3, 0.3), (4, 0.7), (5, 0.3), (6, 0.7), (7, 0.4), (8, 0.6)]);
    }

    #[test]
    fn test_evaluate() {
        let mgr = SddManager::new(2);
        let root = two_true(&mgr);
        let ac = ArithmeticCircuit::compile(&mgr, root).unwrap();
        assert!((ac.evaluate(&[]) - 1.0).abs() < 1e-12);
        assert!((ac.evaluate(&[2]) - 0.7).abs() < 1e-12);
        assert!((ac.evaluate(&[1, -2]) - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_false_root() {
        let mgr = SddManager::new(2);
        let ac = ArithmeticCircuit::compile(&mgr, mgr.false_sdd()).unwrap();
        assert_eq!(ac.node_count(), 4);
        assert_eq!(ac.edge_count(), 0);
        assert_eq!(ac.root(), None);
        assert_eq!(ac.evaluate(&[]), 0.0);
    }

    #[test]
    fn test_errors() {
        let mgr = SddManager::new(2);
        let f = mgr.lookup_node(
            vec![Element::new(mgr.literal(1), mgr.literal(2)), Element::new(mgr.literal(-1), mgr.literal(-2))],
            mgr.vtree().root(),
        );
        assert!(matches!(
            ArithmeticCircuit::compile(&mgr, f),
            Err(CompileError::MissingTheta(id)) if id == f
        ));
        assert!(matches!(
            ArithmeticCircuit::compile(&mgr, mgr.true_sdd()),
            Err(CompileError::UnboundTrue(_))
        ));
    }
}
