//! File I/O for vtrees, SDDs and PSDDs.
//!
//! # Vtree File Format (.vtree)
//!
//! ```text
//! vtree <node_count>
//! L <id> <var>           # leaf node with variable
//! I <id> <left> <right>  # internal node with children
//! ```
//!
//! # SDD File Format (.sdd)
//!
//! ```text
//! sdd <node_count>
//! F <id>                          # false node
//! T <id>                          # true node
//! L <id> <vtree_id> <literal>     # literal node
//! D <id> <vtree_id> <size> {<prime> <sub>}*  # decomposition node
//! ```
//!
//! # PSDD File Format (.psdd)
//!
//! ```text
//! psdd <node_count>
//! L <id> <vtree_id> <literal>
//! T <id> <vtree_id> <var> <log Pr(var)>
//! D <id> <vtree_id> <size> {<prime> <sub> <log Pr(element)>}*
//! ```
//!
//! In every format nodes appear bottom-up (children before parents), ids are
//! file-local, the root is the last node, and lines starting with `c` are
//! comments. Vtree ids are in-order positions.

use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, trace};

use crate::error::IoError;
use crate::manager::SddManager;
use crate::node::{Element, Sdd, Theta};
use crate::reference::SddId;
use crate::traversal::Indexing;
use crate::types::VtreeId;
use crate::vtree::{Vtree, VtreeNode};

const VTREE_HEADER: &str = "\
c ids of vtree nodes start at 0
c ids of variables start at 1
c vtree nodes appear bottom-up, children before parents
c
c file syntax:
c vtree number-of-nodes-in-vtree
c L id-of-leaf-vtree-node id-of-variable
c I id-of-internal-vtree-node id-of-left-child id-of-right-child
c
";

const SDD_HEADER: &str = "\
c ids of sdd nodes start at 0
c sdd nodes appear bottom-up, children before parents
c
c file syntax:
c sdd count-of-sdd-nodes
c F id-of-false-sdd-node
c T id-of-true-sdd-node
c L id-of-literal-sdd-node id-of-vtree literal
c D id-of-decomposition-sdd-node id-of-vtree number-of-elements {id-of-prime id-of-sub}*
c
";

const PSDD_HEADER: &str = "\
c ids of psdd nodes start at 0
c psdd nodes appear bottom-up, children before parents
c
c file syntax:
c psdd count-of-sdd-nodes
c L id-of-literal-sdd-node id-of-vtree literal
c T id-of-trueNode-sdd-node id-of-vtree variable log(litProb)
c D id-of-decomposition-sdd-node id-of-vtree number-of-elements {id-of-prime id-of-sub log(elementProb)}*
c
";

// ─── Line handling ───

/// Non-comment, non-empty lines with their 1-based line numbers, split into fields.
fn records(content: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('c'))
        .map(|(n, line)| (n, line.split_whitespace().collect()))
}

fn field<T: FromStr>(parts: &[&str], i: usize, line: usize, what: &str) -> Result<T, IoError> {
    let raw = parts
        .get(i)
        .ok_or_else(|| IoError::parse(line, format!("missing {}", what)))?;
    raw.parse()
        .map_err(|_| IoError::parse(line, format!("invalid {}: {:?}", what, raw)))
}

fn expect_fields(parts: &[&str], count: usize, line: usize) -> Result<(), IoError> {
    if parts.len() != count {
        return Err(IoError::parse(
            line,
            format!("expected {} fields for '{}', found {}", count, parts[0], parts.len()),
        ));
    }
    Ok(())
}

/// Parses the `<tag> <count>` header line.
///
/// Every node takes a line of its own, so a count above `max_nodes` cannot
/// be satisfied and is rejected before anything is allocated.
fn header<'a>(
    records: &mut impl Iterator<Item = (usize, Vec<&'a str>)>,
    tags: &[&str],
    max_nodes: usize,
) -> Result<usize, IoError> {
    let (line, parts) = records.next().ok_or(IoError::Empty)?;
    if parts.len() != 2 || !tags.contains(&parts[0]) {
        return Err(IoError::parse(line, format!("invalid header, expected '{} <count>'", tags.join("|"))));
    }
    let declared: usize = field(&parts, 1, line, "node count")?;
    if declared > max_nodes {
        return Err(IoError::parse(
            line,
            format!("node count {} exceeds the {} lines of input", declared, max_nodes),
        ));
    }
    Ok(declared)
}

/// Number of fields of a `D` line with `size` elements of `width` fields each.
fn decision_fields(size: usize, width: usize, line: usize) -> Result<usize, IoError> {
    size.checked_mul(width)
        .and_then(|x| x.checked_add(4))
        .ok_or_else(|| IoError::parse(line, format!("element count {} is too large", size)))
}

/// Nodes constructed so far, indexed by file-local id.
struct NodeTable<T> {
    slots: Vec<Option<T>>,
    found: usize,
    last: Option<T>,
}

impl<T: Copy> NodeTable<T> {
    fn new(declared: usize) -> Self {
        Self {
            slots: vec![None; declared],
            found: 0,
            last: None,
        }
    }

    fn get(&self, line: usize, id: u32) -> Result<T, IoError> {
        self.slots
            .get(id as usize)
            .copied()
            .flatten()
            .ok_or(IoError::Reference { line, id })
    }

    fn set(&mut self, line: usize, id: u32, node: T) -> Result<(), IoError> {
        let declared = self.slots.len();
        let slot = self
            .slots
            .get_mut(id as usize)
            .ok_or_else(|| IoError::parse(line, format!("id {} out of range for {} nodes", id, declared)))?;
        if slot.is_some() {
            return Err(IoError::parse(line, format!("duplicate id {}", id)));
        }
        *slot = Some(node);
        self.found += 1;
        self.last = Some(node);
        Ok(())
    }

    /// Returns the last node, checking the declared count.
    fn finish(self) -> Result<T, IoError> {
        if self.found != self.slots.len() {
            return Err(IoError::CountMismatch {
                declared: self.slots.len(),
                found: self.found,
            });
        }
        self.last.ok_or(IoError::Empty)
    }
}

// ─── Vtree I/O ───

impl Vtree {
    /// Saves the vtree to a file in libsdd format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        fs::write(path, self.to_vtree_string()?)?;
        Ok(())
    }

    /// Converts the vtree to libsdd format string.
    pub fn to_vtree_string(&self) -> Result<String, IoError> {
        let mut output = String::from(VTREE_HEADER);
        writeln!(output, "vtree {}", self.num_nodes())?;

        // Post-order: children before parents.
        let mut stack = vec![(self.root(), false)];
        while let Some((id, expanded)) = stack.pop() {
            match self.node(id) {
                VtreeNode::Leaf { var } => writeln!(output, "L {} {}", id.raw(), var)?,
                VtreeNode::Internal { left, right } => {
                    if expanded {
                        writeln!(output, "I {} {} {}", id.raw(), left.raw(), right.raw())?;
                    } else {
                        stack.push((id, true));
                        stack.push((right, false));
                        stack.push((left, false));
                    }
                }
            }
        }

        Ok(output)
    }

    /// Reads a vtree from a file in libsdd format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let content = fs::read_to_string(path)?;
        Self::from_vtree_string(&content)
    }

    /// Parses a vtree from libsdd format string.
    pub fn from_vtree_string(content: &str) -> Result<Self, IoError> {
        let mut records = records(content);
        let declared = header(&mut records, &["vtree"], content.lines().count())?;
        let mut table: NodeTable<VtreeId> = NodeTable::new(declared);
        let mut nodes: Vec<Option<VtreeNode>> = vec![None; declared];
        let mut last_line = 0;

        for (line, parts) in records {
            last_line = line;
            let id: u32 = field(&parts, 1, line, "id")?;
            let node = match parts[0] {
                "L" => {
                    expect_fields(&parts, 3, line)?;
                    VtreeNode::Leaf {
                        var: field(&parts, 2, line, "variable")?,
                    }
                }
                "I" => {
                    expect_fields(&parts, 4, line)?;
                    let left = table.get(line, field(&parts, 2, line, "left child")?)?;
                    let right = table.get(line, field(&parts, 3, line, "right child")?)?;
                    VtreeNode::Internal { left, right }
                }
                other => return Err(IoError::parse(line, format!("unknown node type: {}", other))),
            };
            table.set(line, id, VtreeId::new(id))?;
            nodes[id as usize] = Some(node);
        }

        let root = table.finish()?;
        // `finish` guarantees every slot is filled.
        let nodes = nodes.into_iter().flatten().collect();
        Vtree::from_nodes(nodes, root).map_err(|msg| IoError::parse(last_line, msg))
    }
}

// ─── SDD I/O ───

impl SddManager {
    /// Saves an SDD to a file in libsdd format.
    pub fn save_sdd<P: AsRef<Path>>(&self, root: SddId, path: P) -> Result<(), IoError> {
        fs::write(path, self.sdd_to_string(root)?)?;
        Ok(())
    }

    /// Converts an SDD to libsdd format string.
    ///
    /// Node ids are the post-order indices of [`Indexing`], so every line
    /// only references lines above it.
    pub fn sdd_to_string(&self, root: SddId) -> Result<String, IoError> {
        let indexing = Indexing::new(self, root);
        let index = |id: SddId| indexing.index_of(id).expect("children are indexed");

        let mut output = String::from(SDD_HEADER);
        writeln!(output, "sdd {}", indexing.len())?;
        for (i, id) in indexing.iter().enumerate() {
            match self.kind(id) {
                Sdd::False => writeln!(output, "F {}", i)?,
                Sdd::True { .. } => writeln!(output, "T {}", i)?,
                Sdd::Literal(lit) => {
                    let vtree = self.vtree().var_vtree(lit.var());
                    writeln!(output, "L {} {} {}", i, vtree.raw(), lit.get())?;
                }
                Sdd::Decision { vtree, elements } => {
                    write!(output, "D {} {} {}", i, vtree.raw(), elements.len())?;
                    for e in &elements {
                        write!(output, " {} {}", index(e.prime), index(e.sub))?;
                    }
                    writeln!(output)?;
                }
            }
        }

        Ok(output)
    }

    /// Loads an SDD from a file in libsdd format.
    ///
    /// Note: The manager must have been created with a compatible vtree.
    pub fn load_sdd<P: AsRef<Path>>(&self, path: P) -> Result<SddId, IoError> {
        let content = fs::read_to_string(path)?;
        self.sdd_from_string(&content)
    }

    /// Parses an SDD from libsdd format string.
    ///
    /// Constants resolve to the manager's singletons, literals to its literal
    /// table, and decomposition nodes go through [`SddManager::lookup_node`].
    pub fn sdd_from_string(&self, content: &str) -> Result<SddId, IoError> {
        let mut records = records(content);
        let declared = header(&mut records, &["sdd"], content.lines().count())?;
        debug!("sdd_from_string: {} nodes declared", declared);
        let mut table = NodeTable::new(declared);

        for (line, parts) in records {
            let id: u32 = field(&parts, 1, line, "id")?;
            let node = match parts[0] {
                "F" => {
                    expect_fields(&parts, 2, line)?;
                    self.false_sdd()
                }
                "T" => {
                    expect_fields(&parts, 2, line)?;
                    self.true_sdd()
                }
                "L" => {
                    expect_fields(&parts, 4, line)?;
                    self.read_literal(&parts, line, id)?
                }
                "D" => {
                    let vtree = self.read_decision_vtree(&parts, line)?;
                    let size: usize = field(&parts, 3, line, "size")?;
                    expect_fields(&parts, decision_fields(size, 2, line)?, line)?;
                    let mut elements = Vec::with_capacity(size);
                    for i in 0..size {
                        let prime = table.get(line, field(&parts, 4 + 2 * i, line, "prime id")?)?;
                        let sub = table.get(line, field(&parts, 5 + 2 * i, line, "sub id")?)?;
                        elements.push(Element::new(prime, sub));
                    }
                    if !self.is_normalized(&elements, vtree) {
                        return Err(IoError::VtreeMismatch { line, id });
                    }
                    self.lookup_node(elements, vtree)
                }
                other => return Err(IoError::parse(line, format!("unknown node type: {}", other))),
            };
            trace!("line {}: node {} => {}", line, id, node);
            table.set(line, id, node)?;
        }

        let root = table.finish()?;
        debug!("sdd_from_string: root = {}", root);
        Ok(root)
    }

    /// Resolves an `L` line; its vtree field must be the variable's leaf.
    fn read_literal(&self, parts: &[&str], line: usize, id: u32) -> Result<SddId, IoError> {
        let lit: i32 = field(parts, 3, line, "literal")?;
        let node = self
            .get_literal(lit)
            .ok_or_else(|| IoError::parse(line, format!("literal {} is not in the vtree", lit)))?;
        let position: u32 = field(parts, 2, line, "vtree id")?;
        if self.vtree().var_vtree(lit.unsigned_abs()).raw() != position {
            return Err(IoError::VtreeMismatch { line, id });
        }
        Ok(node)
    }

    fn read_decision_vtree(&self, parts: &[&str], line: usize) -> Result<VtreeId, IoError> {
        let position: u32 = field(parts, 2, line, "vtree id")?;
        match self.vtree().get(position) {
            Some(v) if !self.vtree().is_leaf(v) => Ok(v),
            Some(_) => Err(IoError::parse(line, format!("vtree node {} is a leaf", position))),
            None => Err(IoError::parse(line, format!("unknown vtree node {}", position))),
        }
    }

    /// Primes lie under `vtree.left` and subs under `vtree.right`; unbound
    /// constants fit anywhere.
    fn is_normalized(&self, elements: &[Element], vtree: VtreeId) -> bool {
        let v = self.vtree();
        let (left, right) = match (v.left(vtree), v.right(vtree)) {
            (Some(l), Some(r)) => (l, r),
            _ => return false,
        };
        let fits = |id: SddId, side: VtreeId| self.vtree_of(id).map_or(true, |w| v.is_under(w, side));
        elements.iter().all(|e| fits(e.prime, left) && fits(e.sub, right))
    }
}

// ─── PSDD I/O ───

impl SddManager {
    /// Saves a PSDD to a file.
    pub fn save_psdd<P: AsRef<Path>>(&self, root: SddId, path: P) -> Result<(), IoError> {
        fs::write(path, self.psdd_to_string(root)?)?;
        Ok(())
    }

    /// Converts a PSDD to its text format.
    ///
    /// Weights are written as natural logs of the normalized weights. Every
    /// TRUE and decomposition node must carry weights.
    pub fn psdd_to_string(&self, root: SddId) -> Result<String, IoError> {
        let indexing = Indexing::new(self, root);
        let index = |id: SddId| indexing.index_of(id).expect("children are indexed");

        let mut output = String::from(PSDD_HEADER);
        writeln!(output, "psdd {}", indexing.len())?;
        for (i, id) in indexing.iter().enumerate() {
            let node = self.node(id);
            match &node.kind {
                Sdd::False => writeln!(output, "F {}", i)?,
                Sdd::True { vtree } => {
                    let (vtree, theta) = match (vtree, &node.theta) {
                        (Some(vtree), Some(theta)) => (*vtree, theta),
                        _ => return Err(IoError::MissingTheta(id)),
                    };
                    let var = self.vtree().var(vtree).expect("TRUE nodes are bound to leaves");
                    writeln!(output, "T {} {} {} {}", i, vtree.raw(), var, theta.normalized(1).ln())?;
                }
                Sdd::Literal(lit) => {
                    let vtree = self.vtree().var_vtree(lit.var());
                    writeln!(output, "L {} {} {}", i, vtree.raw(), lit.get())?;
                }
                Sdd::Decision { vtree, elements } => {
                    let theta = node.theta.as_ref().ok_or(IoError::MissingTheta(id))?;
                    write!(output, "D {} {} {}", i, vtree.raw(), elements.len())?;
                    for (k, e) in elements.iter().enumerate() {
                        write!(output, " {} {} {}", index(e.prime), index(e.sub), theta.normalized(k).ln())?;
                    }
                    writeln!(output)?;
                }
            }
        }

        Ok(output)
    }

    /// Loads a PSDD from a file.
    pub fn load_psdd<P: AsRef<Path>>(&self, path: P) -> Result<SddId, IoError> {
        let content = fs::read_to_string(path)?;
        self.psdd_from_string(&content)
    }

    /// Parses a PSDD from its text format.
    ///
    /// TRUE and decomposition lines create fresh weighted nodes; literal lines
    /// resolve to the manager's literal table. All elements of a
    /// decomposition must be normalized for the declared vtree node: every
    /// bound prime sits at its left child and every bound sub at its right
    /// child.
    ///
    /// Both the `psdd` header and the `sdd` header of the weighted SDD
    /// variant are accepted; the line grammar is the same.
    pub fn psdd_from_string(&self, content: &str) -> Result<SddId, IoError> {
        let mut records = records(content);
        let declared = header(&mut records, &["psdd", "sdd"], content.lines().count())?;
        debug!("psdd_from_string: {} nodes declared", declared);
        let mut table = NodeTable::new(declared);

        for (line, parts) in records {
            let id: u32 = field(&parts, 1, line, "id")?;
            let node = match parts[0] {
                "F" => {
                    expect_fields(&parts, 2, line)?;
                    self.false_sdd()
                }
                "L" => {
                    expect_fields(&parts, 4, line)?;
                    self.read_literal(&parts, line, id)?
                }
                "T" => {
                    expect_fields(&parts, 5, line)?;
                    let position: u32 = field(&parts, 2, line, "vtree id")?;
                    let var: u32 = field(&parts, 3, line, "variable")?;
                    let log_p = read_log_probability(&parts, 4, line)?;
                    if var == 0 || var > self.var_count() {
                        return Err(IoError::parse(line, format!("variable {} is not in the vtree", var)));
                    }
                    if self.vtree().var_vtree(var).raw() != position {
                        return Err(IoError::VtreeMismatch { line, id });
                    }
                    let p = log_p.exp();
                    self.new_psdd_true(var, Theta::new(vec![1.0 - p, p]))
                }
                "D" => {
                    let vtree = self.read_decision_vtree(&parts, line)?;
                    let size: usize = field(&parts, 3, line, "size")?;
                    expect_fields(&parts, decision_fields(size, 3, line)?, line)?;
                    let mut elements = Vec::with_capacity(size);
                    let mut weights = Vec::with_capacity(size);
                    for i in 0..size {
                        let prime = table.get(line, field(&parts, 4 + 3 * i, line, "prime id")?)?;
                        let sub = table.get(line, field(&parts, 5 + 3 * i, line, "sub id")?)?;
                        weights.push(read_log_probability(&parts, 6 + 3 * i, line)?.exp());
                        elements.push(Element::new(prime, sub));
                    }
                    if !self.is_psdd_normalized(&elements, vtree) {
                        return Err(IoError::VtreeMismatch { line, id });
                    }
                    self.new_psdd_decision(elements, vtree, Theta::new(weights))
                }
                other => return Err(IoError::parse(line, format!("unknown node type: {}", other))),
            };
            trace!("line {}: node {} => {}", line, id, node);
            table.set(line, id, node)?;
        }

        let root = table.finish()?;
        debug!("psdd_from_string: root = {}", root);
        Ok(root)
    }

    /// Bound primes are normalized for `vtree.left`, bound subs for `vtree.right`.
    fn is_psdd_normalized(&self, elements: &[Element], vtree: VtreeId) -> bool {
        let v = self.vtree();
        let (left, right) = match (v.left(vtree), v.right(vtree)) {
            (Some(l), Some(r)) => (l, r),
            _ => return false,
        };
        let at = |id: SddId, side: VtreeId| self.vtree_of(id).map_or(true, |w| w == side);
        elements.iter().all(|e| at(e.prime, left) && at(e.sub, right))
    }
}

fn read_log_probability(parts: &[&str], i: usize, line: usize) -> Result<f64, IoError> {
    let log_p: f64 = field(parts, i, line, "log-probability")?;
    if log_p.is_nan() || log_p > 0.0 {
        return Err(IoError::parse(line, format!("log-probability {} is positive", log_p)));
    }
    Ok(log_p)
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use test_log::test;

    use super::*;

    #[test]
    fn test_vtree_roundtrip() {
        let vtree = Vtree::balanced(4);
        let s = vtree.to_vtree_string().unwrap();
        let vtree2 = Vtree::from_vtree_string(&s).unwrap();

        assert_eq!(vtree.num_vars(), vtree2.num_vars());
        assert_eq!(vtree.num_nodes(), vtree2.num_nodes());
        assert_eq!(vtree.root(), vtree2.root());
        for id in vtree.ids() {
            assert_eq!(vtree.node(id), vtree2.node(id));
        }
    }

    #[test]
    fn test_vtree_forward_reference() {
        let s = "vtree 3\nI 1 0 2\nL 0 1\nL 2 2\n";
        assert!(matches!(
            Vtree::from_vtree_string(s),
            Err(IoError::Reference { line: 2, id: 0 })
        ));
    }

    #[test]
    fn test_single_true() {
        let mgr = SddManager::new(2);
        let f = mgr.sdd_from_string("sdd 1\nT 0\n").unwrap();
        assert_eq!(f, mgr.true_sdd());
    }

    #[test]
    fn test_literal_resolves_to_table() {
        let mgr = SddManager::new(2);
        let f = mgr.sdd_from_string("c comment\nsdd 1\nL 0 2 -2\n").unwrap();
        assert_eq!(f, mgr.literal(-2));
    }

    #[test]
    fn test_sdd_roundtrip() {
        let mgr = SddManager::new(2);
        let root = mgr.vtree().root();
        let f = mgr.lookup_node(
            vec![
                Element::new(mgr.literal(1), mgr.literal(2)),
                Element::new(mgr.literal(-1), mgr.false_sdd()),
            ],
            root,
        );

        let s = mgr.sdd_to_string(f).unwrap();
        let f2 = mgr.sdd_from_string(&s).unwrap();

        // Hash-consing returns the very same node.
        assert_eq!(f, f2);
        assert_eq!(mgr.model_count(f), mgr.model_count(f2));
    }

    #[test]
    fn test_dangling_reference() {
        let mgr = SddManager::new(2);
        let s = "sdd 3\nL 0 0 1\nD 2 1 1 0 1\nL 1 2 2\n";
        assert!(matches!(mgr.sdd_from_string(s), Err(IoError::Reference { line: 3, id: 1 })));
    }

    #[test]
    fn test_count_mismatch() {
        let mgr = SddManager::new(2);
        assert!(matches!(
            mgr.sdd_from_string("sdd 2\nT 0\n"),
            Err(IoError::CountMismatch { declared: 2, found: 1 })
        ));
        assert!(matches!(mgr.sdd_from_string("sdd 1\nT 0\nF 1\n"), Err(IoError::Parse { line: 3, .. })));
    }

    #[test]
    fn test_parse_errors() {
        let mgr = SddManager::new(2);
        assert!(matches!(mgr.sdd_from_string(""), Err(IoError::Empty)));
        assert!(matches!(mgr.sdd_from_string("psdd 1\nT 0\n"), Err(IoError::Parse { line: 1, .. })));
        assert!(matches!(mgr.sdd_from_string("sdd 1\nX 0\n"), Err(IoError::Parse { line: 2, .. })));
        assert!(matches!(mgr.sdd_from_string("sdd 1\nT 0 5\n"), Err(IoError::Parse { line: 2, .. })));
        assert!(matches!(mgr.sdd_from_string("sdd 1\nL 0 0 3\n"), Err(IoError::Parse { line: 2, .. })));
        // element count says 2, one pair present
        let s = "sdd 3\nL 0 0 1\nL 1 2 2\nD 2 1 2 0 1\n";
        assert!(matches!(mgr.sdd_from_string(s), Err(IoError::Parse { line: 4, .. })));
    }

    #[test]
    fn test_element_count_overflow() {
        let mgr = SddManager::new(2);
        let huge = usize::MAX / 2 + 1;
        let s = format!("sdd 1\nD 0 1 {}\n", huge);
        assert!(matches!(mgr.sdd_from_string(&s), Err(IoError::Parse { line: 2, .. })));
        let s = format!("psdd 1\nD 0 1 {}\n", usize::MAX / 3 + 1);
        assert!(matches!(mgr.psdd_from_string(&s), Err(IoError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_node_count_too_large() {
        let mgr = SddManager::new(2);
        let s = format!("sdd {}\nT 0\n", usize::MAX);
        assert!(matches!(mgr.sdd_from_string(&s), Err(IoError::Parse { line: 1, .. })));
        let s = format!("psdd {}\nT 0 0 1 0\n", usize::MAX);
        assert!(matches!(mgr.psdd_from_string(&s), Err(IoError::Parse { line: 1, .. })));
        let s = format!("vtree {}\nL 0 1\n", u32::MAX);
        assert!(matches!(Vtree::from_vtree_string(&s), Err(IoError::Parse { line: 1, .. })));
        // three lines cannot hold five nodes
        assert!(matches!(mgr.sdd_from_string("sdd 5\nT 0\nF 1\n"), Err(IoError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_literal_vtree_field() {
        let mgr = SddManager::new(2);
        assert!(matches!(mgr.sdd_from_string("sdd 1\nL 0 garbage 1\n"), Err(IoError::Parse { line: 2, .. })));
        // x1 is the leaf at position 0
        assert!(matches!(
            mgr.sdd_from_string("sdd 1\nL 0 2 1\n"),
            Err(IoError::VtreeMismatch { line: 2, id: 0 })
        ));
        assert!(matches!(
            mgr.psdd_from_string("psdd 1\nL 0 1 -2\n"),
            Err(IoError::VtreeMismatch { line: 2, id: 0 })
        ));
        assert_eq!(mgr.psdd_from_string("psdd 1\nL 0 2 -2\n").unwrap(), mgr.literal(-2));
    }

    #[test]
    fn test_sdd_vtree_mismatch() {
        let mgr = SddManager::new(2);
        // prime x2 lives under the right child of v1
        let s = "sdd 3\nL 0 2 2\nL 1 0 1\nD 2 1 1 0 1\n";
        assert!(matches!(mgr.sdd_from_string(s), Err(IoError::VtreeMismatch { line: 4, id: 2 })));
    }

    #[test]
    fn test_psdd_read() {
        let mgr = SddManager::new(2);
        let s = format!(
            "psdd 3\nT 0 0 1 {}\nT 1 2 2 {}\nD 2 1 1 0 1 0\n",
            0.7f64.ln(),
            0.4f64.ln()
        );
        let f = mgr.psdd_from_string(&s).unwrap();
        let node = mgr.node(f);
        assert!(node.is_decision());
        assert_eq!(node.theta.as_ref().unwrap().sum(), 1.0);

        let t = mgr.node(node.elements()[0].prime);
        let theta = t.theta.unwrap();
        assert!((theta.weight(0) - 0.3).abs() < 1e-9);
        assert!((theta.weight(1) - 0.7).abs() < 1e-9);
        assert!((theta.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_psdd_sdd_header() {
        let mgr = SddManager::new(2);
        let s = "sdd 4\nF 0\nL 1 0 1\nL 2 2 2\nD 3 1 1 1 2 0\n";
        let f = mgr.psdd_from_string(s).unwrap();
        assert_eq!(mgr.elements(f), [Element::new(mgr.literal(1), mgr.literal(2))]);
        assert_eq!(mgr.theta(f).unwrap().weights(), [1.0]);
    }

    #[test]
    fn test_psdd_vtree_mismatch() {
        let mgr = SddManager::new(4);
        // x1 has parent v1, x3 has parent v5
        let s = "psdd 3\nL 0 0 1\nL 1 4 3\nD 2 1 1 0 1 0\n";
        assert!(matches!(mgr.psdd_from_string(s), Err(IoError::VtreeMismatch { line: 4, id: 2 })));
    }

    #[test]
    fn test_psdd_swapped_element() {
        // x1 at 0, root 1, x2 at 2, v3 over x2 and x3, x3 at 4
        let mgr = SddManager::with_vtree(Vtree::right_linear(3));
        let below = "psdd 5\nL 0 2 2\nL 1 4 3\nD 2 3 1 0 1 0\nL 3 0 1\n";

        // both children of v1, but the v3 node is the prime and x1 the sub
        let swapped = format!("{}D 4 1 1 2 3 0\n", below);
        assert!(matches!(
            mgr.psdd_from_string(&swapped),
            Err(IoError::VtreeMismatch { line: 6, id: 4 })
        ));

        let f = mgr.psdd_from_string(&format!("{}D 4 1 1 3 2 0\n", below)).unwrap();
        assert_eq!(mgr.model_count(f), BigUint::from(1u32));
    }

    #[test]
    fn test_psdd_rejects_positive_log() {
        let mgr = SddManager::new(2);
        assert!(matches!(mgr.psdd_from_string("psdd 1\nT 0 0 1 0.5\n"), Err(IoError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_psdd_missing_theta() {
        let mgr = SddManager::new(2);
        let root = mgr.vtree().root();
        let f = mgr.lookup_node(vec![Element::new(mgr.literal(1), mgr.literal(2))], root);
        assert!(matches!(mgr.psdd_to_string(f), Err(IoError::MissingTheta(id)) if id == f));
    }
}
