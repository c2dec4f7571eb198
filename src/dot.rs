//! Graphviz DOT export for SDDs, PSDDs and vtrees.
//!
//! Every decomposition node becomes a small gray circle labelled with its
//! vtree id. Each of its elements becomes a two-cell HTML table: the prime is
//! in the left port and the sub in the right port. Terminals and literals are
//! inlined into these cells. A decomposition child gets a dotted-tail edge
//! from its cell instead. Nodes are named by their post-order index, and the
//! root is emitted first. Names, including that of a terminal root box, come
//! from this post-order and not from a pre-order numbering.
//!
//! The PSDD variant also labels the edges with normalized element weights and
//! the TRUE cells with the probability of their variable. Given a
//! [`SubCircuit`], it paints the selected node and element of every vtree
//! node with the highlight color.
//!
//! ```rust
//! use psdd_rs::SddManager;
//!
//! let mgr = SddManager::new(2);
//! let dot = mgr.sdd_to_dot(mgr.literal(-2)).unwrap();
//! assert!(dot.contains("&not;<I>B</I>"));
//! // Render with: dot -Tpdf sdd.dot -o sdd.pdf
//! ```

use std::collections::HashMap;
use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::IoError;
use crate::manager::SddManager;
use crate::node::{Element, Sdd};
use crate::reference::SddId;
use crate::traversal::Indexing;
use crate::types::{Literal, VtreeId};
use crate::vtree::VtreeNode;

/// Configuration for DOT export.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Variable names by index; variables past the end are printed as numbers.
    pub labels: &'static str,
    /// Color of the sub-circuit's nodes and elements (default: "red").
    pub highlight_color: &'static str,
    /// Color of everything else (default: "black").
    pub base_color: &'static str,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            labels: "0ABCDEFGHIJKLMNOPQRSTUVWXYZ",
            highlight_color: "red",
            base_color: "black",
        }
    }
}

/// What a sub-circuit selects at a PSDD node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Choice {
    /// One element of a decomposition node.
    Element(Element),
    /// One value of the variable of a TRUE node.
    Value(bool),
}

/// A selected path through a PSDD: at most one node per vtree node.
#[derive(Debug, Clone, Default)]
pub struct SubCircuit {
    nodes: HashMap<VtreeId, (SddId, Choice)>,
}

impl SubCircuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `node` with `choice` at `vtree`, replacing any earlier selection.
    pub fn insert(&mut self, vtree: VtreeId, node: SddId, choice: Choice) {
        self.nodes.insert(vtree, (node, choice));
    }

    pub fn node_of_vtree(&self, vtree: VtreeId) -> Option<(SddId, Choice)> {
        self.nodes.get(&vtree).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn write_element_table(
    dot: &mut String,
    node: usize,
    i: usize,
    color: Option<&str>,
    left: &str,
    right: &str,
) -> fmt::Result {
    let color = color.map(|c| format!(" COLOR=\"{}\"", c)).unwrap_or_default();
    write!(
        dot,
        "\nn{}e{}\n[label=<\n<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"0\" PORT=\"T\"{}>\n\
         <TR>\n<TD PORT=\"L\">{}</TD>\n<TD PORT=\"R\">{}</TD>\n</TR>\n</TABLE>\n>,\n\
         shape=none,margin=0,fillcolor=white,style=filled,\nfontsize=20,fontname=\"Times\",\n];\n",
        node, i, color, left, right
    )
}

fn literal_label(lit: Literal, config: &DotConfig) -> String {
    let var = lit.var() as usize;
    let neg = if lit.is_negative() { "&not;" } else { "" };
    match config.labels.chars().nth(var) {
        Some(c) => format!("{}<I>{}</I>", neg, c),
        None => format!("{}<I>{}</I>", neg, var),
    }
}

impl SddManager {
    fn node_label(&self, id: SddId, config: &DotConfig) -> String {
        match self.kind(id) {
            Sdd::False => "&#8869;".to_string(),
            Sdd::True { .. } => "&#8868;".to_string(),
            Sdd::Literal(lit) => literal_label(lit, config),
            Sdd::Decision { .. } => "   ".to_string(),
        }
    }

    /// Cell label of a PSDD child: TRUE nodes show `var:probability`.
    fn psdd_node_label(&self, id: SddId, sub: Option<&SubCircuit>, config: &DotConfig) -> String {
        let node = self.node(id);
        let (vtree, var) = match node.kind {
            Sdd::True { vtree: Some(v) } => match self.vtree().var(v) {
                Some(var) => (v, var),
                None => return self.node_label(id, config),
            },
            _ => return self.node_label(id, config),
        };
        let label = literal_label(Literal::positive(var), config);

        let chosen = sub
            .and_then(|sc| sc.node_of_vtree(vtree))
            .filter(|&(n, _)| n == id)
            .map(|(_, choice)| choice);
        match (chosen, &node.theta) {
            (Some(Choice::Value(value)), theta) => {
                let p = theta.as_ref().map_or(".".to_string(), |t| format!("{:.2}", t.normalized(value as usize)));
                if value {
                    format!("{}:{}", label, p)
                } else {
                    format!("&not;{}:{}", label, p)
                }
            }
            (_, Some(theta)) => format!("{}:{:.2}", label, theta.normalized(1)),
            (_, None) => format!("{}:.", label),
        }
    }

    /// Exports an SDD to Graphviz DOT format.
    pub fn sdd_to_dot(&self, root: SddId) -> Result<String, fmt::Error> {
        self.sdd_to_dot_with_config(root, &DotConfig::default())
    }

    pub fn sdd_to_dot_with_config(&self, root: SddId, config: &DotConfig) -> Result<String, fmt::Error> {
        let indexing = Indexing::new(self, root);
        let index = |id: SddId| indexing.index_of(id).expect("reachable nodes are indexed");
        debug!("sdd_to_dot(root = {}, {} nodes)", root, indexing.len());

        let mut dot = String::new();
        writeln!(dot, "digraph sdd {{")?;
        writeln!(dot, "overlap=false")?;
        if !self.is_decision(root) {
            write!(dot, "\nn{} [label=\"{}\",shape=box];", index(root), self.node_label(root, config))?;
        }

        for id in indexing.iter().rev() {
            let (vtree, elements) = match self.kind(id) {
                Sdd::Decision { vtree, elements } => (vtree, elements),
                _ => continue,
            };
            let n = index(id);
            write!(
                dot,
                "\nn{} [label=\"{}\",style=filled,fillcolor=gray95,shape=circle,fixedsize=true,height=.5,width=.5];",
                n,
                vtree.raw()
            )?;
            for (i, e) in elements.iter().enumerate() {
                let (left, right) = (self.node_label(e.prime, config), self.node_label(e.sub, config));
                write_element_table(&mut dot, n, i, None, &left, &right)?;
                write!(dot, "\nn{}->n{}e{}:T [arrowsize=.50];", n, n, i)?;
                for (port, child) in [("L", e.prime), ("R", e.sub)] {
                    if self.is_decision(child) {
                        write!(
                            dot,
                            "\nn{}e{}:{}:c->n{} [arrowsize=.50,tailclip=false,arrowtail=dot,dir=both];",
                            n,
                            i,
                            port,
                            index(child)
                        )?;
                    }
                }
            }
        }

        write!(dot, "\n\n\n}}\n")?;
        Ok(dot)
    }

    /// Exports a PSDD to Graphviz DOT format, highlighting `sub` if given.
    ///
    /// Nodes without weights get unlabelled edges.
    pub fn psdd_to_dot(&self, root: SddId, sub: Option<&SubCircuit>) -> Result<String, fmt::Error> {
        self.psdd_to_dot_with_config(root, sub, &DotConfig::default())
    }

    pub fn psdd_to_dot_with_config(
        &self,
        root: SddId,
        sub: Option<&SubCircuit>,
        config: &DotConfig,
    ) -> Result<String, fmt::Error> {
        let indexing = Indexing::new(self, root);
        let index = |id: SddId| indexing.index_of(id).expect("reachable nodes are indexed");
        debug!(
            "psdd_to_dot(root = {}, {} nodes, sub-circuit of {})",
            root,
            indexing.len(),
            sub.map_or(0, |sc| sc.len())
        );

        let mut dot = String::new();
        writeln!(dot, "digraph sdd {{")?;
        writeln!(dot, "overlap=false")?;
        if !self.is_decision(root) {
            write!(dot, "\nn{} [label=\"{}\",shape=box];", index(root), self.node_label(root, config))?;
        }

        for id in indexing.iter().rev() {
            let node = self.node(id);
            let (vtree, elements) = match &node.kind {
                Sdd::Decision { vtree, elements } => (*vtree, elements),
                _ => continue,
            };
            let n = index(id);
            let selected = sub
                .and_then(|sc| sc.node_of_vtree(vtree))
                .filter(|&(sel, _)| sel == id)
                .map(|(_, choice)| choice);
            let color = |on: bool| if on { config.highlight_color } else { config.base_color };

            write!(
                dot,
                "\nn{} [label=\"{}\",style=filled,fillcolor=gray95,shape=circle,fixedsize=true,height=.5,width=.5,color={},xlabel=\"\"];",
                n,
                vtree.raw(),
                color(selected.is_some())
            )?;
            let is_false = self.is_false_sdd(id);
            for (i, e) in elements.iter().enumerate() {
                let el_color = color(selected == Some(Choice::Element(*e)));
                let left = self.psdd_node_label(e.prime, sub, config);
                let right = self.psdd_node_label(e.sub, sub, config);
                let edge_label = match node.theta.as_ref().and_then(|t| t.weights().get(i).map(|&w| (w, t.sum()))) {
                    Some(_) if is_false => String::new(),
                    Some((w, sum)) if w == sum => "1".to_string(),
                    Some((w, sum)) => format!("{:.2}", w / sum),
                    None => String::new(),
                };

                write_element_table(&mut dot, n, i, Some(el_color), &left, &right)?;
                write!(dot, "\nn{}->n{}e{}:T [arrowsize=.50,label=<{}>,color={}];", n, n, i, edge_label, el_color)?;
                for (port, child) in [("L", e.prime), ("R", e.sub)] {
                    if self.is_decision(child) {
                        write!(
                            dot,
                            "\nn{}e{}:{}:c->n{} [arrowsize=.50,tailclip=false,arrowtail=dot,dir=both,color={}];",
                            n,
                            i,
                            port,
                            index(child),
                            el_color
                        )?;
                    }
                }
            }
        }

        write!(dot, "\n\n\n}}\n")?;
        Ok(dot)
    }

    pub fn save_sdd_dot<P: AsRef<Path>>(&self, root: SddId, path: P) -> Result<(), IoError> {
        fs::write(path, self.sdd_to_dot(root)?)?;
        Ok(())
    }

    pub fn save_psdd_dot<P: AsRef<Path>>(&self, root: SddId, sub: Option<&SubCircuit>, path: P) -> Result<(), IoError> {
        fs::write(path, self.psdd_to_dot(root, sub)?)?;
        Ok(())
    }

    /// Exports the vtree to Graphviz DOT format.
    pub fn vtree_to_dot(&self) -> Result<String, fmt::Error> {
        let vtree = self.vtree();
        let mut dot = String::new();

        writeln!(dot, "digraph vtree {{")?;
        writeln!(dot, "  node [fontsize=12];")?;
        for id in vtree.ids() {
            match vtree.node(id) {
                VtreeNode::Leaf { var } => {
                    writeln!(dot, "  v{} [label=\"x{}\", shape=ellipse];", id.raw(), var)?;
                }
                VtreeNode::Internal { left, right } => {
                    writeln!(dot, "  v{} [label=\"{}\", shape=circle];", id.raw(), id.raw())?;
                    writeln!(dot, "  v{} -> v{} [label=\"L\"];", id.raw(), left.raw())?;
                    writeln!(dot, "  v{} -> v{} [label=\"R\"];", id.raw(), right.raw())?;
                }
            }
        }
        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
