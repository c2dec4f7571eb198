//! Error types for reading, writing and compiling diagrams.

use std::io;

use thiserror::Error;

use crate::reference::SddId;

/// Error type for I/O operations.
///
/// Line numbers are 1-based and count every line of the input, comments included.
#[derive(Error, Debug)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Malformed line: unknown tag, wrong field count, bad number, bad id.
    #[error("Parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// An element references a node id that has not been defined yet.
    #[error("Reference error at line {line}: node {id} is not defined before use")]
    Reference { line: usize, id: u32 },

    /// Elements of a decomposition node do not agree on a parent vtree.
    #[error("Vtree mismatch at line {line}: elements of node {id} are not normalized for one vtree")]
    VtreeMismatch { line: usize, id: u32 },

    /// Declared node count differs from the number of node lines.
    #[error("Declared {declared} nodes, found {found}")]
    CountMismatch { declared: usize, found: usize },

    /// The input contains no nodes.
    #[error("No nodes in input")]
    Empty,

    /// A probabilistic node without weights cannot be written as a PSDD.
    #[error("Node {0} has no weights")]
    MissingTheta(SddId),
}

impl IoError {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        IoError::Parse { line, msg: msg.into() }
    }
}

/// Error type for arithmetic circuit compilation.
#[derive(Error, Debug)]
pub enum CompileError {
    /// TRUE or decomposition node without weights.
    #[error("Node {0} has no weights")]
    MissingTheta(SddId),

    /// TRUE node that is not bound to a variable.
    #[error("TRUE node {0} is not bound to a variable")]
    UnboundTrue(SddId),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}
