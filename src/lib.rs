//! # psdd-rs: Sentential Decision Diagrams and their probabilistic variant
//!
//! **`psdd-rs`** reads, writes, renders and compiles **Sentential Decision Diagrams (SDDs)**
//! and **Probabilistic SDDs (PSDDs)**.
//!
//! ## What is an SDD?
//!
//! An SDD represents a boolean function as a DAG whose shape follows a *vtree*: a binary tree
//! whose leaves are the variables. A decomposition node normalized for an internal vtree node `v`
//! is a disjunction of elements `(prime ∧ sub)`, where primes are functions over the variables of
//! `v.left`, subs over `v.right`, and the primes are mutually exclusive and exhaustive.
//! A PSDD attaches a distribution to this structure: every decomposition node carries one weight per
//! element, and every TRUE node carries the probability of its variable.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All nodes live in an [`SddManager`], referenced by lightweight
//!   [`SddId`] handles. Decomposition nodes are hash-consed; PSDD nodes are always fresh.
//! - **Text formats**: libsdd-style vtree, SDD and PSDD files, read bottom-up and written in post-order.
//! - **Graphviz export**: SDDs, PSDDs with a highlighted sub-circuit, and vtrees.
//! - **Circuit compilation**: a PSDD flattens into an NNF arithmetic circuit plus an LMAP weight table.
//!
//! ## Basic Usage
//!
//! ```rust
//! use psdd_rs::{ArithmeticCircuit, SddManager};
//!
//! let mgr = SddManager::new(2);
//! let psdd = "psdd 3\nT 0 0 1 -0.35667494393873245\nT 1 2 2 -0.916290731874155\nD 2 1 1 0 1 0\n";
//! let root = mgr.psdd_from_string(psdd).unwrap();
//!
//! let ac = ArithmeticCircuit::compile(&mgr, root).unwrap();
//! assert_eq!(ac.node_count(), 2 * 2 + 5 + 5 + 3);
//!
//! // Pr(x1 ∧ x2) = 0.7 * 0.4
//! assert!((ac.evaluate(&[1, 2]) - 0.28).abs() < 1e-9);
//! ```
//!
//! ## Core Components
//!
//! - **[`manager`]**: The [`SddManager`] node store.
//! - **[`io`]**: Readers and writers for the text formats.
//! - **[`dot`]**: Utilities for visualizing diagrams using Graphviz.
//! - **[`circuit`]**: The PSDD to arithmetic circuit compiler, with [`lmap`] for its weights.

pub mod circuit;
pub mod dot;
pub mod error;
pub mod io;
pub mod lmap;
pub mod manager;
pub mod node;
pub mod reference;
pub mod traversal;
pub mod types;
pub mod vtree;

pub use circuit::ArithmeticCircuit;
pub use error::{CompileError, IoError};
pub use manager::SddManager;
pub use node::{Element, Sdd, Theta};
pub use reference::SddId;
pub use types::{Literal, VtreeId};
pub use vtree::Vtree;
