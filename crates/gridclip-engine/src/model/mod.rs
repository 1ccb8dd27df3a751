//! # Document Model
//!
//! The tree the clipboard engine edits: an arena of typed nodes, positions
//! between children, marker ranges and all-or-nothing transactions.
//!
//! ## Modules
//!
//! - **`node`**: `NodeId`, `NodeKind` and the stored `Node`
//! - **`tree`**: `Tree` arena with insertion, detaching, cloning and position order
//! - **`position`**: `Position` and `Range`
//! - **`markers`**: `Marker` and the per-document `MarkerRegistry`
//! - **`document`**: `Document`, `Fragment` and `Transaction`
//! - **`build`**: `GridSpec` / `CellSpec` builders
//!
//! ## Key Invariants
//!
//! - Node ids are stable across moves and never reused after a discard
//! - Positions are ordered by their path from the root, so ordering is only
//!   meaningful between positions of the same tree
//! - A transaction dropped without `commit` leaves no trace

pub mod build;
pub mod document;
pub mod markers;
pub mod node;
pub mod position;
pub mod tree;

pub use build::{CellSpec, GridSpec, cell};
pub use document::{Commit, Document, Fragment, Transaction};
pub use markers::{Marker, MarkerRegistry};
pub use node::{Boundary, Node, NodeId, NodeKind};
pub use position::{Position, Range};
pub use tree::Tree;
