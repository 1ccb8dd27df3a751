use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Arena handle of a node inside a [`Tree`](super::Tree).
///
/// Ids are never reused, so a handle to a discarded node stays invalid
/// instead of silently pointing at a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which end of a marker range a sentinel stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    Start,
    End,
}

/// The kind of a document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Document or fragment root.
    Root,
    /// Generic block or inline container (`paragraph`, `div`, ...).
    Element { name: String },
    /// Leaf text.
    Text(String),
    /// Spanning-cell grid. Heading counts mark the leading heading rows/columns.
    Grid {
        heading_rows: usize,
        heading_columns: usize,
    },
    /// A grid row; only cells are expected as children.
    Row,
    /// A grid cell with its spans. Both spans are at least 1.
    Cell { row_span: usize, col_span: usize },
    /// Transient placeholder for one boundary of a marker.
    Sentinel { marker: String, boundary: Boundary },
}

impl NodeKind {
    pub fn element(name: impl Into<String>) -> Self {
        NodeKind::Element { name: name.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text(text.into())
    }

    pub fn grid() -> Self {
        NodeKind::Grid {
            heading_rows: 0,
            heading_columns: 0,
        }
    }

    pub fn cell(row_span: usize, col_span: usize) -> Self {
        NodeKind::Cell {
            row_span: row_span.max(1),
            col_span: col_span.max(1),
        }
    }

    pub fn is_grid(&self) -> bool {
        matches!(self, NodeKind::Grid { .. })
    }

    pub fn is_row(&self) -> bool {
        matches!(self, NodeKind::Row)
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, NodeKind::Cell { .. })
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, NodeKind::Sentinel { .. })
    }
}

/// A node stored in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
