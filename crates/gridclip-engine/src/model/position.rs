use super::node::NodeId;

/// A point between two children of `parent`.
///
/// Offsets count children, so a position stays meaningful only while the
/// parent's child list is unchanged before `offset`. Ordering needs the tree,
/// see [`Tree::compare`](super::Tree::compare).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub parent: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(parent: NodeId, offset: usize) -> Self {
        Self { parent, offset }
    }

    pub fn at_start(parent: NodeId) -> Self {
        Self::new(parent, 0)
    }
}

/// Two positions of the same tree, `start` not after `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Position) -> Self {
        Self::new(at, at)
    }
}
