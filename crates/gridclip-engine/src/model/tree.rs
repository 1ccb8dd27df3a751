use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

use super::node::{Node, NodeId, NodeKind};
use super::position::{Position, Range};

/// Arena-backed document tree.
///
/// Nodes are addressed by [`NodeId`] and keep their identity while they are
/// moved around, which lets callers capture edit targets once and apply them
/// after the structure has already changed. Indexing a discarded id panics,
/// the same way indexing a slice out of bounds does.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(kind)));
        id
    }

    /// Create a detached `paragraph` element, with a text child unless `text` is empty.
    pub fn create_paragraph(&mut self, text: &str) -> NodeId {
        let paragraph = self.create(NodeKind::element("paragraph"));
        if !text.is_empty() {
            let text = self.create(NodeKind::text(text));
            self.append(paragraph, text);
        }
        paragraph
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self[id].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self[id].children
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self[id].attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, id: NodeId, key: impl Into<String>, value: impl Into<String>) {
        self[id].attributes.insert(key.into(), value.into());
    }

    /// Index of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Row and column spans of a cell node.
    pub fn spans(&self, id: NodeId) -> Option<(usize, usize)> {
        match self.get(id)?.kind {
            NodeKind::Cell { row_span, col_span } => Some((row_span, col_span)),
            _ => None,
        }
    }

    /// Overwrite the spans of a cell node. Non-cells are left alone.
    pub fn set_spans(&mut self, id: NodeId, rows: usize, cols: usize) {
        if let NodeKind::Cell { row_span, col_span } = &mut self[id].kind {
            *row_span = rows.max(1);
            *col_span = cols.max(1);
        }
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let offset = self.children(parent).len();
        self.insert(parent, offset, child);
    }

    /// Insert a detached node at `offset` among `parent`'s children.
    ///
    /// An attached node is detached from its current parent first.
    pub fn insert(&mut self, parent: NodeId, offset: usize, child: NodeId) {
        self.detach(child);
        let offset = offset.min(self.children(parent).len());
        self[parent].children.insert(offset, child);
        self[child].parent = Some(parent);
    }

    pub fn insert_at(&mut self, position: Position, child: NodeId) {
        self.insert(position.parent, position.offset, child);
    }

    /// Unlink a node from its parent, keeping it (and its subtree) alive.
    ///
    /// Returns the position the node occupied.
    pub fn detach(&mut self, id: NodeId) -> Option<Position> {
        let parent = self[id].parent.take()?;
        let offset = self[parent].children.iter().position(|&c| c == id)?;
        self[parent].children.remove(offset);
        Some(Position::new(parent, offset))
    }

    /// Detach a node and free its whole subtree.
    pub fn discard(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
    }

    /// Deep-copy a subtree within this tree, dropping nodes rejected by `keep`.
    ///
    /// The copy is detached.
    pub fn clone_subtree(
        &mut self,
        id: NodeId,
        keep: &mut impl FnMut(NodeId, &NodeKind) -> bool,
    ) -> NodeId {
        let node = &self[id];
        let kind = node.kind.clone();
        let attributes = node.attributes.clone();
        let children = node.children.clone();

        let copy = self.create(kind);
        self[copy].attributes = attributes;
        for child in children {
            if keep(child, self.kind(child)) {
                let child_copy = self.clone_subtree(child, keep);
                self.append(copy, child_copy);
            }
        }
        copy
    }

    /// Deep-copy a subtree out of another tree into this one, dropping nodes
    /// rejected by `keep`. The copy is detached.
    pub fn import(
        &mut self,
        source: &Tree,
        id: NodeId,
        keep: &mut impl FnMut(NodeId, &NodeKind) -> bool,
    ) -> NodeId {
        let node = &source[id];
        let copy = self.create(node.kind.clone());
        self[copy].attributes = node.attributes.clone();
        for &child in &node.children {
            if keep(child, source.kind(child)) {
                let child_copy = self.import(source, child, keep);
                self.append(copy, child_copy);
            }
        }
        copy
    }

    /// Iterate `id`'s ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// `id` equals `ancestor` or lies somewhere below it.
    pub fn is_inside(&self, id: NodeId, ancestor: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|node| node == ancestor)
    }

    /// All nodes below `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if let NodeKind::Text(own) = self.kind(id) {
            text.push_str(own);
        }
        for node in self.descendants(id) {
            if let NodeKind::Text(own) = self.kind(node) {
                text.push_str(own);
            }
        }
        text
    }

    /// Deep structural equality of two subtrees, possibly in different trees.
    pub fn same_structure(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
        let (a, b) = (&self[id], &other[other_id]);
        a.kind == b.kind
            && a.attributes == b.attributes
            && a.children.len() == b.children.len()
            && a.children
                .iter()
                .zip(&b.children)
                .all(|(&x, &y)| self.same_structure(x, other, y))
    }

    /// Child indices leading from the topmost ancestor down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(offset) = self.index_in_parent(current) {
            path.push(offset);
            current = self.parent(current).unwrap_or(current);
        }
        path.reverse();
        path
    }

    pub fn position_path(&self, position: Position) -> Vec<usize> {
        let mut path = self.path(position.parent);
        path.push(position.offset);
        path
    }

    /// Document order of two positions of this tree.
    pub fn compare(&self, a: Position, b: Position) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.position_path(a).cmp(&self.position_path(b))
    }

    pub fn position_before(&self, id: NodeId) -> Option<Position> {
        let offset = self.index_in_parent(id)?;
        Some(Position::new(self.parent(id)?, offset))
    }

    pub fn position_after(&self, id: NodeId) -> Option<Position> {
        self.position_before(id)
            .map(|p| Position::new(p.parent, p.offset + 1))
    }

    pub fn at_end(&self, id: NodeId) -> Position {
        Position::new(id, self.children(id).len())
    }

    /// Range covering all of `id`'s content.
    pub fn range_in(&self, id: NodeId) -> Range {
        Range::new(Position::at_start(id), self.at_end(id))
    }

    /// Position lies inside `container`'s content (at any depth).
    pub fn is_position_inside(&self, position: Position, container: NodeId) -> bool {
        self.is_inside(position.parent, container)
    }

    /// Ranges overlap or touch.
    pub fn intersects(&self, a: &Range, b: &Range) -> bool {
        self.compare(a.start, b.end) != Ordering::Greater
            && self.compare(b.start, a.end) != Ordering::Greater
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("stale node id {id:?}"),
        }
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("stale node id {id:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.create(NodeKind::Root);
        let first = tree.create_paragraph("one");
        let second = tree.create_paragraph("two");
        tree.append(root, first);
        tree.append(root, second);
        (tree, root, first, second)
    }

    #[test]
    fn test_insert_and_detach_keep_identity() {
        let (mut tree, root, first, second) = sample();

        let old = tree.detach(first).unwrap();
        assert_eq!(old, Position::new(root, 0));
        assert_eq!(tree.children(root), &[second]);

        tree.insert(root, 1, first);
        assert_eq!(tree.children(root), &[second, first]);
        assert_eq!(tree.text_content(first), "one");
    }

    #[test]
    fn test_discard_frees_subtree() {
        let (mut tree, root, first, _) = sample();
        let text = tree.children(first)[0];

        tree.discard(first);

        assert!(!tree.contains(first));
        assert!(!tree.contains(text));
        assert_eq!(tree.children(root).len(), 1);
    }

    #[test]
    fn test_position_order_follows_paths() {
        let (tree, root, first, _) = sample();

        let before_first = Position::new(root, 0);
        let inside_first = Position::new(first, 1);
        let after_first = Position::new(root, 1);

        assert_eq!(tree.compare(before_first, inside_first), Ordering::Less);
        assert_eq!(tree.compare(inside_first, after_first), Ordering::Less);
        assert_eq!(tree.compare(after_first, after_first), Ordering::Equal);
    }

    #[test]
    fn test_touching_ranges_intersect() {
        let (tree, root, first, _) = sample();
        let a = Range::new(Position::new(root, 0), Position::new(first, 0));
        let b = tree.range_in(first);
        let c = Range::new(Position::new(root, 1), Position::new(root, 2));

        assert!(tree.intersects(&a, &b));
        assert!(!tree.intersects(&b, &c));
    }

    #[test]
    fn test_clone_subtree_filters_nodes() {
        let (mut tree, _, first, _) = sample();
        let copy = tree.clone_subtree(first, &mut |_, kind| !matches!(kind, NodeKind::Text(_)));

        assert_eq!(tree.kind(copy), &NodeKind::element("paragraph"));
        assert!(tree.children(copy).is_empty());
        assert_eq!(tree.parent(copy), None);
    }

    #[test]
    fn test_import_is_structurally_equal() {
        let (source, _, first, _) = sample();
        let mut target = Tree::new();

        let copy = target.import(&source, first, &mut |_, _| true);

        assert!(target.same_structure(copy, &source, first));
    }
}
