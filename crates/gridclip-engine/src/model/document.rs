use std::ops::{Deref, DerefMut};

use super::markers::MarkerRegistry;
use super::node::{NodeId, NodeKind};
use super::tree::Tree;

/// A tree with a root node and the markers annotating it.
///
/// Clipboard fragments use the same type: their root holds the copied
/// content and their registry the markers that travel with it.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) tree: Tree,
    pub(crate) root: NodeId,
    pub(crate) markers: MarkerRegistry,
    /// Version counter incremented on each committed transaction
    pub(crate) version: u64,
}

/// Content copied out of a document.
pub type Fragment = Document;

impl Document {
    pub fn new() -> Self {
        let mut tree = Tree::new();
        let root = tree.create(NodeKind::Root);
        Self {
            tree,
            root,
            markers: MarkerRegistry::new(),
            version: 0,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    pub fn markers_mut(&mut self) -> &mut MarkerRegistry {
        &mut self.markers
    }

    /// Split borrow used by operations that edit the tree while reading markers.
    pub fn parts_mut(&mut self) -> (&mut Tree, &mut MarkerRegistry) {
        (&mut self.tree, &mut self.markers)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Append a node under the root.
    pub fn push(&mut self, node: NodeId) {
        let root = self.root;
        self.tree.append(root, node);
    }

    /// Sentinel nodes currently attached below the root.
    pub fn sentinels(&self) -> Vec<NodeId> {
        self.tree
            .descendants(self.root)
            .into_iter()
            .filter(|&node| self.tree.kind(node).is_sentinel())
            .collect()
    }

    /// Start an atomic change.
    ///
    /// Every mutation made through the returned transaction becomes visible
    /// together on [`Transaction::commit`]; dropping it uncommitted restores
    /// the tree and markers exactly as they were.
    pub fn transaction(&mut self) -> Transaction<'_> {
        let backup = Box::new((self.tree.clone(), self.markers.clone()));
        Transaction {
            doc: self,
            backup: Some(backup),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of committing a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub version: u64,
}

/// An open atomic change over a [`Document`].
pub struct Transaction<'a> {
    doc: &'a mut Document,
    backup: Option<Box<(Tree, MarkerRegistry)>>,
}

impl Transaction<'_> {
    pub fn commit(mut self) -> Commit {
        self.backup = None;
        self.doc.version += 1;
        log::debug!("committed document version {}", self.doc.version);
        Commit {
            version: self.doc.version,
        }
    }

    /// Explicitly discard every change made so far.
    pub fn rollback(self) {
        // Drop restores the backup.
    }
}

impl Deref for Transaction<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        &*self.doc
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        &mut *self.doc
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            let (tree, markers) = *backup;
            self.doc.tree = tree;
            self.doc.markers = markers;
            log::debug!("rolled back uncommitted transaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, Range};

    #[test]
    fn test_commit_keeps_changes_and_bumps_version() {
        let mut doc = Document::new();
        let mut tx = doc.transaction();
        let p = tx.tree_mut().create_paragraph("kept");
        tx.push(p);
        let commit = tx.commit();

        assert_eq!(commit.version, 1);
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.tree().text_content(doc.root()), "kept");
    }

    #[test]
    fn test_drop_rolls_back_tree_and_markers() {
        let mut doc = Document::new();
        let root = doc.root();
        {
            let mut tx = doc.transaction();
            let p = tx.tree_mut().create_paragraph("lost");
            tx.push(p);
            tx.markers_mut()
                .set("m", Range::collapsed(Position::at_start(root)));
        }

        assert_eq!(doc.version(), 0);
        assert!(doc.tree().children(root).is_empty());
        assert!(doc.markers().is_empty());
    }
}
