use crate::model::{NodeId, NodeKind, Tree};

/// Decides whether pasted content is a single grid the transplant engine can
/// take, or something that has to go through generic insertion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentClassifier;

impl ContentClassifier {
    /// The one grid carried by `content`, if that is all it carries.
    ///
    /// Accepted shapes: a grid itself, a wrapper with a grid as its only
    /// child, or content whose first grid has nothing but whitespace and
    /// empty elements around it.
    pub fn classify(tree: &Tree, content: NodeId) -> Option<NodeId> {
        if tree.kind(content).is_grid() {
            return Some(content);
        }
        if let [only] = tree.children(content)
            && tree.kind(*only).is_grid()
        {
            return Some(*only);
        }

        let nodes = tree.descendants(content);
        let grid = nodes.iter().copied().find(|&n| tree.kind(n).is_grid())?;
        let cluttered = nodes.iter().any(|&node| {
            !tree.is_inside(node, grid)
                && !tree.is_inside(grid, node)
                && Self::carries_content(tree, node)
        });
        if cluttered {
            log::debug!("pasted content around grid {grid:?} is not a lone grid");
            return None;
        }
        Some(grid)
    }

    /// Non-whitespace text or grid structure anywhere in the subtree.
    fn carries_content(tree: &Tree, node: NodeId) -> bool {
        match tree.kind(node) {
            NodeKind::Text(text) => !text.trim().is_empty(),
            NodeKind::Grid { .. } | NodeKind::Row | NodeKind::Cell { .. } => true,
            NodeKind::Sentinel { .. } => false,
            NodeKind::Root | NodeKind::Element { .. } => tree
                .children(node)
                .iter()
                .any(|&child| Self::carries_content(tree, child)),
        }
    }
}
