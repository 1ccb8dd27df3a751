use super::node::{NodeId, NodeKind};
use super::tree::Tree;

/// Declarative description of one cell, used to build grids in tests,
/// benches and demos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSpec {
    pub text: String,
    pub row_span: usize,
    pub col_span: usize,
}

/// Shorthand for a 1x1 cell holding one paragraph of `text`.
pub fn cell(text: &str) -> CellSpec {
    CellSpec {
        text: text.to_string(),
        row_span: 1,
        col_span: 1,
    }
}

impl CellSpec {
    pub fn rows(mut self, span: usize) -> Self {
        self.row_span = span.max(1);
        self
    }

    pub fn cols(mut self, span: usize) -> Self {
        self.col_span = span.max(1);
        self
    }

    pub fn build(&self, tree: &mut Tree) -> NodeId {
        let node = tree.create(NodeKind::cell(self.row_span, self.col_span));
        let paragraph = tree.create_paragraph(&self.text);
        tree.append(node, paragraph);
        node
    }
}

/// Rows of cells in document order. Slots covered by a span from an earlier
/// row are simply left out of the later row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSpec {
    pub rows: Vec<Vec<CellSpec>>,
    pub heading_rows: usize,
    pub heading_columns: usize,
}

impl GridSpec {
    pub fn new(rows: Vec<Vec<CellSpec>>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// A `height` x `width` grid of 1x1 cells named by `label(row, column)`.
    pub fn filled(height: usize, width: usize, label: impl Fn(usize, usize) -> String) -> Self {
        let rows = (0..height)
            .map(|r| (0..width).map(|c| cell(&label(r, c))).collect())
            .collect();
        Self::new(rows)
    }

    pub fn headings(mut self, rows: usize, columns: usize) -> Self {
        self.heading_rows = rows;
        self.heading_columns = columns;
        self
    }

    /// Build the grid as a detached node of `tree`.
    pub fn build(&self, tree: &mut Tree) -> NodeId {
        let grid = tree.create(NodeKind::Grid {
            heading_rows: self.heading_rows,
            heading_columns: self.heading_columns,
        });
        for cells in &self.rows {
            let row = tree.create(NodeKind::Row);
            for spec in cells {
                let node = spec.build(tree);
                tree.append(row, node);
            }
            tree.append(grid, row);
        }
        grid
    }
}
