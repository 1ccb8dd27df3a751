use serde::{Deserialize, Serialize};

use crate::error::{ClipboardError, Result};
use crate::model::{NodeId, NodeKind, Tree};

use super::rectangle::SelectionRectangle;

/// Logical size of a grid, in slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    pub height: usize,
    pub width: usize,
}

impl GridDimensions {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    pub fn min(self, other: GridDimensions) -> Self {
        Self::new(self.height.min(other.height), self.width.min(other.width))
    }
}

/// A cell resolved to its anchor slot and effective spans.
///
/// Row spans reaching past the last row are clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub cell: NodeId,
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub col_span: usize,
}

impl CellRef {
    pub fn last_row(&self) -> usize {
        self.row + self.row_span - 1
    }

    pub fn last_column(&self) -> usize {
        self.column + self.col_span - 1
    }
}

/// Slot occupancy of one grid, computed once and read many times.
///
/// Cells are placed row by row, each one in the first column of its row not
/// already covered by a span from above.
#[derive(Debug, Clone)]
pub struct GridMap {
    grid: NodeId,
    dimensions: GridDimensions,
    heading_rows: usize,
    heading_columns: usize,
    rows: Vec<NodeId>,
    /// Cells in document order, which is row-major by anchor slot
    cells: Vec<CellRef>,
    /// `height * width` indices into `cells`
    slots: Vec<Option<usize>>,
}

impl GridMap {
    pub fn build(tree: &Tree, grid: NodeId) -> Result<Self> {
        let (heading_rows, heading_columns) = match tree.kind(grid) {
            NodeKind::Grid {
                heading_rows,
                heading_columns,
            } => (*heading_rows, *heading_columns),
            _ => return Err(ClipboardError::NotAGrid(grid)),
        };

        let rows: Vec<NodeId> = tree
            .children(grid)
            .iter()
            .copied()
            .filter(|&row| tree.kind(row).is_row())
            .collect();
        let height = rows.len();

        let mut cells = Vec::new();
        let mut occupied: Vec<Vec<Option<usize>>> = vec![Vec::new(); height];
        for (r, &row) in rows.iter().enumerate() {
            let mut column = 0;
            for &node in tree.children(row) {
                let Some((row_span, col_span)) = tree.spans(node) else {
                    continue;
                };
                while occupied[r].get(column).is_some_and(Option::is_some) {
                    column += 1;
                }
                let cref = CellRef {
                    cell: node,
                    row: r,
                    column,
                    row_span: row_span.min(height - r),
                    col_span,
                };
                let index = cells.len();
                cells.push(cref);
                for line in &mut occupied[r..=cref.last_row()] {
                    if line.len() <= cref.last_column() {
                        line.resize(cref.last_column() + 1, None);
                    }
                    for slot in &mut line[column..=cref.last_column()] {
                        *slot = Some(index);
                    }
                }
                column += col_span;
            }
        }

        let width = occupied.iter().map(Vec::len).max().unwrap_or(0);
        let slots = occupied
            .into_iter()
            .flat_map(|mut line| {
                line.resize(width, None);
                line
            })
            .collect();

        Ok(Self {
            grid,
            dimensions: GridDimensions::new(height, width),
            heading_rows,
            heading_columns,
            rows,
            cells,
            slots,
        })
    }

    pub fn grid(&self) -> NodeId {
        self.grid
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    pub fn heading_rows(&self) -> usize {
        self.heading_rows
    }

    pub fn heading_columns(&self) -> usize {
        self.heading_columns
    }

    pub fn cells(&self) -> &[CellRef] {
        &self.cells
    }

    pub fn row_node(&self, row: usize) -> Option<NodeId> {
        self.rows.get(row).copied()
    }

    /// The cell covering a slot, if the slot is in range and covered.
    pub fn slot(&self, row: usize, column: usize) -> Option<&CellRef> {
        if row >= self.dimensions.height || column >= self.dimensions.width {
            return None;
        }
        self.slots[row * self.dimensions.width + column].map(|index| &self.cells[index])
    }

    pub fn locate(&self, cell: NodeId) -> Option<&CellRef> {
        self.cells.iter().find(|cref| cref.cell == cell)
    }

    /// Child offset in `row` at which a cell anchored at `column` belongs.
    pub fn insertion_index(&self, row: usize, column: usize) -> usize {
        self.cells
            .iter()
            .filter(|cref| cref.row == row && cref.column < column)
            .count()
    }

    /// Rectangle covering the whole grid, `None` for an empty grid.
    pub fn full_rectangle(&self) -> Option<SelectionRectangle> {
        if self.dimensions.is_empty() {
            return None;
        }
        Some(SelectionRectangle::new(
            0,
            self.dimensions.height - 1,
            0,
            self.dimensions.width - 1,
        ))
    }

    /// Fails when `rectangle` reaches outside the grid.
    pub fn check(&self, rectangle: &SelectionRectangle) -> Result<()> {
        if rectangle.last_row >= self.dimensions.height
            || rectangle.last_column >= self.dimensions.width
        {
            return Err(ClipboardError::InvalidRegion {
                rectangle: *rectangle,
                dimensions: self.dimensions,
            });
        }
        Ok(())
    }

    /// Anchor-only lookup table of this grid.
    pub fn anchor_lookup(&self) -> AnchorLookup {
        let GridDimensions { height, width } = self.dimensions;
        let mut anchors = vec![None; height * width];
        for cref in &self.cells {
            if cref.row < height && cref.column < width {
                anchors[cref.row * width + cref.column] = Some(*cref);
            }
        }
        AnchorLookup {
            dimensions: self.dimensions,
            anchors,
        }
    }
}

/// `(row, column)` → cell anchored exactly there; spanned-over slots are empty.
#[derive(Debug, Clone)]
pub struct AnchorLookup {
    dimensions: GridDimensions,
    anchors: Vec<Option<CellRef>>,
}

impl AnchorLookup {
    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&CellRef> {
        if row >= self.dimensions.height || column >= self.dimensions.width {
            return None;
        }
        self.anchors[row * self.dimensions.width + column].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GridSpec, cell};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_spans_push_later_cells_right() {
        let mut tree = Tree::new();
        let grid = GridSpec::new(vec![
            vec![cell("a").rows(2), cell("b"), cell("c")],
            vec![cell("e"), cell("f")],
        ])
        .build(&mut tree);

        let map = GridMap::build(&tree, grid).unwrap();

        assert_eq!(map.dimensions(), GridDimensions::new(2, 3));
        let e = map.slot(1, 1).unwrap();
        assert_eq!((e.row, e.column), (1, 1));
        assert_eq!(tree.text_content(e.cell), "e");
        assert_eq!(tree.text_content(map.slot(1, 0).unwrap().cell), "a");
        assert_eq!(map.insertion_index(1, 2), 1);
    }

    #[test]
    fn test_row_span_is_clipped_to_height() {
        let mut tree = Tree::new();
        let grid = GridSpec::new(vec![vec![cell("a").rows(5), cell("b")]]).build(&mut tree);

        let map = GridMap::build(&tree, grid).unwrap();

        assert_eq!(map.cells()[0].row_span, 1);
        assert_eq!(map.dimensions(), GridDimensions::new(1, 2));
    }

    #[test]
    fn test_anchor_lookup_leaves_spanned_slots_empty() {
        let mut tree = Tree::new();
        let grid = GridSpec::new(vec![
            vec![cell("a").cols(2)],
            vec![cell("c"), cell("d")],
        ])
        .build(&mut tree);

        let lookup = GridMap::build(&tree, grid).unwrap().anchor_lookup();

        assert!(lookup.get(0, 0).is_some());
        assert!(lookup.get(0, 1).is_none());
        assert!(lookup.get(1, 1).is_some());
        assert!(lookup.get(2, 0).is_none());
    }

    #[test]
    fn test_non_grid_is_rejected() {
        let mut tree = Tree::new();
        let paragraph = tree.create_paragraph("x");

        assert_eq!(
            GridMap::build(&tree, paragraph).unwrap_err(),
            ClipboardError::NotAGrid(paragraph)
        );
    }
}
