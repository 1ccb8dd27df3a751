use serde::{Deserialize, Serialize};

use crate::error::{ClipboardError, Result};
use crate::model::{NodeId, Tree};

use super::map::{CellRef, GridDimensions, GridMap};
use super::structure;

/// Inclusive slot bounds, `first <= last` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRectangle {
    pub first_row: usize,
    pub last_row: usize,
    pub first_column: usize,
    pub last_column: usize,
}

impl SelectionRectangle {
    pub fn new(first_row: usize, last_row: usize, first_column: usize, last_column: usize) -> Self {
        Self {
            first_row: first_row.min(last_row),
            last_row: last_row.max(first_row),
            first_column: first_column.min(last_column),
            last_column: last_column.max(first_column),
        }
    }

    /// Smallest rectangle holding every cell's anchor slot and span.
    pub fn bounding(cells: &[CellRef]) -> Option<Self> {
        let first = cells.first()?;
        let mut rect = Self::new(first.row, first.last_row(), first.column, first.last_column());
        for cref in &cells[1..] {
            rect.first_row = rect.first_row.min(cref.row);
            rect.last_row = rect.last_row.max(cref.last_row());
            rect.first_column = rect.first_column.min(cref.column);
            rect.last_column = rect.last_column.max(cref.last_column());
        }
        Some(rect)
    }

    pub fn height(&self) -> usize {
        self.last_row - self.first_row + 1
    }

    pub fn width(&self) -> usize {
        self.last_column - self.first_column + 1
    }

    pub fn dimensions(&self) -> GridDimensions {
        GridDimensions::new(self.height(), self.width())
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_column..=self.last_column).contains(&column)
    }

    /// Grow (never shrink) so the rectangle is at least `dimensions` big,
    /// keeping the top-left corner.
    pub fn expanded_to(self, dimensions: GridDimensions) -> Self {
        Self {
            last_row: self.last_row.max(self.first_row + dimensions.height.max(1) - 1),
            last_column: self
                .last_column
                .max(self.first_column + dimensions.width.max(1) - 1),
            ..self
        }
    }

    /// Shrink (never grow) so the rectangle is at most `dimensions` big,
    /// keeping the top-left corner.
    pub fn clamped_to(self, dimensions: GridDimensions) -> Self {
        Self {
            last_row: self.last_row.min(self.first_row + dimensions.height.max(1) - 1),
            last_column: self
                .last_column
                .min(self.first_column + dimensions.width.max(1) - 1),
            ..self
        }
    }
}

/// Resolve selected cell nodes to their grid, failing before any mutation
/// when a node is not a cell or the cells span several grids.
pub fn locate_selection(tree: &Tree, cells: &[NodeId]) -> Result<(GridMap, Vec<CellRef>)> {
    let mut grid = None;
    for &cell in cells {
        if !tree.contains(cell) || !tree.kind(cell).is_cell() {
            return Err(ClipboardError::NotACell(cell));
        }
        let owner = tree
            .parent(cell)
            .filter(|&row| tree.kind(row).is_row())
            .and_then(|row| tree.parent(row))
            .filter(|&g| tree.kind(g).is_grid())
            .ok_or(ClipboardError::NotACell(cell))?;
        match grid {
            None => grid = Some(owner),
            Some(existing) if existing != owner => return Err(ClipboardError::MixedGrids),
            Some(_) => {}
        }
    }
    let grid = grid.ok_or(ClipboardError::MixedGrids)?;

    let map = GridMap::build(tree, grid)?;
    let refs = cells
        .iter()
        .map(|&cell| map.locate(cell).copied().ok_or(ClipboardError::NotACell(cell)))
        .collect::<Result<Vec<_>>>()?;
    Ok((map, refs))
}

/// Bounds computed for a selection before any splitting happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBounds {
    pub grid: NodeId,
    pub rectangle: SelectionRectangle,
    /// The selection was a single cell grown to the pasted size
    pub expanded: bool,
}

/// Turns an arbitrary cell selection into a [`SelectionRectangle`] that no
/// cell crosses.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRectangularizer {
    expand_single_cell: bool,
}

impl Default for SelectionRectangularizer {
    fn default() -> Self {
        Self {
            expand_single_cell: true,
        }
    }
}

impl SelectionRectangularizer {
    pub fn new(expand_single_cell: bool) -> Self {
        Self { expand_single_cell }
    }

    /// Bounding box of the selection, grown to `incoming` when exactly one
    /// cell is selected. `None` for an empty selection.
    pub fn bounds(
        &self,
        tree: &Tree,
        cells: &[NodeId],
        incoming: Option<GridDimensions>,
    ) -> Result<Option<SelectionBounds>> {
        if cells.is_empty() {
            return Ok(None);
        }
        let (map, refs) = locate_selection(tree, cells)?;
        let Some(mut rectangle) = SelectionRectangle::bounding(&refs) else {
            return Ok(None);
        };

        let mut expanded = false;
        if let Some(incoming) = incoming
            && self.expand_single_cell
            && refs.len() == 1
        {
            rectangle = rectangle.expanded_to(incoming);
            expanded = true;
        }

        Ok(Some(SelectionBounds {
            grid: map.grid(),
            rectangle,
            expanded,
        }))
    }

    /// Split every cell crossing a boundary line of `rectangle` so none does
    /// any more.
    ///
    /// Lines are handled left column, right column, top row, bottom row, each
    /// across the whole grid; a split against an early line can produce cells
    /// that a later one has to split again. When no cell crosses any line the
    /// grid is left untouched, the bounding box already reaching to the end
    /// of every selected span.
    pub fn settle(
        &self,
        tree: &mut Tree,
        grid: NodeId,
        rectangle: SelectionRectangle,
    ) -> Result<SelectionRectangle> {
        let map = GridMap::build(tree, grid)?;
        map.check(&rectangle)?;

        let column_lines = [rectangle.first_column, rectangle.last_column + 1];
        let row_lines = [rectangle.first_row, rectangle.last_row + 1];
        let crossed = map.cells().iter().any(|cref| {
            column_lines
                .iter()
                .any(|&line| structure::crosses_column_line(cref, line))
                || row_lines
                    .iter()
                    .any(|&line| structure::crosses_row_line(cref, line))
        });
        if !crossed {
            log::trace!("selection {rectangle:?} is already rectangular");
            return Ok(rectangle);
        }

        for line in column_lines {
            structure::split_across_column(tree, grid, line)?;
        }
        for line in row_lines {
            structure::split_across_row(tree, grid, line)?;
        }

        log::debug!("split crossing cells around {rectangle:?}");
        Ok(rectangle)
    }

    /// Bounds, grid growth for an expanded single cell, and settling in one go.
    pub fn rectangularize(
        &self,
        tree: &mut Tree,
        cells: &[NodeId],
        incoming: Option<GridDimensions>,
    ) -> Result<Option<(NodeId, SelectionRectangle)>> {
        let Some(bounds) = self.bounds(tree, cells, incoming)? else {
            return Ok(None);
        };
        structure::grow(tree, bounds.grid, bounds.rectangle)?;
        let rectangle = self.settle(tree, bounds.grid, bounds.rectangle)?;
        Ok(Some((bounds.grid, rectangle)))
    }
}
