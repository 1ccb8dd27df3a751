//! Structural grid edits: splitting, trimming, growing and cropping cells.
//!
//! Every function re-reads the grid layout before it edits, so callers can
//! chain them freely. Split halves duplicate the original cell's content and
//! attributes but never its sentinels, which stay with the original half.

use crate::error::{ClipboardError, Result};
use crate::model::{NodeId, NodeKind, Tree};

use super::map::{CellRef, GridMap};
use super::rectangle::SelectionRectangle;

/// A 1x1 cell holding an empty paragraph.
pub fn empty_cell(tree: &mut Tree) -> NodeId {
    let cell = tree.create(NodeKind::cell(1, 1));
    let paragraph = tree.create_paragraph("");
    tree.append(cell, paragraph);
    cell
}

fn duplicate_without_sentinels(tree: &mut Tree, cell: NodeId) -> NodeId {
    tree.clone_subtree(cell, &mut |_, kind: &NodeKind| !kind.is_sentinel())
}

fn locate(map: &GridMap, cell: NodeId) -> Result<CellRef> {
    map.locate(cell).copied().ok_or(ClipboardError::NotACell(cell))
}

/// Split `cell` so that no part of it crosses the line above row `boundary`.
///
/// The original keeps the upper part; the lower part is a new cell anchored
/// in row `boundary`. Returns `None` when the cell does not cross the line.
pub fn split_at_row(
    tree: &mut Tree,
    grid: NodeId,
    cell: NodeId,
    boundary: usize,
) -> Result<Option<NodeId>> {
    let map = GridMap::build(tree, grid)?;
    let cref = locate(&map, cell)?;
    if !crosses_row_line(&cref, boundary) {
        return Ok(None);
    }
    let Some(row) = map.row_node(boundary) else {
        return Ok(None);
    };

    let upper = boundary - cref.row;
    let lower = cref.row_span - upper;
    let part = duplicate_without_sentinels(tree, cell);
    tree.set_spans(part, lower, cref.col_span);
    tree.insert(row, map.insertion_index(boundary, cref.column), part);
    tree.set_spans(cell, upper, cref.col_span);

    log::trace!("split {cell:?} at row {boundary} into {part:?}");
    Ok(Some(part))
}

/// Split `cell` so that no part of it crosses the line left of `boundary`.
///
/// The original keeps the left part; the right part is inserted right after
/// it. Returns `None` when the cell does not cross the line.
pub fn split_at_column(
    tree: &mut Tree,
    grid: NodeId,
    cell: NodeId,
    boundary: usize,
) -> Result<Option<NodeId>> {
    let map = GridMap::build(tree, grid)?;
    let cref = locate(&map, cell)?;
    if !crosses_column_line(&cref, boundary) {
        return Ok(None);
    }
    let Some(after) = tree.position_after(cell) else {
        return Ok(None);
    };

    let left = boundary - cref.column;
    let right = cref.col_span - left;
    let part = duplicate_without_sentinels(tree, cell);
    tree.set_spans(part, cref.row_span, right);
    tree.insert_at(after, part);
    tree.set_spans(cell, cref.row_span, left);

    log::trace!("split {cell:?} at column {boundary} into {part:?}");
    Ok(Some(part))
}

/// Does `cref` cross the line above row `line`?
pub fn crosses_row_line(cref: &CellRef, line: usize) -> bool {
    cref.row < line && line <= cref.last_row()
}

/// Does `cref` cross the line left of column `line`?
pub fn crosses_column_line(cref: &CellRef, line: usize) -> bool {
    cref.column < line && line <= cref.last_column()
}

/// Split every cell crossing the line above `split_row`, across the whole
/// width of the grid.
pub fn split_across_row(tree: &mut Tree, grid: NodeId, split_row: usize) -> Result<Vec<NodeId>> {
    if split_row < 1 {
        return Ok(Vec::new());
    }
    let crossing: Vec<NodeId> = GridMap::build(tree, grid)?
        .cells()
        .iter()
        .filter(|c| crosses_row_line(c, split_row))
        .map(|c| c.cell)
        .collect();

    let mut parts = Vec::with_capacity(crossing.len());
    for cell in crossing {
        parts.extend(split_at_row(tree, grid, cell, split_row)?);
    }
    Ok(parts)
}

/// Split every cell crossing the line left of `split_column`, across the
/// whole height of the grid.
pub fn split_across_column(
    tree: &mut Tree,
    grid: NodeId,
    split_column: usize,
) -> Result<Vec<NodeId>> {
    if split_column < 1 {
        return Ok(Vec::new());
    }
    let crossing: Vec<NodeId> = GridMap::build(tree, grid)?
        .cells()
        .iter()
        .filter(|c| crosses_column_line(c, split_column))
        .map(|c| c.cell)
        .collect();

    let mut parts = Vec::with_capacity(crossing.len());
    for cell in crossing {
        parts.extend(split_at_column(tree, grid, cell, split_column)?);
    }
    Ok(parts)
}

/// Shrink the spans of a cell anchored at `(row, column)` so it ends no later
/// than `(last_row, last_column)`.
pub fn trim(
    tree: &mut Tree,
    cell: NodeId,
    (row, column): (usize, usize),
    (last_row, last_column): (usize, usize),
) {
    let Some((row_span, col_span)) = tree.spans(cell) else {
        return;
    };
    let row_span = row_span.min(last_row.saturating_sub(row) + 1);
    let col_span = col_span.min(last_column.saturating_sub(column) + 1);
    tree.set_spans(cell, row_span, col_span);
}

/// Append empty rows and columns until `rectangle` fits inside the grid.
pub fn grow(tree: &mut Tree, grid: NodeId, rectangle: SelectionRectangle) -> Result<()> {
    let map = GridMap::build(tree, grid)?;
    let current = map.dimensions();
    let height = current.height.max(rectangle.last_row + 1);
    let width = current.width.max(rectangle.last_column + 1);
    if (height, width) == (current.height, current.width) {
        return Ok(());
    }

    // Row spans clipped at the old bottom edge must not leak into new rows.
    for cref in map.cells() {
        if tree.spans(cref.cell).is_some_and(|(rs, _)| rs > cref.row_span) {
            tree.set_spans(cref.cell, cref.row_span, cref.col_span);
        }
    }

    for r in 0..current.height {
        let Some(row) = map.row_node(r) else {
            continue;
        };
        let missing = (0..width).filter(|&c| map.slot(r, c).is_none()).count();
        for _ in 0..missing {
            let filler = empty_cell(tree);
            tree.append(row, filler);
        }
    }
    for _ in current.height..height {
        let row = tree.create(NodeKind::Row);
        for _ in 0..width {
            let filler = empty_cell(tree);
            tree.append(row, filler);
        }
        tree.append(grid, row);
    }

    log::debug!(
        "grew grid {grid:?} from {}x{} to {height}x{width}",
        current.height,
        current.width
    );
    Ok(())
}

/// Copy the `rectangle` part of `grid` from `source` into `target` as a new,
/// detached grid.
///
/// Cells anchored inside the rectangle are copied whole (sentinels included)
/// and trimmed to its edges. Slots covered by a cell anchored outside get an
/// empty filler cell each. Heading counts shrink to the part that remains.
pub fn crop_into(
    source: &Tree,
    grid: NodeId,
    rectangle: SelectionRectangle,
    target: &mut Tree,
) -> Result<NodeId> {
    let map = GridMap::build(source, grid)?;
    map.check(&rectangle)?;

    let cropped = target.create(NodeKind::Grid {
        heading_rows: map
            .heading_rows()
            .saturating_sub(rectangle.first_row)
            .min(rectangle.height()),
        heading_columns: map
            .heading_columns()
            .saturating_sub(rectangle.first_column)
            .min(rectangle.width()),
    });

    for r in rectangle.first_row..=rectangle.last_row {
        let row = target.create(NodeKind::Row);
        for c in rectangle.first_column..=rectangle.last_column {
            let cell = match map.slot(r, c) {
                Some(cref) if cref.row == r && cref.column == c => {
                    let copy = target.import(source, cref.cell, &mut |_, _| true);
                    trim(
                        target,
                        copy,
                        (r, c),
                        (rectangle.last_row, rectangle.last_column),
                    );
                    copy
                }
                Some(cref) if rectangle.contains(cref.row, cref.column) => continue,
                _ => empty_cell(target),
            };
            target.append(row, cell);
        }
        target.append(cropped, row);
    }

    log::debug!("cropped {rectangle:?} out of grid {grid:?}");
    Ok(cropped)
}

/// Split cells straddling the heading row and heading column boundaries
/// where those boundaries pass through `rectangle`.
pub fn split_headings(
    tree: &mut Tree,
    grid: NodeId,
    rectangle: SelectionRectangle,
) -> Result<Vec<NodeId>> {
    let map = GridMap::build(tree, grid)?;
    let (heading_rows, heading_columns) = (map.heading_rows(), map.heading_columns());
    let mut parts = Vec::new();

    if rectangle.first_row < heading_rows && heading_rows <= rectangle.last_row {
        parts.extend(split_across_row(tree, grid, heading_rows)?);
    }
    if rectangle.first_column < heading_columns && heading_columns <= rectangle.last_column {
        parts.extend(split_across_column(tree, grid, heading_columns)?);
    }
    Ok(parts)
}
