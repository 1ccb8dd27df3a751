use std::collections::HashSet;

use crate::error::{ClipboardError, Result};
use crate::grid::{
    GridMap, GridSlot, GridWalker, SelectionRectangle, SelectionRectangularizer, structure,
};
use crate::model::{NodeId, Position, Tree};

use super::options::TransplantOptions;
use super::sentinel::MarkerSentinelCodec;

/// Per-slot decoration of pasted cells.
///
/// Called once for every destination slot inside the paste rectangle, after
/// the destination cell has been removed. `incoming` is the copy of the
/// pasted cell anchored at the matching pasted slot, if any. Whatever is
/// returned gets inserted; returning `None` leaves the slot to the spans of
/// neighbouring cells.
pub trait SlotHook {
    fn replace_slot(
        &mut self,
        tree: &mut Tree,
        slot: &GridSlot,
        incoming: Option<NodeId>,
    ) -> Option<NodeId> {
        let _ = (tree, slot);
        incoming
    }
}

/// Inserts pasted cells unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl SlotHook for PassThrough {}

/// Outcome of a transplant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transplanted {
    pub grid: NodeId,
    pub rectangle: SelectionRectangle,
    /// Inserted and heading-split cells, row-major by anchor slot
    pub cells: Vec<NodeId>,
}

/// Sentinels taken out of a removed destination cell.
struct Displaced {
    row: usize,
    column: usize,
    sentinels: Vec<NodeId>,
}

/// Pastes a grid over a selection of destination cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridTransplantEngine {
    options: TransplantOptions,
}

impl GridTransplantEngine {
    pub fn new(options: TransplantOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransplantOptions {
        &self.options
    }

    /// Replace the `destination` cells of `tree` with `pasted_grid` out of
    /// `pasted`.
    ///
    /// Nothing is touched when validation fails. `Ok(None)` means the
    /// selection was empty. Sentinels riding on pasted cells are inserted
    /// once even when the pasted grid is tiled; sentinels of removed
    /// destination cells move to the cell covering the same slot afterwards.
    pub fn transplant(
        &self,
        tree: &mut Tree,
        pasted: &Tree,
        pasted_grid: NodeId,
        destination: &[NodeId],
        hook: &mut dyn SlotHook,
    ) -> Result<Option<Transplanted>> {
        if destination.is_empty() {
            log::debug!("nothing selected to paste into");
            return Ok(None);
        }
        let pasted_dimensions = GridMap::build(pasted, pasted_grid)?.dimensions();
        if pasted_dimensions.is_empty() {
            return Err(ClipboardError::EmptyGrid(pasted_grid));
        }

        let rectangularizer = SelectionRectangularizer::new(self.options.expand_single_cell);
        let Some(bounds) = rectangularizer.bounds(tree, destination, Some(pasted_dimensions))?
        else {
            return Ok(None);
        };
        let grid = bounds.grid;
        let mut rectangle = bounds.rectangle;
        if !self.options.tile {
            rectangle = rectangle.clamped_to(pasted_dimensions);
        }

        structure::grow(tree, grid, rectangle)?;
        let rectangle = rectangularizer.settle(tree, grid, rectangle)?;
        log::debug!(
            "pasting {}x{} grid into {rectangle:?}",
            pasted_dimensions.height,
            pasted_dimensions.width
        );

        let crop = rectangle.dimensions().min(pasted_dimensions);
        let mut scratch = Tree::new();
        let cropped = structure::crop_into(
            pasted,
            pasted_grid,
            SelectionRectangle::new(0, crop.height - 1, 0, crop.width - 1),
            &mut scratch,
        )?;
        let lookup = GridMap::build(&scratch, cropped)?.anchor_lookup();

        let walker = GridWalker::new(tree, grid)?
            .within(rectangle)?
            .include_all_slots(true);
        let map = walker.map();

        let mut emitted = HashSet::new();
        let mut inserted = Vec::new();
        let mut displaced = Vec::new();
        let mut cursor: Option<(usize, Position)> = None;

        for slot in walker.slots() {
            let Some(row_node) = map.row_node(slot.row) else {
                continue;
            };
            let at = match cursor {
                Some((row, at)) if row == slot.row => at,
                _ => Self::row_start(tree, map, row_node, slot.row, rectangle.first_column),
            };

            if slot.is_anchor {
                let sentinels = MarkerSentinelCodec::salvage(tree, slot.cell);
                if !sentinels.is_empty() {
                    displaced.push(Displaced {
                        row: slot.row,
                        column: slot.column,
                        sentinels,
                    });
                }
                tree.discard(slot.cell);
            }

            let source_row = (slot.row - rectangle.first_row) % crop.height;
            let source_column = (slot.column - rectangle.first_column) % crop.width;
            let incoming = lookup.get(source_row, source_column).map(|source| {
                tree.import(&scratch, source.cell, &mut |id, kind| {
                    !kind.is_sentinel() || emitted.insert(id)
                })
            });

            let Some(cell) = hook.replace_slot(tree, &slot, incoming) else {
                cursor = Some((slot.row, at));
                continue;
            };
            tree.insert_at(at, cell);
            structure::trim(
                tree,
                cell,
                (slot.row, slot.column),
                (rectangle.last_row, rectangle.last_column),
            );
            log::trace!("slot ({}, {}) <- {cell:?}", slot.row, slot.column);
            inserted.push(cell);
            cursor = Some((slot.row, Position::new(at.parent, at.offset + 1)));
        }

        if self.options.split_headings {
            inserted.extend(structure::split_headings(tree, grid, rectangle)?);
        }

        let map = GridMap::build(tree, grid)?;
        Self::rehome(tree, &map, displaced, &inserted);

        inserted.sort_by_key(|&cell| map.locate(cell).map(|c| (c.row, c.column)));
        log::debug!("pasted {} cells into grid {grid:?}", inserted.len());
        Ok(Some(Transplanted {
            grid,
            rectangle,
            cells: inserted,
        }))
    }

    /// Insert position for the first pasted cell of a row: right after the
    /// last cell anchored left of the rectangle.
    fn row_start(
        tree: &Tree,
        map: &GridMap,
        row_node: NodeId,
        row: usize,
        first_column: usize,
    ) -> Position {
        map.cells()
            .iter()
            .rev()
            .find(|c| c.row == row && c.column < first_column)
            .and_then(|c| tree.position_after(c.cell))
            .unwrap_or(Position::at_start(row_node))
    }

    fn rehome(tree: &mut Tree, map: &GridMap, displaced: Vec<Displaced>, inserted: &[NodeId]) {
        for Displaced {
            row,
            column,
            sentinels,
        } in displaced
        {
            let target = map
                .slot(row, column)
                .map(|c| c.cell)
                .or_else(|| inserted.first().copied())
                .or_else(|| map.cells().first().map(|c| c.cell));
            match target {
                Some(cell) => MarkerSentinelCodec::rehome(tree, cell, &sentinels),
                None => log::warn!("no cell left to take {} sentinels", sentinels.len()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridDimensions;
    use crate::model::{GridSpec, NodeKind, cell};
    use pretty_assertions::assert_eq;

    fn select(tree: &Tree, grid: NodeId, texts: &[&str]) -> Vec<NodeId> {
        let map = GridMap::build(tree, grid).unwrap();
        texts
            .iter()
            .map(|t| {
                map.cells()
                    .iter()
                    .find(|c| tree.text_content(c.cell) == *t)
                    .unwrap()
                    .cell
            })
            .collect()
    }

    fn rows_of_text(tree: &Tree, grid: NodeId) -> Vec<Vec<String>> {
        let map = GridMap::build(tree, grid).unwrap();
        let dims = map.dimensions();
        (0..dims.height)
            .map(|r| {
                (0..dims.width)
                    .map(|c| {
                        map.slot(r, c)
                            .map(|cref| tree.text_content(cref.cell))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    fn pasted(height: usize, width: usize) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let grid = GridSpec::filled(height, width, |r, c| format!("p{r}{c}")).build(&mut tree);
        (tree, grid)
    }

    #[test]
    fn test_same_size_paste_replaces_cells() {
        let mut tree = Tree::new();
        let grid = GridSpec::filled(2, 3, |r, c| format!("d{r}{c}")).build(&mut tree);
        let selection = select(&tree, grid, &["d01", "d02", "d11", "d12"]);
        let (source, pasted_grid) = pasted(2, 2);

        let result = GridTransplantEngine::default()
            .transplant(&mut tree, &source, pasted_grid, &selection, &mut PassThrough)
            .unwrap()
            .unwrap();

        assert_eq!(result.rectangle, SelectionRectangle::new(0, 1, 1, 2));
        assert_eq!(result.cells.len(), 4);
        assert_eq!(
            rows_of_text(&tree, grid),
            vec![vec!["d00", "p00", "p01"], vec!["d10", "p10", "p11"]]
        );
    }

    #[test]
    fn test_single_cell_tiles_over_selection() {
        let mut tree = Tree::new();
        let grid = GridSpec::filled(2, 2, |r, c| format!("d{r}{c}")).build(&mut tree);
        let selection = select(&tree, grid, &["d00", "d01", "d10", "d11"]);
        let (source, pasted_grid) = pasted(1, 1);

        let result = GridTransplantEngine::default()
            .transplant(&mut tree, &source, pasted_grid, &selection, &mut PassThrough)
            .unwrap()
            .unwrap();

        assert_eq!(result.cells.len(), 4);
        assert_eq!(
            rows_of_text(&tree, grid),
            vec![vec!["p00", "p00"], vec!["p00", "p00"]]
        );
    }

    #[test]
    fn test_tiling_off_clamps_selection() {
        let mut tree = Tree::new();
        let grid = GridSpec::filled(2, 2, |r, c| format!("d{r}{c}")).build(&mut tree);
        let selection = select(&tree, grid, &["d00", "d01", "d10", "d11"]);
        let (source, pasted_grid) = pasted(1, 1);
        let engine = GridTransplantEngine::new(TransplantOptions {
            tile: false,
            ..TransplantOptions::default()
        });

        let result = engine
            .transplant(&mut tree, &source, pasted_grid, &selection, &mut PassThrough)
            .unwrap()
            .unwrap();

        assert_eq!(result.cells.len(), 1);
        assert_eq!(
            rows_of_text(&tree, grid),
            vec![vec!["p00", "d01"], vec!["d10", "d11"]]
        );
    }

    #[test]
    fn test_single_cell_paste_grows_grid() {
        let mut tree = Tree::new();
        let grid = GridSpec::filled(2, 2, |r, c| format!("d{r}{c}")).build(&mut tree);
        let selection = select(&tree, grid, &["d11"]);
        let (source, pasted_grid) = pasted(2, 2);

        GridTransplantEngine::default()
            .transplant(&mut tree, &source, pasted_grid, &selection, &mut PassThrough)
            .unwrap()
            .unwrap();

        let map = GridMap::build(&tree, grid).unwrap();
        assert_eq!(map.dimensions(), GridDimensions::new(3, 3));
        assert_eq!(
            rows_of_text(&tree, grid),
            vec![
                vec!["d00", "d01", ""],
                vec!["d10", "p00", "p01"],
                vec!["", "p10", "p11"],
            ]
        );
    }

    #[test]
    fn test_pasted_span_is_trimmed_to_selection() {
        let mut tree = Tree::new();
        let grid = GridSpec::filled(2, 2, |r, c| format!("d{r}{c}")).build(&mut tree);
        let selection = select(&tree, grid, &["d00", "d01"]);
        let mut source = Tree::new();
        let pasted_grid = GridSpec::new(vec![vec![cell("tall").rows(2).cols(2)], vec![]])
            .build(&mut source);

        let result = GridTransplantEngine::default()
            .transplant(&mut tree, &source, pasted_grid, &selection, &mut PassThrough)
            .unwrap()
            .unwrap();

        assert_eq!(result.cells.len(), 1);
        assert_eq!(tree.spans(result.cells[0]), Some((1, 2)));
        assert_eq!(
            rows_of_text(&tree, grid),
            vec![vec!["tall", "tall"], vec!["d10", "d11"]]
        );
    }

    #[test]
    fn test_empty_selection_is_nothing_to_do() {
        let mut tree = Tree::new();
        let (source, pasted_grid) = pasted(1, 1);

        let result = GridTransplantEngine::default().transplant(
            &mut tree,
            &source,
            pasted_grid,
            &[],
            &mut PassThrough,
        );

        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_empty_pasted_grid_is_rejected() {
        let mut tree = Tree::new();
        let grid = GridSpec::filled(1, 1, |_, _| "d".into()).build(&mut tree);
        let selection = select(&tree, grid, &["d"]);
        let mut source = Tree::new();
        let empty = GridSpec::new(Vec::new()).build(&mut source);

        let result = GridTransplantEngine::default().transplant(
            &mut tree,
            &source,
            empty,
            &selection,
            &mut PassThrough,
        );

        assert_eq!(result, Err(ClipboardError::EmptyGrid(empty)));
    }

    struct Stamp;

    impl SlotHook for Stamp {
        fn replace_slot(
            &mut self,
            tree: &mut Tree,
            slot: &GridSlot,
            incoming: Option<NodeId>,
        ) -> Option<NodeId> {
            let cell = incoming?;
            tree.set_attribute(cell, "pasted-at", format!("{},{}", slot.row, slot.column));
            Some(cell)
        }
    }

    #[test]
    fn test_hook_sees_every_inserted_cell() {
        let mut tree = Tree::new();
        let grid = GridSpec::filled(1, 2, |r, c| format!("d{r}{c}")).build(&mut tree);
        let selection = select(&tree, grid, &["d00", "d01"]);
        let (source, pasted_grid) = pasted(1, 1);

        let result = GridTransplantEngine::default()
            .transplant(&mut tree, &source, pasted_grid, &selection, &mut Stamp)
            .unwrap()
            .unwrap();

        let stamps: Vec<&str> = result
            .cells
            .iter()
            .filter_map(|&c| tree.attribute(c, "pasted-at"))
            .collect();
        assert_eq!(stamps, vec!["0,0", "0,1"]);
        assert!(result.cells.iter().all(|&c| tree.kind(c).is_cell()));
        assert!(matches!(tree.kind(grid), NodeKind::Grid { .. }));
    }
}
