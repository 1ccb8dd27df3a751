use crate::error::Result;
use crate::model::{NodeId, Tree};

use super::map::{CellRef, GridMap};
use super::rectangle::SelectionRectangle;

/// One logical slot of a grid and the cell covering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSlot {
    pub row: usize,
    pub column: usize,
    pub cell: NodeId,
    pub anchor_row: usize,
    pub anchor_column: usize,
    pub row_span: usize,
    pub col_span: usize,
    /// `true` only at the cell's top-left slot
    pub is_anchor: bool,
}

impl GridSlot {
    fn new(row: usize, column: usize, cref: &CellRef) -> Self {
        Self {
            row,
            column,
            cell: cref.cell,
            anchor_row: cref.row,
            anchor_column: cref.column,
            row_span: cref.row_span,
            col_span: cref.col_span,
            is_anchor: cref.row == row && cref.column == column,
        }
    }
}

/// Row-major enumeration of a grid's slots.
///
/// The walker owns a snapshot of the grid layout, so [`GridWalker::slots`]
/// can be called any number of times and always yields the same sequence,
/// even while the tree itself is being edited.
///
/// ```
/// use gridclip_engine::grid::GridWalker;
/// use gridclip_engine::model::{GridSpec, Tree, cell};
///
/// let mut tree = Tree::new();
/// let grid = GridSpec::new(vec![
///     vec![cell("a").cols(2)],
///     vec![cell("c"), cell("d")],
/// ])
/// .build(&mut tree);
///
/// let walker = GridWalker::new(&tree, grid).unwrap();
/// assert_eq!(walker.slots().count(), 3);
/// assert_eq!(walker.include_all_slots(true).slots().count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct GridWalker {
    map: GridMap,
    rectangle: Option<SelectionRectangle>,
    all_slots: bool,
}

impl GridWalker {
    pub fn new(tree: &Tree, grid: NodeId) -> Result<Self> {
        Ok(Self::from_map(GridMap::build(tree, grid)?))
    }

    pub fn from_map(map: GridMap) -> Self {
        Self {
            map,
            rectangle: None,
            all_slots: false,
        }
    }

    /// Restrict the walk to `rectangle`, which must lie inside the grid.
    pub fn within(mut self, rectangle: SelectionRectangle) -> Result<Self> {
        self.map.check(&rectangle)?;
        self.rectangle = Some(rectangle);
        Ok(self)
    }

    /// Yield every covered slot instead of only anchor slots.
    pub fn include_all_slots(mut self, all_slots: bool) -> Self {
        self.all_slots = all_slots;
        self
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn slots(&self) -> Slots<'_> {
        let bounds = self.rectangle.or_else(|| self.map.full_rectangle());
        Slots {
            walker: self,
            bounds,
            row: bounds.map_or(0, |b| b.first_row),
            column: bounds.map_or(0, |b| b.first_column),
        }
    }
}

impl<'a> IntoIterator for &'a GridWalker {
    type Item = GridSlot;
    type IntoIter = Slots<'a>;

    fn into_iter(self) -> Slots<'a> {
        self.slots()
    }
}

/// Iterator returned by [`GridWalker::slots`].
#[derive(Debug, Clone)]
pub struct Slots<'a> {
    walker: &'a GridWalker,
    bounds: Option<SelectionRectangle>,
    row: usize,
    column: usize,
}

impl Iterator for Slots<'_> {
    type Item = GridSlot;

    fn next(&mut self) -> Option<GridSlot> {
        let bounds = self.bounds?;
        while self.row <= bounds.last_row {
            let (row, column) = (self.row, self.column);
            if column >= bounds.last_column {
                self.row += 1;
                self.column = bounds.first_column;
            } else {
                self.column += 1;
            }

            // Ragged rows leave uncovered slots; there is nothing to report there.
            let Some(cref) = self.walker.map.slot(row, column) else {
                continue;
            };
            let slot = GridSlot::new(row, column, cref);
            if self.walker.all_slots || slot.is_anchor {
                return Some(slot);
            }
        }
        None
    }
}
