//! # Grid Geometry
//!
//! Slot-level view of spanning-cell grids and the structural edits that
//! keep a selection rectangular.
//!
//! ## Modules
//!
//! - **`map`**: `GridMap` slot occupancy, `CellRef`, `AnchorLookup`
//! - **`walker`**: `GridWalker`, the row-major slot iterator
//! - **`rectangle`**: `SelectionRectangle` and `SelectionRectangularizer`
//! - **`structure`**: split, trim, grow and crop primitives
//!
//! ## Key Invariants
//!
//! - Cells are placed in the first free column of their row, after spans
//!   reaching down from earlier rows
//! - Every slot of a well-formed grid is covered by exactly one cell
//! - After `SelectionRectangularizer::settle` no cell crosses the rectangle

pub mod map;
pub mod rectangle;
pub mod structure;
pub mod walker;

pub use map::{AnchorLookup, CellRef, GridDimensions, GridMap};
pub use rectangle::{
    SelectionBounds, SelectionRectangle, SelectionRectangularizer, locate_selection,
};
pub use walker::{GridSlot, GridWalker, Slots};
