//! # gridclip-engine
//!
//! Copy, cut and paste of rectangular and irregular regions of
//! spanning-cell grids embedded in a tree document, keeping marker ranges
//! (comment anchors and the like) attached to the content they annotate.
//!
//! ## Modules
//!
//! - **`model`**: arena tree, positions, markers, documents and transactions
//! - **`grid`**: slot geometry, the grid walker and structural edits
//! - **`clipboard`**: classifier, sentinel codec, transplant engine and façade
//! - **`render`**: plain-text previews used by the CLI and snapshot tests

pub mod clipboard;
pub mod error;
pub mod grid;
pub mod model;
pub mod render;

// Re-export key types for easier usage
pub use clipboard::{
    Clipboard, ContentClassifier, CutOutcome, GridTransplantEngine, MarkerConflict,
    MarkerSentinelCodec, PassThrough, PasteOutcome, SlotHook, TransplantOptions,
};
pub use error::{ClipboardError, Result};
pub use grid::{GridDimensions, GridSlot, GridWalker, SelectionRectangle, SelectionRectangularizer};
pub use model::{Document, Fragment, Marker, MarkerRegistry, NodeId, NodeKind, Position, Range, Tree};
