use thiserror::Error;

use crate::grid::{GridDimensions, SelectionRectangle};
use crate::model::NodeId;

/// Contract and consistency failures of the clipboard engine.
///
/// Everything here except [`ClipboardError::SentinelLeak`] is detected
/// before the first destructive step, so an aborted operation leaves the
/// document untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("region {rectangle:?} lies outside the {}x{} grid", dimensions.height, dimensions.width)]
    InvalidRegion {
        rectangle: SelectionRectangle,
        dimensions: GridDimensions,
    },

    #[error("node {0:?} is not a grid cell attached to a grid")]
    NotACell(NodeId),

    #[error("node {0:?} is not a grid")]
    NotAGrid(NodeId),

    #[error("selected cells belong to more than one grid")]
    MixedGrids,

    #[error("pasted grid {0:?} has no cells")]
    EmptyGrid(NodeId),

    #[error("sentinel for marker `{marker}` survived decoding")]
    SentinelLeak { marker: String },
}

pub type Result<T> = std::result::Result<T, ClipboardError>;
