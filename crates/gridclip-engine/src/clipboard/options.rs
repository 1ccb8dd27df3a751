use serde::{Deserialize, Serialize};

/// What happens when a pasted marker's name is already used by the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerConflict {
    /// Register the pasted marker as `name:1`, `name:2`, ...
    #[default]
    Rename,
    /// Move the existing marker to the pasted range.
    Replace,
    /// Keep the existing marker and drop the pasted one.
    Skip,
}

/// Tunables of a grid paste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransplantOptions {
    /// Grow a single selected cell to the size of the pasted grid
    pub expand_single_cell: bool,
    /// Repeat the pasted grid over a larger selection. When off, the
    /// selection is clamped to the pasted size instead.
    pub tile: bool,
    /// Split cells that straddle a heading boundary after pasting
    pub split_headings: bool,
    pub marker_conflict: MarkerConflict,
}

impl Default for TransplantOptions {
    fn default() -> Self {
        Self {
            expand_single_cell: true,
            tile: true,
            split_headings: true,
            marker_conflict: MarkerConflict::Rename,
        }
    }
}
