//! # Clipboard
//!
//! Copy, cut and paste of grid regions, with marker ranges carried across.
//!
//! ## Modules
//!
//! - **`classify`**: `ContentClassifier`, the lone-grid gate in front of paste
//! - **`sentinel`**: `MarkerSentinelCodec`, markers to sentinel nodes and back
//! - **`transplant`**: `GridTransplantEngine` and the `SlotHook` extension point
//! - **`options`**: `TransplantOptions` and `MarkerConflict`
//! - **`ops`**: the `Clipboard` façade tying the above together
//!
//! ## Key Invariants
//!
//! - Every operation runs inside one document transaction and either commits
//!   whole or leaves the document as it was
//! - No sentinel survives a committed operation
//! - Selection problems are reported before the first edit

pub mod classify;
pub mod ops;
pub mod options;
pub mod sentinel;
pub mod transplant;

pub use classify::ContentClassifier;
pub use ops::{Clipboard, CutOutcome, PasteOutcome};
pub use options::{MarkerConflict, TransplantOptions};
pub use sentinel::{
    Coverage, DecodeMode, DecodedMarker, Decoding, EncodedMarker, MarkerSentinelCodec, Region,
    SentinelMap,
};
pub use transplant::{GridTransplantEngine, PassThrough, SlotHook, Transplanted};
