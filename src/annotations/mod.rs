//! Annotation module
//!
//! Highlight and underline annotations anchored to page-relative rects.
//!
//! # Features
//!
//! - Geometry mapping from a captured text selection to per-page rects
//! - Ordered annotation store with add, note edits and deletion
//! - Bounded snapshot history for undo

mod geometry;
mod history;
mod store;
mod types;

pub use geometry::{map_selection, PageLayout, ScreenRect, SelectionSnapshot};
pub use history::{HistoryStack, DEFAULT_HISTORY_LIMIT};
pub use store::{AnnotationStore, Mutation};
pub use types::{
    normalize_note, Annotation, AnnotationType, Document, DocumentPatch, DocumentSummary, Rect,
};
