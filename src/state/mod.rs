//! State management module
//!
//! This module contains the editing data model:
//! - Section: A page-range slice of a source PDF
//! - Timeline: The packed arrangement of all sections
//! - Cursor: The scrub position and its source-page mapping
//! - HistoryStack: Undo snapshots
//! - EditSession: The single owner of all of the above

mod section;
mod timeline;
mod history;
mod session;
pub mod cursor;
pub mod resize;

pub use section::Section;
pub use timeline::Timeline;
pub use history::HistoryStack;
pub use session::{CommandOutcome, EditSession};
pub use resize::ResizeEdge;
