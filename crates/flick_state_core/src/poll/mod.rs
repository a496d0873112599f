//! Fixed-interval reconciliation loops.
//!
//! # Responsibility
//! - Fire a callback on a fixed period on a dedicated thread.
//! - Detect document content changes between ticks.
//!
//! # Invariants
//! - Ticks of one loop never overlap: a slow callback drops ticks instead
//!   of queueing them.
//! - Dropping a [`PollHandle`] stops its loop.
//! - Staleness is bounded by one interval plus the callback duration.

mod document_watch;
mod schedule;

pub use document_watch::{watch_document, DocumentWatch};
pub use schedule::{PollControl, PollHandle, PollLoop, StartMode};
