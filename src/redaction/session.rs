//! Document session abstraction.
//!
//! The redaction core never talks to a PDF library directly. A backend opens
//! documents into sessions; a session exposes pages as span models and
//! accepts removal marks.

use crate::domain::{Rect, SpanTextModel};
use crate::error::RedactorResult;
use std::path::Path;

/// Serialization options passed to [`DocumentSession::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Drop unreferenced objects and compact the xref.
    pub garbage_collect: bool,
    /// Deflate uncompressed streams.
    pub deflate: bool,
    /// Clean and sanitize content streams.
    pub clean: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            garbage_collect: true,
            deflate: true,
            clean: true,
        }
    }
}

/// An open document. Page indices are 0-based. Closing happens on drop.
pub trait DocumentSession {
    fn page_count(&self) -> RedactorResult<usize>;

    /// Fresh snapshot of the page's text layout.
    fn extract_spans(&self, page_index: usize) -> RedactorResult<SpanTextModel>;

    /// Queues `rect` for removal on the page. Nothing changes until
    /// [`commit_marks`](Self::commit_marks) is called for that page.
    fn mark_for_removal(&mut self, page_index: usize, rect: Rect) -> RedactorResult<()>;

    /// Applies every queued mark on the page, returning how many were
    /// applied.
    fn commit_marks(&mut self, page_index: usize) -> RedactorResult<usize>;

    fn save(&mut self, path: &Path, options: SaveOptions) -> RedactorResult<()>;
}

/// Opens documents into sessions.
pub trait DocumentBackend: Send + Sync {
    fn open(&self, path: &Path) -> RedactorResult<Box<dyn DocumentSession>>;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &str;
}
