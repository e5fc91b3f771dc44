//! PDF text redaction with span-level geometry.
//!
//! This library finds literal or regex patterns in the text layout of each
//! page, turns every hit into a rectangle, and has MuPDF physically remove
//! the covered content. The redacted file is then recompressed with `qpdf`.
//!
//! # Features
//!
//! - **Span-level matching**: literal (overlapping substring scan) or regex,
//!   case-insensitive and whole-word variants
//! - **Geometry projection**: character ranges mapped to sub-rectangles of
//!   their span
//! - **Dry runs**: per-pattern counts and affected pages without writing
//! - **Secure removal**: redaction annotations applied with MuPDF, not
//!   visual overlays
//!
//! # Architecture
//!
//! - [`domain`]: pure occurrence location and geometry over page snapshots
//! - [`redaction`]: document sessions, planner, optimizer and the run
//!   orchestration
//! - [`config`]: persisted defaults
//! - [`error`]: error taxonomy
//!
//! # Quick Start
//!
//! ```no_run
//! use pdf_scrub::{PatternSpec, RedactionService};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedactionService::with_defaults();
//!
//! let outcome = service.redact(
//!     Path::new("input.pdf"),
//!     Path::new("output.pdf"),
//!     &[PatternSpec::literal("John Doe")],
//! )?;
//! println!("{} instance(s) removed", outcome.summary.total_instances);
//! # Ok(())
//! # }
//! ```
//!
//! # Examples
//!
//! ## Locating occurrences in a page snapshot
//!
//! ```
//! use pdf_scrub::domain::{OccurrenceLocator, PatternSpec, Rect, Span, SpanTextModel};
//!
//! let page = SpanTextModel::new(vec![Span::new(
//!     "SSN: 123-45-6789 end",
//!     Rect::new(0.0, 0.0, 200.0, 12.0),
//! )]);
//! let outcome = OccurrenceLocator::new().locate(&page, &PatternSpec::regex(r"\d{3}-\d{2}-\d{4}"));
//! assert_eq!(outcome.occurrences.len(), 1);
//! assert_eq!(outcome.occurrences[0].start_offset, 5);
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod redaction;

// Re-exports for convenient access
pub use config::RedactionConfig;
pub use domain::{Occurrence, OccurrenceLocator, PatternSpec, Rect, Span, SpanTextModel};
pub use error::{RedactorError, RedactorResult};
pub use redaction::{
    DocumentBackend, DocumentSession, PageRedactionPlanner, RedactionOutcome, RedactionService,
    RedactionSummary, RunOptions, SizeReport,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_creation() {
        let _service = RedactionService::with_defaults();
    }

    #[test]
    fn test_config_feeds_pattern_specs() {
        let config = RedactionConfig::default();
        let spec = config.pattern_spec("John Doe");
        let page = SpanTextModel::new(vec![Span::new(
            "Contact John Doe",
            Rect::new(0.0, 0.0, 160.0, 10.0),
        )]);
        let outcome = OccurrenceLocator::new().locate(&page, &spec);
        assert_eq!(outcome.occurrences.len(), 1);
        assert_eq!(outcome.occurrences[0].bbox, Rect::new(80.0, 0.0, 160.0, 10.0));
    }
}
