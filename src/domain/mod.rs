//! Text-occurrence-to-geometry resolution.
//!
//! Everything in this module is pure: it works on page snapshots handed in
//! by a document session and never touches files or the document library.

pub mod geometry;
pub mod locator;
pub mod matcher;
pub mod pattern;
pub mod span;

pub use geometry::GeometryProjector;
pub use locator::{
    CompiledPattern, LocateOutcome, Occurrence, OccurrenceLocator, PatternDiagnostic,
};
pub use matcher::{CompileOptions, CompiledMatcher, PatternEngine, RegexEngine};
pub use pattern::PatternSpec;
pub use span::{LayoutBlock, LayoutLine, Rect, Span, SpanTextModel};
