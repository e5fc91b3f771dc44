//! Projection of character ranges onto span rectangles.
//!
//! Glyph advances are not available at this level, so every character of a
//! span is assumed to take the same share of the span width. Over
//! proportional fonts the result may be wider than the glyphs it covers,
//! which is fine for redaction.

use super::span::{Rect, Span};

/// Maps character offsets within a span to a sub-rectangle of its bbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryProjector;

impl GeometryProjector {
    pub fn new() -> Self {
        Self
    }

    /// Width of one character of `span`, or 0 for an empty span.
    pub fn char_width(span: &Span) -> f32 {
        let len = span.char_len();
        if len == 0 {
            0.0
        } else {
            span.bbox.width() / len as f32
        }
    }

    /// Rectangle covering characters `start..end` of `span`. The full span
    /// height is kept.
    pub fn project(&self, span: &Span, start: usize, end: usize) -> Rect {
        let width = Self::char_width(span);
        let bbox = span.bbox;
        Rect {
            x0: bbox.x0 + start as f32 * width,
            y0: bbox.y0,
            x1: bbox.x0 + end as f32 * width,
            y1: bbox.y1,
        }
    }
}
