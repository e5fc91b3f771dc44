//! Normalized text layout for a single page.
//!
//! Layout extractors hand back a tree of blocks, lines and spans. The
//! redaction core only ever needs the spans in reading order, so the tree is
//! flattened once here and non-text blocks are dropped in the same pass.

/// Axis-aligned rectangle in page space, `(x0, y0)` top-left and `(x1, y1)`
/// bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Creates a rectangle, swapping coordinates so that `x1 >= x0` and
    /// `y1 >= y0` always hold.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Minimal text run sharing one bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bbox: Rect,
}

impl Span {
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }

    /// Length of the span text in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A line of spans as produced by a layout extractor.
#[derive(Debug, Clone, Default)]
pub struct LayoutLine {
    pub spans: Vec<Span>,
}

/// One block of a page layout tree.
#[derive(Debug, Clone)]
pub enum LayoutBlock {
    Text { lines: Vec<LayoutLine> },
    /// Images, vector graphics and anything else without text lines.
    Other,
}

/// Ordered spans of one page, in the reading order supplied by the
/// extractor.
///
/// A model is a snapshot of one extraction call. Pages are re-extracted
/// after each round of committed redactions instead of being cached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanTextModel {
    spans: Vec<Span>,
}

impl SpanTextModel {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Flattens a block → line → span tree, skipping non-text blocks.
    pub fn from_blocks<I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = LayoutBlock>,
    {
        let spans = blocks
            .into_iter()
            .filter_map(|block| match block {
                LayoutBlock::Text { lines } => Some(lines),
                LayoutBlock::Other => None,
            })
            .flatten()
            .flat_map(|line| line.spans)
            .collect();
        Self { spans }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn get(&self, index: usize) -> Option<&Span> {
        self.spans.get(index)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Page text with one span per line, for diagnostics.
    pub fn plain_text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<Span> for SpanTextModel {
    fn from_iter<T: IntoIterator<Item = Span>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
