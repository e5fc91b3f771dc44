//! Occurrence location within a page's spans.
//!
//! Matches never cross span boundaries. Offsets are character offsets into
//! the span text, so they stay valid for the uniform-width projection.

use super::geometry::GeometryProjector;
use super::matcher::{CompileOptions, CompiledMatcher, PatternEngine, RegexEngine};
use super::pattern::PatternSpec;
use super::span::{Rect, SpanTextModel};
use std::fmt;

/// One located match of a pattern within a single span.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub span_index: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub bbox: Rect,
}

/// A pattern that could not be compiled. The pattern contributes no
/// occurrences but the run carries on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternDiagnostic {
    pub pattern: String,
    pub reason: String,
}

impl fmt::Display for PatternDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid regex pattern '{}': {}", self.pattern, self.reason)
    }
}

/// Result of a one-shot [`OccurrenceLocator::locate`] call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocateOutcome {
    pub occurrences: Vec<Occurrence>,
    pub diagnostic: Option<PatternDiagnostic>,
}

enum Searcher {
    Literal {
        needle: Vec<char>,
        case_sensitive: bool,
        whole_word: bool,
    },
    Engine(Box<dyn CompiledMatcher>),
}

/// A pattern compiled once and reused across every page of a run.
pub struct CompiledPattern {
    spec: PatternSpec,
    searcher: Searcher,
}

impl CompiledPattern {
    pub fn spec(&self) -> &PatternSpec {
        &self.spec
    }

    /// Character ranges of all hits in `text`, left to right.
    fn char_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.searcher {
            Searcher::Literal {
                needle,
                case_sensitive,
                whole_word,
            } => literal_ranges(text, needle, *case_sensitive, *whole_word),
            Searcher::Engine(matcher) => {
                let mut ranges = Vec::new();
                for range in matcher.find_ranges(text) {
                    if range.is_empty() {
                        continue;
                    }
                    let start = text[..range.start].chars().count();
                    let len = text[range.clone()].chars().count();
                    ranges.push((start, start + len));
                }
                ranges
            }
        }
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Finds pattern occurrences in a [`SpanTextModel`] and projects them to
/// page rectangles. Pure: no I/O, no state between calls.
pub struct OccurrenceLocator {
    engine: Box<dyn PatternEngine>,
    projector: GeometryProjector,
}

impl Default for OccurrenceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl OccurrenceLocator {
    /// Creates a locator using the `regex` crate for regex patterns.
    pub fn new() -> Self {
        Self::with_engine(Box::new(RegexEngine::new()))
    }

    pub fn with_engine(engine: Box<dyn PatternEngine>) -> Self {
        Self {
            engine,
            projector: GeometryProjector::new(),
        }
    }

    /// Prepares `spec` for searching. Only regex patterns can fail.
    pub fn compile(&self, spec: &PatternSpec) -> Result<CompiledPattern, PatternDiagnostic> {
        let searcher = if spec.is_regex {
            let options = CompileOptions {
                case_insensitive: !spec.case_sensitive,
                whole_word: spec.whole_word,
            };
            let matcher = self
                .engine
                .compile(&spec.pattern, options)
                .map_err(|reason| PatternDiagnostic {
                    pattern: spec.pattern.clone(),
                    reason,
                })?;
            Searcher::Engine(matcher)
        } else {
            let needle = if spec.case_sensitive {
                spec.pattern.chars().collect()
            } else {
                spec.pattern.chars().map(fold_case).collect()
            };
            Searcher::Literal {
                needle,
                case_sensitive: spec.case_sensitive,
                whole_word: spec.whole_word,
            }
        };

        Ok(CompiledPattern {
            spec: spec.clone(),
            searcher,
        })
    }

    /// Locates every occurrence of `spec` in `model`, ordered by span index
    /// then start offset. A pattern that fails to compile yields no
    /// occurrences and a diagnostic.
    pub fn locate(&self, model: &SpanTextModel, spec: &PatternSpec) -> LocateOutcome {
        match self.compile(spec) {
            Ok(compiled) => LocateOutcome {
                occurrences: self.locate_compiled(model, &compiled),
                diagnostic: None,
            },
            Err(diagnostic) => LocateOutcome {
                occurrences: Vec::new(),
                diagnostic: Some(diagnostic),
            },
        }
    }

    pub fn locate_compiled(
        &self,
        model: &SpanTextModel,
        pattern: &CompiledPattern,
    ) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();

        for (span_index, span) in model.spans().iter().enumerate() {
            if span.text.is_empty() {
                continue;
            }
            for (start, end) in pattern.char_ranges(&span.text) {
                occurrences.push(Occurrence {
                    span_index,
                    start_offset: start,
                    end_offset: end,
                    bbox: self.projector.project(span, start, end),
                });
            }
        }

        occurrences
    }
}

/// Simple per-character lowercasing. Characters whose lowercase form is
/// longer than one character keep their first one, so offsets stay aligned
/// with the original text.
fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn is_ascii_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Substring scan that restarts one character after each hit, so
/// overlapping hits are all reported.
fn literal_ranges(
    text: &str,
    needle: &[char],
    case_sensitive: bool,
    whole_word: bool,
) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }

    let original: Vec<char> = text.chars().collect();
    let haystack: Vec<char> = if case_sensitive {
        original.clone()
    } else {
        original.iter().copied().map(fold_case).collect()
    };

    let boundary_at = |pos: usize| {
        let before = pos.checked_sub(1).and_then(|i| original.get(i)).copied();
        let after = original.get(pos).copied();
        before.is_some_and(is_ascii_word) != after.is_some_and(is_ascii_word)
    };

    let mut ranges = Vec::new();
    let mut start = 0;
    while start + needle.len() <= haystack.len() {
        let end = start + needle.len();
        let bounded = !whole_word || (boundary_at(start) && boundary_at(end));
        if bounded && haystack[start..end] == *needle {
            ranges.push((start, end));
        }
        start += 1;
    }
    ranges
}
