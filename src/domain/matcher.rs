//! Pattern engines.
//!
//! The locator only needs "compile a pattern, then list its non-overlapping
//! matches in a string". Keeping that behind a trait lets another engine be
//! swapped in without touching occurrence logic.

use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// ASCII word boundary. Non-ASCII characters count as non-word.
const ASCII_WORD_BOUNDARY: &str = r"(?-u:\b)";

/// Compile options understood by every engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub case_insensitive: bool,
    pub whole_word: bool,
}

/// A compiled pattern ready to scan text.
pub trait CompiledMatcher: Send + Sync {
    /// Byte ranges of non-overlapping matches, left to right.
    fn find_ranges(&self, haystack: &str) -> Vec<Range<usize>>;
}

/// Factory for compiled matchers.
pub trait PatternEngine: Send + Sync {
    /// Compiles `pattern`, returning a human-readable reason on failure.
    fn compile(
        &self,
        pattern: &str,
        options: CompileOptions,
    ) -> Result<Box<dyn CompiledMatcher>, String>;

    fn name(&self) -> &str;
}

/// Engine backed by the `regex` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexEngine;

impl RegexEngine {
    pub fn new() -> Self {
        Self
    }

    /// Source actually handed to the regex compiler.
    pub fn effective_pattern(pattern: &str, options: CompileOptions) -> String {
        if options.whole_word {
            format!(
                "{b}(?:{p}){b}",
                b = ASCII_WORD_BOUNDARY,
                p = pattern
            )
        } else {
            pattern.to_string()
        }
    }
}

struct RegexMatcher {
    regex: Regex,
}

impl CompiledMatcher for RegexMatcher {
    fn find_ranges(&self, haystack: &str) -> Vec<Range<usize>> {
        self.regex.find_iter(haystack).map(|m| m.range()).collect()
    }
}

impl PatternEngine for RegexEngine {
    fn compile(
        &self,
        pattern: &str,
        options: CompileOptions,
    ) -> Result<Box<dyn CompiledMatcher>, String> {
        let source = Self::effective_pattern(pattern, options);
        let regex = RegexBuilder::new(&source)
            .case_insensitive(options.case_insensitive)
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Box::new(RegexMatcher { regex }))
    }

    fn name(&self) -> &str {
        "regex"
    }
}
