//! Pattern specifications.

/// What to look for and how to match it.
///
/// When `is_regex` is false the pattern is a literal: regex metacharacters
/// have no special meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSpec {
    pub pattern: String,
    pub case_sensitive: bool,
    pub is_regex: bool,
    pub whole_word: bool,
}

impl PatternSpec {
    /// Case-sensitive literal pattern.
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_sensitive: true,
            is_regex: false,
            whole_word: false,
        }
    }

    /// Case-sensitive regex pattern.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            is_regex: true,
            ..Self::literal(pattern)
        }
    }

    pub fn with_case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    pub fn with_regex(mut self, value: bool) -> Self {
        self.is_regex = value;
        self
    }

    pub fn with_whole_word(mut self, value: bool) -> Self {
        self.whole_word = value;
        self
    }
}
