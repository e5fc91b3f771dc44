//! Multi-pattern, multi-page redaction planning.
//!
//! Patterns are processed one at a time across every page (pattern-major).
//! Each pattern×page step re-extracts the page so that it always searches
//! the layout left behind by earlier commits.

use super::session::DocumentSession;
use crate::domain::{CompiledPattern, OccurrenceLocator, PatternDiagnostic, PatternSpec};
use crate::error::{RedactorError, RedactorResult};
use indexmap::IndexMap;
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-pattern statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatternReport {
    pub pattern: String,
    pub count: usize,
    /// 1-based page numbers, ascending.
    pub pages: BTreeSet<usize>,
}

/// Aggregate result of a preview or apply run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedactionSummary {
    pub total_instances: usize,
    /// 1-based page numbers, ascending, without duplicates.
    pub pages_affected: BTreeSet<usize>,
    /// Keyed by pattern text, in first-seen order.
    pub per_pattern: IndexMap<String, PatternReport>,
    pub pages_scanned: usize,
    /// Patterns that failed to compile and were skipped.
    pub diagnostics: Vec<PatternDiagnostic>,
}

impl RedactionSummary {
    /// Returns true if any occurrence was found.
    pub fn has_matches(&self) -> bool {
        self.total_instances > 0
    }

    /// Skipped patterns as recoverable errors.
    pub fn pattern_errors(&self) -> impl Iterator<Item = RedactorError> + '_ {
        self.diagnostics.iter().cloned().map(RedactorError::from)
    }

    fn report_mut(&mut self, pattern: &str) -> &mut PatternReport {
        self.per_pattern
            .entry(pattern.to_string())
            .or_insert_with(|| PatternReport {
                pattern: pattern.to_string(),
                ..Default::default()
            })
    }

    fn record(&mut self, pattern: &str, page_number: usize, count: usize) {
        if count == 0 {
            return;
        }
        let report = self.report_mut(pattern);
        report.count += count;
        report.pages.insert(page_number);
        self.total_instances += count;
        self.pages_affected.insert(page_number);
    }
}

/// Drives occurrence location over a whole document.
pub struct PageRedactionPlanner {
    locator: OccurrenceLocator,
    cancel: Option<Arc<AtomicBool>>,
    progress: ProgressBar,
}

impl Default for PageRedactionPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRedactionPlanner {
    pub fn new() -> Self {
        Self::with_locator(OccurrenceLocator::new())
    }

    pub fn with_locator(locator: OccurrenceLocator) -> Self {
        Self {
            locator,
            cancel: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Checks `flag` before every pattern×page step and stops with
    /// [`RedactorError::Interrupted`] once it is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Advances `progress` once per pattern×page step.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Counts occurrences without touching the document.
    pub fn preview(
        &self,
        session: &dyn DocumentSession,
        patterns: &[PatternSpec],
    ) -> RedactorResult<RedactionSummary> {
        let page_count = session.page_count()?;
        self.scan(page_count, patterns, |pattern, page_index| {
            let model = session.extract_spans(page_index)?;
            Ok(self.locator.locate_compiled(&model, pattern).len())
        })
    }

    /// Marks and commits every occurrence, page by page. A failed commit
    /// aborts the whole run.
    pub fn apply(
        &self,
        session: &mut dyn DocumentSession,
        patterns: &[PatternSpec],
    ) -> RedactorResult<RedactionSummary> {
        let page_count = session.page_count()?;
        self.scan(page_count, patterns, |pattern, page_index| {
            let model = session.extract_spans(page_index)?;
            let occurrences = self.locator.locate_compiled(&model, pattern);
            if occurrences.is_empty() {
                return Ok(0);
            }

            for occurrence in &occurrences {
                session.mark_for_removal(page_index, occurrence.bbox)?;
            }
            session.commit_marks(page_index)?;
            Ok(occurrences.len())
        })
    }

    fn scan<F>(
        &self,
        page_count: usize,
        patterns: &[PatternSpec],
        mut visit: F,
    ) -> RedactorResult<RedactionSummary>
    where
        F: FnMut(&CompiledPattern, usize) -> RedactorResult<usize>,
    {
        let mut summary = RedactionSummary {
            pages_scanned: page_count,
            ..Default::default()
        };

        self.progress.set_length((page_count * patterns.len()) as u64);
        self.progress.set_position(0);

        for spec in patterns {
            log::info!("Searching for pattern: '{}'", spec.pattern);
            summary.report_mut(&spec.pattern);

            let compiled = match self.locator.compile(spec) {
                Ok(compiled) => compiled,
                Err(diagnostic) => {
                    log::error!("{}", RedactorError::from(diagnostic.clone()));
                    summary.diagnostics.push(diagnostic);
                    self.progress.inc(page_count as u64);
                    continue;
                }
            };

            let mut pattern_count = 0;
            for page_index in 0..page_count {
                self.check_cancelled()?;
                self.progress.set_message(format!("page {}", page_index + 1));

                let count = visit(&compiled, page_index)?;
                if count > 0 {
                    log::debug!("  Found on page {}: {} instance(s)", page_index + 1, count);
                    summary.record(&spec.pattern, page_index + 1, count);
                    pattern_count += count;
                }
                self.progress.inc(1);
            }
            log::info!("{} instance(s) of '{}'", pattern_count, spec.pattern);
        }

        self.progress.finish_and_clear();
        Ok(summary)
    }

    fn check_cancelled(&self) -> RedactorResult<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(RedactorError::Interrupted),
            _ => Ok(()),
        }
    }
}
