//! Redaction orchestration.
//!
//! [`RedactionService`] runs one document through
//! `OPENED → PREVIEWING | REDACTING → SAVED_RAW → OPTIMIZED → CLOSED`,
//! with `FAILED` reachable from every non-terminal state. The intermediate
//! uncompressed save lives in a temporary file that is removed on every exit
//! path.

pub mod optimizer;
pub mod planner;
pub mod secure;
pub mod session;

pub use optimizer::{Optimizer, OptimizerFlags, OptimizerStatus, QpdfOptimizer};
pub use planner::{PageRedactionPlanner, PatternReport, RedactionSummary};
pub use secure::{MupdfBackend, MupdfSession};
pub use session::{DocumentBackend, DocumentSession, SaveOptions};

use crate::domain::PatternSpec;
use crate::error::{RedactorError, RedactorResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const MB_DIVISOR: f64 = 1024.0 * 1024.0;

/// States of a single document run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Opened,
    Previewing,
    Redacting,
    SavedRaw,
    Optimized,
    Closed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// Tracks the run state and logs every transition.
#[derive(Debug)]
struct RunTracker {
    state: RunState,
}

impl RunTracker {
    fn opened() -> Self {
        log::debug!("run state: {:?}", RunState::Opened);
        Self {
            state: RunState::Opened,
        }
    }

    fn advance(&mut self, next: RunState) {
        log::debug!("run state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Moves to `FAILED` when `result` is an error.
    fn guard<T>(&mut self, result: RedactorResult<T>) -> RedactorResult<T> {
        if result.is_err() && !self.state.is_terminal() {
            self.advance(RunState::Failed);
        }
        result
    }
}

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Keep the raw save as the output when the optimizer fails.
    pub allow_unoptimized: bool,
    /// Directory for the intermediate file; the output directory when unset.
    pub temp_dir: Option<PathBuf>,
    /// Reject inputs larger than this many megabytes.
    pub max_file_size_mb: Option<u64>,
    /// Copy the input to `<input><suffix>` before redacting.
    pub backup_suffix: Option<String>,
}

/// Outcome of a successful apply run.
#[derive(Debug, Clone, PartialEq)]
pub struct RedactionOutcome {
    pub summary: RedactionSummary,
    pub output: PathBuf,
    /// `None` when the optimizer failed and the raw save was kept.
    pub optimizer_status: Option<OptimizerStatus>,
}

impl RedactionOutcome {
    pub fn is_optimized(&self) -> bool {
        self.optimizer_status.is_some()
    }
}

/// Input and output file sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeReport {
    pub original_mb: f64,
    pub final_mb: f64,
    /// Signed percentage change relative to the original.
    pub change_percent: f64,
}

impl SizeReport {
    pub fn measure(input: &Path, output: &Path) -> RedactorResult<Self> {
        let original = file_len(input)?;
        let final_size = file_len(output)?;
        Ok(Self::from_bytes(original, final_size))
    }

    pub fn from_bytes(original: u64, final_size: u64) -> Self {
        let change_percent = if original == 0 {
            0.0
        } else {
            (final_size as f64 - original as f64) / original as f64 * 100.0
        };
        Self {
            original_mb: original as f64 / MB_DIVISOR,
            final_mb: final_size as f64 / MB_DIVISOR,
            change_percent,
        }
    }
}

fn file_len(path: &Path) -> RedactorResult<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| RedactorError::io(path, e))
}

/// `<stem><suffix><.ext>` next to `input`.
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    input.with_file_name(format!("{}{}{}", stem, suffix, extension))
}

/// Redaction service coordinating document backend, planner and optimizer.
pub struct RedactionService {
    backend: Box<dyn DocumentBackend>,
    optimizer: Box<dyn Optimizer>,
    options: RunOptions,
    cancel: Arc<AtomicBool>,
    show_progress: bool,
}

impl RedactionService {
    pub fn new(backend: Box<dyn DocumentBackend>, optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            backend,
            optimizer,
            options: RunOptions::default(),
            cancel: Arc::new(AtomicBool::new(false)),
            show_progress: false,
        }
    }

    /// MuPDF for the document, qpdf for recompression.
    pub fn with_defaults() -> Self {
        Self::new(Box::new(MupdfBackend::new()), Box::new(QpdfOptimizer::new()))
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares a cancellation flag, typically set from a Ctrl-C handler.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    fn planner(&self) -> PageRedactionPlanner {
        let progress = if self.show_progress {
            let pb = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            ) {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };
        PageRedactionPlanner::new()
            .with_cancel_flag(Arc::clone(&self.cancel))
            .with_progress(progress)
    }

    fn validate(&self, input: &Path, patterns: &[PatternSpec]) -> RedactorResult<()> {
        if !input.exists() {
            return Err(RedactorError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        if patterns.is_empty() {
            return Err(RedactorError::InvalidInput {
                parameter: "patterns".to_string(),
                reason: "No redaction patterns specified".to_string(),
            });
        }

        if patterns.iter().any(|p| p.pattern.is_empty()) {
            return Err(RedactorError::InvalidInput {
                parameter: "patterns".to_string(),
                reason: "Empty patterns are not allowed".to_string(),
            });
        }

        if let Some(limit) = self.options.max_file_size_mb {
            let size = file_len(input)?;
            if size as f64 / MB_DIVISOR > limit as f64 {
                return Err(RedactorError::InvalidInput {
                    parameter: "input".to_string(),
                    reason: format!(
                        "File is {:.1} MB, larger than the {} MB limit",
                        size as f64 / MB_DIVISOR,
                        limit
                    ),
                });
            }
        }

        Ok(())
    }

    /// Reports what would be redacted without writing anything.
    pub fn preview(
        &self,
        input: &Path,
        patterns: &[PatternSpec],
    ) -> RedactorResult<RedactionSummary> {
        self.validate(input, patterns)?;
        log::info!("Previewing redactions for: {}", input.display());

        let mut tracker = RunTracker::opened();
        let session = tracker.guard(self.backend.open(input))?;
        tracker.advance(RunState::Previewing);

        let summary = tracker.guard(self.planner().preview(session.as_ref(), patterns))?;
        drop(session);
        tracker.advance(RunState::Closed);
        Ok(summary)
    }

    /// Redacts `patterns` from `input` and writes the optimized result to
    /// `output`. On failure no output file is left behind unless
    /// `allow_unoptimized` kept the raw save.
    pub fn redact(
        &self,
        input: &Path,
        output: &Path,
        patterns: &[PatternSpec],
    ) -> RedactorResult<RedactionOutcome> {
        self.validate(input, patterns)?;
        log::info!("Opening PDF: {}", input.display());

        if let Some(suffix) = &self.options.backup_suffix {
            let backup = PathBuf::from(format!("{}{}", input.display(), suffix));
            fs::copy(input, &backup).map_err(|e| RedactorError::io(&backup, e))?;
            log::info!("Backup written to {}", backup.display());
        }

        let mut tracker = RunTracker::opened();
        let mut session = tracker.guard(self.backend.open(input))?;
        tracker.advance(RunState::Redacting);

        let summary = tracker.guard(self.planner().apply(session.as_mut(), patterns))?;

        let temp = tracker.guard(self.temp_file(output))?;
        log::info!("Applying redactions and optimizing...");
        tracker.guard(session.save(temp.path(), SaveOptions::default()))?;
        drop(session);
        tracker.guard(self.check_cancelled(output))?;
        tracker.advance(RunState::SavedRaw);

        let optimized = self.optimizer.optimize(temp.path(), output);
        tracker.guard(self.check_cancelled(output))?;
        let optimizer_status = match optimized {
            Ok(status) => {
                tracker.advance(RunState::Optimized);
                Some(status)
            }
            Err(err) => {
                remove_partial_output(output);
                if !self.options.allow_unoptimized {
                    return tracker.guard(Err(err));
                }
                log::warn!("{}; keeping unoptimized output", err);
                tracker.guard(
                    fs::copy(temp.path(), output)
                        .map(|_| ())
                        .map_err(|e| RedactorError::io(output, e)),
                )?;
                None
            }
        };

        tracker.advance(RunState::Closed);
        Ok(RedactionOutcome {
            summary,
            output: output.to_path_buf(),
            optimizer_status,
        })
    }

    /// A Ctrl-C after the page loop still ends the run, discarding any
    /// output written so far.
    fn check_cancelled(&self, output: &Path) -> RedactorResult<()> {
        if self.cancel.load(Ordering::SeqCst) {
            remove_partial_output(output);
            return Err(RedactorError::Interrupted);
        }
        Ok(())
    }

    fn temp_file(&self, output: &Path) -> RedactorResult<tempfile::NamedTempFile> {
        let dir = match &self.options.temp_dir {
            Some(dir) => dir.clone(),
            None => output
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(std::env::temp_dir),
        };

        tempfile::Builder::new()
            .prefix(".pdf-scrub-")
            .suffix(".pdf")
            .tempfile_in(&dir)
            .map_err(|e| RedactorError::io(dir, e))
    }
}

fn remove_partial_output(output: &Path) {
    if output.exists() {
        if let Err(e) = fs::remove_file(output) {
            log::warn!(
                "Failed to remove partial output {}: {}",
                output.display(),
                e
            );
        }
    }
}
