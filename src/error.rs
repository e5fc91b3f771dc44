//! Error types for the PDF redaction library.
//!
//! Every fault a run can hit is categorized here. Only pattern compilation
//! faults are recovered locally; everything else terminates the run.

use crate::domain::PatternDiagnostic;
use std::io;
use std::path::PathBuf;

/// Result type alias for redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Comprehensive error type for all redaction operations.
#[derive(Debug, thiserror::Error)]
pub enum RedactorError {
    /// The source document does not exist
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// A regex pattern failed to compile
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The document library refused to open the file
    #[error("Failed to open PDF '{}': {message}", path.display())]
    DocumentOpen {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Serializing the redacted document failed
    #[error("Failed to save PDF '{}': {message}", path.display())]
    DocumentSave {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Page-level failure while extracting, marking or committing
    #[error("{}", format_processing(message, *page))]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The optimizer ran but exited with a status outside the accepted set
    #[error("{}", format_optimizer(*status, stderr))]
    Optimizer { status: Option<i32>, stderr: String },

    /// The optimizer binary could not be located
    #[error(
        "{binary} not found. Please install qpdf:\n  macOS: brew install qpdf\n  Ubuntu: sudo apt-get install qpdf"
    )]
    OptimizerNotFound { binary: String },

    /// The user cancelled the run
    #[error("Operation cancelled by user")]
    Interrupted,

    /// Invalid configuration or parameters
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Configuration file could not be read, parsed or validated
    #[error("Configuration error for '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn format_processing(message: &str, page: Option<usize>) -> String {
    match page {
        Some(p) => format!("PDF processing error on page {}: {}", p, message),
        None => format!("PDF processing error: {}", message),
    }
}

fn format_optimizer(status: Option<i32>, stderr: &str) -> String {
    let status = match status {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    };
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("qpdf failed ({})", status)
    } else {
        format!("qpdf failed ({}): {}", status, stderr)
    }
}

impl RedactorError {
    /// Returns true when the fault only affects one pattern and the run can
    /// continue without it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<PatternDiagnostic> for RedactorError {
    fn from(diagnostic: PatternDiagnostic) -> Self {
        Self::InvalidPattern {
            pattern: diagnostic.pattern,
            reason: diagnostic.reason,
        }
    }
}
