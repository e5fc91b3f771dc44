//! Post-redaction stream recompression.
//!
//! The final pass shells out to `qpdf`. Exit statuses 0, 2 and 3 all leave a
//! usable output file; anything else is fatal.

use crate::error::{RedactorError, RedactorResult};
use std::io;
use std::path::Path;
use std::process::Command;

/// Flags forwarded to the optimizer binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerFlags {
    pub compress_streams: bool,
    pub recompress_flate: bool,
    pub optimize_images: bool,
    pub object_streams: bool,
}

impl Default for OptimizerFlags {
    fn default() -> Self {
        Self {
            compress_streams: true,
            recompress_flate: true,
            optimize_images: true,
            object_streams: true,
        }
    }
}

impl OptimizerFlags {
    /// Command-line arguments for qpdf, excluding the file paths.
    pub fn to_args(&self) -> Vec<&'static str> {
        let mut args = Vec::new();
        if self.compress_streams {
            args.push("--compress-streams=y");
        }
        if self.recompress_flate {
            args.push("--recompress-flate");
        }
        if self.optimize_images {
            args.push("--optimize-images");
        }
        if self.object_streams {
            args.push("--object-streams=generate");
        }
        args
    }
}

/// Accepted optimizer outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerStatus {
    /// Exit 0.
    Clean,
    /// Exit 2: errors were recovered and the output is still usable.
    RecoverableErrors,
    /// Exit 3: warnings only.
    Warnings,
}

impl OptimizerStatus {
    /// Maps a process exit code to an outcome. `None` means the process was
    /// killed by a signal.
    pub fn from_exit_code(code: Option<i32>, stderr: &str) -> RedactorResult<Self> {
        match code {
            Some(0) => Ok(Self::Clean),
            Some(2) => Ok(Self::RecoverableErrors),
            Some(3) => Ok(Self::Warnings),
            other => Err(RedactorError::Optimizer {
                status: other,
                stderr: stderr.to_string(),
            }),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::RecoverableErrors => 2,
            Self::Warnings => 3,
        }
    }
}

/// Recompresses `input` into `output`.
pub trait Optimizer: Send + Sync {
    fn optimize(&self, input: &Path, output: &Path) -> RedactorResult<OptimizerStatus>;

    fn name(&self) -> &str;
}

/// Runs the external `qpdf` binary.
#[derive(Debug, Clone)]
pub struct QpdfOptimizer {
    binary: String,
    flags: OptimizerFlags,
}

impl Default for QpdfOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl QpdfOptimizer {
    pub fn new() -> Self {
        Self {
            binary: "qpdf".to_string(),
            flags: OptimizerFlags::default(),
        }
    }

    /// Uses a different binary name or path.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_flags(mut self, flags: OptimizerFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn flags(&self) -> OptimizerFlags {
        self.flags
    }
}

impl Optimizer for QpdfOptimizer {
    fn optimize(&self, input: &Path, output: &Path) -> RedactorResult<OptimizerStatus> {
        log::debug!(
            "Running {} {:?} {} {}",
            self.binary,
            self.flags.to_args(),
            input.display(),
            output.display()
        );

        let result = Command::new(&self.binary)
            .args(self.flags.to_args())
            .arg(input)
            .arg(output)
            .output()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    RedactorError::OptimizerNotFound {
                        binary: self.binary.clone(),
                    }
                } else {
                    RedactorError::io(&self.binary, e)
                }
            })?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        match OptimizerStatus::from_exit_code(result.status.code(), &stderr) {
            Ok(status) => {
                let message = match status {
                    OptimizerStatus::Clean => "qpdf optimization completed successfully",
                    OptimizerStatus::Warnings => "qpdf optimization completed with warnings",
                    OptimizerStatus::RecoverableErrors => {
                        "qpdf encountered recoverable errors but completed"
                    }
                };
                log::info!("{}", message);
                Ok(status)
            }
            Err(e) => {
                log::error!("qpdf failed: {}", stderr.trim());
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "qpdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_exit_codes() {
        assert_eq!(
            OptimizerStatus::from_exit_code(Some(0), "").unwrap(),
            OptimizerStatus::Clean
        );
        assert_eq!(
            OptimizerStatus::from_exit_code(Some(2), "").unwrap(),
            OptimizerStatus::RecoverableErrors
        );
        assert_eq!(
            OptimizerStatus::from_exit_code(Some(3), "").unwrap(),
            OptimizerStatus::Warnings
        );
    }

    #[test]
    fn test_rejected_exit_codes() {
        for code in [Some(1), Some(4), Some(127), None] {
            let err = OptimizerStatus::from_exit_code(code, "boom").unwrap_err();
            match err {
                RedactorError::Optimizer { status, stderr } => {
                    assert_eq!(status, code);
                    assert_eq!(stderr, "boom");
                }
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn test_default_flags_to_args() {
        assert_eq!(
            OptimizerFlags::default().to_args(),
            vec![
                "--compress-streams=y",
                "--recompress-flate",
                "--optimize-images",
                "--object-streams=generate",
            ]
        );
    }

    #[test]
    fn test_disabled_flags_are_omitted() {
        let flags = OptimizerFlags {
            optimize_images: false,
            object_streams: false,
            ..Default::default()
        };
        assert_eq!(
            flags.to_args(),
            vec!["--compress-streams=y", "--recompress-flate"]
        );
    }

    #[test]
    fn test_missing_binary_is_distinct_fault() {
        let optimizer = QpdfOptimizer::new().with_binary("qpdf-binary-that-does-not-exist");
        let dir = tempfile::TempDir::new().unwrap();
        let err = optimizer
            .optimize(&dir.path().join("in.pdf"), &dir.path().join("out.pdf"))
            .unwrap_err();
        assert!(matches!(err, RedactorError::OptimizerNotFound { .. }));
    }
}
