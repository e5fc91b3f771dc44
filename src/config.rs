//! Persisted configuration.
//!
//! Stored as a flat JSON document. Every field is optional on disk; missing
//! fields take their defaults. The configuration supplies default pattern
//! flags, optimizer flags and run options, and is handed to the run
//! explicitly rather than living in global state.

use crate::domain::PatternSpec;
use crate::error::{RedactorError, RedactorResult};
use crate::redaction::{OptimizerFlags, RunOptions};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no path is given.
pub const LOCAL_CONFIG_FILE: &str = "redaction_config.json";

const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

static BUILTIN_PATTERN_SETS: Lazy<IndexMap<String, Vec<String>>> = Lazy::new(|| {
    [
        (
            "email",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        ),
        ("phone", r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b"),
        ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
        (
            "credit_card",
            r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b",
        ),
        ("license_text", r"Licensed to.*"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name.to_string(), vec![pattern.to_string()]))
    .collect()
});

/// Configuration settings for PDF redaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    // Search behavior
    pub case_sensitive: bool,
    pub use_regex: bool,
    pub whole_words_only: bool,

    // Output
    pub output_suffix: String,
    pub create_backup: bool,
    pub backup_suffix: String,

    // Optimizer
    pub compress_streams: bool,
    pub recompress_flate: bool,
    pub optimize_images: bool,
    pub object_streams: bool,
    pub optimizer_binary: String,
    pub allow_unoptimized: bool,

    // Logging
    pub log_level: String,
    pub log_file: Option<PathBuf>,

    // Limits
    pub max_file_size_mb: Option<u64>,
    pub temp_dir: Option<PathBuf>,

    /// Named groups of regexes for common redaction tasks.
    pub pattern_sets: IndexMap<String, Vec<String>>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            use_regex: false,
            whole_words_only: false,
            output_suffix: "_redacted".to_string(),
            create_backup: false,
            backup_suffix: ".backup".to_string(),
            compress_streams: true,
            recompress_flate: true,
            optimize_images: true,
            object_streams: true,
            optimizer_binary: "qpdf".to_string(),
            allow_unoptimized: false,
            log_level: "INFO".to_string(),
            log_file: None,
            max_file_size_mb: None,
            temp_dir: None,
            pattern_sets: BUILTIN_PATTERN_SETS.clone(),
        }
    }
}

impl RedactionConfig {
    /// Loads configuration from a JSON file.
    pub fn from_file(path: &Path) -> RedactorResult<Self> {
        if !path.exists() {
            return Err(RedactorError::Config {
                path: path.to_path_buf(),
                reason: "Config file not found".to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| RedactorError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| RedactorError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Saves configuration as pretty-printed JSON.
    pub fn to_file(&self, path: &Path) -> RedactorResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| RedactorError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, content).map_err(|e| RedactorError::io(path, e))
    }

    /// Places searched when no explicit path is given, in order.
    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            locations.push(cwd.join(LOCAL_CONFIG_FILE));
        }
        if let Some(home) = dirs::home_dir() {
            locations.push(home.join(".pdf_redactor").join("config.json"));
        }
        locations
    }

    /// Loads `path` if given, else the first existing default location,
    /// else the built-in defaults.
    pub fn load(path: Option<&Path>) -> RedactorResult<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_locations().into_iter().find(|p| p.exists()) {
            Some(found) => {
                log::debug!("Using configuration from {}", found.display());
                Self::from_file(&found)
            }
            None => Ok(Self::default()),
        }
    }

    /// Validates configuration settings.
    pub fn validate(&self) -> RedactorResult<()> {
        let invalid = |reason: String| RedactorError::InvalidInput {
            parameter: "config".to_string(),
            reason,
        };

        if !LOG_LEVELS.contains(&self.log_level.to_uppercase().as_str()) {
            return Err(invalid(format!("Invalid log level: {}", self.log_level)));
        }

        if self.max_file_size_mb == Some(0) {
            return Err(invalid("max_file_size_mb must be positive".to_string()));
        }

        if let Some(dir) = &self.temp_dir {
            if !dir.is_dir() {
                return Err(invalid(format!(
                    "Temp directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Looks up a named pattern set.
    pub fn pattern_set(&self, name: &str) -> RedactorResult<&[String]> {
        self.pattern_sets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                let available: Vec<&str> = self.pattern_sets.keys().map(String::as_str).collect();
                RedactorError::InvalidInput {
                    parameter: "pattern_set".to_string(),
                    reason: format!(
                        "Pattern set '{}' not found. Available: {}",
                        name,
                        available.join(", ")
                    ),
                }
            })
    }

    /// Pattern carrying the configured search defaults.
    pub fn pattern_spec(&self, pattern: &str) -> PatternSpec {
        PatternSpec::literal(pattern)
            .with_case_sensitive(self.case_sensitive)
            .with_regex(self.use_regex)
            .with_whole_word(self.whole_words_only)
    }

    pub fn optimizer_flags(&self) -> OptimizerFlags {
        OptimizerFlags {
            compress_streams: self.compress_streams,
            recompress_flate: self.recompress_flate,
            optimize_images: self.optimize_images,
            object_streams: self.object_streams,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            allow_unoptimized: self.allow_unoptimized,
            temp_dir: self.temp_dir.clone(),
            max_file_size_mb: self.max_file_size_mb,
            backup_suffix: self
                .create_backup
                .then(|| self.backup_suffix.clone()),
        }
    }

    /// Maps the configured level name onto the `log` crate's filter.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.log_level.to_uppercase().as_str() {
            "DEBUG" => log::LevelFilter::Debug,
            "WARNING" => log::LevelFilter::Warn,
            "ERROR" | "CRITICAL" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        }
    }
}
