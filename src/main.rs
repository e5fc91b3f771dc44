//! PDF Redaction CLI Application.
//!
//! Redacts literal or regex patterns from a PDF, then recompresses the result
//! with qpdf. Exit code 0 on success (including when nothing matched), 1 on
//! any fault or interruption.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pdf_scrub::redaction::{default_output_path, MupdfBackend, QpdfOptimizer};
use pdf_scrub::{
    PatternSpec, RedactionConfig, RedactionService, RedactionSummary, RedactorError, SizeReport,
};

const EXAMPLES: &str = "\
Examples:
  pdf-scrub document.pdf \"John Doe\"
  pdf-scrub -o output.pdf document.pdf \"Licensed to.*\" --regex
  pdf-scrub --regex --case-insensitive document.pdf \"confidential\"
  pdf-scrub --pattern-set ssn --pattern-set email document.pdf
  pdf-scrub --dry-run document.pdf \"pattern1\" \"pattern2\"";

/// Redact text from PDF files with optimization
#[derive(Parser, Debug)]
#[command(name = "pdf-scrub")]
#[command(version, about, long_about = None, after_help = EXAMPLES)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "INPUT_FILE", required_unless_present = "save_config")]
    input_file: Option<PathBuf>,

    /// Text patterns to redact
    #[arg(value_name = "PATTERNS")]
    patterns: Vec<String>,

    /// Output file (default: <input>_redacted.pdf)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Treat patterns as regular expressions
    #[arg(long)]
    regex: bool,

    /// Perform case-insensitive matching
    #[arg(long)]
    case_insensitive: bool,

    /// Match whole words only
    #[arg(long)]
    whole_words: bool,

    /// Show what would be redacted without making changes
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,

    /// Configuration file (default: ./redaction_config.json, then ~/.pdf_redactor/config.json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Add a named pattern set from the configuration (can be repeated)
    #[arg(long, value_name = "NAME")]
    pattern_set: Vec<String>,

    /// Keep the unoptimized output if qpdf fails
    #[arg(long)]
    allow_unoptimized: bool,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    fn effective_config(&self, mut config: RedactionConfig) -> RedactionConfig {
        if self.case_insensitive {
            config.case_sensitive = false;
        }
        if self.regex {
            config.use_regex = true;
        }
        if self.whole_words {
            config.whole_words_only = true;
        }
        if self.allow_unoptimized {
            config.allow_unoptimized = true;
        }
        config
    }

    /// `--verbose` only affects this run and is never persisted.
    fn apply_verbosity(&self, mut config: RedactionConfig) -> RedactionConfig {
        if self.verbose {
            config.log_level = "DEBUG".to_string();
        }
        config
    }
}

/// Builds the pattern list: positional patterns with the configured flags,
/// then named sets, which are always regexes.
fn build_patterns(
    config: &RedactionConfig,
    patterns: &[String],
    pattern_sets: &[String],
) -> Result<Vec<PatternSpec>> {
    let mut specs: Vec<PatternSpec> = patterns.iter().map(|p| config.pattern_spec(p)).collect();

    for name in pattern_sets {
        let set = config.pattern_set(name)?;
        specs.extend(set.iter().map(|p| config.pattern_spec(p).with_regex(true)));
    }

    if specs.is_empty() {
        anyhow::bail!("No patterns specified. Pass PATTERNS or --pattern-set.");
    }

    Ok(specs)
}

fn init_logging(config: &RedactionConfig) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(config.log_level_filter())
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()));

    if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("Failed to initialize logging")?;
    Ok(())
}

/// Redaction command handler with dependency injection.
struct RedactionHandler {
    service: RedactionService,
}

impl RedactionHandler {
    fn new(config: &RedactionConfig, show_progress: bool, cancel: Arc<AtomicBool>) -> Self {
        let optimizer = QpdfOptimizer::new()
            .with_binary(config.optimizer_binary.clone())
            .with_flags(config.optimizer_flags());
        let service = RedactionService::new(Box::new(MupdfBackend::new()), Box::new(optimizer))
            .with_options(config.run_options())
            .with_cancel_flag(cancel)
            .with_progress(show_progress);
        Self { service }
    }

    fn preview(&self, input: &Path, patterns: &[PatternSpec]) -> Result<()> {
        log::info!("DRY RUN MODE - No changes will be made");
        let summary = self.service.preview(input, patterns)?;

        log::info!("Preview Results:");
        for report in summary.per_pattern.values() {
            log::info!(
                "  Pattern '{}': {} instances on pages {:?}",
                report.pattern,
                report.count,
                report.pages
            );
        }
        log::info!(
            "Total instances that would be redacted: {}",
            summary.total_instances
        );
        log::info!("Pages that would be affected: {:?}", summary.pages_affected);
        report_diagnostics(&summary);

        if !summary.has_matches() {
            log::warn!("No instances found to redact");
        }
        Ok(())
    }

    fn redact(&self, input: &Path, output: &Path, patterns: &[PatternSpec]) -> Result<()> {
        let outcome = self.service.redact(input, output, patterns)?;
        let summary = &outcome.summary;

        for report in summary.per_pattern.values() {
            log::info!("Redacted {} instances of '{}'", report.count, report.pattern);
        }
        log::info!("Total instances redacted: {}", summary.total_instances);
        report_diagnostics(summary);

        if !summary.has_matches() {
            log::warn!("No instances found to redact");
        }
        if !outcome.is_optimized() {
            log::warn!("Output was not optimized");
        }

        let sizes = SizeReport::measure(input, output)?;
        log::info!("Original size: {:.1} MB", sizes.original_mb);
        log::info!("Final size: {:.1} MB", sizes.final_mb);
        log::info!("Size change: {:+.1}%", sizes.change_percent);

        if summary.has_matches() {
            println!(
                "✓ Successfully redacted {} instance(s) → {}",
                summary.total_instances,
                output.display()
            );
        } else {
            println!("⚠ No instances found to redact");
        }
        log::info!("Redaction completed: {}", output.display());
        Ok(())
    }
}

fn report_diagnostics(summary: &RedactionSummary) {
    for err in summary.pattern_errors() {
        log::warn!("Skipped pattern: {}", err);
    }
}

fn run(cli: &Cli, config: &RedactionConfig, cancel: Arc<AtomicBool>) -> Result<()> {
    config.validate()?;

    let input = cli
        .input_file
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("INPUT_FILE is required"))?;
    let patterns = build_patterns(config, &cli.patterns, &cli.pattern_set)?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, &config.output_suffix));

    log::info!("Processing: {}", input.display());
    log::info!(
        "Patterns to redact: {:?}",
        patterns.iter().map(|p| p.pattern.as_str()).collect::<Vec<_>>()
    );
    log::info!("Output will be: {}", output.display());

    let handler = RedactionHandler::new(config, !cli.no_progress, cancel);
    if cli.dry_run {
        handler.preview(input, &patterns)
    } else {
        handler.redact(input, &output, &patterns)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match RedactionConfig::load(cli.config.as_deref()) {
        Ok(config) => cli.effective_config(config),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &cli.save_config {
        return match config.to_file(path) {
            Ok(()) => {
                println!("✓ Configuration written → {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("ERROR: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let config = cli.apply_verbosity(config);
    if let Err(e) = init_logging(&config) {
        eprintln!("ERROR: {:#}", e);
        return ExitCode::FAILURE;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        log::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    match run(&cli, &config, cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<RedactorError>() {
                Some(RedactorError::Interrupted) => log::info!("Operation cancelled by user"),
                _ => log::error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
