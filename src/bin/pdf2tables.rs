//! CLI binary for pdf2tables.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, renders batch progress, and prints the run summary.
//! All diagnostics go to the log file; the console belongs to the progress
//! bar, matching how long corpus runs are actually watched.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2tables::{
    run_batch, BatchProgressCallback, BatchSummary, ExtractionConfig, ManifestEntry,
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the corpus, one log line per
/// completed document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{prefix:<28} |{bar:50.green/238}| {percent:>3}% [{pos}/{len}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix("Processing PDFs");
        Self { bar }
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, stem: &str, _index: usize, _total: usize) {
        let short: String = stem.chars().take(20).collect();
        self.bar.set_prefix(format!("Processing {short}"));
    }

    fn on_document_skipped(&self, _stem: &str) {
        self.bar.inc(1);
    }

    fn on_document_complete(&self, stem: &str, entry: &ManifestEntry) {
        let line = if let Some(err) = &entry.error {
            format!("  {} {stem}  {}", red("✗"), red(err))
        } else if entry.is_scanned {
            format!("  {} {stem}  {}", dim("•"), dim("scanned, skipped"))
        } else if entry.has_tables {
            format!(
                "  {} {stem}  {} tables  {}",
                green("✓"),
                entry.num_tables,
                dim(&format!("scores {:?}", entry.quality_scores)),
            )
        } else {
            format!("  {} {stem}  {}", dim("•"), dim("no tables"))
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process the default corpus layout (data/extracted → data/tables)
  pdf2tables

  # Reprocess everything, also writing per-table CSV files
  pdf2tables --force --save-csv

  # A different corpus root
  pdf2tables --base-dir /srv/corpus

  # Point directly at an input directory, raising the persistence bar
  pdf2tables /tmp/pdfs --min-quality 0.75

LAYOUT (relative to --base-dir, default "data"):
  extracted/                       input PDFs
  tables/json/{doc}.json           one record per document
  tables/csv/{doc}_table_{n}.csv   flat files (--save-csv)
  tables/logs/table_extraction.log run log
  tables/processed_manifest.json   skip-on-rerun state

BEHAVIOUR:
  Documents with an existing manifest entry are skipped unless --force is
  given. Scanned (image-only) PDFs are recorded and skipped. A run commits
  the manifest once, at the end; an interrupted run loses only that run's
  updates, never earlier state.
"#;

/// Extract quality-scored tables from a directory of PDF files.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2tables",
    version,
    about = "Extract quality-scored tables from PDF corpora",
    long_about = "Extract tables from every PDF in a corpus directory, score each candidate \
grid for structural and content quality, keep only trustworthy tables, and track per-document \
outcomes in a manifest so repeated runs are incremental.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input directory of PDF files. Defaults to {base-dir}/extracted.
    input_dir: Option<PathBuf>,

    /// Corpus root containing the conventional layout.
    #[arg(long, env = "PDF2TABLES_BASE_DIR", default_value = "data")]
    base_dir: PathBuf,

    /// Force reprocessing of all PDFs, ignoring existing manifest entries.
    #[arg(long)]
    force: bool,

    /// Additionally save each accepted table as a CSV file.
    #[arg(long)]
    save_csv: bool,

    /// Minimum quality score for a table to be persisted (0.0–1.0).
    /// Lowers the floor threshold too when set below it.
    #[arg(long, env = "PDF2TABLES_MIN_QUALITY",
          value_parser = parse_quality)]
    min_quality: Option<f64>,

    /// Manifest file path. Defaults to {base-dir}/tables/processed_manifest.json.
    #[arg(long, env = "PDF2TABLES_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Log file path. Defaults to {base-dir}/tables/logs/table_extraction.log.
    #[arg(long, env = "PDF2TABLES_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2TABLES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level logs in the log file.
    #[arg(short, long, env = "PDF2TABLES_VERBOSE")]
    verbose: bool,

    /// Suppress all console output except errors.
    #[arg(short, long, env = "PDF2TABLES_QUIET")]
    quiet: bool,
}

fn parse_quality(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("not a number: '{s}'"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("quality must be within 0.0–1.0, got {v}"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    // ── Logging setup ────────────────────────────────────────────────────
    // Structured lines (timestamp, level, target, message) go to a file;
    // the console carries only the progress bar and the summary.
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log dir {:?}", config.log_dir))?;
    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| config.log_dir.join("table_extraction.log"));
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();

    // ── Run the batch ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress;
    let callback = show_progress.then(CliProgressCallback::new);
    let summary = run_batch(
        &config,
        callback.as_ref().map(|cb| cb as &dyn BatchProgressCallback),
    )
    .context("Batch processing failed")?;

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        println!("\n{}", bold("Processing Summary:"));
        println!("{:<22} {}", "Files with tables:", summary.with_tables);
        println!("{:<22} {}", "Files without tables:", summary.no_tables);
        println!("{:<22} {}", "Skipped files:", summary.skipped);
        if summary.failed > 0 {
            println!("{:<22} {}", "Failed files:", red(&summary.failed.to_string()));
        }
        println!(
            "\n{} {}",
            green("✅"),
            bold(&format!(
                "Processing complete in {:.1}s — details in {}",
                summary.duration_ms as f64 / 1000.0,
                log_path.display()
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .base_dir(&cli.base_dir)
        .force(cli.force)
        .save_csv(cli.save_csv);

    if let Some(dir) = &cli.input_dir {
        builder = builder.input_dir(dir);
    }
    if let Some(path) = &cli.manifest {
        builder = builder.manifest_path(path);
    }
    if let Some(q) = cli.min_quality {
        builder = builder.high_threshold(q);
        // Keep the floor sensible when the caller asks for a very low bar.
        if q < pdf2tables::config::DEFAULT_FLOOR_THRESHOLD {
            builder = builder.floor_threshold(q);
        }
    }

    builder.build().context("Invalid configuration")
}
