//! # pdf2tables
//!
//! Extract tabular data from heterogeneous PDF corpora, discard
//! low-confidence extractions automatically, and persist results so repeated
//! runs are incremental rather than full re-scans.
//!
//! ## Why quality arbitration?
//!
//! PDF table extractors are optimistic: anything grid-shaped — column layout
//! artifacts, forms, cover-page decorations — comes back as a "table".
//! Instead of trusting any single backend, this crate scores every candidate
//! grid with a multi-factor Table Quality Score (TQS) and lets two
//! thresholds arbitrate: a floor below which a grid is not a table at all,
//! and a stricter bar a table must clear to be persisted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF corpus
//!  │
//!  ├─ 1. Manifest  skip documents processed by an earlier run
//!  ├─ 2. Classify  text-bearing vs. scanned (two-page text sample)
//!  ├─ 3. Extract   structured backend, geometric fallback (lattice, stream)
//!  ├─ 4. Score     TQS per grid; floor threshold filters inline
//!  ├─ 5. Accept    high threshold gates persistence
//!  ├─ 6. Normalize ragged grids become rectangular tables
//!  └─ 7. Output    per-document JSON record (+ optional CSVs) + manifest
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2tables::{run_batch, ExtractionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .input_dir("data/extracted")
//!         .save_csv(true)
//!         .build()?;
//!     let summary = run_batch(&config, None)?;
//!     println!(
//!         "{} documents with tables, {} skipped",
//!         summary.with_tables, summary.skipped
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2tables` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2tables = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod score;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{bind_pdfium, process_document, run_batch, BatchSummary};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractError;
pub use manifest::{Manifest, ManifestEntry, ManifestStore};
pub use output::{DocumentRecord, SavedFiles, TableRecord};
pub use pipeline::normalize::normalize_grid;
pub use progress::{BatchProgressCallback, NoopProgressCallback};
pub use score::{score_grid, ContentStats};
pub use table::{AcceptedTable, Classification, ExtractionMethod, RawGrid, RawTableCandidate};
