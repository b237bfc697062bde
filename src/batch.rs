//! The batch driver: a sequential walk over the input corpus.
//!
//! ## Why sequential?
//!
//! Each document's classification, extraction, scoring, and write are fully
//! independent of every other document's, so the corpus is embarrassingly
//! parallel in principle — but the manifest's whole-file load/save
//! discipline means concurrent writers would need external coordination
//! (shard the corpus, merge manifests afterward). So the driver keeps one
//! thread, one pass, one manifest commit; a pathological PDF can stall it
//! indefinitely since no per-document timeout is enforced.
//!
//! ## Failure containment
//!
//! Nothing a single document does propagates out of [`process_document`]:
//! unreadable files classify as scanned, extraction errors yield zero
//! candidates, write failures mark the entry unsuccessful. The driver runs
//! the full list and reports aggregate counts; the log file carries the
//! detail.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::manifest::{ManifestEntry, ManifestStore};
use crate::output::write_document;
use crate::pipeline::classify::classify;
use crate::pipeline::extract::extract_candidates;
use crate::progress::BatchProgressCallback;
use crate::table::{AcceptedTable, Classification, RawTableCandidate};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Aggregate counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Documents that produced at least one accepted table.
    pub with_tables: usize,
    /// Documents processed without accepted tables (including scanned).
    pub no_tables: usize,
    /// Documents skipped because of an existing manifest entry.
    pub skipped: usize,
    /// Documents whose results could not be written.
    pub failed: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
}

impl BatchSummary {
    fn record(&mut self, entry: &ManifestEntry) {
        if entry.error.is_some() {
            self.failed += 1;
        } else if entry.has_tables {
            self.with_tables += 1;
        } else {
            self.no_tables += 1;
        }
    }
}

/// Bind to a pdfium library: a copy next to the binary first, then the
/// system-wide installation.
pub fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{e:?}")))
}

/// Run the full pipeline over every PDF in `config.input_dir`.
///
/// Creates the output directories, loads the manifest, processes documents
/// in name order (skipping those with existing entries unless forced), and
/// commits the manifest once at the end. An empty input directory returns
/// an all-zero summary without touching the manifest.
pub fn run_batch(
    config: &ExtractionConfig,
    progress: Option<&dyn BatchProgressCallback>,
) -> Result<BatchSummary, ExtractError> {
    let start = Instant::now();
    ensure_directories(config)?;

    let documents = list_documents(&config.input_dir)?;
    if documents.is_empty() {
        info!("No PDFs found in '{}'", config.input_dir.display());
        return Ok(BatchSummary::default());
    }

    let pdfium = bind_pdfium()?;
    let store = ManifestStore::new(&config.manifest_path);
    let mut manifest = store.load()?;

    info!(
        "Processing {} documents from '{}' (force={}, save_csv={})",
        documents.len(),
        config.input_dir.display(),
        config.force,
        config.save_csv
    );
    if let Some(cb) = progress {
        cb.on_batch_start(documents.len());
    }

    let mut summary = BatchSummary::default();
    for (index, path) in documents.iter().enumerate() {
        let stem = document_stem(path);

        if manifest.contains_key(&stem) && !config.force {
            summary.skipped += 1;
            if let Some(cb) = progress {
                cb.on_document_skipped(&stem);
            }
            continue;
        }

        if let Some(cb) = progress {
            cb.on_document_start(&stem, index, documents.len());
        }

        let entry = process_document(&pdfium, path, config);
        summary.record(&entry);
        if let Some(cb) = progress {
            cb.on_document_complete(&stem, &entry);
        }
        manifest.insert(stem, entry);
    }

    store.save(&manifest)?;

    summary.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Batch complete: {} with tables, {} without, {} skipped, {} failed in {}ms",
        summary.with_tables, summary.no_tables, summary.skipped, summary.failed, summary.duration_ms
    );
    if let Some(cb) = progress {
        cb.on_batch_complete(&summary);
    }

    Ok(summary)
}

/// Process one document through the full pipeline.
///
/// Infallible by design: every per-document failure mode collapses into the
/// returned [`ManifestEntry`].
pub fn process_document(
    pdfium: &Pdfium,
    path: &Path,
    config: &ExtractionConfig,
) -> ManifestEntry {
    let stem = document_stem(path);

    // Step 1: scanned documents skip extraction entirely.
    if classify(pdfium, path) == Classification::Scanned {
        info!("'{stem}' is image-based; skipping extraction");
        return ManifestEntry::scanned(&stem);
    }

    // Step 2: collect floor-passing candidates (backend ordering inside).
    let candidates = extract_candidates(pdfium, path, config);
    if candidates.is_empty() {
        warn!("No tables extracted from '{stem}' by any backend");
    }

    // Step 3: the stricter persistence gate.
    let accepted = accept_candidates(&candidates, config.high_threshold);

    // Step 4: persist and record.
    if accepted.is_empty() {
        return ManifestEntry::processed(&stem, &accepted, None);
    }
    match write_document(config, &stem, &accepted) {
        Ok(saved) => ManifestEntry::processed(&stem, &accepted, Some(saved)),
        Err(e) => {
            warn!("Failed to save tables for '{stem}': {e}");
            ManifestEntry::write_failed(&stem, &accepted, e.to_string())
        }
    }
}

/// Normalize the candidates that clear the high threshold, assigning
/// 1-based table numbers in candidate order.
///
/// A floor-passing candidate below `high_threshold` is dropped here: it was
/// a legitimate table candidate (it suppressed the fallback backend) but is
/// not trustworthy enough to persist.
fn accept_candidates(
    candidates: &[RawTableCandidate],
    high_threshold: f64,
) -> Vec<AcceptedTable> {
    candidates
        .iter()
        .filter(|c| c.quality_score >= high_threshold)
        .enumerate()
        .map(|(i, c)| AcceptedTable::from_candidate(i + 1, c))
        .collect()
}

/// List the input PDFs in deterministic (name) order, excluding hidden
/// files.
fn list_documents(input_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let entries = std::fs::read_dir(input_dir).map_err(|e| ExtractError::InputDirUnreadable {
        path: input_dir.to_path_buf(),
        source: e,
    })?;

    let mut documents: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            let hidden = p
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            let is_pdf = p
                .extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.eq_ignore_ascii_case("pdf"));
            !hidden && is_pdf && p.is_file()
        })
        .collect();
    documents.sort();
    Ok(documents)
}

fn ensure_directories(config: &ExtractionConfig) -> Result<(), ExtractError> {
    for dir in [&config.json_dir, &config.csv_dir, &config.log_dir] {
        std::fs::create_dir_all(dir).map_err(|e| ExtractError::CreateDirFailed {
            path: dir.clone(),
            source: e,
        })?;
    }
    Ok(())
}

fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
