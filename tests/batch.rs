//! End-to-end batch tests against a temporary corpus.
//!
//! These tests exercise the real driver: directory layout creation,
//! classification of unreadable inputs, manifest commit, and skip-on-rerun
//! semantics. They need a pdfium library to bind against and skip
//! gracefully when none is installed (CI without the shared library).

use pdf2tables::{bind_pdfium, run_batch, ExtractionConfig, ManifestStore};
use std::path::{Path, PathBuf};

/// Skip this test unless a pdfium library can be bound.
macro_rules! skip_unless_pdfium {
    () => {
        if bind_pdfium().is_err() {
            eprintln!("SKIP — no pdfium library available");
            return;
        }
    };
}

fn corpus_config(base: &Path) -> ExtractionConfig {
    ExtractionConfig::builder()
        .base_dir(base)
        .build()
        .unwrap()
}

/// Write a file that claims to be a PDF but is not parseable. The pipeline
/// must treat it conservatively: classification fails → scanned.
fn write_garbage_pdf(input_dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(input_dir).unwrap();
    let path = input_dir.join(name);
    std::fs::write(&path, b"%PDF-1.4 this is not a real pdf body").unwrap();
    path
}

#[test]
fn unreadable_pdf_is_recorded_as_scanned() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let config = corpus_config(dir.path());
    write_garbage_pdf(&config.input_dir, "corrupt_survey.pdf");

    let summary = run_batch(&config, None).unwrap();
    assert_eq!(summary.no_tables, 1);
    assert_eq!(summary.failed, 0);

    let manifest = ManifestStore::new(&config.manifest_path).load().unwrap();
    let entry = &manifest["corrupt_survey"];
    assert!(entry.is_scanned);
    assert_eq!(entry.num_tables, 0);
    assert!(entry.extraction_method.is_none());
    assert!(entry.quality_scores.is_empty());
    // No extraction ran, so no artifacts were produced.
    assert!(entry.saved_files.is_none());
    assert!(!config.json_dir.join("corrupt_survey.json").exists());
}

#[test]
fn second_run_skips_and_leaves_state_unchanged() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let config = corpus_config(dir.path());
    write_garbage_pdf(&config.input_dir, "doc_a.pdf");
    write_garbage_pdf(&config.input_dir, "doc_b.pdf");

    let first = run_batch(&config, None).unwrap();
    assert_eq!(first.skipped, 0);
    assert_eq!(first.no_tables, 2);
    let manifest_bytes = std::fs::read(&config.manifest_path).unwrap();

    let second = run_batch(&config, None).unwrap();
    assert_eq!(second.skipped, 2);
    assert_eq!(second.no_tables, 0);
    // Timestamps inside entries would differ if anything were reprocessed;
    // byte-identical manifest means the run was a true no-op.
    assert_eq!(std::fs::read(&config.manifest_path).unwrap(), manifest_bytes);
}

#[test]
fn force_overwrites_existing_entries() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let mut config = corpus_config(dir.path());
    write_garbage_pdf(&config.input_dir, "doc.pdf");

    run_batch(&config, None).unwrap();
    let before = std::fs::read_to_string(&config.manifest_path).unwrap();

    config.force = true;
    let summary = run_batch(&config, None).unwrap();
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.no_tables, 1);

    // The entry was rebuilt: same shape, fresh timestamp.
    let after = std::fs::read_to_string(&config.manifest_path).unwrap();
    let manifest = ManifestStore::new(&config.manifest_path).load().unwrap();
    assert!(manifest["doc"].is_scanned);
    assert_ne!(before, after);
}

#[test]
fn hidden_files_are_never_processed() {
    // No pdfium needed: an input dir with only hidden files is an empty
    // corpus and the driver returns before binding the engine.
    let dir = tempfile::tempdir().unwrap();
    let config = corpus_config(dir.path());
    write_garbage_pdf(&config.input_dir, ".hidden.pdf");

    let summary = run_batch(&config, None).unwrap();
    assert_eq!(summary.no_tables + summary.with_tables + summary.failed, 0);
    assert!(!config.manifest_path.exists());
}

#[test]
fn output_directories_are_created_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let config = corpus_config(dir.path());
    std::fs::create_dir_all(&config.input_dir).unwrap();

    run_batch(&config, None).unwrap();
    assert!(config.json_dir.is_dir());
    assert!(config.csv_dir.is_dir());
    assert!(config.log_dir.is_dir());
}
