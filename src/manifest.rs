//! The processing manifest: durable per-document outcomes.
//!
//! The manifest is what makes repeated runs incremental: a document with an
//! entry is skipped unless the run is forced. Its consistency model is
//! deliberately simple — single writer, whole-file replace:
//!
//! * `load()` reads the entire file once at run start (missing file ⇒ empty
//!   manifest, the first-run case);
//! * the batch driver mutates an in-memory working copy;
//! * `save()` atomically replaces the file once at run end.
//!
//! A crash mid-run therefore loses that run's updates but can never corrupt
//! prior runs' entries — the last complete write wins. There is no locking
//! or merge logic; concurrent writers must shard the corpus and merge
//! manifests externally.

use crate::error::ExtractError;
use crate::output::SavedFiles;
use crate::table::{AcceptedTable, ExtractionMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// The in-memory manifest: document stem → last processing outcome.
///
/// `BTreeMap` keeps serialization order stable across runs, so an unchanged
/// corpus produces a byte-identical manifest file.
pub type Manifest = BTreeMap<String, ManifestEntry>;

/// One document's last processing outcome.
///
/// Invariant: `is_scanned == true` implies `num_tables == 0` and
/// `extraction_method == None`. Use the constructors, which enforce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    /// ISO-8601 processing timestamp.
    pub processed_date: String,
    pub is_scanned: bool,
    pub has_tables: bool,
    pub num_tables: usize,
    pub extraction_method: Option<ExtractionMethod>,
    pub quality_scores: Vec<f64>,
    pub saved_files: Option<SavedFiles>,
    pub success: bool,
    /// Retained message when the document failed (e.g. a write error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ManifestEntry {
    fn base(stem: &str) -> Self {
        Self {
            filename: stem.to_string(),
            processed_date: chrono::Utc::now().to_rfc3339(),
            is_scanned: false,
            has_tables: false,
            num_tables: 0,
            extraction_method: None,
            quality_scores: Vec::new(),
            saved_files: None,
            success: false,
            error: None,
        }
    }

    /// Entry for a scanned (image-based) document: extraction never ran.
    pub fn scanned(stem: &str) -> Self {
        Self {
            is_scanned: true,
            ..Self::base(stem)
        }
    }

    /// Entry for a text-bearing document processed to completion.
    ///
    /// `tables` may be empty — a document whose candidates all missed the
    /// high threshold is a success with `has_tables = false`.
    pub fn processed(stem: &str, tables: &[AcceptedTable], saved_files: Option<SavedFiles>) -> Self {
        Self {
            has_tables: !tables.is_empty(),
            num_tables: tables.len(),
            extraction_method: tables.first().map(|t| t.method),
            quality_scores: tables.iter().map(|t| t.quality_score).collect(),
            saved_files,
            success: true,
            ..Self::base(stem)
        }
    }

    /// Entry for a document whose accepted tables could not be written.
    ///
    /// The extraction results are recorded for diagnosis, but the entry is
    /// unsuccessful and points at no artifacts.
    pub fn write_failed(stem: &str, tables: &[AcceptedTable], error: String) -> Self {
        Self {
            has_tables: !tables.is_empty(),
            num_tables: tables.len(),
            extraction_method: tables.first().map(|t| t.method),
            quality_scores: tables.iter().map(|t| t.quality_score).collect(),
            error: Some(error),
            ..Self::base(stem)
        }
    }
}

/// Owner of the manifest's durable representation.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest; a missing file is an empty manifest (first run).
    pub fn load(&self) -> Result<Manifest, ExtractError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No manifest at '{}'; starting fresh", self.path.display());
                return Ok(Manifest::new());
            }
            Err(e) => {
                return Err(ExtractError::ManifestRead {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|e| ExtractError::ManifestParse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Atomically replace the manifest on disk (temp file + rename).
    pub fn save(&self, manifest: &Manifest) -> Result<(), ExtractError> {
        let json = serde_json::to_string_pretty(manifest).map_err(|e| {
            ExtractError::ManifestWrite {
                path: self.path.clone(),
                detail: e.to_string(),
            }
        })?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            ExtractError::ManifestWrite {
                path: self.path.clone(),
                detail: e.to_string(),
            }
        })?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| ExtractError::ManifestWrite {
                path: self.path.clone(),
                detail: e.to_string(),
            })?;
        tmp.persist(&self.path)
            .map_err(|e| ExtractError::ManifestWrite {
                path: self.path.clone(),
                detail: e.to_string(),
            })?;

        info!(
            "Manifest saved: {} entries → '{}'",
            manifest.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{AcceptedTable, RawTableCandidate};

    fn accepted(page: u32, score: f64) -> AcceptedTable {
        let candidate = RawTableCandidate {
            page,
            method: ExtractionMethod::Structured,
            grid: vec![
                vec![Some("a".into()), Some("b".into())],
                vec![Some("c".into()), Some("d".into())],
            ],
            quality_score: score,
            extracted_at: "2024-06-01T00:00:00+00:00".into(),
        };
        AcceptedTable::from_candidate(1, &candidate)
    }

    #[test]
    fn scanned_entry_upholds_invariant() {
        let e = ManifestEntry::scanned("survey_2019");
        assert!(e.is_scanned);
        assert_eq!(e.num_tables, 0);
        assert!(e.extraction_method.is_none());
        assert!(e.quality_scores.is_empty());
        assert!(!e.success);
    }

    #[test]
    fn processed_entry_with_no_tables_is_success() {
        let e = ManifestEntry::processed("empty_doc", &[], None);
        assert!(e.success);
        assert!(!e.has_tables);
        assert!(e.extraction_method.is_none());
    }

    #[test]
    fn processed_entry_records_scores_and_method() {
        let tables = vec![accepted(2, 0.96), accepted(4, 0.71)];
        let e = ManifestEntry::processed("rich_doc", &tables, None);
        assert!(e.has_tables);
        assert_eq!(e.num_tables, 2);
        assert_eq!(e.quality_scores, vec![0.96, 0.71]);
        assert_eq!(e.extraction_method, Some(ExtractionMethod::Structured));
    }

    #[test]
    fn missing_manifest_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("processed_manifest.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("processed_manifest.json"));

        let mut manifest = Manifest::new();
        manifest.insert("doc_a".into(), ManifestEntry::scanned("doc_a"));
        manifest.insert(
            "doc_b".into(),
            ManifestEntry::processed("doc_b", &[accepted(2, 0.88)], None),
        );
        store.save(&manifest).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn save_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("processed_manifest.json"));

        let mut first = Manifest::new();
        first.insert("old".into(), ManifestEntry::scanned("old"));
        store.save(&first).unwrap();

        let mut second = Manifest::new();
        second.insert("new".into(), ManifestEntry::scanned("new"));
        store.save(&second).unwrap();

        let loaded = store.load().unwrap();
        assert!(!loaded.contains_key("old"));
        assert!(loaded.contains_key("new"));
    }

    #[test]
    fn corrupt_manifest_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_manifest.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ManifestStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ExtractError::ManifestParse { .. }));
    }
}
