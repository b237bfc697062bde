//! Configuration for a table-extraction batch run.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config between the batch driver and the output writer,
//! serialise it for logging, and diff two runs to understand why their
//! results differ.
//!
//! The on-disk layout defaults to the conventional corpus tree:
//!
//! ```text
//! data/
//! ├── extracted/                   input PDFs
//! └── tables/
//!     ├── json/                    one record per document
//!     ├── csv/                     optional flat files (--save-csv)
//!     ├── logs/                    extraction log
//!     └── processed_manifest.json  skip-on-rerun state
//! ```

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum quality score for a candidate to be considered a table at all.
///
/// Candidates below this floor are dropped inline during extraction and, in
/// particular, do not suppress the fallback backend: fallback triggers when
/// the primary backend produces *no* floor-passing candidate.
pub const DEFAULT_FLOOR_THRESHOLD: f64 = 0.5;

/// Minimum quality score for a candidate to be normalized, persisted, and
/// counted in the manifest. A document whose candidates all sit between the
/// floor and this value ends the run with `has_tables = false` — valid, not
/// an error.
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.6;

/// Configuration for a batch extraction run.
///
/// Built via [`ExtractionConfig::builder()`], [`ExtractionConfig::default()`],
/// or [`ExtractionConfig::with_base_dir()`].
///
/// # Example
/// ```rust
/// use pdf2tables::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .input_dir("corpus/pdfs")
///     .high_threshold(0.7)
///     .save_csv(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Directory scanned for `*.pdf` inputs. Hidden (dot-prefixed) files are
    /// always excluded. Default: `data/extracted`.
    pub input_dir: PathBuf,

    /// Directory receiving one `{stem}.json` record per document.
    /// Default: `data/tables/json`.
    pub json_dir: PathBuf,

    /// Directory receiving `{stem}_table_{n}.csv` files when `save_csv` is
    /// set. Default: `data/tables/csv`.
    pub csv_dir: PathBuf,

    /// Directory for the extraction log file. Default: `data/tables/logs`.
    pub log_dir: PathBuf,

    /// Path of the processing manifest. Default:
    /// `data/tables/processed_manifest.json`.
    pub manifest_path: PathBuf,

    /// Floor quality threshold, in [0, 1]. Default: 0.5.
    ///
    /// Applied inline while backends run; a candidate below the floor is
    /// never considered a table, independent of `high_threshold`.
    pub floor_threshold: f64,

    /// High (persistence) quality threshold, in [0, 1]. Default: 0.6.
    ///
    /// Applied after all of a document's candidates are collected; gates
    /// normalization, output, and the manifest's table counts.
    pub high_threshold: f64,

    /// Also write one flat CSV file per accepted table. Default: false.
    pub save_csv: bool,

    /// Reprocess documents that already have a manifest entry. Default:
    /// false (any prior entry, successful or not, suppresses reprocessing).
    pub force: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::with_base_dir("data")
    }
}

impl ExtractionConfig {
    /// Create a config rooted at `base`, using the conventional layout
    /// (`{base}/extracted`, `{base}/tables/{json,csv,logs}`).
    pub fn with_base_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let tables = base.join("tables");
        Self {
            input_dir: base.join("extracted"),
            json_dir: tables.join("json"),
            csv_dir: tables.join("csv"),
            log_dir: tables.join("logs"),
            manifest_path: tables.join("processed_manifest.json"),
            floor_threshold: DEFAULT_FLOOR_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            save_csv: false,
            force: false,
        }
    }

    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Root the whole layout at `base` before applying other overrides.
    pub fn base_dir(mut self, base: impl AsRef<Path>) -> Self {
        let ExtractionConfig {
            floor_threshold,
            high_threshold,
            save_csv,
            force,
            ..
        } = self.config;
        self.config = ExtractionConfig::with_base_dir(base);
        self.config.floor_threshold = floor_threshold;
        self.config.high_threshold = high_threshold;
        self.config.save_csv = save_csv;
        self.config.force = force;
        self
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn json_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.json_dir = dir.into();
        self
    }

    pub fn csv_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.csv_dir = dir.into();
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.manifest_path = path.into();
        self
    }

    pub fn floor_threshold(mut self, t: f64) -> Self {
        self.config.floor_threshold = t.clamp(0.0, 1.0);
        self
    }

    pub fn high_threshold(mut self, t: f64) -> Self {
        self.config.high_threshold = t.clamp(0.0, 1.0);
        self
    }

    pub fn save_csv(mut self, v: bool) -> Self {
        self.config.save_csv = v;
        self
    }

    pub fn force(mut self, v: bool) -> Self {
        self.config.force = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.floor_threshold > c.high_threshold {
            return Err(ExtractError::InvalidConfig(format!(
                "floor threshold ({}) must not exceed high threshold ({})",
                c.floor_threshold, c.high_threshold
            )));
        }
        Ok(self.config)
    }
}
