//! Error types for the pdf2tables library.
//!
//! Only *batch-fatal* conditions surface as [`ExtractError`]: a missing
//! pdfium library, an unwritable manifest, invalid configuration. Everything
//! that can go wrong with a *single document* — unreadable file, corrupt PDF,
//! failed serialization — is deliberately not an error type at all. Those
//! conditions are caught at the component boundary, logged, and recorded in
//! the document's [`crate::manifest::ManifestEntry`], so one bad PDF can
//! never abort a corpus run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2tables library.
///
/// Per-document failures are stored in [`crate::manifest::ManifestEntry`]
/// (`success = false`, `error` retained) rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium next to the binary or system-wide, or point\n\
LD_LIBRARY_PATH / DYLD_LIBRARY_PATH at an existing copy."
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Manifest errors ───────────────────────────────────────────────────
    /// The manifest file exists but could not be read.
    #[error("Failed to read manifest '{path}': {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest file exists but is not valid JSON.
    ///
    /// A *missing* manifest is treated as an empty one (first run); a
    /// *corrupt* manifest is surfaced so prior run state is never silently
    /// discarded.
    #[error("Manifest '{path}' is not valid JSON: {source}\nDelete it to start from scratch.")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Could not write the manifest back to disk.
    #[error("Failed to write manifest '{path}': {detail}")]
    ManifestWrite { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create a required output directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read the input directory.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write a per-document JSON record.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a per-table CSV file.
    #[error("Failed to write CSV file '{path}': {source}")]
    CsvWriteFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Could not serialise a record to JSON.
    #[error("Failed to serialise record for '{document}': {source}")]
    SerializeFailed {
        document: String,
        #[source]
        source: serde_json::Error,
    },
}
