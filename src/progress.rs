//! Progress-callback trait for per-document batch events.
//!
//! Pass a [`BatchProgressCallback`] to [`crate::batch::run_batch`] to
//! receive events as the pipeline walks the corpus. The callback approach
//! is the least-invasive integration point: callers can forward events to a
//! terminal progress bar, a database record, or a dashboard without the
//! library knowing anything about how the host application communicates —
//! and the batch run itself carries no process-wide reporting state.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about.

use crate::manifest::ManifestEntry;

/// Called by the batch driver as it processes each document.
///
/// The batch is sequential, so events for one document never interleave
/// with another's.
pub trait BatchProgressCallback {
    /// Called once before any document is processed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is classified and extracted.
    ///
    /// `index` is 0-based within this run's document list.
    fn on_document_start(&self, stem: &str, index: usize, total_documents: usize) {
        let _ = (stem, index, total_documents);
    }

    /// Called when a document is skipped because its manifest entry exists
    /// and the run is not forced.
    fn on_document_skipped(&self, stem: &str) {
        let _ = stem;
    }

    /// Called when a document finishes, with its freshly built entry.
    fn on_document_complete(&self, stem: &str, entry: &ManifestEntry) {
        let _ = (stem, entry);
    }

    /// Called once after the full document list has been attempted.
    fn on_batch_complete(&self, summary: &crate::batch::BatchSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}
