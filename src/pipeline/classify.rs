//! Document classification: text-bearing vs. scanned.
//!
//! Scanned (image-only) PDFs have no text layer for the extraction backends
//! to work with; feeding them through anyway yields garbage grids that waste
//! scoring effort. Sampling a two-page prefix is enough signal in practice:
//! genuinely text-bearing documents almost never open with two blank pages.
//!
//! The failure bias is deliberate: any error opening or reading the document
//! classifies it as scanned. A false "scanned" costs one skipped document; a
//! false "text-bearing" would feed unreadable bytes into extraction.

use crate::table::Classification;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::warn;

/// Number of leading pages sampled for extractable text.
const SAMPLE_PAGES: usize = 2;

/// Classify a document by sampling its first pages for text.
///
/// Pure with respect to on-disk state: no writes, no caching. Errors are
/// logged and collapse to [`Classification::Scanned`].
pub fn classify(pdfium: &Pdfium, path: &Path) -> Classification {
    match classify_inner(pdfium, path) {
        Ok(c) => c,
        Err(e) => {
            warn!(
                "Could not inspect '{}' ({e:?}); treating as scanned",
                path.display()
            );
            Classification::Scanned
        }
    }
}

fn classify_inner(pdfium: &Pdfium, path: &Path) -> Result<Classification, PdfiumError> {
    let document = pdfium.load_pdf_from_file(path, None)?;
    for page in document.pages().iter().take(SAMPLE_PAGES) {
        let text = page.text()?.all();
        if !text.trim().is_empty() {
            return Ok(Classification::TextBearing);
        }
    }
    Ok(Classification::Scanned)
}
