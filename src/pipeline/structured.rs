//! Primary extraction backend: positioned text segments.
//!
//! pdfium groups a page's characters into segments that already approximate
//! visual cells — a run of text sharing a baseline and font box. Projecting
//! segment boxes through the shared grid assembly in [`super::cells`] turns
//! well-structured tables (clear cell spacing, consistent columns) into
//! grids with very little work, which is why this backend runs first.

use super::cells::{grids_from_cells, GridSettings, TextCell};
use crate::table::RawGrid;
use pdfium_render::prelude::*;

/// Extract candidate grids from one page.
///
/// Returns raw grids only; scoring and floor filtering happen in
/// [`super::extract`].
pub fn page_grids(page: &PdfPage) -> Result<Vec<RawGrid>, PdfiumError> {
    let cells = segment_cells(page)?;
    Ok(grids_from_cells(&cells, &GridSettings::default()))
}

/// Collect the page's text segments as positioned cells, flipping pdfium's
/// bottom-left origin to top-left so that sorting by `y` reads top-down.
fn segment_cells(page: &PdfPage) -> Result<Vec<TextCell>, PdfiumError> {
    let page_height = page.height().value;
    let text = page.text()?;

    let mut cells = Vec::new();
    for segment in text.segments().iter() {
        let content = segment.text();
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        let bounds = segment.bounds();
        cells.push(TextCell {
            text: content.to_string(),
            x: bounds.left().value,
            y: page_height - bounds.top().value,
            width: bounds.right().value - bounds.left().value,
            height: bounds.top().value - bounds.bottom().value,
        });
    }

    cells.sort_by(|a, b| {
        let y = a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal);
        if y == std::cmp::Ordering::Equal {
            a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            y
        }
    });

    Ok(cells)
}
