//! Fallback extraction backend: geometric lattice and whitespace stream.
//!
//! Invoked only when the primary backend produces no floor-passing
//! candidate. Two structural modes are tried in order:
//!
//! * **Lattice** — rebuild words from individual characters (pdfium's
//!   segmenting sometimes glues whole table rows into one segment, which is
//!   exactly the case the primary backend loses), then demand a strict grid:
//!   every row in a region must have the same column count.
//! * **Stream** — give up on geometry entirely and split the page's layout
//!   text on runs of whitespace, the way fixed-width reports are parsed.
//!   Coarse, but it salvages borderless tables the box-based modes miss.

use super::cells::{grids_from_cells, GridSettings, TextCell};
use crate::table::RawGrid;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;

/// Horizontal gap (points) above which two characters belong to different
/// words. Typical glyph advance is 5–10 pt.
const WORD_GAP: f32 = 3.0;
/// Vertical distance (points) above which two characters sit on different
/// baselines.
const BASELINE_TOLERANCE: f32 = 2.0;

/// Lattice mode: word cells assembled from characters, strict grid assembly.
pub fn lattice_grids(page: &PdfPage) -> Result<Vec<RawGrid>, PdfiumError> {
    let cells = word_cells(page)?;
    Ok(grids_from_cells(&cells, &GridSettings::strict()))
}

/// Stream mode: whitespace-delimited rows from the page's layout text.
pub fn stream_grids(page: &PdfPage) -> Result<Vec<RawGrid>, PdfiumError> {
    let text = page.text()?.all();
    Ok(stream_grids_from_text(&text))
}

/// One positioned character, in pdfium's bottom-left-origin space.
struct CharBox {
    ch: char,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

/// Group the page's characters into word-level cells.
fn word_cells(page: &PdfPage) -> Result<Vec<TextCell>, PdfiumError> {
    let page_height = page.height().value;
    let text = page.text()?;

    let mut chars: Vec<CharBox> = Vec::new();
    for info in text.chars().iter() {
        let Ok(bounds) = info.loose_bounds() else {
            continue;
        };
        let Some(s) = info.unicode_string() else {
            continue;
        };
        let Some(ch) = s.chars().next() else {
            continue;
        };
        if ch == ' ' || ch == '\n' || ch == '\r' {
            continue;
        }
        chars.push(CharBox {
            ch,
            left: bounds.left().value,
            top: bounds.top().value,
            right: bounds.right().value,
            bottom: bounds.bottom().value,
        });
    }

    // Reading order: PDF y grows upward, so top-down means descending y.
    chars.sort_by(|a, b| {
        let y = b.top.partial_cmp(&a.top).unwrap_or(std::cmp::Ordering::Equal);
        if y == std::cmp::Ordering::Equal {
            a.left.partial_cmp(&b.left).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            y
        }
    });

    let mut words: Vec<TextCell> = Vec::new();
    let mut current: Option<(String, f32, f32, f32, f32)> = None; // text, left, top, right, bottom

    for c in &chars {
        let continues = match &current {
            Some((_, _, top, right, _)) => {
                let gap = c.left - right;
                gap < WORD_GAP && gap > -1.0 && (c.top - top).abs() < BASELINE_TOLERANCE
            }
            None => false,
        };

        match current.as_mut() {
            Some((text, _, _, right, bottom)) if continues => {
                text.push(c.ch);
                *right = c.right.max(*right);
                *bottom = c.bottom.min(*bottom);
            }
            _ => {
                if let Some(word) = current.take() {
                    words.push(finish_word(word, page_height));
                }
                current = Some((c.ch.to_string(), c.left, c.top, c.right, c.bottom));
            }
        }
    }
    if let Some(word) = current.take() {
        words.push(finish_word(word, page_height));
    }

    Ok(words)
}

fn finish_word(
    (text, left, top, right, bottom): (String, f32, f32, f32, f32),
    page_height: f32,
) -> TextCell {
    TextCell {
        text,
        x: left,
        y: page_height - top,
        width: right - left,
        height: top - bottom,
    }
}

static FIELD_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}|\t").unwrap());

/// Minimum fields per line for it to count as a table row.
const MIN_STREAM_FIELDS: usize = 2;
/// Minimum consecutive table rows to form a candidate block.
const MIN_STREAM_ROWS: usize = 2;

/// Split layout text into whitespace-delimited table blocks.
///
/// Lines with two or more fields (separated by a tab or a run of two or
/// more spaces) are table rows; consecutive table rows form a block, and
/// blocks of at least two rows become candidate grids.
pub fn stream_grids_from_text(text: &str) -> Vec<RawGrid> {
    let mut grids = Vec::new();
    let mut block: RawGrid = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        let fields: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            FIELD_SEPARATOR.split(trimmed).map(str::trim).collect()
        };

        if fields.len() >= MIN_STREAM_FIELDS {
            block.push(fields.into_iter().map(|f| Some(f.to_string())).collect());
        } else {
            if block.len() >= MIN_STREAM_ROWS {
                grids.push(std::mem::take(&mut block));
            }
            block.clear();
        }
    }
    if block.len() >= MIN_STREAM_ROWS {
        grids.push(block);
    }

    grids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_splits_on_whitespace_runs() {
        let text = "Survey results for 2023\n\
                    \n\
                    Site    Species           Count\n\
                    A1      Parus major       12\n\
                    A2      Falco peregrinus  3\n\
                    \n\
                    Notes: weather was poor.\n";
        let grids = stream_grids_from_text(text);
        assert_eq!(grids.len(), 1);
        let grid = &grids[0];
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0][0].as_deref(), Some("Site"));
        assert_eq!(grid[1][1].as_deref(), Some("Parus major"));
        assert_eq!(grid[2][2].as_deref(), Some("3"));
    }

    #[test]
    fn stream_requires_two_consecutive_rows() {
        let text = "Heading\nA    B\nplain prose line\nC    D\n";
        assert!(stream_grids_from_text(text).is_empty());
    }

    #[test]
    fn stream_separates_blocks_at_prose() {
        let text = "a  b\nc  d\n--- interlude text ---\ne  f\ng  h\n";
        let grids = stream_grids_from_text(text);
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].len(), 2);
        assert_eq!(grids[1].len(), 2);
    }

    #[test]
    fn stream_handles_tabs_and_ragged_rows() {
        let text = "Name\tValue\tUnit\nmass\t4.2\nlength\t7.0\tm\n";
        let grids = stream_grids_from_text(text);
        assert_eq!(grids.len(), 1);
        // Ragged rows survive: normalization is downstream's job.
        assert_eq!(grids[0][0].len(), 3);
        assert_eq!(grids[0][1].len(), 2);
    }

    #[test]
    fn single_spaces_do_not_split_cells() {
        let text = "Species name    Observed count\nParus major    12\n";
        let grids = stream_grids_from_text(text);
        assert_eq!(grids[0][0][0].as_deref(), Some("Species name"));
        assert_eq!(grids[0][1][0].as_deref(), Some("Parus major"));
    }
}
