//! Ragged-grid repair: coerce cells to strings and square the grid off.
//!
//! Normalization runs only on candidates selected for persistence, never on
//! the full candidate pool — rejected candidates are scored and dropped
//! without paying for the copy.

use crate::table::RawGrid;

/// Normalize a grid so every row has the same length.
///
/// Absent cells become empty strings; shorter rows are right-padded with
/// empty strings to the maximum row length. An empty input yields an empty
/// output without error.
pub fn normalize_grid(grid: &RawGrid) -> Vec<Vec<String>> {
    if grid.is_empty() {
        return Vec::new();
    }

    let mut cleaned: Vec<Vec<String>> = grid
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.clone().unwrap_or_default())
                .collect()
        })
        .collect();

    let max_len = cleaned.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut cleaned {
        row.resize(max_len, String::new());
    }
    cleaned
}
