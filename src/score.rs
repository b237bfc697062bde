//! Table Quality Score (TQS): the arbitration metric of the pipeline.
//!
//! Every extracted grid receives a score in [0, 1], computed once and never
//! mutated. The score is a pure function of the grid's cells and its source
//! page number, so repeated runs over the same corpus produce byte-identical
//! results.
//!
//! ## Metric composition
//!
//! | Metric                  | Weight | Intuition                               |
//! |-------------------------|--------|-----------------------------------------|
//! | Content density         |  0.4   | sparse grids are usually layout noise   |
//! | Structural consistency  |  0.3   | real tables have near-equal row widths  |
//! | Header plausibility     |  0.3   | header-like first rows signal tables    |
//! | Empty-cell clustering   | −0.2   | whole sparse rows signal garbage bands  |
//! | First-page penalty      | −0.4   | cover pages masquerade as tables        |
//!
//! Content statistics additionally track special-character and numeric-cell
//! counts. These are exposed on [`ContentStats`] but intentionally do not
//! enter the combination formula; downstream consumers may inspect them, the
//! arbitration does not.

use crate::table::RawGrid;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Weight of the content-density metric.
pub const DENSITY_WEIGHT: f64 = 0.4;
/// Weight of the structural-consistency metric.
pub const CONSISTENCY_WEIGHT: f64 = 0.3;
/// Weight of the header-plausibility metric.
pub const HEADER_WEIGHT: f64 = 0.3;
/// Weight of the empty-cell clustering penalty.
pub const CLUSTER_WEIGHT: f64 = 0.2;
/// Flat penalty for candidates found on page 1, where title and cover
/// layouts frequently produce grid-shaped artifacts.
pub const FIRST_PAGE_PENALTY: f64 = 0.4;

/// Vocabulary of common table-header terms. A first row containing three or
/// more of these saturates the header metric.
pub const HEADER_KEYWORDS: [&str; 15] = [
    "table",
    "id",
    "name",
    "date",
    "year",
    "value",
    "category",
    "type",
    "species",
    "count",
    "total",
    "number",
    "description",
    "location",
    "site",
];

static SPECIAL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,%-]").unwrap());
static NUMERIC_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d.,%-]+$").unwrap());

/// Aggregate per-cell content statistics for one grid.
///
/// `special_chars` and `numeric` are tracked but unused by [`score_grid`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    /// Cells across all rows, including absent ones.
    pub total_cells: usize,
    /// Cells that are present and do not trim to the empty string.
    pub non_empty: usize,
    /// Non-empty cells containing at least one special character.
    pub special_chars: usize,
    /// Non-empty cells that are entirely numeric-ish (digits, `.,%-`).
    pub numeric: usize,
}

impl ContentStats {
    /// Fraction of cells that carry content.
    pub fn density(&self) -> f64 {
        if self.total_cells == 0 {
            0.0
        } else {
            self.non_empty as f64 / self.total_cells as f64
        }
    }

    /// Fraction of non-empty cells containing special characters.
    pub fn special_char_ratio(&self) -> f64 {
        if self.non_empty == 0 {
            0.0
        } else {
            self.special_chars as f64 / self.non_empty as f64
        }
    }

    /// Fraction of non-empty cells that are numeric.
    pub fn numeric_ratio(&self) -> f64 {
        if self.non_empty == 0 {
            0.0
        } else {
            self.numeric as f64 / self.non_empty as f64
        }
    }
}

/// A cell is empty when absent or when it trims to the empty string.
fn is_empty(cell: &Option<String>) -> bool {
    match cell {
        None => true,
        Some(s) => s.trim().is_empty(),
    }
}

/// Walk the grid once, counting cells, content, and character classes.
pub fn content_stats(grid: &RawGrid) -> ContentStats {
    let mut stats = ContentStats::default();
    for row in grid {
        stats.total_cells += row.len();
        for cell in row {
            let Some(text) = cell else { continue };
            if text.trim().is_empty() {
                continue;
            }
            stats.non_empty += 1;
            if SPECIAL_CHARS.is_match(text) {
                stats.special_chars += 1;
            }
            if NUMERIC_CELL.is_match(text.trim()) {
                stats.numeric += 1;
            }
        }
    }
    stats
}

/// Structural consistency: `1 / (1 + population_variance(row_lengths))`.
///
/// Perfectly rectangular grids score 1.0; increasing ragged variance
/// asymptotically approaches 0.
pub fn structural_consistency(grid: &RawGrid) -> f64 {
    if grid.len() < 2 {
        return 1.0;
    }
    let lengths: Vec<f64> = grid.iter().map(|row| row.len() as f64).collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let variance =
        lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    1.0 / (1.0 + variance)
}

/// Header plausibility: intersect the first row's non-null cells, lower-cased,
/// with [`HEADER_KEYWORDS`]; saturates at three matches.
pub fn header_score(grid: &RawGrid) -> f64 {
    let Some(first_row) = grid.first() else {
        return 0.0;
    };
    if first_row.is_empty() {
        return 0.0;
    }
    let cells: HashSet<String> = first_row
        .iter()
        .flatten()
        .map(|c| c.to_lowercase())
        .collect();
    let matches = HEADER_KEYWORDS
        .iter()
        .filter(|k| cells.contains(**k))
        .count();
    (matches as f64 / 3.0).min(1.0)
}

/// Fraction of rows in which more than half the cells are empty.
///
/// Whole sparse rows indicate garbage bands rather than isolated missing
/// values, so they are penalized separately from plain density.
pub fn cluster_penalty(grid: &RawGrid) -> f64 {
    if grid.is_empty() {
        return 0.0;
    }
    let sparse_rows = grid
        .iter()
        .filter(|row| {
            let empty = row.iter().filter(|c| is_empty(c)).count();
            empty > row.len() / 2
        })
        .count();
    sparse_rows as f64 / grid.len() as f64
}

/// Compute the Table Quality Score for one grid found on `page` (1-based).
///
/// Deterministic and pure: calling it twice on the same inputs returns the
/// identical value. Degenerate grids (fewer than 2 rows, or no cells at all)
/// score exactly 0.0. The result is clamped to [0, 1] and rounded to two
/// decimal places.
pub fn score_grid(grid: &RawGrid, page: u32) -> f64 {
    if grid.len() < 2 {
        return 0.0;
    }

    let stats = content_stats(grid);
    if stats.total_cells == 0 {
        return 0.0;
    }

    let first_page = if page == 1 { FIRST_PAGE_PENALTY } else { 0.0 };
    let score = DENSITY_WEIGHT * stats.density()
        + CONSISTENCY_WEIGHT * structural_consistency(grid)
        + HEADER_WEIGHT * header_score(grid)
        - CLUSTER_WEIGHT * cluster_penalty(grid)
        - first_page;

    round2(score).clamp(0.0, 1.0)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells.iter().map(|c| Some((*c).to_string())).collect()
    }

    /// The Scenario-A grid: header plus nine data rows, 3 of 30 cells empty,
    /// perfectly rectangular.
    fn field_survey_grid() -> RawGrid {
        let mut grid = vec![row(&["Site", "Species", "Count"])];
        for i in 0..9 {
            let mut r = row(&["A1", "Falco peregrinus", "12"]);
            if i < 3 {
                r[i] = Some(String::new());
            }
            grid.push(r);
        }
        grid
    }

    #[test]
    fn scoring_is_deterministic() {
        let grid = field_survey_grid();
        assert_eq!(score_grid(&grid, 2), score_grid(&grid, 2));
        assert_eq!(score_grid(&grid, 1), score_grid(&grid, 1));
    }

    #[test]
    fn score_is_bounded() {
        let grids = vec![
            field_survey_grid(),
            vec![row(&["", "", ""]), row(&["", "", ""])],
            vec![vec![None, None], vec![None, None]],
            vec![row(&["a"]), row(&["b", "c", "d", "e", "f", "g", "h"])],
        ];
        for grid in &grids {
            for page in [1, 2, 7] {
                let s = score_grid(grid, page);
                assert!((0.0..=1.0).contains(&s), "score {s} out of bounds");
            }
        }
    }

    #[test]
    fn degenerate_grids_score_zero() {
        assert_eq!(score_grid(&vec![], 2), 0.0);
        assert_eq!(score_grid(&vec![row(&["only", "one", "row"])], 2), 0.0);
        // Two rows but zero cells.
        assert_eq!(score_grid(&vec![vec![], vec![]], 2), 0.0);
    }

    #[test]
    fn scenario_a_high_quality_page_two_table() {
        let grid = field_survey_grid();
        let stats = content_stats(&grid);
        assert_eq!(stats.total_cells, 30);
        assert_eq!(stats.non_empty, 27);
        assert_eq!(structural_consistency(&grid), 1.0);
        assert_eq!(header_score(&grid), 1.0);
        assert_eq!(cluster_penalty(&grid), 0.0);
        assert_eq!(score_grid(&grid, 2), 0.96);
    }

    #[test]
    fn scenario_b_first_page_drops_exactly_point_four() {
        let grid = field_survey_grid();
        let page2 = score_grid(&grid, 2);
        let page1 = score_grid(&grid, 1);
        assert_eq!(page2, 0.96);
        assert_eq!(page1, 0.56);
        assert!((page2 - page1 - FIRST_PAGE_PENALTY).abs() < 1e-9);
    }

    #[test]
    fn header_metric_saturates_at_three_matches() {
        let one = vec![row(&["Species", "Abundance", "Notes"]), row(&["x", "y", "z"])];
        let five = vec![
            row(&["Site", "Species", "Count", "Date", "Year"]),
            row(&["a", "b", "c", "d", "e"]),
        ];
        assert!((header_score(&one) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(header_score(&five), 1.0);
    }

    #[test]
    fn header_matching_ignores_case_and_null_cells() {
        let grid = vec![
            vec![Some("SITE".into()), None, Some("CoUnT".into())],
            row(&["a", "b", "c"]),
        ];
        assert!((header_score(&grid) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn ragged_grids_lose_consistency() {
        let rect = vec![row(&["a", "b"]), row(&["c", "d"])];
        let ragged = vec![row(&["a", "b", "c", "d", "e"]), row(&["f"])];
        assert_eq!(structural_consistency(&rect), 1.0);
        assert!(structural_consistency(&ragged) < 0.25);
    }

    #[test]
    fn sparse_rows_are_penalized() {
        // Half the rows have 2 of 3 cells empty.
        let grid = vec![
            row(&["Site", "Species", "Count"]),
            row(&["A1", "", ""]),
            row(&["A2", "Parus major", "4"]),
            row(&["A3", "", ""]),
        ];
        assert_eq!(cluster_penalty(&grid), 0.5);
        // Whitespace-only cells count as empty too.
        let ws = vec![row(&["a", "  ", "\t"]), row(&["b", "c", "d"])];
        assert_eq!(cluster_penalty(&ws), 0.5);
    }

    #[test]
    fn unused_content_ratios_are_still_tracked() {
        let grid = vec![
            row(&["Name", "Value", "Remark"]),
            row(&["alpha", "12.5", "ok (verified)"]),
            row(&["beta", "7,100", "±0.3"]),
        ];
        let stats = content_stats(&grid);
        assert_eq!(stats.numeric, 2);
        assert!(stats.special_chars >= 2);
        assert!(stats.special_char_ratio() > 0.0);
        assert!(stats.numeric_ratio() > 0.0);
        // The tracked ratios do not move the score: an identical grid with
        // the special characters stripped scores the same.
        let plain = vec![
            row(&["Name", "Value", "Remark"]),
            row(&["alpha", "12.5", "ok verified"]),
            row(&["beta", "7,100", "0.3"]),
        ];
        assert_eq!(score_grid(&grid, 2), score_grid(&plain, 2));
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        // 6 of 9 cells non-empty: density 0.6666… → weighted 0.2666…;
        // consistency 1.0 → 0.3; no header matches, no penalties.
        let grid = vec![
            row(&["aa", "bb", ""]),
            row(&["cc", "dd", ""]),
            row(&["ee", "ff", ""]),
        ];
        let s = score_grid(&grid, 2);
        assert_eq!(s, 0.57);
        assert_eq!((s * 100.0).round() / 100.0, s);
    }
}
