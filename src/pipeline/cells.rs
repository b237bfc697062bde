//! Shared cell geometry: clustering positioned text into candidate grids.
//!
//! Both the structured backend (segment boxes) and the lattice fallback
//! (word boxes assembled from characters) reduce to the same problem: given
//! text fragments with bounding boxes, find regions that behave like tables
//! and slice them into rows and columns. The algorithm:
//!
//! 1. Cluster fragments into rows by vertical-center proximity
//! 2. Find regions of consecutive rows with compatible column counts
//! 3. Derive column boundaries from clustered left edges
//! 4. Assign each fragment to the column containing its horizontal center
//!
//! Coordinates are top-left origin (y grows downward); callers flip pdfium's
//! bottom-left origin before handing cells in.

use crate::table::RawGrid;

/// A text fragment with its bounding box, in points.
#[derive(Debug, Clone)]
pub struct TextCell {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextCell {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Tuning knobs for grid assembly.
#[derive(Debug, Clone)]
pub struct GridSettings {
    /// Cells within this vertical distance of a row's first cell share the
    /// row.
    pub row_tolerance: f32,
    /// Left edges closer than this are the same column.
    pub col_tolerance: f32,
    /// Minimum rows for a region to count as a table.
    pub min_rows: usize,
    /// Minimum columns for a region to count as a table.
    pub min_cols: usize,
    /// Allowed per-row deviation from a region's column count. The
    /// structured backend tolerates ±1 (merged or missing cells); the
    /// lattice fallback requires an exact match.
    pub column_slack: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            row_tolerance: 5.0,
            col_tolerance: 10.0,
            min_rows: 2,
            min_cols: 2,
            column_slack: 1,
        }
    }
}

impl GridSettings {
    /// Settings for the lattice fallback: exact column counts only.
    pub fn strict() -> Self {
        Self {
            column_slack: 0,
            ..Self::default()
        }
    }
}

/// Slice a page's text fragments into zero or more candidate grids.
pub fn grids_from_cells(cells: &[TextCell], settings: &GridSettings) -> Vec<RawGrid> {
    if cells.len() < settings.min_rows * settings.min_cols {
        return Vec::new();
    }
    let rows = cluster_rows(cells, settings);
    find_regions(&rows, settings)
        .into_iter()
        .filter_map(|region| build_grid(&region, settings))
        .collect()
}

/// Cluster cells into rows by vertical-center proximity, then order rows
/// top-to-bottom and cells left-to-right.
fn cluster_rows<'a>(cells: &'a [TextCell], settings: &GridSettings) -> Vec<Vec<&'a TextCell>> {
    let mut rows: Vec<Vec<&TextCell>> = Vec::new();

    for cell in cells {
        let found = rows.iter().position(|row| {
            row.first()
                .is_some_and(|first| (cell.center_y() - first.center_y()).abs() <= settings.row_tolerance)
        });
        match found {
            Some(i) => rows[i].push(cell),
            None => rows.push(vec![cell]),
        }
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }
    rows.sort_by(|a, b| {
        let ay = a.first().map_or(0.0, |c| c.y);
        let by = b.first().map_or(0.0, |c| c.y);
        ay.partial_cmp(&by).unwrap_or(std::cmp::Ordering::Equal)
    });

    rows
}

/// Find runs of consecutive rows whose cell counts agree within
/// `column_slack`. Single-cell rows (headings, paragraphs) break regions.
fn find_regions<'a>(
    rows: &[Vec<&'a TextCell>],
    settings: &GridSettings,
) -> Vec<Vec<Vec<&'a TextCell>>> {
    let mut regions: Vec<Vec<Vec<&TextCell>>> = Vec::new();
    let mut current: Vec<Vec<&TextCell>> = Vec::new();
    let mut expected_cols: Option<usize> = None;

    for row in rows {
        if row.len() < settings.min_cols {
            if current.len() >= settings.min_rows {
                regions.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            expected_cols = None;
            continue;
        }

        match expected_cols {
            Some(expected)
                if row.len().abs_diff(expected) <= settings.column_slack =>
            {
                current.push(row.clone());
            }
            Some(_) => {
                if current.len() >= settings.min_rows {
                    regions.push(std::mem::take(&mut current));
                }
                current.clear();
                current.push(row.clone());
                expected_cols = Some(row.len());
            }
            None => {
                current.push(row.clone());
                expected_cols = Some(row.len());
            }
        }
    }

    if current.len() >= settings.min_rows {
        regions.push(current);
    }

    regions
}

/// Assemble one region into a grid: columns from clustered left edges,
/// cells assigned by horizontal center. Unfilled slots stay `None`; two
/// fragments landing in one slot are joined with a space (merged cells).
fn build_grid(region: &[Vec<&TextCell>], settings: &GridSettings) -> Option<RawGrid> {
    let boundaries = column_boundaries(region, settings);
    let num_cols = boundaries.len().saturating_sub(1);
    if num_cols < settings.min_cols {
        return None;
    }

    let mut grid: RawGrid = Vec::with_capacity(region.len());
    for row in region {
        let mut out: Vec<Option<String>> = vec![None; num_cols];
        for cell in row {
            let idx = column_index(cell, &boundaries);
            if idx < num_cols {
                match &mut out[idx] {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(&cell.text);
                    }
                    slot => *slot = Some(cell.text.clone()),
                }
            }
        }
        grid.push(out);
    }

    Some(grid)
}

/// Cluster left edges into column boundaries; the final boundary is the
/// rightmost cell edge.
fn column_boundaries(region: &[Vec<&TextCell>], settings: &GridSettings) -> Vec<f32> {
    let mut xs: Vec<f32> = region
        .iter()
        .flat_map(|row| row.iter().map(|c| c.x))
        .collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let Some(&first) = xs.first() else {
        return Vec::new();
    };
    let mut boundaries = vec![first];
    for &x in &xs[1..] {
        if x - boundaries.last().copied().unwrap_or(first) > settings.col_tolerance {
            boundaries.push(x);
        }
    }

    if let Some(max_right) = region
        .iter()
        .flat_map(|row| row.iter().map(|c| c.right()))
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    {
        boundaries.push(max_right);
    }

    boundaries
}

fn column_index(cell: &TextCell, boundaries: &[f32]) -> usize {
    let center = cell.center_x();
    for (i, window) in boundaries.windows(2).enumerate() {
        if center >= window[0] && center < window[1] {
            return i;
        }
    }
    boundaries.len().saturating_sub(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str, x: f32, y: f32) -> TextCell {
        TextCell {
            text: text.to_string(),
            x,
            y,
            width: 40.0,
            height: 10.0,
        }
    }

    /// A clean 3×3 layout: three columns at x = 0/100/200, rows 12pt apart.
    fn three_by_three() -> Vec<TextCell> {
        let mut cells = Vec::new();
        for (r, y) in [0.0_f32, 12.0, 24.0].iter().enumerate() {
            for (c, x) in [0.0_f32, 100.0, 200.0].iter().enumerate() {
                cells.push(cell(&format!("r{r}c{c}"), *x, *y));
            }
        }
        cells
    }

    #[test]
    fn clean_layout_yields_one_full_grid() {
        let grids = grids_from_cells(&three_by_three(), &GridSettings::default());
        assert_eq!(grids.len(), 1);
        let grid = &grids[0];
        assert_eq!(grid.len(), 3);
        assert!(grid.iter().all(|r| r.len() == 3));
        assert_eq!(grid[0][0].as_deref(), Some("r0c0"));
        assert_eq!(grid[2][2].as_deref(), Some("r2c2"));
    }

    #[test]
    fn missing_cell_leaves_none_slot() {
        let mut cells = three_by_three();
        cells.retain(|c| c.text != "r1c1");
        let grids = grids_from_cells(&cells, &GridSettings::default());
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0][1][1], None);
        assert_eq!(grids[0][1][0].as_deref(), Some("r1c0"));
    }

    #[test]
    fn paragraph_rows_split_regions() {
        let mut cells = three_by_three();
        // A lone wide fragment between two table bands.
        cells.push(cell("Figure 1: survey sites", 0.0, 50.0));
        for (r, y) in [(3, 70.0_f32), (4, 82.0)] {
            for (c, x) in [0.0_f32, 100.0, 200.0].iter().enumerate() {
                cells.push(cell(&format!("r{r}c{c}"), *x, y));
            }
        }
        let grids = grids_from_cells(&cells, &GridSettings::default());
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].len(), 3);
        assert_eq!(grids[1].len(), 2);
    }

    #[test]
    fn strict_settings_reject_ragged_rows() {
        let mut cells = three_by_three();
        // Row 1 loses a cell: count 2 vs. expected 3.
        cells.retain(|c| c.text != "r1c2");
        let loose = grids_from_cells(&cells, &GridSettings::default());
        let strict = grids_from_cells(&cells, &GridSettings::strict());
        // Loose keeps all three rows in one region; strict breaks the run
        // and no fragment survives the 2-row minimum on both sides.
        assert_eq!(loose.len(), 1);
        assert_eq!(loose[0].len(), 3);
        assert!(strict.is_empty() || strict[0].len() < 3);
    }

    #[test]
    fn merged_fragments_join_with_space() {
        let mut cells = three_by_three();
        cells.push(cell("extra", 205.0, 0.0));
        let grids = grids_from_cells(&cells, &GridSettings::default());
        assert_eq!(grids[0][0][2].as_deref(), Some("r0c2 extra"));
    }

    #[test]
    fn too_few_cells_yield_nothing() {
        let cells = vec![cell("lonely", 0.0, 0.0), cell("pair", 100.0, 0.0)];
        assert!(grids_from_cells(&cells, &GridSettings::default()).is_empty());
    }
}
