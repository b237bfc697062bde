//! Typed records flowing through the extraction pipeline.
//!
//! A candidate grid moves through three representations:
//!
//! ```text
//! RawGrid ──▶ RawTableCandidate ──▶ AcceptedTable
//! (ragged)    (scored, tagged)      (rectangular, indexed)
//! ```
//!
//! Raggedness is legal up to and including [`RawTableCandidate`]; only
//! [`AcceptedTable`] guarantees uniform row lengths (enforced by
//! [`crate::pipeline::normalize::normalize_grid`] at construction).

use serde::{Deserialize, Serialize};

/// A raw extracted grid: ordered rows of cells, each possibly absent.
///
/// Rows may have unequal lengths at this stage; downstream normalization
/// repairs that, so extraction backends never reject ragged output.
pub type RawGrid = Vec<Vec<Option<String>>>;

/// Whether a document carries an extractable text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// At least one sampled page yielded non-whitespace text.
    TextBearing,
    /// No text found in the sampled pages, or the document could not be
    /// read — the conservative branch that skips extraction entirely.
    Scanned,
}

/// Which extraction backend family produced a table.
///
/// The geometric fallback has two internal modes (lattice and stream); the
/// persisted method records only the family, mirroring what downstream
/// consumers need to know about provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Primary backend: positioned text segments clustered into a grid.
    Structured,
    /// Fallback backend: character-geometry lattice or whitespace stream.
    Geometric,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMethod::Structured => write!(f, "structured"),
            ExtractionMethod::Geometric => write!(f, "geometric"),
        }
    }
}

/// A scored grid produced by one extraction backend for one page.
///
/// The score is computed once, at extraction time, and never mutated.
#[derive(Debug, Clone)]
pub struct RawTableCandidate {
    /// Source page, 1-based.
    pub page: u32,
    /// Backend family that produced the grid.
    pub method: ExtractionMethod,
    /// The extracted cells, possibly ragged.
    pub grid: RawGrid,
    /// Table Quality Score in [0, 1].
    pub quality_score: f64,
    /// ISO-8601 extraction timestamp.
    pub extracted_at: String,
}

/// A candidate that passed the high threshold and was normalized.
///
/// Invariant: every row of `rows` has length `column_names.len()`, equal to
/// the maximum row length of the pre-normalization candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedTable {
    /// 1-based index of this table within its document.
    pub table_number: usize,
    /// Source page, 1-based.
    pub page: u32,
    /// Backend family that produced the grid.
    pub method: ExtractionMethod,
    /// Table Quality Score in [0, 1].
    pub quality_score: f64,
    /// ISO-8601 extraction timestamp, carried over from the candidate.
    pub extracted_at: String,
    /// Column names; defaulted (`column_1`…) when the backend supplies none.
    pub column_names: Vec<String>,
    /// Rectangular cell data, row-oriented.
    pub rows: Vec<Vec<String>>,
}

impl AcceptedTable {
    /// Normalize a candidate into a rectangular table with the given 1-based
    /// table number.
    pub fn from_candidate(table_number: usize, candidate: &RawTableCandidate) -> Self {
        let rows = crate::pipeline::normalize::normalize_grid(&candidate.grid);
        let width = rows.first().map_or(0, Vec::len);
        let column_names = default_column_names(width);
        Self {
            table_number,
            page: candidate.page,
            method: candidate.method,
            quality_score: candidate.quality_score,
            extracted_at: candidate.extracted_at.clone(),
            column_names,
            rows,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.column_names.len()
    }
}

/// Default column names for a table `width` columns wide: `column_1`… .
pub fn default_column_names(width: usize) -> Vec<String> {
    (1..=width).map(|i| format!("column_{i}")).collect()
}
