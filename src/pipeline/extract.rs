//! Extraction orchestration: backend ordering and inline floor filtering.
//!
//! The backend set is a closed family of three variants behind one
//! interface: the structured primary, then the geometric fallback in its
//! lattice and stream modes. Fallback policy turns on *floor-passing*
//! candidates, not extracted ones — a primary run that finds only sub-floor
//! grids still triggers the fallback, because "we found nothing trustworthy"
//! and "we found nothing" must behave the same.
//!
//! Every candidate is scored the moment its grid exists and dropped inline
//! when it misses the floor threshold; nothing below the floor is ever
//! considered a table by any later stage.

use super::{geometric, structured};
use crate::config::ExtractionConfig;
use crate::score::score_grid;
use crate::table::{ExtractionMethod, RawGrid, RawTableCandidate};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// The closed set of extraction variants, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Primary: segment-geometry grids.
    Structured,
    /// Fallback mode 1: strict char-geometry grids.
    GeometricLattice,
    /// Fallback mode 2: whitespace-delimited rows.
    GeometricStream,
}

impl Backend {
    /// The backend family recorded in manifest entries and output records.
    pub fn method(self) -> ExtractionMethod {
        match self {
            Backend::Structured => ExtractionMethod::Structured,
            Backend::GeometricLattice | Backend::GeometricStream => ExtractionMethod::Geometric,
        }
    }
}

/// Extract all floor-passing candidates for one document.
///
/// File-not-found and parse errors are logged and yield zero candidates;
/// each document is processed independently and one failure must not abort
/// a batch run.
pub fn extract_candidates(
    pdfium: &Pdfium,
    path: &Path,
    config: &ExtractionConfig,
) -> Vec<RawTableCandidate> {
    let document = match pdfium.load_pdf_from_file(path, None) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(
                "Extraction failed to open '{}': {e:?}; no candidates",
                path.display()
            );
            return Vec::new();
        }
    };

    select_candidates(
        config,
        || document_grids(&document, Backend::Structured, path),
        || document_grids(&document, Backend::GeometricLattice, path),
        || document_grids(&document, Backend::GeometricStream, path),
    )
}

/// The ordering policy, factored over lazily-invoked backends.
///
/// The primary backend always runs. If it yields no floor-passing candidate,
/// the fallback modes run in order and candidates are kept from the first
/// mode that produced any non-empty grid — even when all of that mode's
/// candidates then fall below the floor.
pub(crate) fn select_candidates<P, L, S>(
    config: &ExtractionConfig,
    primary: P,
    lattice: L,
    stream: S,
) -> Vec<RawTableCandidate>
where
    P: FnOnce() -> Vec<(u32, RawGrid)>,
    L: FnOnce() -> Vec<(u32, RawGrid)>,
    S: FnOnce() -> Vec<(u32, RawGrid)>,
{
    let candidates = score_and_filter(primary(), Backend::Structured, config);
    if !candidates.is_empty() {
        return candidates;
    }

    debug!("Primary backend produced no floor-passing candidate; falling back");
    let grids = lattice();
    if !grids.is_empty() {
        return score_and_filter(grids, Backend::GeometricLattice, config);
    }

    let grids = stream();
    if !grids.is_empty() {
        return score_and_filter(grids, Backend::GeometricStream, config);
    }

    Vec::new()
}

/// Score each grid immediately; keep only candidates at or above the floor.
fn score_and_filter(
    grids: Vec<(u32, RawGrid)>,
    backend: Backend,
    config: &ExtractionConfig,
) -> Vec<RawTableCandidate> {
    let mut kept = Vec::new();
    for (page, grid) in grids {
        let quality_score = score_grid(&grid, page);
        if quality_score < config.floor_threshold {
            debug!(
                "Dropping page-{page} candidate from {backend:?}: score {quality_score} < floor {}",
                config.floor_threshold
            );
            continue;
        }
        kept.push(RawTableCandidate {
            page,
            method: backend.method(),
            grid,
            quality_score,
            extracted_at: chrono::Utc::now().to_rfc3339(),
        });
    }
    kept
}

/// Run one backend over every page of an open document.
fn document_grids(document: &PdfDocument, backend: Backend, path: &Path) -> Vec<(u32, RawGrid)> {
    let mut out = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        let page_number = index as u32 + 1;
        let grids = match backend {
            Backend::Structured => structured::page_grids(&page),
            Backend::GeometricLattice => geometric::lattice_grids(&page),
            Backend::GeometricStream => geometric::stream_grids(&page),
        };
        match grids {
            Ok(grids) => {
                out.extend(grids.into_iter().map(|g| (page_number, g)));
            }
            Err(e) => {
                warn!(
                    "{backend:?} failed on page {page_number} of '{}': {e:?}",
                    path.display()
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RawGrid;
    use std::cell::Cell;

    fn good_grid() -> RawGrid {
        // Rectangular, fully dense, header-matching: scores well above 0.6.
        vec![
            vec![Some("Site".into()), Some("Species".into()), Some("Count".into())],
            vec![Some("A1".into()), Some("Parus major".into()), Some("4".into())],
            vec![Some("A2".into()), Some("Falco peregrinus".into()), Some("2".into())],
        ]
    }

    fn poor_grid() -> RawGrid {
        // Very ragged and sparse: scores near zero.
        vec![
            vec![Some("x".into()), None, None, None, None, None],
            vec![Some("y".into())],
            vec![None, None, None],
        ]
    }

    fn config() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    #[test]
    fn primary_success_suppresses_fallback() {
        let fallback_calls = Cell::new(0);
        let got = select_candidates(
            &config(),
            || vec![(2, good_grid())],
            || {
                fallback_calls.set(fallback_calls.get() + 1);
                vec![(2, good_grid())]
            },
            || {
                fallback_calls.set(fallback_calls.get() + 1);
                vec![(2, good_grid())]
            },
        );
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].method, ExtractionMethod::Structured);
        assert_eq!(fallback_calls.get(), 0);
    }

    #[test]
    fn sub_floor_primary_triggers_fallback_exactly_once() {
        let lattice_calls = Cell::new(0);
        let got = select_candidates(
            &config(),
            || vec![(2, poor_grid())],
            || {
                lattice_calls.set(lattice_calls.get() + 1);
                vec![(2, good_grid())]
            },
            || panic!("stream must not run when lattice yields grids"),
        );
        assert_eq!(lattice_calls.get(), 1);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].method, ExtractionMethod::Geometric);
    }

    #[test]
    fn empty_primary_triggers_fallback() {
        let got = select_candidates(
            &config(),
            Vec::new,
            Vec::new,
            || vec![(3, good_grid())],
        );
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].page, 3);
        assert_eq!(got[0].method, ExtractionMethod::Geometric);
    }

    #[test]
    fn first_yielding_fallback_mode_wins_even_when_filtered_out() {
        // Lattice produces a grid, but it is sub-floor; the stream mode must
        // still not run — mode selection keys on grids produced, not kept.
        let got = select_candidates(
            &config(),
            Vec::new,
            || vec![(2, poor_grid())],
            || panic!("stream must not run after lattice produced a grid"),
        );
        assert!(got.is_empty());
    }

    #[test]
    fn floor_filters_inline_per_candidate() {
        let got = select_candidates(
            &config(),
            || vec![(2, good_grid()), (5, poor_grid())],
            || panic!("fallback must not run: primary kept a candidate"),
            || panic!("fallback must not run: primary kept a candidate"),
        );
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].page, 2);
        assert!(got[0].quality_score >= config().floor_threshold);
    }

    #[test]
    fn scores_are_attached_and_bounded() {
        let got = select_candidates(&config(), || vec![(2, good_grid())], Vec::new, Vec::new);
        let c = &got[0];
        assert!((0.0..=1.0).contains(&c.quality_score));
        assert!(!c.extracted_at.is_empty());
    }
}
