//! Candidate selection by minimum sum of squared errors.
//!
//! For every reference curve the selector scans the whole candidate library and
//! keeps the candidate with the smallest
//!
//! ```text
//! SSE(r, c) = Σ_row (r.y[row] - c.y[row])²
//! ```
//!
//! Samples are paired by the data row they were read from, so a row dropped by
//! cleaning on one side simply drops out of the sum.
//!
//! Selection rules:
//! 1. Candidates sharing no data row with the reference are skipped
//! 2. The first compatible candidate is always taken; later ones replace it only
//!    on a strictly smaller SSE, so exact ties go to the lowest identifier
//! 3. The winner's worst pointwise deviation `max_row |r.y - c.y|` is kept
//!    for the classifier's tolerance rule

use log::{debug, info, warn};

use crate::domain::{Curve, CurveSet, REFERENCE_COUNT, SelectedPair, Selection};
use crate::error::AppError;

/// Pick the best candidate for every reference curve.
///
/// Fails with a selection error unless all [`REFERENCE_COUNT`] reference curves
/// end up matched.
pub fn select(references: &CurveSet, candidates: &CurveSet) -> Result<Selection, AppError> {
    let mut pairs = Vec::with_capacity(references.len());
    let mut unmatched = Vec::new();

    for reference in references.iter() {
        match best_candidate(reference, candidates) {
            Some(pair) => {
                info!(
                    "{} -> {} (sse={:.3}, max deviation={:.4})",
                    pair.reference, pair.candidate, pair.sse, pair.max_deviation
                );
                pairs.push(pair);
            }
            None => {
                warn!("No compatible candidate for {}", reference.id);
                unmatched.push(reference.id.to_string());
            }
        }
    }

    if pairs.len() != REFERENCE_COUNT {
        let detail = if unmatched.is_empty() {
            String::new()
        } else {
            format!(" (unmatched: {})", unmatched.join(", "))
        };
        return Err(AppError::selection(format!(
            "Could not select {REFERENCE_COUNT} candidate curves: {} of {} reference curve(s) matched against a library of {}{detail}.",
            pairs.len(),
            references.len(),
            candidates.len(),
        )));
    }

    Ok(Selection::from_pairs(pairs))
}

/// Best candidate for one reference curve, or `None` if nothing is compatible.
fn best_candidate(reference: &Curve, candidates: &CurveSet) -> Option<SelectedPair> {
    let mut best: Option<(&Curve, f64, f64)> = None;

    for candidate in candidates.iter() {
        let Some((ref_y, cand_y)) = aligned_values(reference, candidate) else {
            debug!(
                "Skipping {} for {}: no shared data rows",
                candidate.id, reference.id
            );
            continue;
        };

        let sse = sum_squared_error(&ref_y, &cand_y);
        let better = match best {
            Some((_, best_sse, _)) => sse < best_sse,
            None => true,
        };
        if better {
            best = Some((candidate, sse, max_abs_deviation(&ref_y, &cand_y)));
        }
    }

    best.map(|(candidate, sse, max_deviation)| SelectedPair {
        reference: reference.id,
        candidate: candidate.id,
        sse,
        max_deviation,
    })
}

/// `y` values of both curves on the rows they share, or `None` if they share none.
fn aligned_values(reference: &Curve, candidate: &Curve) -> Option<(Vec<f64>, Vec<f64>)> {
    let pairs = reference.aligned_with(candidate);
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .into_iter()
            .map(|(i, j)| (reference.y[i], candidate.y[j]))
            .unzip(),
    )
}

/// `Σ (a[i] - b[i])²` over matching indices.
pub fn sum_squared_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// `max |a[i] - b[i]|` over matching indices (0 for empty input).
pub fn max_abs_deviation(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurveId;
    use crate::error::ErrorKind;

    fn id(n: u16) -> CurveId {
        CurveId::new(n).unwrap()
    }

    fn curve(n: u16, x: &[f64], y: &[f64]) -> Curve {
        Curve::new(id(n), x.to_vec(), y.to_vec())
    }

    const X: [f64; 4] = [1.0, 2.0, 3.0, 4.0];

    /// y1 = x², y2 = x, y3 = 2x, y4 = x - 1
    fn references() -> CurveSet {
        CurveSet::new(vec![
            curve(1, &X, &[1.0, 4.0, 9.0, 16.0]),
            curve(2, &X, &[1.0, 2.0, 3.0, 4.0]),
            curve(3, &X, &[2.0, 4.0, 6.0, 8.0]),
            curve(4, &X, &[0.0, 1.0, 2.0, 3.0]),
        ])
        .unwrap()
    }

    /// Library where y5 (x² + 0.1) is the only close match for reference y1.
    fn library() -> CurveSet {
        CurveSet::new(vec![
            curve(1, &X, &[0.0, 0.0, 0.0, 0.0]),
            curve(2, &X, &[1.0, 2.0, 3.0, 4.0]),
            curve(3, &X, &[2.0, 4.0, 6.0, 8.0]),
            curve(4, &X, &[0.0, 1.0, 2.0, 3.0]),
            curve(5, &X, &[1.1, 4.1, 9.1, 16.1]),
        ])
        .unwrap()
    }

    #[test]
    fn selects_minimum_sse_candidate() {
        let selection = select(&references(), &library()).unwrap();
        assert_eq!(selection.len(), 4);

        let y1 = &selection.pairs()[0];
        assert_eq!(y1.reference, id(1));
        assert_eq!(y1.candidate, id(5));
        assert!((y1.sse - 0.04).abs() < 1e-9);
        assert!((y1.max_deviation - 0.1).abs() < 1e-9);
        assert!((y1.threshold() - 0.1 * std::f64::consts::SQRT_2).abs() < 1e-9);

        assert_eq!(selection.candidate_for(id(2)), Some(id(2)));
        assert_eq!(selection.candidate_for(id(3)), Some(id(3)));
        assert_eq!(selection.candidate_for(id(4)), Some(id(4)));
    }

    #[test]
    fn minimum_is_found_even_when_it_is_not_first() {
        // The first candidate has a finite error; the true minimum comes later.
        let library = CurveSet::new(vec![
            curve(1, &X, &[100.0, 100.0, 100.0, 100.0]),
            curve(2, &X, &[1.0, 4.0, 9.0, 16.0]),
            curve(3, &X, &[1.0, 2.0, 3.0, 4.0]),
            curve(4, &X, &[2.0, 4.0, 6.0, 8.0]),
            curve(5, &X, &[0.0, 1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let selection = select(&references(), &library).unwrap();
        let mapped: Vec<_> = selection.pairs().iter().map(|p| p.candidate.index()).collect();
        assert_eq!(mapped, vec![2, 3, 4, 5]);
    }

    #[test]
    fn exact_ties_go_to_lowest_identifier() {
        // y10 is inserted first but y2 sorts first; both sit exactly 1.0 away from y1.
        let library = CurveSet::new(vec![
            curve(10, &X, &[2.0, 5.0, 10.0, 17.0]),
            curve(2, &X, &[0.0, 3.0, 8.0, 15.0]),
        ])
        .unwrap();
        let selection = select(&references(), &library).unwrap();
        assert_eq!(selection.candidate_for(id(1)), Some(id(2)));
    }

    #[test]
    fn incompatible_candidates_are_skipped() {
        let library = CurveSet::new(vec![
            Curve::with_rows(id(1), vec![1.0, 2.0], vec![1.0, 4.0], vec![10, 11]),
            curve(7, &X, &[9.0, 9.0, 9.0, 9.0]),
        ])
        .unwrap();
        let selection = select(&references(), &library).unwrap();
        assert!(selection.pairs().iter().all(|p| p.candidate == id(7)));
    }

    #[test]
    fn empty_library_is_a_selection_failure() {
        let err = select(&references(), &CurveSet::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Selection);
        assert!(err.message().contains("unmatched: y1, y2, y3, y4"), "{}", err.message());
    }

    #[test]
    fn structurally_incompatible_library_is_a_selection_failure() {
        let library = CurveSet::new(vec![Curve::with_rows(id(1), vec![1.0], vec![1.0], vec![99])]).unwrap();
        let err = select(&references(), &library).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Selection);
    }

    #[test]
    fn fewer_than_four_references_fail() {
        let refs = CurveSet::new(vec![curve(1, &X, &[1.0, 4.0, 9.0, 16.0])]).unwrap();
        let err = select(&refs, &library()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Selection);
    }

    #[test]
    fn rows_dropped_on_either_side_are_compared_by_source_row() {
        // Reference lost data row 1 (x=2); the candidate table lost data row 3 (x=4).
        let x_ref = [1.0, 3.0, 4.0, 5.0];
        let refs = CurveSet::new(
            (1..=4)
                .map(|n| Curve::with_rows(id(n), x_ref.to_vec(), x_ref.to_vec(), vec![0, 2, 3, 4]))
                .collect(),
        )
        .unwrap();
        let x_cand = vec![1.0, 2.0, 3.0, 5.0];
        let library = CurveSet::new(vec![
            Curve::with_rows(id(1), x_cand.clone(), vec![1.0, 2.0, 3.0, 5.0], vec![0, 1, 2, 4]),
            Curve::with_rows(id(2), x_cand, vec![1.0, 3.0, 4.0, 5.0], vec![0, 1, 2, 4]),
        ])
        .unwrap();

        let selection = select(&refs, &library).unwrap();
        for pair in selection.pairs() {
            assert_eq!(pair.candidate, id(1));
            assert_eq!(pair.sse, 0.0);
            assert_eq!(pair.max_deviation, 0.0);
        }
    }

    #[test]
    fn partially_overlapping_rows_still_match() {
        // One reference cell went missing, so every reference curve has a row fewer.
        let refs = CurveSet::new(
            references()
                .iter()
                .map(|c| Curve::with_rows(c.id, c.x[1..].to_vec(), c.y[1..].to_vec(), vec![1, 2, 3]))
                .collect(),
        )
        .unwrap();
        let selection = select(&refs, &library()).unwrap();
        assert_eq!(selection.candidate_for(id(1)), Some(id(5)));
        assert!((selection.pairs()[0].sse - 0.03).abs() < 1e-9);
    }

    #[test]
    fn overflowing_error_still_selects_a_candidate() {
        let library = CurveSet::new(vec![curve(1, &X, &[1e200, 1e200, 1e200, 1e200])]).unwrap();
        let selection = select(&references(), &library).unwrap();
        assert_eq!(selection.len(), 4);
        assert!(selection.pairs()[0].sse.is_infinite());
    }

    #[test]
    fn selection_is_deterministic() {
        let a = select(&references(), &library()).unwrap();
        let b = select(&references(), &library()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn error_helpers() {
        assert_eq!(sum_squared_error(&[1.0, 2.0], &[2.0, 4.0]), 5.0);
        assert_eq!(max_abs_deviation(&[1.0, 2.0], &[2.0, -1.0]), 3.0);
        assert_eq!(max_abs_deviation(&[], &[]), 0.0);
    }
}
