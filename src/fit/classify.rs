//! Assign test observations to selected candidates.
//!
//! For each observation `(tx, ty)` and each selected pair, in reference order:
//!
//! ```text
//! cy        = y of the candidate sample with x closest to tx (first on ties)
//! deviation = |ty - cy|
//! threshold = √2 · max_i |r.y[i] - c.y[i]|
//! ```
//!
//! A pair accepts the observation when `deviation <= threshold`. The accepting
//! pair with the smallest deviation wins; equal deviations keep the earlier
//! reference. Observations no pair accepts are omitted from the output.

use log::info;

use crate::domain::{ClassificationResult, Curve, CurveSet, SelectedPair, Selection, TestObservation};
use crate::error::AppError;

/// Classify a batch of test observations against a selection.
///
/// Results follow input order. Any non-finite observation fails the whole batch.
pub fn classify(
    observations: &[TestObservation],
    selection: &Selection,
    candidates: &CurveSet,
) -> Result<Vec<ClassificationResult>, AppError> {
    let pairs = resolve_pairs(selection, candidates)?;

    let mut results = Vec::new();
    for (row, obs) in observations.iter().enumerate() {
        if !(obs.x.is_finite() && obs.y.is_finite()) {
            return Err(AppError::classification(format!(
                "Test observation {} is malformed (x={}, y={}).",
                row + 1,
                obs.x,
                obs.y
            )));
        }
        if let Some(result) = match_observation(obs, &pairs) {
            results.push(result);
        }
    }

    info!(
        "Matched {} of {} test observation(s)",
        results.len(),
        observations.len()
    );
    Ok(results)
}

/// Look up the candidate curve behind every selected pair.
fn resolve_pairs<'a>(
    selection: &'a Selection,
    candidates: &'a CurveSet,
) -> Result<Vec<(&'a SelectedPair, &'a Curve)>, AppError> {
    if selection.is_empty() {
        return Err(AppError::classification("Selection is empty; run the selector first."));
    }

    selection
        .pairs()
        .iter()
        .map(|pair| {
            candidates
                .get(pair.candidate)
                .map(|curve| (pair, curve))
                .ok_or_else(|| {
                    AppError::classification(format!(
                        "Selected candidate {} (for {}) is not in the candidate library.",
                        pair.candidate, pair.reference
                    ))
                })
        })
        .collect()
}

fn match_observation(
    obs: &TestObservation,
    pairs: &[(&SelectedPair, &Curve)],
) -> Option<ClassificationResult> {
    let mut best: Option<ClassificationResult> = None;

    for (pair, curve) in pairs {
        let Some(idx) = curve.nearest_index(obs.x) else {
            continue;
        };
        let deviation = (obs.y - curve.y[idx]).abs();
        if deviation > pair.threshold() {
            continue;
        }

        let better = match &best {
            Some(current) => deviation < current.deviation,
            None => true,
        };
        if better {
            best = Some(ClassificationResult {
                x: obs.x,
                y: obs.y,
                candidate: pair.candidate,
                deviation,
            });
        }
    }

    best
}
