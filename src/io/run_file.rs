//! Read/write run JSON files.
//!
//! A run file is the "portable" representation of a finished run:
//! - the selection (pairs, SSE, max deviation)
//! - the samples of every selected pair, for plotting
//! - the accepted test observations
//!
//! The schema is defined by `domain::RunFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{ClassificationResult, CurveSet, PairSamples, RunFile, Selection};
use crate::error::AppError;

/// Assemble a run file from in-memory results.
pub fn build_run_file(
    selection: &Selection,
    references: &CurveSet,
    candidates: &CurveSet,
    results: &[ClassificationResult],
) -> Result<RunFile, AppError> {
    let mut pairs = Vec::with_capacity(selection.len());
    for pair in selection.pairs() {
        let reference = references
            .get(pair.reference)
            .ok_or_else(|| AppError::selection(format!("Unknown reference curve {}.", pair.reference)))?;
        let candidate = candidates
            .get(pair.candidate)
            .ok_or_else(|| AppError::selection(format!("Unknown candidate curve {}.", pair.candidate)))?;

        // Only rows both datasets kept, matching what the selector compared.
        let aligned = reference.aligned_with(candidate);
        pairs.push(PairSamples {
            reference: pair.reference,
            candidate: pair.candidate,
            x: aligned.iter().map(|&(i, _)| reference.x[i]).collect(),
            reference_y: aligned.iter().map(|&(i, _)| reference.y[i]).collect(),
            candidate_y: aligned.iter().map(|&(_, j)| candidate.y[j]).collect(),
        });
    }

    Ok(RunFile {
        tool: "cm".to_string(),
        generated_at: Utc::now(),
        selection: selection.clone(),
        pairs,
        results: results.to_vec(),
    })
}

/// Write a run JSON file.
pub fn write_run_json(path: &Path, run: &RunFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create run JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, run)
        .map_err(|e| AppError::io(format!("Failed to write run JSON: {e}")))?;

    Ok(())
}

/// Read a run JSON file.
pub fn read_run_json(path: &Path) -> Result<RunFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open run JSON '{}': {e}", path.display())))?;
    let run: RunFile =
        serde_json::from_reader(file).map_err(|e| AppError::data_shape(format!("Invalid run JSON: {e}")))?;
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Curve, CurveId, SelectedPair};

    fn id(n: u16) -> CurveId {
        CurveId::new(n).unwrap()
    }

    #[test]
    fn run_file_survives_disk() {
        let references = CurveSet::new(vec![Curve::new(id(1), vec![0.0, 1.0], vec![0.0, 1.0])]).unwrap();
        let candidates = CurveSet::new(vec![Curve::new(id(8), vec![0.0, 1.0], vec![0.5, 1.5])]).unwrap();
        let selection = Selection::from_pairs(vec![SelectedPair {
            reference: id(1),
            candidate: id(8),
            sse: 0.5,
            max_deviation: 0.5,
        }]);
        let results = vec![ClassificationResult { x: 0.2, y: 0.4, candidate: id(8), deviation: 0.1 }];

        let run = build_run_file(&selection, &references, &candidates, &results).unwrap();
        assert_eq!(run.pairs[0].candidate_y, vec![0.5, 1.5]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        write_run_json(&path, &run).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"candidate\": \"y8\""), "{text}");

        let back = read_run_json(&path).unwrap();
        assert_eq!(back.selection, selection);
        assert_eq!(back.results, results);
        assert_eq!(back.generated_at, run.generated_at);
    }

    #[test]
    fn pair_samples_keep_only_shared_rows() {
        let references = CurveSet::new(vec![Curve::with_rows(id(1), vec![0.0, 2.0], vec![0.0, 2.0], vec![0, 2])]).unwrap();
        let candidates = CurveSet::new(vec![Curve::with_rows(
            id(4),
            vec![0.0, 1.0, 2.0],
            vec![0.1, 1.1, 2.1],
            vec![0, 1, 2],
        )])
        .unwrap();
        let selection = Selection::from_pairs(vec![SelectedPair {
            reference: id(1),
            candidate: id(4),
            sse: 0.02,
            max_deviation: 0.1,
        }]);

        let run = build_run_file(&selection, &references, &candidates, &[]).unwrap();
        assert_eq!(run.pairs[0].x, vec![0.0, 2.0]);
        assert_eq!(run.pairs[0].reference_y, vec![0.0, 2.0]);
        assert_eq!(run.pairs[0].candidate_y, vec![0.1, 2.1]);
    }

    #[test]
    fn missing_candidate_is_reported() {
        let references = CurveSet::new(vec![Curve::new(id(1), vec![0.0], vec![0.0])]).unwrap();
        let selection = Selection::from_pairs(vec![SelectedPair {
            reference: id(1),
            candidate: id(3),
            sse: 0.0,
            max_deviation: 0.0,
        }]);
        assert!(build_run_file(&selection, &references, &CurveSet::default(), &[]).is_err());
    }

    #[test]
    fn invalid_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"tool\": 1}").unwrap();
        assert!(read_run_json(&path).is_err());
    }
}
