//! Shared "match pipeline" logic used by the `run` and `select` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> clean -> select -> classify -> summarize
//!
//! The command handlers can then focus on presentation (printing and exports).

use std::path::Path;

use crate::domain::{ClassificationResult, CurveSet, RunConfig, Selection, TestObservation};
use crate::error::AppError;
use crate::io::ingest::{Ingested, load_candidates, load_reference, load_tests};
use crate::report::{MatchSummary, summarize_matches};

/// All computed outputs of a single `cm run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub references: Ingested<CurveSet>,
    pub candidates: Ingested<CurveSet>,
    pub tests: Ingested<Vec<TestObservation>>,
    pub selection: Selection,
    pub results: Vec<ClassificationResult>,
    pub summary: MatchSummary,
}

/// Outputs of a selection-only run.
#[derive(Debug, Clone)]
pub struct SelectionOutput {
    pub references: Ingested<CurveSet>,
    pub candidates: Ingested<CurveSet>,
    pub selection: Selection,
}

/// Load the reference and candidate datasets and select one candidate per reference.
pub fn run_selection(train_csv: &Path, ideal_csv: &Path) -> Result<SelectionOutput, AppError> {
    let references = load_reference(train_csv)?;
    let candidates = load_candidates(ideal_csv)?;
    let selection = crate::fit::select(&references.data, &candidates.data)?;

    Ok(SelectionOutput {
        references,
        candidates,
        selection,
    })
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_pipeline(config: &RunConfig) -> Result<RunOutput, AppError> {
    let SelectionOutput {
        references,
        candidates,
        selection,
    } = run_selection(&config.train_csv, &config.ideal_csv)?;

    let tests = load_tests(&config.test_csv)?;
    let results = crate::fit::classify(&tests.data, &selection, &candidates.data)?;
    let summary = summarize_matches(tests.data.len(), &results);

    Ok(RunOutput {
        references,
        candidates,
        tests,
        selection,
        results,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::domain::CurveId;
    use crate::error::ErrorKind;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn config(dir: &Path) -> RunConfig {
        RunConfig {
            train_csv: write(
                dir,
                "train.csv",
                "x,y1,y2,y3,y4\n1,1,1,2,0\n2,4,2,4,1\n3,9,3,6,2\n4,16,4,8,3\n",
            ),
            ideal_csv: write(
                dir,
                "ideal.csv",
                "x,y1,y2,y3,y4,y5\n1,0,1,2,0,1.1\n2,0,2,4,1,4.1\n3,0,3,6,2,9.1\n4,0,4,8,3,16.1\n",
            ),
            test_csv: write(dir, "test.csv", "x,y\n1,1.2\n1,5\n2,2\n2,\n"),
            top_n: 10,
            plot: false,
            plot_width: 40,
            plot_height: 10,
            export_results: None,
            export_selection: None,
            export_run: None,
            svg: None,
        }
    }

    #[test]
    fn full_pipeline_on_small_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_pipeline(&config(dir.path())).unwrap();

        let picked: Vec<u16> = out.selection.pairs().iter().map(|p| p.candidate.index()).collect();
        assert_eq!(picked, vec![5, 2, 3, 4]);

        assert_eq!(out.tests.rows_read, 4);
        assert_eq!(out.tests.clean.missing_removed, 1);
        assert_eq!(out.results.len(), 2);
        assert_eq!(out.results[0].candidate, CurveId::new(5).unwrap());
        assert_eq!(out.summary.matched, 2);
        assert_eq!(out.summary.unmatched(), 1);
    }

    #[test]
    fn missing_test_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.test_csv = dir.path().join("nope.csv");
        assert_eq!(run_pipeline(&config).unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn selection_only_skips_test_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let out = run_selection(&config.train_csv, &config.ideal_csv).unwrap();
        assert_eq!(out.selection.len(), 4);
        assert_eq!(out.candidates.data.len(), 5);
    }
}
