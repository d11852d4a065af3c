//! Export selection and classification results to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{ClassificationResult, Selection};
use crate::error::AppError;

#[derive(Serialize)]
struct SelectionRow {
    reference: String,
    candidate: String,
    sse: f64,
    max_deviation: f64,
    threshold: f64,
}

/// Write classification results (`x,y,ideal_function,deviation`) to a CSV file.
pub fn write_results_csv(path: &Path, results: &[ClassificationResult]) -> Result<(), AppError> {
    let file = create(path, "results")?;
    write_results(file, results)
}

/// Write the selection table to a CSV file.
pub fn write_selection_csv(path: &Path, selection: &Selection) -> Result<(), AppError> {
    let file = create(path, "selection")?;
    write_selection(file, selection)
}

pub fn write_results<W: Write>(writer: W, results: &[ClassificationResult]) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    // Serializing an empty slice writes nothing, so the header is written by hand.
    writer
        .write_record(["x", "y", "ideal_function", "deviation"])
        .map_err(|e| AppError::io(format!("Failed to write results CSV header: {e}")))?;
    for r in results {
        writer
            .serialize(r)
            .map_err(|e| AppError::io(format!("Failed to write results CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush results CSV: {e}")))
}

pub fn write_selection<W: Write>(writer: W, selection: &Selection) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(writer);
    for pair in selection.pairs() {
        writer
            .serialize(SelectionRow {
                reference: pair.reference.to_string(),
                candidate: pair.candidate.to_string(),
                sse: pair.sse,
                max_deviation: pair.max_deviation,
                threshold: pair.threshold(),
            })
            .map_err(|e| AppError::io(format!("Failed to write selection CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush selection CSV: {e}")))
}

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create {what} CSV '{}': {e}", path.display())))
}
