//! CSV ingest and validation.
//!
//! This module is responsible for turning the three input CSVs into typed,
//! cleaned datasets that the selector and classifier can consume directly.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors, abort the run)
//! - **Fail fast** on malformed cells; missing cells are left to the cleaning step
//! - **Deterministic behavior** (column order, row order and curve order are stable)
//! - **Separation of concerns**: no selection/classification logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::{info, warn};

use crate::domain::{Curve, CurveId, CurveSet, MAX_CANDIDATES, REFERENCE_COUNT, TestObservation};
use crate::error::AppError;
use crate::io::clean::{CleanReport, Cleanable};

/// Which dataset a table holds.
///
/// The kind decides the required columns and which error a malformed row raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Reference,
    Candidate,
    Test,
}

impl DatasetKind {
    pub fn label(self) -> &'static str {
        match self {
            DatasetKind::Reference => "reference",
            DatasetKind::Candidate => "candidate",
            DatasetKind::Test => "test",
        }
    }

    /// Malformed test rows abort the classification batch; anything else is a shape problem.
    fn malformed(self, message: String) -> AppError {
        match self {
            DatasetKind::Test => AppError::classification(message),
            DatasetKind::Reference | DatasetKind::Candidate => AppError::data_shape(message),
        }
    }
}

/// A set of named numeric columns sharing a row index.
///
/// `None` marks a missing cell. `source_rows[i]` is the 0-based data-row number
/// `rows[i]` was read from; it survives projection and cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub kind: DatasetKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
    pub source_rows: Vec<usize>,
}

impl Table {
    /// A freshly read table: row `i` came from data row `i`.
    pub fn new(kind: DatasetKind, columns: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Self {
        let source_rows = (0..rows.len()).collect();
        Self {
            kind,
            columns,
            rows,
            source_rows,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Keep only the named columns, in the given order.
    pub fn project(&self, names: &[String]) -> Result<Table, AppError> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    AppError::data_shape(format!(
                        "{} dataset is missing required column `{name}`.",
                        self.kind.label()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i]).collect())
            .collect();

        Ok(Table {
            kind: self.kind,
            columns: names.to_vec(),
            rows,
            source_rows: self.source_rows.clone(),
        })
    }

    /// Values of one column. Every cell must be present.
    pub fn values(&self, name: &str) -> Result<Vec<f64>, AppError> {
        let idx = self.column_index(name).ok_or_else(|| {
            AppError::data_shape(format!(
                "{} dataset is missing required column `{name}`.",
                self.kind.label()
            ))
        })?;

        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                cells[idx].ok_or_else(|| {
                    self.kind.malformed(format!(
                        "{} dataset row {} has no value for `{name}`.",
                        self.kind.label(),
                        row + 1
                    ))
                })
            })
            .collect()
    }
}

/// A typed dataset plus bookkeeping about how it was read.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub data: T,
    pub rows_read: usize,
    pub clean: CleanReport,
}

impl<T> Ingested<T> {
    pub fn rows_used(&self) -> usize {
        self.clean.rows_out()
    }
}

/// Load the reference dataset (`x, y1..y4`).
pub fn load_reference(path: &Path) -> Result<Ingested<CurveSet>, AppError> {
    let table = read_table(path, DatasetKind::Reference)?;
    prepare(table, &reference_columns(), reference_curves)
}

/// Load the candidate library (`x` plus any of `y1..y50`).
pub fn load_candidates(path: &Path) -> Result<Ingested<CurveSet>, AppError> {
    let table = read_table(path, DatasetKind::Candidate)?;
    let columns = candidate_columns(&table)?;
    prepare(table, &columns, candidate_curves)
}

/// Load the test observations (`x, y`).
pub fn load_tests(path: &Path) -> Result<Ingested<Vec<TestObservation>>, AppError> {
    let table = read_table(path, DatasetKind::Test)?;
    prepare(table, &test_columns(), test_observations)
}

/// Project to the columns that matter, clean, and convert.
pub fn prepare<T>(
    table: Table,
    columns: &[String],
    convert: fn(&Table) -> Result<T, AppError>,
) -> Result<Ingested<T>, AppError> {
    let kind = table.kind;
    let rows_read = table.row_count();
    let (table, clean) = table.project(columns)?.clean();

    if clean.removed() > 0 {
        info!(
            "Cleaned {} dataset: removed {} row(s) with missing values and {} duplicate row(s)",
            kind.label(),
            clean.missing_removed,
            clean.duplicates_removed
        );
    }
    if table.row_count() == 0 {
        return Err(AppError::data_shape(format!(
            "No valid rows remain in the {} dataset after cleaning.",
            kind.label()
        )));
    }

    let data = convert(&table)?;
    info!("Loaded {} {} row(s)", table.row_count(), kind.label());

    Ok(Ingested {
        data,
        rows_read,
        clean,
    })
}

/// Read a CSV file into a raw table.
pub fn read_table(path: &Path, kind: DatasetKind) -> Result<Table, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::io(format!(
            "Failed to open {} CSV '{}': {e}",
            kind.label(),
            path.display()
        ))
    })?;
    parse_table(file, kind)
}

/// Parse CSV text into a raw table.
///
/// Empty cells and `nan`/`na`/`null` markers become missing values; anything
/// else that is not a number makes the row malformed.
pub fn parse_table<R: Read>(reader: R, kind: DatasetKind) -> Result<Table, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data_shape(format!("Failed to read {} CSV headers: {e}", kind.label())))?
        .clone();
    let columns = normalize_headers(&headers, kind)?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because records() starts after the header and CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| {
            kind.malformed(format!("{} CSV line {line}: {e}", kind.label()))
        })?;

        let row = record
            .iter()
            .zip(&columns)
            .map(|(cell, column)| {
                parse_cell(cell).map_err(|e| {
                    kind.malformed(format!(
                        "{} CSV line {line}, column `{column}`: {e}",
                        kind.label()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    Ok(Table::new(kind, columns, rows))
}

/// Turn a cleaned reference table into the four reference curves.
pub fn reference_curves(table: &Table) -> Result<CurveSet, AppError> {
    let x = table.values("x")?;
    let mut curves = Vec::with_capacity(REFERENCE_COUNT);
    for name in reference_columns().iter().skip(1) {
        let id: CurveId = name.parse().map_err(AppError::data_shape)?;
        curves.push(Curve::with_rows(id, x.clone(), table.values(name)?, table.source_rows.clone()));
    }
    CurveSet::new(curves)
}

/// Turn a cleaned candidate table into the candidate library.
///
/// Every column other than `x` is expected to be a `yN` candidate.
pub fn candidate_curves(table: &Table) -> Result<CurveSet, AppError> {
    let x = table.values("x")?;
    let mut curves = Vec::new();
    for name in table.columns.iter().filter(|c| c.as_str() != "x") {
        let id: CurveId = name.parse().map_err(AppError::data_shape)?;
        curves.push(Curve::with_rows(id, x.clone(), table.values(name)?, table.source_rows.clone()));
    }
    CurveSet::new(curves)
}

/// Turn a cleaned test table into observations, preserving row order.
pub fn test_observations(table: &Table) -> Result<Vec<TestObservation>, AppError> {
    let x = table.values("x")?;
    let y = table.values("y")?;
    Ok(x.into_iter().zip(y).map(|(x, y)| TestObservation { x, y }).collect())
}

fn reference_columns() -> Vec<String> {
    let mut columns = vec!["x".to_string()];
    columns.extend((1..=REFERENCE_COUNT).map(|i| format!("y{i}")));
    columns
}

fn test_columns() -> Vec<String> {
    vec!["x".to_string(), "y".to_string()]
}

/// `x` plus every usable `yN` column in the candidate table.
///
/// Columns that are not candidate ids, or whose index exceeds the library size,
/// are ignored with a warning rather than failing the run.
fn candidate_columns(table: &Table) -> Result<Vec<String>, AppError> {
    if table.column_index("x").is_none() {
        return Err(AppError::data_shape("candidate dataset is missing required column `x`."));
    }

    let mut columns = vec!["x".to_string()];
    for name in table.columns.iter().filter(|c| c.as_str() != "x") {
        match name.parse::<CurveId>() {
            Ok(id) if id.index() <= MAX_CANDIDATES => columns.push(name.clone()),
            Ok(id) => warn!("Ignoring candidate column `{id}`: library holds at most {MAX_CANDIDATES} curves"),
            Err(_) => warn!("Ignoring non-candidate column `{name}` in candidate dataset"),
        }
    }
    if columns.len() == 1 {
        warn!("Candidate dataset has no `yN` columns; the library is empty");
    }
    Ok(columns)
}

fn normalize_headers(headers: &StringRecord, kind: DatasetKind) -> Result<Vec<String>, AppError> {
    let columns: Vec<String> = headers.iter().map(normalize_header_name).collect();

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (idx, name) in columns.iter().enumerate() {
        if let Some(first) = seen.insert(name.as_str(), idx) {
            return Err(AppError::data_shape(format!(
                "{} CSV has duplicate column `{name}` (positions {} and {}).",
                kind.label(),
                first + 1,
                idx + 1
            )));
        }
    }
    Ok(columns)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_cell(cell: &str) -> Result<Option<f64>, String> {
    let cell = cell.trim();
    if cell.is_empty() || ["nan", "na", "null"].iter().any(|m| cell.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    let v = cell
        .parse::<f64>()
        .map_err(|_| format!("'{cell}' is not a number"))?;
    Ok(v.is_finite().then_some(v))
}
