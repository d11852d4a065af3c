//! Synthetic reference/candidate/test datasets.
//!
//! The candidate library is a fixed family of 50 shape functions evaluated on a
//! uniform x grid. Four library members are drawn with a seeded RNG and perturbed
//! with Gaussian noise to form the reference curves; test observations are drawn
//! near those members, plus a share of uniform outliers that should stay
//! unassigned.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use log::info;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand_distr::Normal;

use crate::domain::{CurveId, GenerateConfig, MAX_CANDIDATES, REFERENCE_COUNT, TestObservation};
use crate::error::AppError;

/// Upper bound on grid rows so a typo in `--step` cannot fill the disk.
const MAX_GRID_ROWS: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub x: Vec<f64>,
    /// `library[i]` holds the samples of candidate `y{i+1}`.
    pub library: Vec<Vec<f64>>,
    /// Library members the reference curves were built from, in reference order.
    pub chosen: Vec<CurveId>,
    pub references: Vec<Vec<f64>>,
    pub tests: Vec<TestObservation>,
}

/// Paths written by [`write_datasets`].
#[derive(Debug, Clone)]
pub struct GeneratedFiles {
    pub train: PathBuf,
    pub ideal: PathBuf,
    pub test: PathBuf,
}

/// Value of library curve `id` at `x`.
///
/// Five families of ten members each: linear, quadratic, sine, cubic, log.
/// Ids past `y50` keep cycling through the log family.
pub fn library_value(id: CurveId, x: f64) -> f64 {
    // CurveId indices start at 1.
    let offset = id.index() - 1;
    let family = offset / 10;
    let p = f64::from(offset % 10 + 1);
    match family {
        0 => 0.5 * p * x - p,
        1 => 0.05 * p * x * x - p,
        2 => p * (x / p).sin(),
        3 => 0.001 * p * x * x * x,
        _ => p * (x.abs() + 1.0).ln(),
    }
}

pub fn generate_datasets(config: &GenerateConfig) -> Result<SyntheticData, AppError> {
    let x = build_grid(config)?;
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::usage("Noise must be finite and >= 0."));
    }
    if !(0.0..=1.0).contains(&config.outlier_fraction) {
        return Err(AppError::usage("Outlier fraction must be within [0, 1]."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::usage(format!("Noise distribution error: {e}")))?;

    let library: Vec<Vec<f64>> = (1..=MAX_CANDIDATES)
        .filter_map(CurveId::new)
        .map(|id| x.iter().map(|&xi| library_value(id, xi)).collect())
        .collect();

    let chosen: Vec<CurveId> = sample(&mut rng, usize::from(MAX_CANDIDATES), REFERENCE_COUNT)
        .into_iter()
        .filter_map(|i| u16::try_from(i + 1).ok().and_then(CurveId::new))
        .collect();

    let references: Vec<Vec<f64>> = chosen
        .iter()
        .map(|id| {
            library[usize::from(id.index() - 1)]
                .iter()
                .map(|&y| y + normal.sample(&mut rng))
                .collect()
        })
        .collect();

    let (y_lo, y_hi) = chosen
        .iter()
        .flat_map(|id| library[usize::from(id.index() - 1)].iter().copied())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let mut tests = Vec::with_capacity(config.test_rows);
    for _ in 0..config.test_rows {
        let row = rng.gen_range(0..x.len());
        let y = if rng.gen_bool(config.outlier_fraction) && y_hi > y_lo {
            rng.gen_range(y_lo..=y_hi)
        } else {
            let id = chosen[rng.gen_range(0..chosen.len())];
            library[usize::from(id.index() - 1)][row] + normal.sample(&mut rng)
        };
        tests.push(TestObservation { x: x[row], y });
    }

    Ok(SyntheticData {
        x,
        library,
        chosen,
        references,
        tests,
    })
}

/// Generate and write `train.csv`, `ideal.csv` and `test.csv` into `config.out_dir`.
pub fn write_datasets(config: &GenerateConfig) -> Result<(SyntheticData, GeneratedFiles), AppError> {
    let data = generate_datasets(config)?;

    create_dir_all(&config.out_dir).map_err(|e| {
        AppError::io(format!(
            "Failed to create output directory '{}': {e}",
            config.out_dir.display()
        ))
    })?;

    let files = GeneratedFiles {
        train: config.out_dir.join("train.csv"),
        ideal: config.out_dir.join("ideal.csv"),
        test: config.out_dir.join("test.csv"),
    };

    let train_header: Vec<String> = std::iter::once("x".to_string())
        .chain((1..=REFERENCE_COUNT).map(|i| format!("y{i}")))
        .collect();
    write_columns(&files.train, &train_header, &data.x, &data.references)?;

    let ideal_header: Vec<String> = std::iter::once("x".to_string())
        .chain((1..=MAX_CANDIDATES).map(|i| format!("y{i}")))
        .collect();
    write_columns(&files.ideal, &ideal_header, &data.x, &data.library)?;

    let test_x: Vec<f64> = data.tests.iter().map(|t| t.x).collect();
    let test_y: Vec<f64> = data.tests.iter().map(|t| t.y).collect();
    write_columns(&files.test, &["x".to_string(), "y".to_string()], &test_x, &[test_y])?;

    info!(
        "Wrote {} grid rows and {} test rows to '{}'",
        data.x.len(),
        data.tests.len(),
        config.out_dir.display()
    );
    Ok((data, files))
}

fn build_grid(config: &GenerateConfig) -> Result<Vec<f64>, AppError> {
    if !(config.x_min.is_finite() && config.x_max.is_finite() && config.x_max > config.x_min) {
        return Err(AppError::usage("Invalid x range for dataset generation."));
    }
    if !(config.step.is_finite() && config.step > 0.0) {
        return Err(AppError::usage("Grid step must be finite and > 0."));
    }

    let span = (config.x_max - config.x_min) / config.step;
    if span >= MAX_GRID_ROWS as f64 {
        return Err(AppError::usage(format!(
            "Grid would exceed {MAX_GRID_ROWS} rows; increase --step."
        )));
    }

    // Half-open range like `-20.0..20.0`; rounding keeps 0.1 steps printable.
    let n = (span - 1e-9).ceil() as usize;
    Ok((0..n)
        .map(|i| ((config.x_min + i as f64 * config.step) * 1e9).round() / 1e9)
        .collect())
}

fn write_columns(path: &Path, header: &[String], x: &[f64], columns: &[Vec<f64>]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(header)
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    for (row, xi) in x.iter().enumerate() {
        let record = std::iter::once(format!("{xi}"))
            .chain(columns.iter().map(|c| format!("{:.6}", c[row])));
        writer
            .write_record(record)
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush '{}': {e}", path.display())))
}
