//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during selection and classification
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of reference curves every run must match.
pub const REFERENCE_COUNT: usize = 4;

/// Highest candidate identifier read from a candidate dataset (`y1..y50`).
pub const MAX_CANDIDATES: u16 = 50;

/// Multiplier applied to the worst reference/candidate deviation to obtain the
/// acceptance threshold for test observations.
pub const TOLERANCE_FACTOR: f64 = std::f64::consts::SQRT_2;

/// Identifier of a curve column (`y1`, `y2`, ...).
///
/// Ordering is numeric, so `y2 < y10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurveId(u16);

impl CurveId {
    /// Build an id from its 1-based index.
    pub fn new(index: u16) -> Option<Self> {
        (index > 0).then_some(Self(index))
    }

    pub fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y{}", self.0)
    }
}

impl FromStr for CurveId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix(['y', 'Y'])
            .ok_or_else(|| format!("Invalid curve id '{s}': expected `y<N>`."))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Invalid curve id '{s}': expected `y<N>`."));
        }
        let index: u16 = digits
            .parse()
            .map_err(|_| format!("Invalid curve id '{s}': index out of range."))?;
        CurveId::new(index).ok_or_else(|| format!("Invalid curve id '{s}': index must be >= 1."))
    }
}

impl TryFrom<String> for CurveId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurveId> for String {
    fn from(id: CurveId) -> Self {
        id.to_string()
    }
}

/// An ordered sequence of `(x, y)` samples.
///
/// Samples are not assumed sorted by `x`, and `x` values may repeat. `rows`
/// holds the data-row number each sample was read from, so curves from
/// different files can be lined up after cleaning dropped rows on either side.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub id: CurveId,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub rows: Vec<usize>,
}

impl Curve {
    /// Build a curve from parallel `x`/`y` columns read from rows `0..n`.
    pub fn new(id: CurveId, x: Vec<f64>, y: Vec<f64>) -> Self {
        let rows = (0..y.len()).collect();
        Self::with_rows(id, x, y, rows)
    }

    /// Build a curve whose samples came from the given (ascending) source rows.
    ///
    /// All columns come from the same table rows, so a length mismatch is a bug
    /// in the caller rather than bad input.
    pub fn with_rows(id: CurveId, x: Vec<f64>, y: Vec<f64>, rows: Vec<usize>) -> Self {
        debug_assert_eq!(x.len(), y.len(), "curve columns must share a row index");
        debug_assert_eq!(y.len(), rows.len(), "every sample needs a source row");
        Self { id, x, y, rows }
    }

    /// Sample index pairs `(i, j)` where `self.rows[i] == other.rows[j]`.
    ///
    /// Both row lists are ascending, so this is a single merge pass.
    pub fn aligned_with(&self, other: &Curve) -> Vec<(usize, usize)> {
        let mut pairs = Vec::with_capacity(self.rows.len().min(other.rows.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.rows.len() && j < other.rows.len() {
            match self.rows[i].cmp(&other.rows[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    pairs.push((i, j));
                    i += 1;
                    j += 1;
                }
            }
        }
        pairs
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Index of the sample whose `x` is closest to `x`.
    ///
    /// Ties keep the first sample in curve order. Returns `None` for an empty curve.
    pub fn nearest_index(&self, x: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &xi) in self.x.iter().enumerate() {
            let dist = (xi - x).abs();
            let closer = match best {
                Some((_, best_dist)) => dist < best_dist,
                None => true,
            };
            if closer {
                best = Some((i, dist));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// A set of curves ordered by ascending identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveSet {
    curves: Vec<Curve>,
}

impl CurveSet {
    pub fn new(mut curves: Vec<Curve>) -> Result<Self, AppError> {
        curves.sort_by_key(|c| c.id);
        if let Some(w) = curves.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(AppError::data_shape(format!("Duplicate curve id `{}`.", w[0].id)));
        }
        Ok(Self { curves })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Curve> {
        self.curves.iter()
    }

    pub fn get(&self, id: CurveId) -> Option<&Curve> {
        self.curves
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &self.curves[i])
    }

    pub fn ids(&self) -> Vec<CurveId> {
        self.curves.iter().map(|c| c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

/// The winning candidate for one reference curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPair {
    pub reference: CurveId,
    pub candidate: CurveId,
    /// Sum of squared errors that won the selection.
    pub sse: f64,
    /// `max |reference.y - candidate.y|` over the rows both curves kept.
    pub max_deviation: f64,
}

impl SelectedPair {
    /// Largest accepted deviation for a test observation against this candidate.
    pub fn threshold(&self) -> f64 {
        TOLERANCE_FACTOR * self.max_deviation
    }
}

/// Reference → candidate mapping produced once by the selector.
///
/// Pairs are kept in ascending reference order, which is also the classifier's
/// tie-break order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    pairs: Vec<SelectedPair>,
}

impl Selection {
    pub(crate) fn from_pairs(mut pairs: Vec<SelectedPair>) -> Self {
        pairs.sort_by_key(|p| p.reference);
        Self { pairs }
    }

    pub fn pairs(&self) -> &[SelectedPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn candidate_for(&self, reference: CurveId) -> Option<CurveId> {
        self.pairs
            .iter()
            .find(|p| p.reference == reference)
            .map(|p| p.candidate)
    }
}

/// A single independent `(x, y)` test sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestObservation {
    pub x: f64,
    pub y: f64,
}

/// An accepted test observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "ideal_function")]
    pub candidate: CurveId,
    pub deviation: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub train_csv: PathBuf,
    pub ideal_csv: PathBuf,
    pub test_csv: PathBuf,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_selection: Option<PathBuf>,
    pub export_run: Option<PathBuf>,
    pub svg: Option<PathBuf>,
}

/// Settings for synthetic dataset generation.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub out_dir: PathBuf,
    pub seed: u64,
    pub x_min: f64,
    pub x_max: f64,
    pub step: f64,
    pub test_rows: usize,
    /// Standard deviation of the Gaussian noise added to reference and test samples.
    pub noise: f64,
    /// Share of test rows drawn uniformly instead of near a library curve.
    pub outlier_fraction: f64,
}

/// Samples of one selected pair, stored so plots can be redrawn offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSamples {
    pub reference: CurveId,
    pub candidate: CurveId,
    pub x: Vec<f64>,
    pub reference_y: Vec<f64>,
    pub candidate_y: Vec<f64>,
}

/// A saved run (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub selection: Selection,
    pub pairs: Vec<PairSamples>,
    pub results: Vec<ClassificationResult>,
}
