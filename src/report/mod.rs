//! Reporting utilities: match summaries and formatted terminal output.

use std::collections::BTreeMap;

use crate::domain::{ClassificationResult, CurveId};

pub mod format;

pub use format::*;

/// Aggregate view of a classification run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    pub observations: usize,
    pub matched: usize,
    /// Accepted observations per candidate, in identifier order.
    pub per_candidate: BTreeMap<CurveId, usize>,
    pub max_deviation: Option<f64>,
}

impl MatchSummary {
    pub fn unmatched(&self) -> usize {
        self.observations - self.matched
    }
}

/// Summarize results against the number of observations that went in.
pub fn summarize_matches(observations: usize, results: &[ClassificationResult]) -> MatchSummary {
    let mut per_candidate = BTreeMap::new();
    for r in results {
        *per_candidate.entry(r.candidate).or_insert(0) += 1;
    }
    let max_deviation = results.iter().map(|r| r.deviation).reduce(f64::max);

    MatchSummary {
        observations,
        matched: results.len(),
        per_candidate,
        max_deviation,
    }
}
