//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the selection/classification code stays clean and testable
//! - output changes are localized

use crate::domain::{ClassificationResult, Selection};
use crate::io::ingest::Ingested;
use crate::report::MatchSummary;

/// One line of dataset bookkeeping (`rows read -> rows used`).
pub fn format_dataset_line<T>(label: &str, data: &Ingested<T>) -> String {
    let mut line = format!(
        "{label:<10} rows={} used={}",
        data.rows_read,
        data.rows_used()
    );
    if data.clean.removed() > 0 {
        line.push_str(&format!(
            " (dropped {} incomplete, {} duplicate)",
            data.clean.missing_removed, data.clean.duplicates_removed
        ));
    }
    line
}

/// Format the selection table.
pub fn format_selection(selection: &Selection) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<10} {:>14} {:>14} {:>14}",
        "reference", "candidate", "sse", "max_dev", "threshold"
    ));
    out.push('\n');
    out.push_str(&format!(
        "{:-<10} {:-<10} {:-<14} {:-<14} {:-<14}",
        "", "", "", "", ""
    ));
    out.push('\n');

    for pair in selection.pairs() {
        out.push_str(&format!(
            "{:<10} {:<10} {:>14.6} {:>14.6} {:>14.6}",
            pair.reference.to_string(),
            pair.candidate.to_string(),
            pair.sse,
            pair.max_deviation,
            pair.threshold()
        ));
        out.push('\n');
    }

    out
}

/// Format the match counts.
pub fn format_match_summary(summary: &MatchSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Matched {} of {} test observation(s); {} left unassigned.\n",
        summary.matched,
        summary.observations,
        summary.unmatched()
    ));
    for (candidate, count) in &summary.per_candidate {
        out.push_str(&format!("  {:<6} {count}\n", candidate.to_string()));
    }
    if let Some(max) = summary.max_deviation {
        out.push_str(&format!("  largest accepted deviation: {max:.6}\n"));
    }
    out
}

/// Format the first `top_n` accepted observations.
pub fn format_results(results: &[ClassificationResult], top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>12} {:>12} {:<10} {:>12}",
        "x", "y", "candidate", "deviation"
    ));
    out.push('\n');
    out.push_str(&format!("{:-<12} {:-<12} {:-<10} {:-<12}", "", "", "", ""));
    out.push('\n');

    for r in results.iter().take(top_n) {
        out.push_str(&format!(
            "{:>12.4} {:>12.4} {:<10} {:>12.6}",
            r.x,
            r.y,
            r.candidate.to_string(),
            r.deviation
        ));
        out.push('\n');
    }
    if results.len() > top_n {
        out.push_str(&format!("... {} more\n", results.len() - top_n));
    }

    out
}
