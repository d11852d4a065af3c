//! Dataset cleaning applied to every table before it reaches the core.
//!
//! Cleaning is a capability rather than a base class: anything that can drop
//! incomplete and repeated rows implements [`Cleanable`].

use std::collections::HashSet;

use crate::io::ingest::Table;

/// What a cleaning pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_in: usize,
    pub missing_removed: usize,
    pub duplicates_removed: usize,
}

impl CleanReport {
    pub fn removed(&self) -> usize {
        self.missing_removed + self.duplicates_removed
    }

    pub fn rows_out(&self) -> usize {
        self.rows_in - self.removed()
    }
}

pub trait Cleanable: Sized {
    /// Drop rows with missing values, then rows repeating an earlier row.
    fn clean(self) -> (Self, CleanReport);
}

impl Cleanable for Table {
    fn clean(self) -> (Self, CleanReport) {
        let rows_in = self.rows.len();

        // Source rows ride along so later stages can line up tables by row.
        let complete: Vec<(usize, Vec<f64>)> = self
            .source_rows
            .into_iter()
            .zip(self.rows)
            .filter_map(|(source, row)| Some((source, row.into_iter().collect::<Option<Vec<f64>>>()?)))
            .collect();
        let missing_removed = rows_in - complete.len();

        let mut seen = HashSet::with_capacity(complete.len());
        let mut rows = Vec::with_capacity(complete.len());
        let mut source_rows = Vec::with_capacity(complete.len());
        for (source, row) in complete {
            // `+ 0.0` folds -0.0 into 0.0 so both spellings count as the same value.
            let key: Vec<u64> = row.iter().map(|v| (v + 0.0).to_bits()).collect();
            if seen.insert(key) {
                rows.push(row.into_iter().map(Some).collect());
                source_rows.push(source);
            }
        }
        let duplicates_removed = rows_in - missing_removed - rows.len();

        let report = CleanReport {
            rows_in,
            missing_removed,
            duplicates_removed,
        };
        (
            Table {
                kind: self.kind,
                columns: self.columns,
                rows,
                source_rows,
            },
            report,
        )
    }
}
