//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - curve identifiers and curve collections (`CurveId`, `Curve`, `CurveSet`)
//! - selector output (`Selection`, `SelectedPair`)
//! - classifier input/output (`TestObservation`, `ClassificationResult`)
//! - run configuration and the saved run file (`RunConfig`, `GenerateConfig`, `RunFile`)

pub mod types;

pub use types::*;
