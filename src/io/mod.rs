//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - dataset cleaning (`clean`)
//! - result exports (CSV) (`export`)
//! - run JSON read/write (`run_file`)

pub mod clean;
pub mod export;
pub mod ingest;
pub mod run_file;

pub use clean::*;
pub use export::*;
pub use ingest::*;
pub use run_file::*;
