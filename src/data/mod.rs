//! Data sources that do not come from user CSVs.
//!
//! - seeded synthetic datasets for demos and end-to-end tests (`synthetic`)

pub mod synthetic;

pub use synthetic::{GeneratedFiles, SyntheticData, generate_datasets, library_value, write_datasets};
