//! `curve-match` library crate.
//!
//! The binary (`cm`) is a thin wrapper around this library so that:
//!
//! - selection and classification are testable without spawning processes
//! - modules are reusable (e.g., a service that classifies streamed points)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod plot;
pub mod report;
