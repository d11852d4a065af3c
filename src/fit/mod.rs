//! Curve matching: candidate selection and test-point classification.
//!
//! The selector must run to completion before the classifier; the classifier only
//! ever sees the immutable `Selection` it produced.

pub mod classify;
pub mod selection;

pub use classify::classify;
pub use selection::select;
