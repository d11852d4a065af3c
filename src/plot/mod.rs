//! Presentation: terminal charts and SVG export.

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;
