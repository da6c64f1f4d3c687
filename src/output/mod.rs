//! Output writers for analysis results.
//!
//! JSON is the canonical interchange format consumed by the presentation
//! layer; the text summary is for terminal use.

pub mod json;
pub mod summary;

// Re-export main functions
pub use json::{read_analysis, write_analysis};
pub use summary::render_summary;
