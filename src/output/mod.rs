//! Output formatting module
//!
//! Renders run summaries as text reports or JSON.

mod formatter;

pub use formatter::{write_results_to_file, OutputFormat, ResultFormatter};
