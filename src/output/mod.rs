//! Output formatting module
//!
//! Renders run summaries for the terminal or for files.

mod formatter;

pub use formatter::{write_results_to_file, OutputFormat, ResultFormatter};
