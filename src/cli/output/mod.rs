//! CLI output formatting module
//!
//! Provides the table formatter and spinners used by the commands.

pub mod progress;
pub mod table;

pub use progress::{create_spinner, turn_spinner, ProgressBarExt};
pub use table::TableFormatter;
