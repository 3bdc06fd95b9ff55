/// CLI layer: argument parsing and output formatting.
pub mod args;
pub mod output;

pub use args::{Cli, Command, OutputFormat};
pub use output::{init_logging, write_error};
