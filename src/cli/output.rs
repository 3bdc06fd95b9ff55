/// Output: resource rendering, status lines, spinners, errors and logging setup.
use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use super::args::OutputFormat;
use crate::errors::Result;
use crate::render::{Serialization, print_block, resource_table, serialize};
use crate::resources::ResourceKind;

/// Environment variable holding an `EnvFilter` directive for log output.
pub const LOG_ENV: &str = "FLOWCTL_LOG";

/// Install the stderr log subscriber. `FLOWCTL_LOG` overrides the default
/// level, which is `debug` in development mode and `warn` otherwise.
pub fn init_logging(dev_mode: bool) {
    let default = if dev_mode { "flowctl=debug" } else { "flowctl=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

/// Print resources of one kind: a single record or a list.
///
/// # Errors
///
/// Returns render and serialization errors.
pub fn write_resources(kind: ResourceKind, resources: &Value, format: OutputFormat) -> Result<()> {
    match format.serialization() {
        Some(encoding) => print_block(&serialize(resources, encoding)?),
        None => {
            let records = match resources {
                Value::Array(items) => items.as_slice(),
                single => std::slice::from_ref(single),
            };
            print_block(&resource_table(kind, records, Utc::now())?);
        }
    }
    Ok(())
}

/// Print a `--select` result. A selection may reshape records arbitrarily,
/// so it is always serialized; the table format falls back to JSON.
///
/// # Errors
///
/// Returns serialization errors.
pub fn write_selection(selection: &Value, format: Option<OutputFormat>) -> Result<()> {
    print_block(&serialize(selection, selection_encoding(format))?);
    Ok(())
}

fn selection_encoding(format: Option<OutputFormat>) -> Serialization {
    format
        .and_then(OutputFormat::serialization)
        .unwrap_or(Serialization::Json)
}

/// `[kind/name]` in bold.
#[must_use]
pub fn resource_label(kind: impl std::fmt::Display, name: &str) -> String {
    style(format!("[{kind}/{name}]")).bold().to_string()
}

/// Print `[kind/name] action` to stdout.
pub fn write_status(kind: impl std::fmt::Display, name: &str, action: &str) {
    println!("{} {action}", resource_label(kind, name));
}

/// Print a warning line to stderr.
pub fn write_warning(message: &str) {
    let _ = writeln!(std::io::stderr().lock(), "{} {message}", style("Warning:").for_stderr().yellow().bold());
}

/// Start a ticking spinner on stderr.
#[must_use]
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Write an error to stderr: the message with its causes, or the full debug
/// chain in development mode.
pub fn write_error(err: &anyhow::Error, dev_mode: bool) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    let label = style("Error:").for_stderr().red().bold();
    if dev_mode {
        let _ = writeln!(out, "{label} {err:?}");
    } else {
        let _ = writeln!(out, "{label} {err:#}");
    }
}
