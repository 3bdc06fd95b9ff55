/// CLI argument definitions via clap derive.
use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::docs::DocsStyle;
use crate::render::Serialization;

/// Date and time formats accepted by `metrics --start-time/--end-time`.
pub const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// flowctl: the CLI tool for managing Flowdapt.
#[derive(Debug, Parser)]
#[command(
    name = "flowctl",
    about = "The CLI tool for managing Flowdapt.",
    disable_version_flag = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Show the flowctl version and exit.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// The application directory to use. Defaults to the Flowdapt app directory.
    #[arg(long, env = "FLOWCTL__APP_DIR", value_name = "PATH")]
    pub app_dir: Option<PathBuf>,

    /// The path to the configuration file relative to the application directory.
    /// Use `-` to disable the file.
    #[arg(
        short = 'c',
        long = "config",
        env = "FLOWCTL__CONFIG_FILE",
        value_name = "FILE",
        default_value = "flowctl.yaml"
    )]
    pub config_file: String,

    /// Load a .env file in the configuration.
    #[arg(long = "env", value_name = "FILE")]
    pub dotenv: Vec<PathBuf>,

    /// Run flowctl in development mode.
    #[arg(long = "dev", env = "FLOWCTL__DEV_MODE")]
    pub dev_mode: bool,

    /// The Flowdapt server to connect to. Can be the server name or URL.
    #[arg(short = 's', long, env = "FLOWCTL__SERVER", value_name = "NAME|URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output formats for resource records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Per-kind table (human-readable).
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    Yaml,
    /// Compact single-line JSON.
    Raw,
}

impl OutputFormat {
    /// The machine-readable encoding, or `None` for tables.
    #[must_use]
    pub fn serialization(self) -> Option<Serialization> {
        match self {
            Self::Table => None,
            Self::Json => Some(Serialization::Json),
            Self::Yaml => Some(Serialization::Yaml),
            Self::Raw => Some(Serialization::Raw),
        }
    }
}

/// Output formats for `metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum MetricsFormat {
    /// Terminal plot.
    #[default]
    Graph,
    /// Compact single-line JSON.
    Raw,
    Json,
    Yaml,
}

/// Serialization formats for `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Json,
}

impl From<ConfigFormat> for Serialization {
    fn from(format: ConfigFormat) -> Self {
        match format {
            ConfigFormat::Yaml => Self::Yaml,
            ConfigFormat::Json => Self::Json,
        }
    }
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Get one or more resources of a specific kind.
    Get(GetArgs),
    /// Show the full definition of a resource.
    Inspect(InspectArgs),
    /// Create or update resources from definition files.
    Apply(ApplyArgs),
    /// Delete a resource by identifier or from definition files.
    Delete(DeleteArgs),
    /// Patch fields of a resource.
    Patch(PatchArgs),
    /// Execute a Workflow by identifier with an optional input.
    Run(RunArgs),
    /// Get the status of the server.
    Status,
    /// Get information about the metrics of the server.
    Metrics(MetricsArgs),
    /// Commands for managing flowctl configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Commands useful for internal development.
    #[command(subcommand, hide = true)]
    Dev(DevCommand),
}

/// Free-form `--key value` arguments after the fixed ones.
#[derive(Debug, Clone, Default, Args)]
pub struct ExtraArgs {
    /// Extra keyword arguments as `--key value` pairs (e.g. `--spec.a 1`).
    #[arg(
        value_name = "EXTRA",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub extra: Vec<String>,
}

impl ExtraArgs {
    /// Split an optional identifier from the extras. After `--` clap fills
    /// the identifier with the first extra token, so a hyphenated identifier
    /// is moved back in front of the extras.
    #[must_use]
    pub fn split_identifier(&self, identifier: Option<&str>) -> (Option<String>, Vec<String>) {
        match identifier {
            Some(id) if id.starts_with('-') => {
                let mut extra = Vec::with_capacity(self.extra.len() + 1);
                extra.push(id.to_owned());
                extra.extend(self.extra.iter().cloned());
                (None, extra)
            }
            other => (other.map(str::to_owned), self.extra.clone()),
        }
    }
}

/// Arguments for `flowctl get`.
#[derive(Debug, Args)]
pub struct GetArgs {
    /// The kind of resource to get.
    pub kind: String,

    /// The identifier of the resource to get.
    pub identifier: Option<String>,

    /// The format to output the resource in.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// The select query to filter the results.
    #[arg(long, value_name = "QUERY")]
    pub select: Option<String>,

    #[command(flatten)]
    pub extra: ExtraArgs,
}

/// Arguments for `flowctl inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// The kind of resource to inspect.
    pub kind: String,

    /// The identifier of the resource to inspect.
    pub identifier: String,

    #[command(flatten)]
    pub extra: ExtraArgs,
}

/// Arguments for `flowctl apply`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Resource definition files or directories.
    #[arg(short, long = "path", value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,
}

/// Arguments for `flowctl delete`.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// The kind of resource to delete.
    #[arg(requires = "identifier")]
    pub kind: Option<String>,

    /// The identifier of the resource to delete.
    pub identifier: Option<String>,

    /// Resource definition files or directories.
    #[arg(
        short,
        long = "path",
        value_name = "PATH",
        num_args = 1..,
        conflicts_with_all = ["kind", "identifier"]
    )]
    pub paths: Vec<PathBuf>,
}

/// Arguments for `flowctl patch`.
#[derive(Debug, Args)]
pub struct PatchArgs {
    /// The kind of resource to patch.
    pub kind: String,

    /// The identifier of the resource to patch.
    pub identifier: String,

    /// The schema version of the resource.
    #[arg(short = 's', long, value_name = "VERSION")]
    pub schema_version: Option<String>,

    #[command(flatten)]
    pub extra: ExtraArgs,
}

/// Arguments for `flowctl run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// The identifier of the Workflow to run.
    pub identifier: String,

    /// The output format for `--result-only`.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Only output the result of the run.
    #[arg(long)]
    pub result_only: bool,

    /// Wait for the run to complete.
    #[arg(long, overrides_with = "no_wait")]
    pub wait: bool,

    /// Return as soon as the run is scheduled.
    #[arg(long)]
    pub no_wait: bool,

    /// The namespace to run the Workflow in.
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Show the progress spinner while waiting for the execution.
    #[arg(long, overrides_with = "disable_progress")]
    pub show_progress: bool,

    /// Hide the progress spinner.
    #[arg(long)]
    pub disable_progress: bool,

    #[command(flatten)]
    pub extra: ExtraArgs,
}

impl RunArgs {
    /// `--wait` unless `--no-wait` was given last.
    #[must_use]
    pub fn wait(&self) -> bool {
        !self.no_wait
    }

    /// `--show-progress` unless `--disable-progress` was given last.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !self.disable_progress
    }
}

/// Arguments for `flowctl metrics`.
#[derive(Debug, Args)]
pub struct MetricsArgs {
    /// The name of the metric to get: `cpu`, `memory` or `api_latency`.
    #[arg(default_value = "cpu")]
    pub name: String,

    /// The start time of the metric to get.
    #[arg(short, long, value_parser = parse_datetime, value_name = "DATETIME")]
    pub start_time: Option<NaiveDateTime>,

    /// The end time of the metric to get.
    #[arg(short, long, value_parser = parse_datetime, value_name = "DATETIME")]
    pub end_time: Option<NaiveDateTime>,

    /// The maximum number of data points to get. Negative means unlimited.
    #[arg(short, long, default_value_t = 30, allow_negative_numbers = true)]
    pub limit: i64,

    /// The format to render the metrics in.
    #[arg(short, long, value_enum, default_value = "graph")]
    pub format: MetricsFormat,
}

/// `flowctl config` subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved Configuration.
    Show {
        /// The format to render the configuration as.
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
        /// Print without line numbers or highlighting.
        #[arg(long)]
        raw: bool,
    },
    /// Get the specified key from the configuration.
    Get {
        /// The key to get, e.g. `servers.0.url`.
        key: String,
    },
    /// Set the specified key to the specified value in the configuration file.
    Set {
        /// The key to set.
        key: String,
        /// The value to set.
        value: String,
    },
    /// Get the current server.
    Current,
    /// Set the current server.
    Use {
        /// The server to use.
        server: String,
    },
    /// Add a server to the configuration.
    Add {
        /// The server to add.
        server: String,
        /// The URL of the server.
        url: String,
    },
    /// Remove a server from the configuration.
    Remove {
        /// The server to remove.
        server: String,
    },
}

/// `flowctl dev` subcommands.
#[derive(Debug, Subcommand)]
pub enum DevCommand {
    /// Generate the documentation for the flowctl CLI.
    Docs {
        /// The path to write the documentation to. Printed when omitted.
        output: Option<PathBuf>,
        /// The style of the documentation to generate.
        #[arg(long, value_enum, default_value = "table")]
        style: DocsStyle,
    },
}

/// Parse a date or date-time in one of [`DATETIME_FORMATS`].
///
/// # Errors
///
/// Returns a message listing the accepted formats.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDateTime::parse_from_str(raw, fmt).ok().or_else(|| {
                chrono::NaiveDate::parse_from_str(raw, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
        .ok_or_else(|| {
            format!(
                "invalid date `{raw}`, expected one of: {}",
                DATETIME_FORMATS.join(", ")
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("flowctl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_get_collects_trailing_kwargs() {
        let cli = parse(&["get", "runs", "wf", "-f", "json", "--", "--limit", "5"]);
        let Some(Command::Get(args)) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.kind, "runs");
        assert_eq!(args.identifier.as_deref(), Some("wf"));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.extra.extra, vec!["--limit", "5"]);
    }

    #[test]
    fn test_get_list_without_identifier() {
        let cli = parse(&["get", "workflows", "--", "--version", "v1alpha1"]);
        let Some(Command::Get(args)) = cli.command else {
            panic!("expected get");
        };
        let (identifier, extra) = args.extra.split_identifier(args.identifier.as_deref());
        assert_eq!(identifier, None);
        assert_eq!(extra, vec!["--version", "v1alpha1"]);
    }

    #[test]
    fn test_run_flags_last_one_wins() {
        let cli = parse(&["run", "wf", "--no-wait", "--wait", "--disable-progress"]);
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert!(args.wait());
        assert!(!args.show_progress());

        let cli = parse(&["run", "wf"]);
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert!(args.wait());
        assert!(args.show_progress());
    }

    #[test]
    fn test_metrics_negative_limit_and_dates() {
        let cli = parse(&["metrics", "memory", "-l", "-1", "-s", "2024-05-01"]);
        let Some(Command::Metrics(args)) = cli.command else {
            panic!("expected metrics");
        };
        assert_eq!(args.limit, -1);
        assert_eq!(args.start_time, parse_datetime("2024-05-01 00:00:00").ok());
    }

    #[test]
    fn test_delete_modes_conflict() {
        let result = Cli::try_parse_from(["flowctl", "delete", "workflow", "x", "-p", "a.yaml"]);
        assert!(result.is_err());
        assert!(Cli::try_parse_from(["flowctl", "delete", "-p", "a.yaml"]).is_ok());
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-05-01T10:00:00").is_ok());
        assert!(parse_datetime("2024-05-01 10:00:00").is_ok());
        assert!(parse_datetime("May 1").is_err());
    }
}
