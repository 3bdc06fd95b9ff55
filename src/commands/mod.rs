/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod apply;
pub mod config;
pub mod delete;
pub mod dev;
pub mod get;
pub mod inspect;
pub mod metrics;
pub mod patch;
pub mod run;
pub mod status;

use std::path::PathBuf;

use crate::cli::Command;
use crate::cli::output::write_warning;
use crate::client::FlowdaptClient;
use crate::config::Configuration;
use crate::errors::{FlowctlError, Result};
use crate::params::Params;
use crate::resources::{CallOptions, expand_paths, is_definition_path};

/// State shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Configuration,
}

impl Context {
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// A client for the current server.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::ServerNotFound` when the current server is not
    /// configured, or a client error when its URL cannot be used.
    pub fn client(&self) -> Result<FlowdaptClient> {
        let server = self.config.current()?;
        Ok(FlowdaptClient::new(&server.url)?)
    }
}

/// How a command finished when it did not fail with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Nothing found, or a run that did not finish: exit 1 without an error message.
    Failure,
}

impl Outcome {
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

/// Dispatch a parsed `Command` to its handler.
///
/// # Errors
///
/// Returns `FlowctlError` on any command failure.
pub async fn dispatch(command: &Command, ctx: &mut Context) -> Result<Outcome> {
    match command {
        Command::Get(args) => get::run(args, ctx).await,
        Command::Inspect(args) => inspect::run(args, ctx).await,
        Command::Apply(args) => apply::run(args, ctx).await,
        Command::Delete(args) => delete::run(args, ctx).await,
        Command::Patch(args) => patch::run(args, ctx).await,
        Command::Run(args) => run::run(args, ctx).await,
        Command::Status => status::run(ctx).await,
        Command::Metrics(args) => metrics::run(args, ctx).await,
        Command::Config(cmd) => config::run(cmd, ctx),
        Command::Dev(cmd) => dev::run(cmd),
    }
}

/// Take the `--version` and `--limit` keyword arguments shared by resource
/// commands.
///
/// # Errors
///
/// Returns `FlowctlError::InvalidArguments` for a non-numeric limit.
pub fn take_call_options(params: &mut Params) -> Result<CallOptions> {
    let version = params.take_string("version");
    let limit = params
        .take_string("limit")
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| {
                FlowctlError::InvalidArguments(format!("Invalid limit: {raw}"))
            })
        })
        .transpose()?;
    Ok(CallOptions { version, limit })
}

/// Fail when trailing arguments were given that nothing consumed.
///
/// # Errors
///
/// Returns `FlowctlError::InvalidArguments` listing the leftovers.
pub fn ensure_consumed(params: &Params) -> Result<()> {
    let mut leftovers: Vec<String> = params.args.clone();
    leftovers.extend(params.kwargs.keys().map(|k| format!("--{k}")));
    if leftovers.is_empty() {
        Ok(())
    } else {
        Err(FlowctlError::InvalidArguments(format!(
            "Unexpected arguments: {}",
            leftovers.join(" ")
        )))
    }
}

/// Expand `--path` inputs into definition files, warning about missing
/// paths and files that are not definitions.
#[must_use]
pub fn definition_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let (expanded, not_found) = expand_paths(paths, true);
    for path in &not_found {
        write_warning(&format!("File not found: {}", path.display()));
    }
    expanded
        .into_iter()
        .filter(|path| {
            let keep = is_definition_path(path);
            if !keep {
                write_warning(&format!("File not resource definition: {}", path.display()));
            }
            keep
        })
        .collect()
}
