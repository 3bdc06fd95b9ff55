/// Errors surfaced by flowctl commands.
use std::path::PathBuf;

use thiserror::Error;

use crate::client::ClientError;

/// Errors that can occur while running a flowctl command.
#[derive(Debug, Error)]
pub enum FlowctlError {
    /// The kind argument matched no resource kind or alias.
    #[error("No known resource: {0}")]
    UnknownResourceKind(String),

    /// The resource kind exists but does not support the operation.
    #[error("Resource kind {kind} does not support `{operation}`.")]
    UnsupportedOperation {
        kind: &'static str,
        operation: &'static str,
    },

    /// An operation that targets one resource was given no identifier.
    #[error("Resource identifier required for resource kind: {kind}")]
    MissingIdentifier { kind: &'static str },

    /// A schema version outside the supported list.
    #[error(
        "Unsupported resource version: {version} for resource kind: {kind}, supported versions: {}",
        supported.join(", ")
    )]
    UnsupportedVersion {
        kind: &'static str,
        version: String,
        supported: &'static [&'static str],
    },

    /// A resource definition file could not be interpreted.
    #[error("Invalid resource definition {}: {reason}", path.display())]
    InvalidDefinition { path: PathBuf, reason: String },

    /// Command-line arguments that parse but make no sense together.
    #[error("{0}")]
    InvalidArguments(String),

    /// The requested server is not in the configuration.
    #[error("Server `{0}` does not exist.")]
    ServerNotFound(String),

    /// Configuration could not be loaded, validated or modified.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A mutating config command was run with the config file disabled.
    #[error("Cannot set configuration value when config file is deactivated.")]
    ConfigFileDisabled,

    /// The `--select` expression failed to compile or evaluate.
    #[error("Invalid select query: {0}")]
    Query(String),

    /// The record does not have the shape the chosen output expects.
    #[error("Cannot render {what}: {reason}")]
    Render { what: String, reason: String },

    #[error("Unknown metric name: {0}")]
    UnknownMetric(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlowctlError>;

/// Exit code mapping for `FlowctlError` variants.
impl FlowctlError {
    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownResourceKind(_)
            | Self::UnsupportedOperation { .. }
            | Self::MissingIdentifier { .. }
            | Self::UnsupportedVersion { .. }
            | Self::InvalidDefinition { .. }
            | Self::InvalidArguments(_)
            | Self::Config(_)
            | Self::ConfigFileDisabled
            | Self::Query(_)
            | Self::UnknownMetric(_) => 2,
            Self::ServerNotFound(_) => 4,
            Self::Client(client) => match client {
                ClientError::Connection { .. } => 3,
                ClientError::NotFound { .. } => 4,
                _ => 1,
            },
            Self::Render { .. } | Self::Io(_) | Self::Yaml(_) | Self::Json(_) => 1,
        }
    }

    /// Shorthand for a render error about `what`.
    pub fn render(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            what: what.into(),
            reason: reason.into(),
        }
    }
}
