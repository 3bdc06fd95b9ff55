//! Resource layer: kinds, definitions, and per-kind API operations.
pub mod definition;
pub mod kind;

use serde_json::Value;
use tracing::debug;

pub use definition::{ResourceDefinition, expand_paths, is_definition_path, parse_definition};
pub use kind::{Operation, ResourceKind, normalize_kind};

use crate::client::FlowdaptClient;
use crate::errors::{FlowctlError, Result};

/// Default number of runs listed for a workflow.
pub const DEFAULT_RUN_LIMIT: u64 = 10;

/// Per-call options shared by every operation.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Explicit schema version; latest supported when `None`.
    pub version: Option<String>,
    /// Maximum number of items for list operations that page.
    pub limit: Option<u64>,
}

/// Fetch one resource. A 404 is `Ok(None)`.
///
/// # Errors
///
/// Returns `FlowctlError` for unsupported kinds, missing identifiers, bad
/// versions and client failures other than not-found.
pub async fn get_resource(
    client: &FlowdaptClient,
    kind: ResourceKind,
    identifier: Option<&str>,
    opts: &CallOptions,
) -> Result<Option<Value>> {
    kind.ensure_supports(Operation::Get)?;
    let identifier = require_identifier(kind, identifier)?;
    let version = kind.resolve_version(opts.version.as_deref())?;

    debug!(%kind, identifier, "Getting resource");

    match client
        .get(&["api", kind.collection(), identifier], &version, &[])
        .await
    {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// List resources of a kind. Runs are listed per workflow, so `parent` is
/// required for [`ResourceKind::WorkflowRun`] and ignored otherwise.
///
/// # Errors
///
/// Returns `FlowctlError` for unsupported kinds, a missing parent, bad
/// versions, a non-list response and client failures.
pub async fn list_resources(
    client: &FlowdaptClient,
    kind: ResourceKind,
    parent: Option<&str>,
    opts: &CallOptions,
) -> Result<Vec<Value>> {
    kind.ensure_supports(Operation::List)?;
    let version = kind.resolve_version(opts.version.as_deref())?;

    debug!(%kind, ?parent, "Listing resources");

    let value = if kind == ResourceKind::WorkflowRun {
        let workflow = parent.filter(|p| !p.is_empty()).ok_or_else(|| {
            FlowctlError::InvalidArguments(
                "Listing workflow runs requires a workflow identifier.".to_owned(),
            )
        })?;
        let limit = opts.limit.unwrap_or(DEFAULT_RUN_LIMIT);
        client
            .get(
                &["api", ResourceKind::Workflow.collection(), workflow, "runs"],
                &version,
                &[("limit", limit.to_string())],
            )
            .await?
    } else {
        client
            .get(&["api", kind.collection(), ""], &version, &[])
            .await?
    };

    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(FlowctlError::render(
            format!("{kind} list"),
            format!("expected a list, got {}", short_type(&other)),
        )),
    }
}

/// Delete one resource. A 404 is `Ok(None)`; otherwise the server's echo of
/// the deleted record is returned (may be `null`).
///
/// # Errors
///
/// Returns `FlowctlError` for unsupported kinds, missing identifiers, bad
/// versions and client failures other than not-found.
pub async fn delete_resource(
    client: &FlowdaptClient,
    kind: ResourceKind,
    identifier: Option<&str>,
    opts: &CallOptions,
) -> Result<Option<Value>> {
    kind.ensure_supports(Operation::Delete)?;
    let identifier = require_identifier(kind, identifier)?;
    let version = kind.resolve_version(opts.version.as_deref())?;

    debug!(%kind, identifier, "Deleting resource");

    match client
        .delete(&["api", kind.collection(), identifier], &version)
        .await
    {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Create a resource from a definition body.
///
/// # Errors
///
/// Returns `FlowctlError` for unsupported kinds, bad versions and client failures.
pub async fn create_resource(
    client: &FlowdaptClient,
    kind: ResourceKind,
    body: &Value,
    opts: &CallOptions,
) -> Result<Value> {
    kind.ensure_supports(Operation::Create)?;
    let version = kind.resolve_version(opts.version.as_deref())?;

    debug!(%kind, "Creating resource");

    Ok(client
        .post(&["api", kind.collection(), ""], &version, &[], body)
        .await?)
}

/// Replace a resource with a new body.
///
/// # Errors
///
/// Returns `FlowctlError` for unsupported kinds, missing identifiers, bad
/// versions and client failures.
pub async fn update_resource(
    client: &FlowdaptClient,
    kind: ResourceKind,
    identifier: Option<&str>,
    body: &Value,
    opts: &CallOptions,
) -> Result<Value> {
    kind.ensure_supports(Operation::Update)?;
    let identifier = require_identifier(kind, identifier)?;
    let version = kind.resolve_version(opts.version.as_deref())?;

    debug!(%kind, identifier, "Updating resource");

    Ok(client
        .put(&["api", kind.collection(), identifier], &version, body)
        .await?)
}

fn require_identifier(kind: ResourceKind, identifier: Option<&str>) -> Result<&str> {
    identifier
        .filter(|id| !id.is_empty())
        .ok_or(FlowctlError::MissingIdentifier {
            kind: kind.as_str(),
        })
}

fn short_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
