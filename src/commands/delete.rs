/// `delete` command: remove a resource by identifier, or every resource
/// described by definition files.
use super::{Context, Outcome, definition_files};
use crate::cli::args::DeleteArgs;
use crate::cli::output::{write_status, write_warning};
use crate::errors::{FlowctlError, Result};
use crate::resources::{CallOptions, delete_resource, normalize_kind, parse_definition};

/// Run `delete`.
///
/// # Errors
///
/// Returns `FlowctlError::InvalidArguments` unless exactly one of
/// kind+identifier or paths is given, plus definition and client errors.
pub async fn run(args: &DeleteArgs, ctx: &Context) -> Result<Outcome> {
    match (&args.kind, &args.identifier, args.paths.is_empty()) {
        (Some(kind), Some(identifier), true) => delete_one(kind, identifier, ctx).await,
        (None, None, false) => delete_from_files(args, ctx).await,
        (Some(_), Some(_), false) => Err(FlowctlError::InvalidArguments(
            "Either a resource kind and identifier or path must be provided, not both.".to_owned(),
        )),
        _ => Err(FlowctlError::InvalidArguments(
            "Either a resource kind and identifier or path must be provided.".to_owned(),
        )),
    }
}

async fn delete_one(kind: &str, identifier: &str, ctx: &Context) -> Result<Outcome> {
    let (kind, _) = normalize_kind(kind)?;
    let client = ctx.client()?;

    match delete_resource(&client, kind, Some(identifier), &CallOptions::default()).await? {
        Some(deleted) => {
            let name = kind.name_of(&deleted).unwrap_or(identifier);
            write_status(kind, name, "deleted");
            Ok(Outcome::Success)
        }
        None => Ok(Outcome::Failure),
    }
}

async fn delete_from_files(args: &DeleteArgs, ctx: &Context) -> Result<Outcome> {
    let files = definition_files(&args.paths);
    if files.is_empty() {
        return Ok(Outcome::Success);
    }

    let client = ctx.client()?;
    let mut outcome = Outcome::Success;
    for path in files {
        let definition = parse_definition(&path)?;
        let Some(name) = definition.name() else {
            write_warning(&format!("Resource name not found: {}", definition.path.display()));
            continue;
        };

        let opts = CallOptions {
            version: definition.version.clone(),
            limit: None,
        };
        if delete_resource(&client, definition.kind, Some(name), &opts).await?.is_some() {
            write_status(definition.kind, name, "deleted");
        } else {
            write_warning(&format!("[{}/{name}] not found", definition.kind));
            outcome = Outcome::Failure;
        }
    }

    Ok(outcome)
}
