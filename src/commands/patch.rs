/// `patch` command: deep-merge keyword arguments into a resource and save it.
use serde_json::Value;

use super::{Context, Outcome};
use crate::cli::args::PatchArgs;
use crate::cli::output::write_status;
use crate::errors::{FlowctlError, Result};
use crate::params::{Params, deep_merge};
use crate::resources::{CallOptions, get_resource, normalize_kind, update_resource};

/// Run `patch`.
///
/// # Errors
///
/// Returns `FlowctlError` for bad arguments, non-mapping records and client
/// failures.
pub async fn run(args: &PatchArgs, ctx: &Context) -> Result<Outcome> {
    let (kind, _) = normalize_kind(&args.kind)?;
    let params = Params::parse(&args.extra.extra)?;
    let patch = params.coerced_kwargs();

    let opts = CallOptions {
        version: args.schema_version.clone(),
        limit: None,
    };
    let client = ctx.client()?;

    let Some(resource) = get_resource(&client, kind, Some(&args.identifier), &opts).await? else {
        return Ok(Outcome::Failure);
    };
    let Value::Object(record) = resource else {
        return Err(FlowctlError::render(
            format!("{kind} patch"),
            "the stored record is not a mapping",
        ));
    };

    let patched = Value::Object(deep_merge(&record, &patch));
    let updated = update_resource(&client, kind, Some(&args.identifier), &patched, &opts).await?;

    let name = kind
        .name_of(&updated)
        .or_else(|| kind.name_of(&patched))
        .unwrap_or(&args.identifier);
    write_status(kind, name, "updated");
    Ok(Outcome::Success)
}
