/// `apply` command: create or update resources from definition files.
use tracing::debug;

use super::{Context, Outcome, definition_files};
use crate::cli::args::ApplyArgs;
use crate::cli::output::{write_status, write_warning};
use crate::errors::Result;
use crate::resources::{CallOptions, create_resource, get_resource, parse_definition, update_resource};

/// Run `apply`.
///
/// # Errors
///
/// Returns `FlowctlError` for definitions that fail to parse and client
/// failures. Files applied before the failure stay applied.
pub async fn run(args: &ApplyArgs, ctx: &Context) -> Result<Outcome> {
    let files = definition_files(&args.paths);
    if files.is_empty() {
        return Ok(Outcome::Success);
    }

    let client = ctx.client()?;
    for path in files {
        let definition = parse_definition(&path)?;
        let Some(name) = definition.name().map(str::to_owned) else {
            write_warning(&format!("Resource name not found: {}", definition.path.display()));
            continue;
        };

        let opts = CallOptions {
            version: definition.version.clone(),
            limit: None,
        };
        let existing = get_resource(&client, definition.kind, Some(&name), &opts).await?;
        debug!(
            kind = %definition.kind,
            %name,
            path = %definition.path.display(),
            exists = existing.is_some(),
            "Applying definition"
        );

        if existing.is_some() {
            update_resource(&client, definition.kind, Some(&name), &definition.body, &opts).await?;
            write_status(definition.kind, &name, "updated");
        } else {
            create_resource(&client, definition.kind, &definition.body, &opts).await?;
            write_status(definition.kind, &name, "created");
        }
    }

    Ok(Outcome::Success)
}
