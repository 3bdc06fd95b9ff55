/// `get` command: fetch one resource or list a kind, optionally through a
/// `--select` query.
use serde_json::Value;

use super::{Context, Outcome, ensure_consumed, take_call_options};
use crate::cli::args::GetArgs;
use crate::cli::output::{write_resources, write_selection};
use crate::errors::Result;
use crate::params::Params;
use crate::query::{is_empty_selection, select};
use crate::resources::{get_resource, list_resources, normalize_kind};

/// Run `get`.
///
/// # Errors
///
/// Returns `FlowctlError` for bad arguments, client failures, query errors
/// and records that cannot be rendered.
pub async fn run(args: &GetArgs, ctx: &Context) -> Result<Outcome> {
    let (kind, plural) = normalize_kind(&args.kind)?;
    let (identifier, extra) = args.extra.split_identifier(args.identifier.as_deref());
    let mut params = Params::parse(&extra)?;
    let opts = take_call_options(&mut params)?;
    ensure_consumed(&params)?;

    let client = ctx.client()?;
    let resources = if plural {
        let items = list_resources(&client, kind, identifier.as_deref(), &opts).await?;
        (!items.is_empty()).then_some(Value::Array(items))
    } else {
        get_resource(&client, kind, identifier.as_deref(), &opts).await?
    };

    let Some(resources) = resources else {
        return Ok(Outcome::Failure);
    };

    match &args.select {
        Some(query) => {
            let selection = select(query, &resources)?;
            if is_empty_selection(&selection) {
                return Ok(Outcome::Failure);
            }
            write_selection(&selection, args.format)?;
        }
        None => write_resources(kind, &resources, args.format.unwrap_or_default())?,
    }

    Ok(Outcome::Success)
}
