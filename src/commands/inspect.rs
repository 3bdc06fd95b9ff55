/// `inspect` command: show one resource in full as YAML.
use super::{Context, Outcome, ensure_consumed, take_call_options};
use crate::cli::args::{InspectArgs, OutputFormat};
use crate::cli::output::write_resources;
use crate::errors::Result;
use crate::params::Params;
use crate::resources::{get_resource, normalize_kind};

/// Run `inspect`.
///
/// # Errors
///
/// Returns `FlowctlError` for bad arguments and client failures.
pub async fn run(args: &InspectArgs, ctx: &Context) -> Result<Outcome> {
    let (kind, _) = normalize_kind(&args.kind)?;
    let mut params = Params::parse(&args.extra.extra)?;
    let opts = take_call_options(&mut params)?;
    ensure_consumed(&params)?;

    let client = ctx.client()?;
    match get_resource(&client, kind, Some(&args.identifier), &opts).await? {
        Some(resource) => {
            write_resources(kind, &resource, OutputFormat::Yaml)?;
            Ok(Outcome::Success)
        }
        None => Ok(Outcome::Failure),
    }
}
