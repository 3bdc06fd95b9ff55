/// `run` command: execute a workflow and report its final state.
use console::style;
use serde_json::Value;

use super::{Context, Outcome};
use crate::cli::args::{OutputFormat, RunArgs};
use crate::cli::output::{resource_label, spinner};
use crate::errors::Result;
use crate::params::Params;
use crate::render::{print_block, serialize, tree::scalar_text};
use crate::resources::{CallOptions, ResourceKind, get_resource};
use crate::types::{RunOptions, WorkflowRun};

/// Run state that counts as success.
pub const FINISHED: &str = "finished";

/// Run `run`.
///
/// # Errors
///
/// Returns `FlowctlError` for bad arguments and client failures.
pub async fn run(args: &RunArgs, ctx: &Context) -> Result<Outcome> {
    let params = Params::parse(&args.extra.extra)?;
    let input = Value::Object(params.coerced_kwargs());

    let client = ctx.client()?;
    let workflow = get_resource(
        &client,
        ResourceKind::Workflow,
        Some(&args.identifier),
        &CallOptions::default(),
    )
    .await?;
    let Some(workflow) = workflow else {
        println!("{} not found", resource_label(ResourceKind::Workflow, &args.identifier));
        return Ok(Outcome::Failure);
    };

    let uid = workflow
        .pointer("/metadata/uid")
        .and_then(Value::as_str)
        .unwrap_or(&args.identifier);
    let name = ResourceKind::Workflow
        .name_of(&workflow)
        .unwrap_or(&args.identifier);

    let opts = RunOptions {
        wait: args.wait(),
        namespace: args.namespace.clone(),
        version: ResourceKind::WorkflowRun.latest_version().to_owned(),
    };

    let progress = args.show_progress().then(|| {
        spinner(format!("Running {}...", resource_label(ResourceKind::Workflow, name)))
    });
    let result = client.run_workflow(uid, &input, &opts).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let run = result?;

    if args.result_only {
        match args.format.and_then(OutputFormat::serialization) {
            Some(encoding) => print_block(&serialize(&run.result, encoding)?),
            None => println!("{}", scalar_text(&run.result)),
        }
        return Ok(Outcome::Success);
    }

    println!("{}", summary_line(&run));
    if run.state == FINISHED {
        Ok(Outcome::Success)
    } else {
        Ok(Outcome::Failure)
    }
}

/// `[workflow_run/name] [STATE]: result`, with the state coloured by outcome.
#[must_use]
pub fn summary_line(run: &WorkflowRun) -> String {
    let state = format!("[{}]", run.state.to_uppercase());
    let state = match run.state.as_str() {
        FINISHED => style(state).green(),
        "failed" => style(state).red(),
        _ => style(state).yellow(),
    };
    format!(
        "{} {state}: {}",
        resource_label(ResourceKind::WorkflowRun, &run.name),
        scalar_text(&run.result)
    )
}
