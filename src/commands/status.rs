/// `status` command: server version, host metrics and service health as a tree.
use console::style;
use serde_json::{Value, json};

use super::{Context, Outcome};
use crate::errors::Result;
use crate::render::humanize::natural_size;
use crate::render::tree::scalar_text;
use crate::render::{
    Align, BoxFormat, TableStyle, TreeNode, build_table, build_tree, print_block, render_tree,
};
use crate::types::{ServerInfo, SystemStatus};

/// Service state reported as healthy.
const SERVICE_OK: &str = "OK";

/// Run `status`.
///
/// # Errors
///
/// Returns client failures.
pub async fn run(ctx: &Context) -> Result<Outcome> {
    let client = ctx.client()?;
    let status = client.system_status().await?;
    let info = client.ping().await?;

    print_block(&render_tree(&status_tree(&info, &status)));
    Ok(Outcome::Success)
}

/// Build the status tree shown by `status`.
#[must_use]
pub fn status_tree(info: &ServerInfo, status: &SystemStatus) -> TreeNode {
    let system = &status.system;
    let summary = json!({
        "Version": info.version,
        "API Version": info.api_version,
        "Name": status.name,
        "System Metrics": {
            "Time": system.time,
            "CPU": format!("{}%", system.cpu_pct),
            "Memory": natural_size(system.memory),
            "Disk": format!("{}%", system.disk_pct),
            "Network IO Sent": natural_size(system.network_io_sent),
            "Network IO Received": natural_size(system.network_io_recv),
        },
        "Operating System": {
            "Name": status.os.name,
            "Release": status.os.release,
            "Machine": status.os.machine,
        },
    });

    let mut services = TreeNode::new(style("Services").bold().to_string());
    if !status.services.is_empty() {
        services.push(TreeNode::new(services_table(status)));
    }
    build_tree(&summary, None).with_child(services)
}

fn services_table(status: &SystemStatus) -> String {
    let rows: Vec<Vec<String>> = status
        .services
        .iter()
        .map(|(service, detail)| {
            let state = detail
                .get("status")
                .map_or_else(|| scalar_text(&Value::Null), scalar_text);
            let state = if state == SERVICE_OK {
                style(state).green().to_string()
            } else {
                style(state).red().to_string()
            };
            vec![service.clone(), state]
        })
        .collect();

    let table_style = TableStyle {
        box_format: BoxFormat::Rounded,
        align: Align::Center,
        show_header: false,
    };
    build_table::<&str>(&[], &rows, table_style).to_string()
}
