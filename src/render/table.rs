/// Table rendering: box styles and per-kind resource tables.
use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_FULL, ASCII_MARKDOWN, NOTHING, UTF8_FULL, UTF8_HORIZONTAL_ONLY};
use comfy_table::{CellAlignment, Table};
use serde_json::Value;

use super::humanize::{age, natural_delta, parse_timestamp};
use super::tree::scalar_text;
use crate::errors::{FlowctlError, Result};
use crate::resources::ResourceKind;

/// Border style of a rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxFormat {
    /// No borders at all.
    #[default]
    Plain,
    /// Horizontal rules only.
    Simple,
    /// Full borders with rounded corners.
    Rounded,
    /// GitHub-flavoured markdown table.
    Markdown,
    /// Full ASCII borders.
    Ascii,
}

/// Horizontal alignment of cell contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl From<Align> for CellAlignment {
    fn from(align: Align) -> Self {
        match align {
            Align::Left => Self::Left,
            Align::Center => Self::Center,
            Align::Right => Self::Right,
        }
    }
}

/// Options for [`build_table`].
#[derive(Debug, Clone, Copy)]
pub struct TableStyle {
    pub box_format: BoxFormat,
    pub align: Align,
    pub show_header: bool,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            box_format: BoxFormat::Plain,
            align: Align::Left,
            show_header: true,
        }
    }
}

/// Build a table from headers and string rows.
#[must_use]
pub fn build_table<S: AsRef<str>>(columns: &[S], rows: &[Vec<String>], style: TableStyle) -> Table {
    let mut table = Table::new();
    match style.box_format {
        BoxFormat::Plain => {
            table.load_preset(NOTHING);
        }
        BoxFormat::Simple => {
            table.load_preset(UTF8_HORIZONTAL_ONLY);
        }
        BoxFormat::Rounded => {
            table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
        }
        BoxFormat::Markdown => {
            table.load_preset(ASCII_MARKDOWN);
        }
        BoxFormat::Ascii => {
            table.load_preset(ASCII_FULL);
        }
    }

    if style.show_header && !columns.is_empty() {
        table.set_header(columns.iter().map(|c| console::style(c.as_ref()).bold().to_string()));
    }
    for row in rows {
        table.add_row(row.iter().map(String::as_str));
    }

    let alignment = CellAlignment::from(style.align);
    for column in table.column_iter_mut() {
        column.set_cell_alignment(alignment);
    }

    table
}

/// Headers and rows for a list of resources of one kind.
///
/// # Errors
///
/// Returns `FlowctlError::Render` when a record lacks a field the kind's
/// table needs.
pub fn resource_rows(
    kind: ResourceKind,
    resources: &[Value],
    now: DateTime<Utc>,
) -> Result<(Vec<&'static str>, Vec<Vec<String>>)> {
    let headers: Vec<&'static str> = match kind {
        ResourceKind::Workflow => vec!["UID", "NAME", "CREATED"],
        ResourceKind::WorkflowRun => vec!["UID", "NAME", "STATUS", "STARTED", "DURATION"],
        ResourceKind::TriggerRule | ResourceKind::Config => vec!["UID", "NAME", "TYPE", "CREATED"],
        ResourceKind::Plugin => vec!["NAME", "MODULE", "VERSION"],
    };

    let rows = resources
        .iter()
        .map(|resource| resource_row(kind, resource, now))
        .collect::<Result<Vec<_>>>()?;

    Ok((headers, rows))
}

fn resource_row(kind: ResourceKind, r: &Value, now: DateTime<Utc>) -> Result<Vec<String>> {
    let row = match kind {
        ResourceKind::Workflow => vec![
            field(kind, r, "metadata.uid")?,
            field(kind, r, "metadata.name")?,
            created(kind, r, now)?,
        ],
        ResourceKind::WorkflowRun => {
            let started = field(kind, r, "started_at")?;
            let duration = match lookup(r, "finished_at").filter(|v| !v.is_null()) {
                Some(finished) => {
                    let finished = timestamp(kind, "finished_at", &scalar_text(finished))?;
                    let started = timestamp(kind, "started_at", &started)?;
                    natural_delta(finished - started)
                }
                None => "...".to_owned(),
            };
            vec![
                field(kind, r, "uid")?,
                field(kind, r, "name")?,
                field(kind, r, "state")?,
                age(&started, now).ok_or_else(|| bad_timestamp(kind, "started_at"))?,
                duration,
            ]
        }
        ResourceKind::TriggerRule => vec![
            field(kind, r, "metadata.uid")?,
            field(kind, r, "metadata.name")?,
            field(kind, r, "spec.type")?,
            created(kind, r, now)?,
        ],
        ResourceKind::Config => {
            let selector_type = match lookup(r, "spec.selector").filter(|v| !v.is_null()) {
                Some(_) => field(kind, r, "spec.selector.type")?,
                None => String::new(),
            };
            vec![
                field(kind, r, "metadata.uid")?,
                field(kind, r, "metadata.name")?,
                selector_type,
                created(kind, r, now)?,
            ]
        }
        ResourceKind::Plugin => vec![
            field(kind, r, "name")?,
            field(kind, r, "module")?,
            field(kind, r, "metadata.version")?,
        ],
    };
    Ok(row)
}

/// Follow a dotted path through nested mappings.
fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, key| current.get(key))
}

fn field(kind: ResourceKind, record: &Value, path: &str) -> Result<String> {
    lookup(record, path)
        .map(scalar_text)
        .ok_or_else(|| FlowctlError::render(format!("{kind} table"), format!("missing field `{path}`")))
}

fn created(kind: ResourceKind, record: &Value, now: DateTime<Utc>) -> Result<String> {
    let raw = field(kind, record, "metadata.created_at")?;
    age(&raw, now).ok_or_else(|| bad_timestamp(kind, "metadata.created_at"))
}

fn timestamp(kind: ResourceKind, path: &str, raw: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(raw).ok_or_else(|| bad_timestamp(kind, path))
}

fn bad_timestamp(kind: ResourceKind, path: &str) -> FlowctlError {
    FlowctlError::render(format!("{kind} table"), format!("`{path}` is not a timestamp"))
}
