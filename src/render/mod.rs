//! Output formatter: tables, trees, plots and machine-readable serializations
//! of result records.
pub mod humanize;
pub mod markdown;
pub mod plot;
pub mod syntax;
pub mod table;
pub mod tree;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

pub use plot::{PlotOptions, histogram, line_plot};
pub use table::{Align, BoxFormat, TableStyle, build_table, resource_rows};
pub use tree::{TreeNode, build_tree, render_tree};

use crate::errors::Result;
use crate::resources::ResourceKind;

/// Machine-readable output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serialization {
    /// Pretty-printed JSON.
    Json,
    Yaml,
    /// Single-line compact JSON.
    Raw,
}

/// Serialize any value in a machine-readable encoding. The result has no
/// trailing newline.
///
/// # Errors
///
/// Returns `FlowctlError::Json` or `FlowctlError::Yaml` when the value cannot
/// be encoded.
pub fn serialize<T: Serialize + ?Sized>(value: &T, format: Serialization) -> Result<String> {
    let text = match format {
        Serialization::Json => serde_json::to_string_pretty(value)?,
        Serialization::Raw => serde_json::to_string(value)?,
        Serialization::Yaml => serde_yaml::to_string(value)?.trim_end().to_owned(),
    };
    Ok(text)
}

/// Render resources of one kind as that kind's table.
///
/// # Errors
///
/// Returns `FlowctlError::Render` when a record lacks a column's field.
pub fn resource_table(kind: ResourceKind, resources: &[Value], now: DateTime<Utc>) -> Result<String> {
    let (headers, rows) = resource_rows(kind, resources, now)?;
    Ok(build_table(&headers, &rows, TableStyle::default()).to_string())
}

/// Print text to stdout without doubling a trailing newline.
pub fn print_block(text: &str) {
    println!("{}", text.trim_end_matches('\n'));
}
