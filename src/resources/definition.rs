/// Resource definition files and path expansion for `apply` / `delete -p`.
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use super::kind::ResourceKind;
use crate::errors::{FlowctlError, Result};

/// File extensions recognised as resource definitions.
pub const DEFINITION_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// A parsed resource definition.
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    pub kind: ResourceKind,
    /// Schema version requested by the file, if any.
    pub version: Option<String>,
    /// The body to send, without the `version` field.
    pub body: Value,
    pub path: PathBuf,
}

impl ResourceDefinition {
    /// The resource's name as the server will know it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.kind.name_of(&self.body)
    }
}

/// Read and validate a definition file (YAML or JSON).
///
/// # Errors
///
/// Returns `FlowctlError::InvalidDefinition` when the file is not a mapping,
/// has no `kind`, names a kind that cannot be defined, or requests an
/// unsupported version. I/O and YAML errors propagate.
pub fn parse_definition(path: &Path) -> Result<ResourceDefinition> {
    let contents = std::fs::read_to_string(path)?;
    // YAML is a superset of JSON, so one parser covers every extension.
    let value: Value = serde_yaml::from_str(&contents)?;
    from_value(path, value)
}

fn from_value(path: &Path, value: Value) -> Result<ResourceDefinition> {
    let invalid = |reason: String| FlowctlError::InvalidDefinition {
        path: path.to_path_buf(),
        reason,
    };

    let Value::Object(mut body) = value else {
        return Err(invalid("expected a mapping at the top level".to_owned()));
    };

    let kind_name = body
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing `kind`".to_owned()))?;
    let kind = kind_name
        .parse::<ResourceKind>()
        .ok()
        .filter(|k| k.is_definable())
        .ok_or_else(|| invalid(format!("Unknown resource kind: {kind_name}")))?;

    let version = match body.remove("version") {
        None | Some(Value::Null) => None,
        Some(Value::String(v)) => Some(v),
        Some(other) => Some(other.to_string()),
    };
    if let Some(v) = &version {
        kind.resolve_version(Some(v))?;
    }

    debug!(path = %path.display(), %kind, ?version, "Parsed resource definition");

    Ok(ResourceDefinition {
        kind,
        version,
        body: Value::Object(body),
        path: path.to_path_buf(),
    })
}

/// Whether a path has a definition file extension.
#[must_use]
pub fn is_definition_path(path: &Path) -> bool {
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .is_some_and(|ext| DEFINITION_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Expand files and directories into a list of files.
///
/// Directories are walked (recursively when `recursive`). Returns the files
/// found and the input paths that do not exist.
#[must_use]
pub fn expand_paths(paths: &[PathBuf], recursive: bool) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut expanded = Vec::new();
    let mut not_found = Vec::new();

    for path in paths {
        if path.is_file() {
            expanded.push(path.clone());
        } else if path.is_dir() {
            let walker = WalkDir::new(path)
                .sort_by_file_name()
                .max_depth(if recursive { usize::MAX } else { 1 });
            expanded.extend(
                walker
                    .into_iter()
                    .filter_map(std::result::Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .map(walkdir::DirEntry::into_path),
            );
        } else {
            not_found.push(path.clone());
        }
    }

    (expanded, not_found)
}
