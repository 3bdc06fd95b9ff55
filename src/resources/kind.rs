/// Resource kinds, their CLI aliases, schema versions and supported operations.
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::errors::FlowctlError;

/// A kind of resource managed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Workflow,
    WorkflowRun,
    TriggerRule,
    Config,
    Plugin,
}

/// An operation a resource kind may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl ResourceKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 5] = [
        Self::Workflow,
        Self::WorkflowRun,
        Self::TriggerRule,
        Self::Config,
        Self::Plugin,
    ];

    /// Canonical snake_case name, as used in definition files and messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::WorkflowRun => "workflow_run",
            Self::TriggerRule => "trigger_rule",
            Self::Config => "config",
            Self::Plugin => "plugin",
        }
    }

    /// Singular aliases accepted on the command line.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Workflow => &["workflow"],
            Self::WorkflowRun => &["workflow_run", "run"],
            Self::TriggerRule => &["trigger_rule", "trigger"],
            Self::Config => &["config"],
            Self::Plugin => &["plugin"],
        }
    }

    /// Plural aliases; these select the list operation.
    #[must_use]
    pub fn plural_aliases(self) -> &'static [&'static str] {
        match self {
            Self::Workflow => &["workflows"],
            Self::WorkflowRun => &["workflow_runs", "runs"],
            Self::TriggerRule => &["trigger_rules", "triggers"],
            Self::Config => &["configs"],
            Self::Plugin => &["plugins"],
        }
    }

    /// Schema versions the CLI can talk, oldest first.
    #[must_use]
    pub fn supported_versions(self) -> &'static [&'static str] {
        match self {
            Self::Workflow
            | Self::WorkflowRun
            | Self::TriggerRule
            | Self::Config
            | Self::Plugin => &["v1alpha1"],
        }
    }

    /// The newest supported schema version.
    #[must_use]
    pub fn latest_version(self) -> &'static str {
        let versions = self.supported_versions();
        versions[versions.len() - 1]
    }

    /// Validate an explicit version, or fall back to the latest.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::UnsupportedVersion` for unknown versions.
    pub fn resolve_version(self, version: Option<&str>) -> Result<String, FlowctlError> {
        match version {
            None => Ok(self.latest_version().to_owned()),
            Some(v) if self.supported_versions().contains(&v) => Ok(v.to_owned()),
            Some(v) => Err(FlowctlError::UnsupportedVersion {
                kind: self.as_str(),
                version: v.to_owned(),
                supported: self.supported_versions(),
            }),
        }
    }

    /// Whether `op` is available for this kind.
    #[must_use]
    pub fn supports(self, op: Operation) -> bool {
        match self {
            Self::Workflow | Self::TriggerRule | Self::Config => true,
            Self::WorkflowRun => matches!(op, Operation::Get | Operation::List | Operation::Delete),
            Self::Plugin => matches!(op, Operation::Get | Operation::List),
        }
    }

    /// Fail with `UnsupportedOperation` unless `op` is available.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::UnsupportedOperation`.
    pub fn ensure_supports(self, op: Operation) -> Result<(), FlowctlError> {
        if self.supports(op) {
            Ok(())
        } else {
            Err(FlowctlError::UnsupportedOperation {
                kind: self.as_str(),
                operation: op.as_str(),
            })
        }
    }

    /// Whether resources of this kind can be written as definition files.
    #[must_use]
    pub fn is_definable(self) -> bool {
        self.supports(Operation::Create)
    }

    /// API collection segment under `/api/`.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Workflow => "workflows",
            Self::WorkflowRun => "runs",
            Self::TriggerRule => "triggers",
            Self::Config => "configs",
            Self::Plugin => "plugins",
        }
    }

    /// The display name of a record of this kind.
    ///
    /// Workflows, trigger rules and configs keep it under `metadata.name`;
    /// runs and plugins carry a top-level `name`.
    #[must_use]
    pub fn name_of(self, record: &Value) -> Option<&str> {
        let name = match self {
            Self::Workflow | Self::TriggerRule | Self::Config => {
                record.get("metadata").and_then(|m| m.get("name"))
            }
            Self::WorkflowRun | Self::Plugin => record.get("name"),
        };
        name.and_then(Value::as_str).filter(|n| !n.is_empty())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a canonical kind name (as found in definition files).
impl FromStr for ResourceKind {
    type Err = FlowctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| FlowctlError::UnknownResourceKind(s.to_owned()))
    }
}

/// Resolve a user-supplied kind or alias.
///
/// Returns the kind and whether a plural alias was used.
///
/// # Errors
///
/// Returns `FlowctlError::UnknownResourceKind` when nothing matches.
pub fn normalize_kind(input: &str) -> Result<(ResourceKind, bool), FlowctlError> {
    let normalized = input.trim().to_lowercase();

    if let Some(kind) = ResourceKind::ALL
        .into_iter()
        .find(|k| k.plural_aliases().contains(&normalized.as_str()))
    {
        return Ok((kind, true));
    }

    ResourceKind::ALL
        .into_iter()
        .find(|k| k.aliases().contains(&normalized.as_str()))
        .map(|kind| (kind, false))
        .ok_or_else(|| FlowctlError::UnknownResourceKind(input.to_owned()))
}
