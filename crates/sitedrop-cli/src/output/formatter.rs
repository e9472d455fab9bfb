//! Output formatter trait for CLI results.

use anyhow::Result;
use serde::Serialize;
use sitedrop_core::DeployError;
use sitedrop_core::Deployment;
use sitedrop_core::EntryKind;
use sitedrop_core::extraction::ArchivePlan;
use sitedrop_core::extraction::PlannedEntry;
use sitedrop_core::security::Verdict;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format a published deployment
    fn format_deployment(&self, deployment: &Deployment) -> Result<()>;

    /// Format a failed deployment before the error is returned
    fn format_deploy_failure(&self, error: &DeployError) -> Result<()>;

    /// Format a dry-run plan
    fn format_plan(&self, plan: &ArchivePlan) -> Result<()>;
}

/// Serializable view of one planned entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedEntryView {
    pub path: String,
    pub kind: &'static str,
    pub size: u64,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&PlannedEntry> for PlannedEntryView {
    fn from(entry: &PlannedEntry) -> Self {
        let (action, target, reason) = match &entry.verdict {
            Verdict::Accept(path) => ("extract", Some(path.display().to_string()), None),
            Verdict::Skip(reason) => ("skip", None, Some(reason.to_string())),
            Verdict::Reject(reason) => ("reject", None, Some(reason.to_string())),
        };
        Self {
            path: entry.path.display().to_string(),
            kind: kind_name(entry.kind),
            size: entry.size,
            action,
            target,
            reason,
        }
    }
}

pub const fn kind_name(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::File => "file",
        EntryKind::Directory => "directory",
        EntryKind::Symlink => "symlink",
        EntryKind::Other => "other",
    }
}
