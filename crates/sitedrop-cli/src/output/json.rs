//! JSON output formatter for machine-readable output.

use super::formatter::OutputFormatter;
use super::formatter::PlannedEntryView;
use anyhow::Result;
use serde::Serialize;
use sitedrop_core::DeployError;
use sitedrop_core::Deployment;
use sitedrop_core::DeploymentResponse;
use sitedrop_core::extraction::ArchivePlan;

pub struct JsonFormatter;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput {
    entries: Vec<PlannedEntryView>,
    accepted: usize,
    declared_bytes: u64,
    safe: bool,
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        println!("{json}");
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_deployment(&self, deployment: &Deployment) -> Result<()> {
        Self::output(&DeploymentResponse::from(deployment))
    }

    fn format_deploy_failure(&self, error: &DeployError) -> Result<()> {
        Self::output(&DeploymentResponse::from(error))
    }

    fn format_plan(&self, plan: &ArchivePlan) -> Result<()> {
        Self::output(&PlanOutput {
            entries: plan.entries.iter().map(PlannedEntryView::from).collect(),
            accepted: plan.accepted(),
            declared_bytes: plan.declared_bytes(),
            safe: plan.first_rejection().is_none(),
        })
    }
}
