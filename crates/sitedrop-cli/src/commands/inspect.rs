//! Inspect command implementation.

use crate::cli::InspectArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use sitedrop_core::plan_archive;
use std::fs;

pub fn execute(args: &InspectArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let archive = fs::read(&args.archive)
        .with_context(|| format!("Failed to read archive '{}'", args.archive.display()))?;

    let plan = add_archive_context(
        plan_archive(&archive, &args.limits.limits(), &args.limits.policy()),
        &args.archive,
    )?;

    formatter.format_plan(&plan)?;

    if let Some(rejected) = plan.first_rejection() {
        bail!(
            "Archive '{}' would be refused: unsafe entry '{}'",
            args.archive.display(),
            rejected.path.display()
        );
    }

    Ok(())
}
