//! Deploy command implementation.

use crate::cli::DeployArgs;
use crate::error::convert_deploy_error;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use sitedrop_core::Deployer;
use sitedrop_core::NoopProgress;
use std::fs;
use std::io;
use tracing::debug;

pub fn execute(
    args: &DeployArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> Result<()> {
    let deployer = Deployer::new(args.config());

    let result = if args.reads_stdin() {
        debug!(tenant = %args.tenant, "reading archive from stdin");
        deployer.deploy_reader(&args.tenant, io::stdin().lock())
    } else {
        let archive = fs::read(&args.archive)
            .with_context(|| format!("Failed to read archive '{}'", args.archive.display()))?;
        debug!(archive = %args.archive.display(), bytes = archive.len(), "archive loaded");

        if show_progress && CliProgress::should_show() {
            let mut progress = CliProgress::new("Deploying");
            deployer.deploy_with_progress(&args.tenant, &archive, &mut progress)
        } else {
            deployer.deploy_with_progress(&args.tenant, &archive, &mut NoopProgress)
        }
    };

    match result {
        Ok(deployment) => formatter.format_deployment(&deployment),
        Err(err) => {
            formatter.format_deploy_failure(&err)?;
            Err(convert_deploy_error(err, &args.archive))
        }
    }
}
