//! High-level public API for one-shot extraction and deployment.

use std::path::Path;

use crate::DeployConfig;
use crate::Deployer;
use crate::Deployment;
use crate::EntryPolicy;
use crate::ExtractionLimits;
use crate::ExtractionReport;
use crate::NoopProgress;
use crate::Result;
use crate::extraction::ExtractionEngine;
use crate::types::TargetDir;

/// Extracts a buffered ZIP archive into an existing directory.
///
/// Applies the full entry policy and all limits, but neither flattens nor
/// validates the result. Use [`Deployer`] for a complete deployment.
///
/// # Errors
///
/// Returns `DeployError::Io` if `output_dir` is not an existing writable
/// directory, and any extraction error otherwise.
///
/// # Examples
///
/// ```no_run
/// use sitedrop_core::EntryPolicy;
/// use sitedrop_core::ExtractionLimits;
/// use sitedrop_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archive = std::fs::read("site.zip")?;
/// let report = extract_archive(
///     &archive,
///     "/tmp/preview",
///     &ExtractionLimits::default(),
///     &EntryPolicy::default(),
/// )?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>>(
    archive: &[u8],
    output_dir: P,
    limits: &ExtractionLimits,
    policy: &EntryPolicy,
) -> Result<ExtractionReport> {
    let target = TargetDir::new(output_dir.as_ref())?;
    ExtractionEngine::new(limits, policy).extract(archive, &target, &mut NoopProgress)
}

/// Runs a single deployment with a throwaway [`Deployer`].
///
/// Callers deploying repeatedly should keep one `Deployer` so same-tenant
/// attempts are serialized.
///
/// # Errors
///
/// Any error from [`Deployer::deploy`].
pub fn deploy_archive(config: DeployConfig, tenant: &str, archive: &[u8]) -> Result<Deployment> {
    Deployer::new(config).deploy(tenant, archive)
}
