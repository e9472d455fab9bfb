//! Error conversion utilities for CLI.
//!
//! Converts sitedrop-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use sitedrop_core::DeployError;
use std::path::Path;

/// Converts `DeployError` to user-friendly anyhow error with context
pub fn convert_deploy_error(err: DeployError, archive: &Path) -> anyhow::Error {
    match err {
        DeployError::UnsafeEntry { path, reason } => anyhow!(
            "Security violation: Archive '{}' contains unsafe entry '{}' ({reason})\n\
             HINT: This archive may be malicious. \
             Nothing outside the tenant directory was written.",
            archive.display(),
            path.display()
        ),
        DeployError::InputTooLarge { size, max } => anyhow!(
            "Archive '{}' is too large: {size} bytes (max {max})\n\
             HINT: Use --max-input-size to raise the limit.",
            archive.display()
        ),
        DeployError::TooManyEntries { count, max } => anyhow!(
            "Archive '{}' has too many entries: {count} (max {max})\n\
             HINT: Use --max-entries to raise the limit.",
            archive.display()
        ),
        DeployError::ExtractionTooLarge { max } => anyhow!(
            "Archive '{}' expands past {max} bytes\n\
             HINT: The archive may be a zip bomb. Use --max-extracted-size if it is legitimate.",
            archive.display()
        ),
        DeployError::ExtractionTimeout { elapsed_ms } => anyhow!(
            "Extraction of '{}' timed out after {elapsed_ms} ms\n\
             HINT: Use --timeout to allow more time.",
            archive.display()
        ),
        DeployError::EntryPointMissing { entry_point } => anyhow!(
            "Archive '{}' has no {entry_point} at its root\n\
             HINT: Put {entry_point} at the top level of the archive or inside a single folder.",
            archive.display()
        ),
        DeployError::StructureTooDeep { max } => anyhow!(
            "Archive '{}' nests its content more than {max} folders deep",
            archive.display()
        ),
        DeployError::InvalidTenant { tenant, reason } => anyhow!(
            "Invalid tenant '{tenant}': {reason}\n\
             HINT: Tenants are lowercase letters, digits and '-', at most 63 characters."
        ),
        DeployError::InvalidArchive(reason) => anyhow!(
            "Invalid archive '{}': {reason}\n\
             HINT: Only ZIP archives are supported; the file may be corrupted.",
            archive.display()
        ),
        err @ DeployError::StorageUnavailable { .. } => anyhow::Error::from(err).context(
            "Storage unavailable\nHINT: Check that --storage-root exists and is writable.",
        ),
        err @ DeployError::Io(_) => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Adds context to a deployment result
pub fn add_archive_context<T>(
    result: Result<T, DeployError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_deploy_error(e, archive))
}
