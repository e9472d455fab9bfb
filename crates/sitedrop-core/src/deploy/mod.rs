//! Deployment lifecycle.
//!
//! A [`Deployer`] turns an uploaded archive into a live site for one
//! tenant. Each attempt walks the stages of [`DeploymentStage`] in order
//! and stops at the first failure. Attempts for the same tenant are
//! serialized; attempts for different tenants run independently.

mod lock;
mod response;
mod storage;

use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::PoisonError;
use std::time::Instant;

use tracing::info;
use tracing::warn;

pub use response::DeploymentResponse;

use crate::DeployConfig;
use crate::DeployError;
use crate::Deployment;
use crate::NoopProgress;
use crate::ProgressCallback;
use crate::PublishStrategy;
use crate::Result;
use crate::extraction::ExtractionEngine;
use crate::extraction::check_input;
use crate::flatten::TreeFlattener;
use crate::types::TargetDir;
use crate::types::TenantId;

use lock::TenantLocks;

/// Stages a deployment attempt passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeploymentStage {
    /// Upload received, size not yet trusted.
    Received,
    /// Tenant identifier accepted.
    Authorized,
    /// Working directory ready and empty.
    Prepared,
    /// Archive contents written.
    Extracted,
    /// Redundant nesting collapsed.
    Flattened,
    /// Entry point present and no links in the tree.
    Validated,
    /// Site is live.
    Published,
}

impl std::fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Authorized => "authorized",
            Self::Prepared => "prepared",
            Self::Extracted => "extracted",
            Self::Flattened => "flattened",
            Self::Validated => "validated",
            Self::Published => "published",
        };
        f.write_str(name)
    }
}

/// Orchestrates deployments under one storage root.
///
/// # Examples
///
/// ```no_run
/// use sitedrop_core::DeployConfig;
/// use sitedrop_core::Deployer;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let deployer = Deployer::new(DeployConfig::new("/srv/sites", "sites.example.com"));
///
/// let archive = std::fs::read("site.zip")?;
/// let deployment = deployer.deploy("alice", &archive)?;
/// assert_eq!(deployment.public_url, "https://alice.sites.example.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Deployer {
    config: DeployConfig,
    locks: TenantLocks,
}

impl Deployer {
    /// Creates a deployer. Nothing touches the filesystem until the first
    /// deployment.
    #[must_use]
    pub fn new(config: DeployConfig) -> Self {
        Self {
            config,
            locks: TenantLocks::default(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Returns the directory a tenant's site is served from.
    #[must_use]
    pub fn site_dir(&self, tenant: &TenantId) -> PathBuf {
        self.config
            .storage_root
            .join(tenant.site_name(&self.config.domain_suffix))
    }

    /// Returns the public URL of a tenant's site.
    #[must_use]
    pub fn public_url(&self, tenant: &TenantId) -> String {
        format!(
            "{}://{}",
            self.config.url_scheme,
            tenant.site_name(&self.config.domain_suffix)
        )
    }

    /// Deploys a buffered archive for `tenant`.
    ///
    /// # Errors
    ///
    /// Any [`DeployError`]; see [`Deployer::deploy_with_progress`].
    pub fn deploy(&self, tenant: &str, archive: &[u8]) -> Result<Deployment> {
        self.deploy_with_progress(tenant, archive, &mut NoopProgress)
    }

    /// Deploys an archive read from `reader`.
    ///
    /// At most one byte more than the input ceiling is buffered.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::InvalidTenant` before reading anything if
    /// `tenant` is not a valid identifier,
    /// `DeployError::InputTooLarge` as soon as the stream passes the
    /// input ceiling, `DeployError::Io` if reading fails, and otherwise
    /// whatever [`Deployer::deploy`] returns.
    pub fn deploy_reader<R: Read>(&self, tenant: &str, reader: R) -> Result<Deployment> {
        TenantId::new(tenant)?;

        let max = self.config.limits.max_input_size;
        let mut archive = Vec::new();
        reader
            .take(max.saturating_add(1))
            .read_to_end(&mut archive)?;

        let size = archive.len() as u64;
        if size > max {
            warn!(tenant, size, max, "upload exceeds input ceiling");
            return Err(DeployError::InputTooLarge { size, max });
        }
        self.deploy(tenant, &archive)
    }

    /// Deploys a buffered archive, reporting extraction progress.
    ///
    /// With [`PublishStrategy::Staged`] the previous site stays live until
    /// the new one has been validated, and a failed attempt leaves no
    /// trace. With [`PublishStrategy::InPlace`] the previous site is purged
    /// before extraction and a failed attempt leaves partial content
    /// behind until the next attempt.
    ///
    /// # Errors
    ///
    /// - `DeployError::InvalidTenant` if `tenant` is not a valid identifier,
    ///   checked before the upload is looked at
    /// - `DeployError::InputTooLarge` / `DeployError::InvalidArchive` before
    ///   anything on disk changes
    /// - `DeployError::StorageUnavailable` if directories cannot be
    ///   created, purged or swapped
    /// - any extraction error (see
    ///   [`ExtractionEngine::extract`](crate::extraction::ExtractionEngine::extract))
    /// - `DeployError::StructureTooDeep` from flattening
    /// - `DeployError::EntryPointMissing` or `DeployError::UnsafeEntry` from
    ///   validation
    pub fn deploy_with_progress(
        &self,
        tenant: &str,
        archive: &[u8],
        progress: &mut dyn ProgressCallback,
    ) -> Result<Deployment> {
        let span = tracing::info_span!("deploy", tenant, bytes = archive.len());
        let _guard = span.enter();

        let started = Instant::now();
        let mut stage = DeploymentStage::Received;

        let result = self.run(&mut stage, tenant, archive, progress, started);
        match &result {
            Ok(deployment) => info!(
                url = %deployment.public_url,
                files = deployment.report.files_extracted,
                skipped = deployment.report.files_skipped(),
                bytes = deployment.report.bytes_written,
                duration_ms = deployment.duration.as_millis(),
                "deployment published"
            ),
            Err(err) => warn!(
                %stage,
                kind = ?err.kind(),
                error = %err,
                "deployment failed"
            ),
        }
        result
    }

    /// Runs a deployment on tokio's blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`Deployer::deploy`]; a panicked or cancelled task is
    /// reported as `DeployError::Io`.
    #[cfg(feature = "tokio")]
    pub async fn deploy_blocking(
        self: std::sync::Arc<Self>,
        tenant: String,
        archive: Vec<u8>,
    ) -> Result<Deployment> {
        tokio::task::spawn_blocking(move || self.deploy(&tenant, &archive))
            .await
            .map_err(|e| DeployError::Io(std::io::Error::other(e)))?
    }

    fn run(
        &self,
        stage: &mut DeploymentStage,
        tenant: &str,
        archive: &[u8],
        progress: &mut dyn ProgressCallback,
        started: Instant,
    ) -> Result<Deployment> {
        let tenant = TenantId::new(tenant)?;
        *stage = DeploymentStage::Authorized;

        check_input(archive, &self.config.limits)?;

        let site_name = tenant.site_name(&self.config.domain_suffix);
        let site_dir = self.config.storage_root.join(&site_name);

        let lock = self.locks.handle(&site_dir);
        let _exclusive = lock.lock().unwrap_or_else(PoisonError::into_inner);

        storage::ensure_dir(&site_dir)?;

        let (work, flatten_levels, report) = match self.config.publish {
            PublishStrategy::InPlace => {
                storage::purge_dir(&site_dir)?;
                let work = TargetDir::ensure(&site_dir)?;
                *stage = DeploymentStage::Prepared;
                info!(%stage, dir = %work.as_path().display(), "purged previous deployment");

                let (levels, report) = self.build_site(stage, archive, &work, progress)?;
                (work, levels, report)
            }
            PublishStrategy::Staged => {
                let staging = storage::staging_path(&self.config.storage_root, &site_name);
                storage::remove_if_exists(&staging)?;
                let work = TargetDir::ensure(&staging)?;
                *stage = DeploymentStage::Prepared;
                info!(%stage, dir = %work.as_path().display(), "staging directory ready");

                let built = self
                    .build_site(stage, archive, &work, progress)
                    .and_then(|built| {
                        let retired = storage::retired_path(&self.config.storage_root, &site_name);
                        storage::swap_into_place(work.as_path(), &site_dir, &retired)?;
                        Ok(built)
                    });
                let (levels, report) = match built {
                    Ok(built) => built,
                    Err(err) => {
                        storage::discard(work.as_path());
                        return Err(err);
                    }
                };
                (TargetDir::new(&site_dir)?, levels, report)
            }
        };

        *stage = DeploymentStage::Published;
        Ok(Deployment {
            public_url: self.public_url(&tenant),
            tenant,
            target: work.into_path_buf(),
            report,
            flatten_levels,
            duration: started.elapsed(),
        })
    }

    /// Extracts, flattens and validates into `work`.
    fn build_site(
        &self,
        stage: &mut DeploymentStage,
        archive: &[u8],
        work: &TargetDir,
        progress: &mut dyn ProgressCallback,
    ) -> Result<(usize, crate::ExtractionReport)> {
        let report = ExtractionEngine::new(&self.config.limits, &self.config.policy)
            .extract(archive, work, progress)?;
        *stage = DeploymentStage::Extracted;
        info!(
            %stage,
            files = report.files_extracted,
            skipped = report.files_skipped(),
            bytes = report.bytes_written,
            "archive extracted"
        );

        let levels = TreeFlattener::new(
            &self.config.entry_point,
            self.config.limits.max_flatten_depth,
        )
        .flatten(work.as_path())?;
        *stage = DeploymentStage::Flattened;
        info!(%stage, levels, "tree flattened");

        validate_site(work.as_path(), &self.config.entry_point)?;
        *stage = DeploymentStage::Validated;
        info!(%stage, "site validated");

        Ok((levels, report))
    }
}

/// Requires a regular entry-point file at `root` and no links anywhere.
fn validate_site(root: &Path, entry_point: &str) -> Result<()> {
    let is_file = std::fs::symlink_metadata(root.join(entry_point))
        .is_ok_and(|meta| meta.file_type().is_file());
    if !is_file {
        return Err(DeployError::EntryPointMissing {
            entry_point: entry_point.to_string(),
        });
    }
    storage::ensure_no_links(root)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ExtractionLimits;
    use crate::test_utils::ZipTestBuilder;
    use crate::test_utils::create_test_zip;
    use std::fs;
    use tempfile::TempDir;

    fn deployer(root: &Path, publish: PublishStrategy) -> Deployer {
        Deployer::new(DeployConfig::new(root, "example.com").with_publish(publish))
    }

    #[test]
    fn test_stage_order() {
        assert!(DeploymentStage::Received < DeploymentStage::Authorized);
        assert!(DeploymentStage::Validated < DeploymentStage::Published);
        assert_eq!(DeploymentStage::Prepared.to_string(), "prepared");
    }

    #[test]
    fn test_site_dir_and_url() {
        let deployer = Deployer::new(DeployConfig::new("/srv/sites", "example.com"));
        let tenant = TenantId::new("alice").unwrap();
        assert_eq!(
            deployer.site_dir(&tenant),
            PathBuf::from("/srv/sites/alice.example.com")
        );
        assert_eq!(deployer.public_url(&tenant), "https://alice.example.com");
    }

    #[test]
    fn test_deploy_staged() {
        let temp = TempDir::new().unwrap();
        let deployer = deployer(temp.path(), PublishStrategy::Staged);
        let data = create_test_zip(&[("index.html", b"home")]);

        let deployment = deployer.deploy("alice", &data).unwrap();
        assert_eq!(deployment.public_url, "https://alice.example.com");
        assert_eq!(deployment.tenant.as_str(), "alice");
        assert!(deployment.target.join("index.html").is_file());

        // Only the live site remains under the root
        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["alice.example.com"]);
    }

    #[test]
    fn test_deploy_in_place() {
        let temp = TempDir::new().unwrap();
        let deployer = deployer(temp.path(), PublishStrategy::InPlace);
        let data = create_test_zip(&[("project/index.html", b"home")]);

        let deployment = deployer.deploy("bob", &data).unwrap();
        assert_eq!(deployment.flatten_levels, 1);
        assert!(
            temp.path()
                .join("bob.example.com")
                .join("index.html")
                .is_file()
        );
    }

    #[test]
    fn test_invalid_tenant_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let deployer = deployer(temp.path(), PublishStrategy::Staged);
        let data = create_test_zip(&[("index.html", b"home")]);

        let err = deployer.deploy("../evil", &data).unwrap_err();
        assert!(matches!(err, DeployError::InvalidTenant { .. }));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_tenant_checked_before_upload_size() {
        let temp = TempDir::new().unwrap();
        let config = DeployConfig::new(temp.path(), "example.com").with_limits(ExtractionLimits {
            max_input_size: 64,
            ..Default::default()
        });
        let deployer = Deployer::new(config);
        let data = ZipTestBuilder::new()
            .add_file("index.html", &[b'x'; 512])
            .build();

        let err = deployer.deploy("Not A Tenant", &data).unwrap_err();
        assert!(matches!(err, DeployError::InvalidTenant { .. }));
        assert_eq!(err.status_class(), crate::StatusClass::Unauthorized);

        let err = deployer
            .deploy_reader("Not A Tenant", std::io::Cursor::new(data))
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidTenant { .. }));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_entry_point_missing() {
        let temp = TempDir::new().unwrap();
        let deployer = deployer(temp.path(), PublishStrategy::Staged);
        let data = create_test_zip(&[("a/page.html", b"x"), ("b/page.html", b"y")]);

        let err = deployer.deploy("alice", &data).unwrap_err();
        assert!(matches!(
            err,
            DeployError::EntryPointMissing { ref entry_point } if entry_point == "index.html"
        ));
        // Staging discarded, empty live dir left
        let site = temp.path().join("alice.example.com");
        assert!(site.is_dir());
        assert_eq!(fs::read_dir(&site).unwrap().count(), 0);
        assert!(!temp.path().join(".staging-alice.example.com").exists());
    }

    #[test]
    fn test_custom_entry_point() {
        let temp = TempDir::new().unwrap();
        let deployer = Deployer::new(
            DeployConfig::new(temp.path(), "example.com").with_entry_point("home.html"),
        );
        let data = create_test_zip(&[("home.html", b"x")]);
        assert!(deployer.deploy("alice", &data).is_ok());
    }

    #[test]
    fn test_deploy_reader_limits_input() {
        let temp = TempDir::new().unwrap();
        let config = DeployConfig::new(temp.path(), "example.com").with_limits(ExtractionLimits {
            max_input_size: 64,
            ..Default::default()
        });
        let deployer = Deployer::new(config);
        let data = ZipTestBuilder::new()
            .add_file("index.html", &[b'x'; 512])
            .build();

        let err = deployer
            .deploy_reader("alice", std::io::Cursor::new(data))
            .unwrap_err();
        assert!(matches!(err, DeployError::InputTooLarge { size: 65, max: 64 }));
    }

    #[test]
    fn test_deploy_reader_ok() {
        let temp = TempDir::new().unwrap();
        let deployer = deployer(temp.path(), PublishStrategy::Staged);
        let data = create_test_zip(&[("index.html", b"home")]);

        let deployment = deployer
            .deploy_reader("alice", data.as_slice())
            .unwrap();
        assert_eq!(deployment.report.files_extracted, 1);
    }

    #[test]
    fn test_validate_site_rejects_linked_entry_point() {
        let temp = TempDir::new().unwrap();
        let err = validate_site(temp.path(), "index.html").unwrap_err();
        assert!(matches!(err, DeployError::EntryPointMissing { .. }));

        fs::create_dir(temp.path().join("index.html")).unwrap();
        let err = validate_site(temp.path(), "index.html").unwrap_err();
        assert!(matches!(err, DeployError::EntryPointMissing { .. }));
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_deploy_blocking() {
        let temp = TempDir::new().unwrap();
        let deployer = std::sync::Arc::new(deployer(temp.path(), PublishStrategy::Staged));
        let data = create_test_zip(&[("index.html", b"home")]);

        let deployment = deployer
            .deploy_blocking("alice".to_string(), data)
            .await
            .unwrap();
        assert_eq!(deployment.public_url, "https://alice.example.com");
    }
}
