//! Sandboxed static-site deployment from untrusted ZIP uploads.
//!
//! `sitedrop-core` takes an archive uploaded by a tenant and turns it into
//! a live static site under a per-tenant directory, with built-in
//! protection against path traversal, symlink planting, zip bombs,
//! oversized uploads and unwanted files (dotfiles, dependency manifests,
//! non-asset extensions).
//!
//! A deployment runs through four components:
//!
//! - [`security::EntryInspector`] accepts, skips or rejects each entry
//! - [`extraction::ExtractionEngine`] streams entries to disk under an
//!   [`security::ExtractionBudget`]
//! - [`flatten::TreeFlattener`] collapses redundant wrapper directories
//! - [`Deployer`] prepares, validates and publishes the result
//!
//! # Examples
//!
//! ```no_run
//! use sitedrop_core::DeployConfig;
//! use sitedrop_core::Deployer;
//! use sitedrop_core::DeploymentResponse;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let deployer = Deployer::new(DeployConfig::new("/srv/sites", "sites.example.com"));
//!
//! let archive = std::fs::read("upload.zip")?;
//! let result = deployer.deploy("alice", &archive);
//! println!("{}", serde_json::to_string(&DeploymentResponse::from(&result))?);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod copy;
pub mod deploy;
pub mod error;
pub mod extraction;
pub mod flatten;
pub mod formats;
pub mod report;
pub mod security;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use api::deploy_archive;
pub use api::extract_archive;
pub use config::DeployConfig;
pub use config::EntryPolicy;
pub use config::ExtractionLimits;
pub use config::PublishStrategy;
pub use deploy::Deployer;
pub use deploy::DeploymentResponse;
pub use deploy::DeploymentStage;
pub use error::DeployError;
pub use error::ErrorKind;
pub use error::Result;
pub use error::StatusClass;
pub use error::UnsafeReason;
pub use extraction::plan_archive;
pub use report::Deployment;
pub use report::ExtractionReport;
pub use report::NoopProgress;
pub use report::ProgressCallback;

// Re-export types module for easier access
pub use types::EntryKind;
pub use types::TenantId;
