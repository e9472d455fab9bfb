//! Transport-facing outcome record.

use serde::Serialize;

use crate::Deployment;
use crate::DeployError;
use crate::ErrorKind;
use crate::StatusClass;

/// Outcome of one deployment attempt, shaped for a response body.
///
/// Serializes to `{"publicUrl": ...}` on success and to
/// `{"errorKind": ..., "message": ...}` on failure.
///
/// # Examples
///
/// ```
/// use sitedrop_core::DeployError;
/// use sitedrop_core::DeploymentResponse;
///
/// let err = DeployError::EntryPointMissing {
///     entry_point: "index.html".into(),
/// };
/// let response = DeploymentResponse::from(&err);
/// assert!(!response.is_success());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeploymentResponse {
    /// The site is live.
    Published {
        /// Externally reachable URL.
        #[serde(rename = "publicUrl")]
        public_url: String,
    },

    /// The attempt failed.
    Failed {
        /// Error classification.
        #[serde(rename = "errorKind")]
        error_kind: ErrorKind,
        /// Human-readable message.
        message: String,
    },
}

impl DeploymentResponse {
    /// Returns `true` for a published deployment.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Published { .. })
    }

    /// Returns the status class of a failure, `None` on success.
    #[must_use]
    pub const fn status_class(&self) -> Option<StatusClass> {
        match self {
            Self::Published { .. } => None,
            Self::Failed { error_kind, .. } => Some(error_kind.status_class()),
        }
    }
}

impl From<&Deployment> for DeploymentResponse {
    fn from(deployment: &Deployment) -> Self {
        Self::Published {
            public_url: deployment.public_url.clone(),
        }
    }
}

impl From<&DeployError> for DeploymentResponse {
    fn from(err: &DeployError) -> Self {
        Self::Failed {
            error_kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<&crate::Result<Deployment>> for DeploymentResponse {
    fn from(result: &crate::Result<Deployment>) -> Self {
        match result {
            Ok(deployment) => deployment.into(),
            Err(err) => err.into(),
        }
    }
}
