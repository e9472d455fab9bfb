//! Validated tenant identifier.

use crate::DeployError;
use crate::Result;

const MAX_TENANT_LEN: usize = 63;

/// An authenticated tenant name, safe to use as a path component and as a
/// DNS label.
///
/// Construction is the only validation point: lowercase ASCII letters,
/// digits and `-`, at most 63 bytes, not starting or ending with `-`.
///
/// # Examples
///
/// ```
/// use sitedrop_core::TenantId;
///
/// let tenant = TenantId::new("alice")?;
/// assert_eq!(tenant.as_str(), "alice");
///
/// assert!(TenantId::new("../root").is_err());
/// assert!(TenantId::new("Alice").is_err());
/// # Ok::<(), sitedrop_core::DeployError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    /// Validates and wraps a tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::InvalidTenant` if the identifier is empty, too
    /// long, or contains anything other than `[a-z0-9-]`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let refuse = |reason| {
            Err(DeployError::InvalidTenant {
                tenant: id.clone(),
                reason,
            })
        };

        if id.is_empty() {
            return refuse("identifier is empty");
        }
        if id.len() > MAX_TENANT_LEN {
            return refuse("identifier longer than 63 bytes");
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return refuse("only lowercase letters, digits and '-' are allowed");
        }
        if id.starts_with('-') || id.ends_with('-') {
            return refuse("identifier may not start or end with '-'");
        }

        Ok(Self(id))
    }

    /// Returns the identifier.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the sandbox directory name: `"{tenant}.{domain_suffix}"`.
    #[must_use]
    pub fn site_name(&self, domain_suffix: &str) -> String {
        let suffix = domain_suffix.trim_matches('.');
        if suffix.is_empty() {
            self.0.clone()
        } else {
            format!("{}.{suffix}", self.0)
        }
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
