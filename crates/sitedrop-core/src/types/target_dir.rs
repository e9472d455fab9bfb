//! Validated tenant target directory.

use crate::DeployError;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;

/// A directory every extracted path must stay inside.
///
/// Once constructed, a `TargetDir` is an existing, writable directory held
/// as an absolute canonical path. Extraction joins only [`SafePath`]s onto
/// it, so the sandbox boundary is the canonical prefix stored here.
///
/// # Security Considerations
///
/// There is a time-of-check-time-of-use window between the checks in
/// [`TargetDir::new`] and later writes. It is narrowed by canonicalizing
/// here and by canonicalizing each entry's parent during inspection.
///
/// [`SafePath`]: super::SafePath
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDir(PathBuf);

impl TargetDir {
    /// Validates an existing directory.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Io` if the path does not exist, is not a
    /// directory, cannot be canonicalized, or is not writable (Unix).
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let metadata = std::fs::metadata(&path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("target directory unavailable {}: {e}", path.display()),
            )
        })?;

        if !metadata.is_dir() {
            return Err(DeployError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("path is not a directory: {}", path.display()),
            )));
        }

        let canonical = path.canonicalize().map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize path {}: {e}", path.display()),
            )
        })?;

        #[cfg(unix)]
        check_writable(&canonical)?;

        Ok(Self(canonical))
    }

    /// Creates the directory (and missing ancestors) if needed, then
    /// validates it.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::StorageUnavailable` if the directory cannot be
    /// created or validated.
    pub fn ensure(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path).map_err(|e| DeployError::storage(&path, e))?;
        Self::new(&path).map_err(|e| match e {
            DeployError::Io(source) => DeployError::storage(&path, source),
            other => other,
        })
    }

    /// Returns the canonical path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a validated path onto this directory.
    #[inline]
    #[must_use]
    pub fn join(&self, safe_path: &super::SafePath) -> PathBuf {
        self.0.join(safe_path.as_path())
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

/// Checks effective write permission with `access(2)`.
#[cfg(unix)]
fn check_writable(canonical: &Path) -> Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let path_cstring = CString::new(canonical.as_os_str().as_bytes()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path contains null byte")
    })?;

    // SAFETY: access() only reads the NUL-terminated string, which outlives
    // the call.
    #[allow(unsafe_code)]
    let result = unsafe { libc::access(path_cstring.as_ptr(), libc::W_OK) };

    if result != 0 {
        return Err(DeployError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("directory is not writable: {}", canonical.display()),
        )));
    }
    Ok(())
}
