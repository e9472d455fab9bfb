//! Validated relative path for extraction.

use crate::DeployError;
use crate::Result;
use crate::UnsafeReason;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::TargetDir;

/// A normalized relative path that resolves inside a [`TargetDir`].
///
/// # Security Properties
///
/// - Can ONLY be constructed through [`SafePath::validate`]
/// - NO `From<PathBuf>` implementation
/// - Contains only normal components (no `.`, `..`, root or prefix)
/// - Its parent chain, as far as it exists on disk, canonicalizes inside
///   the target directory
///
/// # Examples
///
/// ```no_run
/// use sitedrop_core::types::SafePath;
/// use sitedrop_core::types::TargetDir;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let target = TargetDir::new("/srv/sites/alice.example.com")?;
///
/// let safe = SafePath::validate(Path::new("./css/site.css"), &target)?;
/// assert_eq!(safe.as_path(), Path::new("css/site.css"));
///
/// assert!(SafePath::validate(Path::new("../../etc/passwd"), &target).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Lexically normalizes an untrusted archive path.
    ///
    /// Drops `.` components and rejects NUL bytes, absolute paths and any
    /// `..` segment. The result may be empty (e.g. for `./`). No filesystem
    /// access happens here.
    ///
    /// # Errors
    ///
    /// Returns the [`UnsafeReason`] describing the first offending feature.
    pub fn normalize(path: &Path) -> std::result::Result<PathBuf, UnsafeReason> {
        if has_null_bytes(path) {
            return Err(UnsafeReason::NullByte);
        }

        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => return Err(UnsafeReason::ParentTraversal),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(UnsafeReason::AbsolutePath);
                }
            }
        }
        Ok(normalized)
    }

    /// Validates an archive path against a target directory.
    ///
    /// # Validation Steps
    ///
    /// 1. Lexical normalization (see [`SafePath::normalize`])
    /// 2. Reject an empty normalized path
    /// 3. Canonicalize the nearest existing ancestor of the destination and
    ///    require the target directory as its prefix
    /// 4. Reject a destination that already exists as a symbolic link
    ///
    /// # Errors
    ///
    /// - `DeployError::UnsafeEntry` for traversal, absolute paths, NUL
    ///   bytes, empty paths or an escaping destination
    /// - `DeployError::Io` if canonicalization fails for a reason other
    ///   than a missing path
    pub fn validate(path: &Path, target: &TargetDir) -> Result<Self> {
        let normalized =
            Self::normalize(path).map_err(|reason| DeployError::unsafe_entry(path, reason))?;

        if normalized.as_os_str().is_empty() {
            return Err(DeployError::unsafe_entry(path, UnsafeReason::EscapesTarget));
        }

        let resolved = target.as_path().join(&normalized);
        if !resolved.starts_with(target.as_path()) {
            return Err(DeployError::unsafe_entry(path, UnsafeReason::EscapesTarget));
        }

        // Nearest existing ancestor must canonicalize inside the target,
        // otherwise a directory on the way is a link pointing out.
        let mut probe = resolved.parent();
        while let Some(dir) = probe {
            match dir.canonicalize() {
                Ok(canonical) => {
                    if !canonical.starts_with(target.as_path()) {
                        return Err(DeployError::unsafe_entry(
                            path,
                            UnsafeReason::EscapesTarget,
                        ));
                    }
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => probe = dir.parent(),
                Err(e) => {
                    return Err(DeployError::Io(std::io::Error::new(
                        e.kind(),
                        format!("failed to canonicalize parent: {e}"),
                    )));
                }
            }
        }

        match std::fs::symlink_metadata(&resolved) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(DeployError::unsafe_entry(path, UnsafeReason::EscapesTarget));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(DeployError::Io(e)),
        }

        Ok(Self(normalized))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Checks if a path contains null bytes.
#[cfg(unix)]
fn has_null_bytes(path: &Path) -> bool {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().contains(&b'\0')
}

/// Checks if a path contains null bytes.
#[cfg(not(unix))]
fn has_null_bytes(path: &Path) -> bool {
    path.to_str().is_none_or(|s| s.contains('\0'))
}
