//! Filesystem operations on tenant directories.
//!
//! Every failure here is reported as `StorageUnavailable` with the path
//! involved, except the symlink sweep which reports hostile content.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use tracing::warn;
use walkdir::WalkDir;

use crate::DeployError;
use crate::Result;
use crate::UnsafeReason;

/// Ensures a directory exists.
pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| DeployError::storage(path, e))
}

/// Removes everything inside `dir`, keeping `dir` itself.
///
/// Links are removed, never followed.
pub(crate) fn purge_dir(dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| DeployError::storage(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| DeployError::storage(dir, e))?.path();
        let file_type = fs::symlink_metadata(&path)
            .map_err(|e| DeployError::storage(&path, e))?
            .file_type();
        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| DeployError::storage(&path, e))?;
    }
    Ok(())
}

/// Removes a directory tree if present.
pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(path).map_err(|e| DeployError::storage(path, e))
        }
        Ok(_) => fs::remove_file(path).map_err(|e| DeployError::storage(path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DeployError::storage(path, e)),
    }
}

/// Removes a directory tree, logging instead of failing.
pub(crate) fn discard(path: &Path) {
    if let Err(e) = remove_if_exists(path) {
        warn!(path = %path.display(), error = %e, "failed to discard directory");
    }
}

/// Hidden sibling that holds a deployment while it is being built.
pub(crate) fn staging_path(storage_root: &Path, site_name: &str) -> PathBuf {
    storage_root.join(format!(".staging-{site_name}"))
}

/// Hidden sibling that holds the previous deployment during a swap.
pub(crate) fn retired_path(storage_root: &Path, site_name: &str) -> PathBuf {
    storage_root.join(format!(".retired-{site_name}"))
}

/// Replaces `live` with `staged` using two renames.
///
/// The previous tree is moved to `retired` first and restored if the
/// second rename fails. Both paths must be on the same filesystem.
pub(crate) fn swap_into_place(staged: &Path, live: &Path, retired: &Path) -> Result<()> {
    remove_if_exists(retired)?;

    let had_live = fs::symlink_metadata(live).is_ok();
    if had_live {
        fs::rename(live, retired).map_err(|e| DeployError::storage(live, e))?;
    }

    if let Err(e) = fs::rename(staged, live) {
        if had_live {
            if let Err(restore) = fs::rename(retired, live) {
                warn!(
                    path = %live.display(),
                    error = %restore,
                    "failed to restore previous deployment"
                );
            }
        }
        return Err(DeployError::storage(live, e));
    }

    if had_live {
        discard(retired);
    }
    Ok(())
}

/// Fails if any symbolic link exists below `root`.
///
/// # Errors
///
/// Returns `DeployError::UnsafeEntry` naming the first link found, relative
/// to `root`, or `DeployError::Io` if the tree cannot be walked.
pub(crate) fn ensure_no_links(root: &Path) -> Result<()> {
    for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.path_is_symlink() {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            return Err(DeployError::unsafe_entry(relative, UnsafeReason::Symlink));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_purge_keeps_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("site");
        fs::create_dir_all(dir.join("css")).unwrap();
        fs::write(dir.join("index.html"), "x").unwrap();
        fs::write(dir.join("css/site.css"), "x").unwrap();

        purge_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_purge_does_not_follow_links() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("keep.html"), "x").unwrap();
        let dir = temp.path().join("site");
        fs::create_dir(&dir).unwrap();
        symlink(outside.path(), dir.join("link")).unwrap();

        purge_dir(&dir).unwrap();
        assert!(outside.path().join("keep.html").exists());
    }

    #[test]
    fn test_purge_missing_dir_is_storage_error() {
        let temp = TempDir::new().unwrap();
        let result = purge_dir(&temp.path().join("missing"));
        assert!(matches!(result, Err(DeployError::StorageUnavailable { .. })));
    }

    #[test]
    fn test_swap_replaces_live() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("alice.example.com");
        let staged = staging_path(temp.path(), "alice.example.com");
        let retired = retired_path(temp.path(), "alice.example.com");
        fs::create_dir(&live).unwrap();
        fs::write(live.join("old.html"), "old").unwrap();
        fs::create_dir(&staged).unwrap();
        fs::write(staged.join("index.html"), "new").unwrap();

        swap_into_place(&staged, &live, &retired).unwrap();
        assert!(live.join("index.html").exists());
        assert!(!live.join("old.html").exists());
        assert!(!staged.exists());
        assert!(!retired.exists());
    }

    #[test]
    fn test_swap_without_live() {
        let temp = TempDir::new().unwrap();
        let live = temp.path().join("bob.example.com");
        let staged = staging_path(temp.path(), "bob.example.com");
        let retired = retired_path(temp.path(), "bob.example.com");
        fs::create_dir(&staged).unwrap();

        swap_into_place(&staged, &live, &retired).unwrap();
        assert!(live.is_dir());
    }

    #[test]
    fn test_remove_if_exists() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("d");
        remove_if_exists(&dir).unwrap();
        fs::create_dir(&dir).unwrap();
        remove_if_exists(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_link_sweep() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("css")).unwrap();
        fs::write(temp.path().join("index.html"), "x").unwrap();
        ensure_no_links(temp.path()).unwrap();

        symlink("/etc/passwd", temp.path().join("css/passwd.css")).unwrap();
        let err = ensure_no_links(temp.path()).unwrap_err();
        assert!(matches!(
            err,
            DeployError::UnsafeEntry { ref path, reason: UnsafeReason::Symlink }
                if path == Path::new("css/passwd.css")
        ));
    }
}
