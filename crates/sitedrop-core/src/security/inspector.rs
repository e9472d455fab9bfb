//! Per-entry safety classification.
//!
//! Rejection marks an archive as malicious and aborts the whole run.
//! Skipping marks a single entry as unwanted and extraction continues
//! without it.

use std::path::Path;
use std::path::PathBuf;

use crate::DeployError;
use crate::EntryPolicy;
use crate::Result;
use crate::UnsafeReason;
use crate::types::ArchiveEntry;
use crate::types::EntryKind;
use crate::types::SafePath;
use crate::types::TargetDir;

/// Why an entry was left out of the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// A path component is a dotfile.
    Hidden,
    /// A path component is on the deny-list.
    Denied,
    /// The file extension is absent or not on the allow-list.
    ExtensionNotAllowed,
    /// Neither a regular file nor a directory.
    UnsupportedKind,
    /// The path normalizes to nothing (e.g. `./`).
    EmptyPath,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Hidden => "hidden file",
            Self::Denied => "denied name",
            Self::ExtensionNotAllowed => "extension not allowed",
            Self::UnsupportedKind => "unsupported entry kind",
            Self::EmptyPath => "empty path",
        };
        f.write_str(text)
    }
}

/// Outcome of inspecting one entry.
///
/// `P` is the accepted path type: [`SafePath`] once checked against a
/// target directory, or a plain normalized `PathBuf` from the lexical
/// [`classify`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<P = SafePath> {
    /// Extract the entry at this path.
    Accept(P),
    /// Ignore the entry and continue.
    Skip(SkipReason),
    /// Abort the whole extraction.
    Reject(UnsafeReason),
}

impl<P> Verdict<P> {
    /// Returns `true` for [`Verdict::Reject`].
    #[must_use]
    pub const fn is_reject(&self) -> bool {
        matches!(self, Self::Reject(_))
    }
}

/// Classifies an entry from its metadata alone, without touching the
/// filesystem.
///
/// Checks run in order: path normalization, link detection, hidden
/// components, deny-listed components, entry kind, extension allow-list.
/// Hidden and deny-listed names are matched against every component so
/// that nothing below a skipped directory is extracted either.
///
/// # Examples
///
/// ```
/// use sitedrop_core::EntryPolicy;
/// use sitedrop_core::security::SkipReason;
/// use sitedrop_core::security::Verdict;
/// use sitedrop_core::security::classify;
/// use sitedrop_core::types::ArchiveEntry;
/// use sitedrop_core::types::EntryKind;
///
/// let policy = EntryPolicy::default();
///
/// let entry = ArchiveEntry::new("site/index.html", EntryKind::File, 10, None);
/// assert!(matches!(classify(&entry, &policy), Verdict::Accept(_)));
///
/// let entry = ArchiveEntry::new("deploy.sh", EntryKind::File, 10, None);
/// assert_eq!(
///     classify(&entry, &policy),
///     Verdict::Skip(SkipReason::ExtensionNotAllowed)
/// );
/// ```
#[must_use]
pub fn classify(entry: &ArchiveEntry, policy: &EntryPolicy) -> Verdict<PathBuf> {
    let normalized = match SafePath::normalize(entry.path()) {
        Ok(normalized) => normalized,
        Err(reason) => return Verdict::Reject(reason),
    };

    if entry.is_link() {
        return Verdict::Reject(UnsafeReason::Symlink);
    }

    if normalized.as_os_str().is_empty() {
        return Verdict::Skip(SkipReason::EmptyPath);
    }

    let names: Vec<_> = normalized
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    if names.iter().any(|name| name.starts_with('.')) {
        return Verdict::Skip(SkipReason::Hidden);
    }

    if names.iter().any(|name| policy.is_name_denied(name)) {
        return Verdict::Skip(SkipReason::Denied);
    }

    match entry.kind {
        EntryKind::Directory => Verdict::Accept(normalized),
        EntryKind::File => {
            if has_allowed_extension(&normalized, policy) {
                Verdict::Accept(normalized)
            } else {
                Verdict::Skip(SkipReason::ExtensionNotAllowed)
            }
        }
        EntryKind::Symlink => Verdict::Reject(UnsafeReason::Symlink),
        EntryKind::Other => Verdict::Skip(SkipReason::UnsupportedKind),
    }
}

fn has_allowed_extension(path: &Path, policy: &EntryPolicy) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| policy.is_extension_allowed(&ext))
}

/// Inspects entries against a policy and a target directory.
///
/// # Examples
///
/// ```no_run
/// use sitedrop_core::EntryPolicy;
/// use sitedrop_core::security::EntryInspector;
/// use sitedrop_core::security::Verdict;
/// use sitedrop_core::types::ArchiveEntry;
/// use sitedrop_core::types::EntryKind;
/// use sitedrop_core::types::TargetDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let target = TargetDir::new("/srv/sites/alice.example.com")?;
/// let policy = EntryPolicy::default();
/// let inspector = EntryInspector::new(&policy, &target);
///
/// let entry = ArchiveEntry::new("../../etc/passwd", EntryKind::File, 0, None);
/// assert!(inspector.inspect(&entry)?.is_reject());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EntryInspector<'a> {
    policy: &'a EntryPolicy,
    target: &'a TargetDir,
}

impl<'a> EntryInspector<'a> {
    /// Creates an inspector.
    #[must_use]
    pub fn new(policy: &'a EntryPolicy, target: &'a TargetDir) -> Self {
        Self { policy, target }
    }

    /// Classifies one entry.
    ///
    /// Runs [`classify`] first, then resolves accepted paths against the
    /// target directory. A destination whose existing ancestors canonicalize
    /// outside the target is rejected.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Io` if canonicalization fails for a reason
    /// other than a missing path. Unsafe entries are reported as
    /// [`Verdict::Reject`], not as errors.
    pub fn inspect(&self, entry: &ArchiveEntry) -> Result<Verdict> {
        match classify(entry, self.policy) {
            Verdict::Accept(_) => match SafePath::validate(entry.path(), self.target) {
                Ok(safe) => Ok(Verdict::Accept(safe)),
                Err(DeployError::UnsafeEntry { reason, .. }) => Ok(Verdict::Reject(reason)),
                Err(e) => Err(e),
            },
            Verdict::Skip(reason) => Ok(Verdict::Skip(reason)),
            Verdict::Reject(reason) => Ok(Verdict::Reject(reason)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(path: &str) -> ArchiveEntry {
        ArchiveEntry::new(path, EntryKind::File, 1, Some(0o100_644))
    }

    fn dir(path: &str) -> ArchiveEntry {
        ArchiveEntry::new(path, EntryKind::Directory, 0, Some(0o040_755))
    }

    #[test]
    fn test_accept_static_assets() {
        let policy = EntryPolicy::default();
        for path in ["index.html", "css/site.css", "img/logo.PNG", "./js/app.js"] {
            assert!(
                matches!(classify(&file(path), &policy), Verdict::Accept(_)),
                "{path}"
            );
        }
        assert!(matches!(classify(&dir("assets/"), &policy), Verdict::Accept(_)));
    }

    #[test]
    fn test_reject_traversal_and_absolute() {
        let policy = EntryPolicy::default();
        assert_eq!(
            classify(&file("../../etc/passwd"), &policy),
            Verdict::Reject(UnsafeReason::ParentTraversal)
        );
        assert_eq!(
            classify(&file("/etc/passwd"), &policy),
            Verdict::Reject(UnsafeReason::AbsolutePath)
        );
    }

    #[test]
    fn test_reject_symlink_regardless_of_name() {
        let policy = EntryPolicy::default();
        let by_kind = ArchiveEntry::new("index.html", EntryKind::Symlink, 9, None);
        let by_mode = ArchiveEntry::new(".hidden", EntryKind::File, 9, Some(0o120_777));
        assert_eq!(
            classify(&by_kind, &policy),
            Verdict::Reject(UnsafeReason::Symlink)
        );
        assert_eq!(
            classify(&by_mode, &policy),
            Verdict::Reject(UnsafeReason::Symlink)
        );
    }

    #[test]
    fn test_skip_hidden() {
        let policy = EntryPolicy::default();
        assert_eq!(
            classify(&file(".secret.html"), &policy),
            Verdict::Skip(SkipReason::Hidden)
        );
        assert_eq!(
            classify(&file(".git/HEAD"), &policy),
            Verdict::Skip(SkipReason::Hidden)
        );
    }

    #[test]
    fn test_skip_denied_names() {
        let policy = EntryPolicy::default();
        assert_eq!(
            classify(&file("package.json"), &policy),
            Verdict::Skip(SkipReason::Denied)
        );
        assert_eq!(
            classify(&file("site/node_modules/lib/index.js"), &policy),
            Verdict::Skip(SkipReason::Denied)
        );
        assert_eq!(
            classify(&dir("node_modules/"), &policy),
            Verdict::Skip(SkipReason::Denied)
        );
    }

    #[test]
    fn test_skip_extensions() {
        let policy = EntryPolicy::default();
        for path in ["run.sh", "app.php", "tool.exe", "Makefile", "script.ps1"] {
            assert_eq!(
                classify(&file(path), &policy),
                Verdict::Skip(SkipReason::ExtensionNotAllowed),
                "{path}"
            );
        }
    }

    #[test]
    fn test_skip_other_kinds() {
        let policy = EntryPolicy::default();
        let fifo = ArchiveEntry::new("pipe.html", EntryKind::Other, 0, None);
        assert_eq!(
            classify(&fifo, &policy),
            Verdict::Skip(SkipReason::UnsupportedKind)
        );
    }

    #[test]
    fn test_skip_empty_path() {
        let policy = EntryPolicy::default();
        assert_eq!(
            classify(&dir("./"), &policy),
            Verdict::Skip(SkipReason::EmptyPath)
        );
    }

    #[test]
    fn test_inspect_resolves_against_target() {
        let temp = TempDir::new().unwrap();
        let target = TargetDir::new(temp.path()).unwrap();
        let policy = EntryPolicy::default();
        let inspector = EntryInspector::new(&policy, &target);

        match inspector.inspect(&file("a/index.html")).unwrap() {
            Verdict::Accept(safe) => {
                assert_eq!(target.join(&safe), target.as_path().join("a/index.html"));
            }
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_inspect_rejects_escape_through_existing_link() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        symlink(outside.path(), temp.path().join("css")).unwrap();

        let target = TargetDir::new(temp.path()).unwrap();
        let policy = EntryPolicy::default();
        let inspector = EntryInspector::new(&policy, &target);

        assert_eq!(
            inspector.inspect(&file("css/site.css")).unwrap(),
            Verdict::Reject(UnsafeReason::EscapesTarget)
        );
    }
}
