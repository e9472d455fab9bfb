//! Dry-run classification of archive entries.

use std::io::Cursor;
use std::path::PathBuf;

use crate::EntryPolicy;
use crate::ExtractionLimits;
use crate::Result;
use crate::formats::ArchiveFormat;
use crate::formats::ZipFormat;
use crate::security::ExtractionBudget;
use crate::security::Verdict;
use crate::security::classify;
use crate::types::EntryKind;

use super::engine::check_input;

/// One entry as it would be handled by a real extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    /// Logical path as recorded in the archive.
    pub path: PathBuf,
    /// Entry kind from the archive metadata.
    pub kind: EntryKind,
    /// Declared uncompressed size in bytes.
    pub size: u64,
    /// Lexical verdict; accepted entries carry the normalized path.
    pub verdict: Verdict<PathBuf>,
}

/// Summary of a dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchivePlan {
    /// Entries in archive order.
    pub entries: Vec<PlannedEntry>,
}

impl ArchivePlan {
    /// Returns the first rejected entry, if any.
    #[must_use]
    pub fn first_rejection(&self) -> Option<&PlannedEntry> {
        self.entries.iter().find(|e| e.verdict.is_reject())
    }

    /// Returns the number of entries that would be extracted.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.verdict, Verdict::Accept(_)))
            .count()
    }

    /// Returns the sum of declared sizes of accepted entries.
    ///
    /// Declared sizes are untrusted; a real extraction enforces the
    /// ceiling on decompressed bytes instead.
    #[must_use]
    pub fn declared_bytes(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| matches!(e.verdict, Verdict::Accept(_)))
            .fold(0u64, |acc, e| acc.saturating_add(e.size))
    }
}

/// Classifies every entry without decompressing or writing anything.
///
/// Applies the same input-size and entry-count ceilings as a real run.
/// Verdicts are lexical only: escapes through links already present in a
/// target directory can only be detected during extraction.
///
/// # Errors
///
/// - `DeployError::InputTooLarge` if the archive exceeds the input ceiling
/// - `DeployError::InvalidArchive` if the archive cannot be parsed
/// - `DeployError::TooManyEntries` if the archive declares too many entries
///
/// # Examples
///
/// ```
/// use sitedrop_core::EntryPolicy;
/// use sitedrop_core::ExtractionLimits;
/// use sitedrop_core::extraction::plan_archive;
/// use sitedrop_core::test_utils::ZipTestBuilder;
///
/// let data = ZipTestBuilder::new()
///     .add_file("index.html", b"<h1>hi</h1>")
///     .add_file("../escape.html", b"x")
///     .build();
///
/// let plan = plan_archive(&data, &ExtractionLimits::default(), &EntryPolicy::default())?;
/// assert_eq!(plan.accepted(), 1);
/// assert!(plan.first_rejection().is_some());
/// # Ok::<(), sitedrop_core::DeployError>(())
/// ```
pub fn plan_archive(
    archive: &[u8],
    limits: &ExtractionLimits,
    policy: &EntryPolicy,
) -> Result<ArchivePlan> {
    check_input(archive, limits)?;
    let mut format = ZipFormat::new(Cursor::new(archive))?;

    let budget = ExtractionBudget::new(limits);
    budget.check_entry_count(format.len())?;

    let entries = (0..format.len())
        .map(|index| {
            let entry = format.entry(index)?;
            let verdict = classify(&entry, policy);
            Ok(PlannedEntry {
                path: entry.path,
                kind: entry.kind,
                size: entry.size,
                verdict,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ArchivePlan { entries })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::DeployError;
    use crate::UnsafeReason;
    use crate::security::SkipReason;
    use crate::test_utils::ZipTestBuilder;

    #[test]
    fn test_plan_verdicts() {
        let data = ZipTestBuilder::new()
            .add_file("site/index.html", b"<h1>hi</h1>")
            .add_file("site/.env", b"X=1")
            .add_symlink("site/link.html", "/etc/passwd")
            .build();

        let plan = plan_archive(&data, &ExtractionLimits::default(), &EntryPolicy::default())
            .unwrap();
        assert_eq!(plan.entries.len(), 3);
        assert_eq!(
            plan.entries[0].verdict,
            Verdict::Accept(PathBuf::from("site/index.html"))
        );
        assert_eq!(plan.entries[1].verdict, Verdict::Skip(SkipReason::Hidden));
        assert_eq!(
            plan.entries[2].verdict,
            Verdict::Reject(UnsafeReason::Symlink)
        );
        assert_eq!(plan.accepted(), 1);
        assert_eq!(plan.declared_bytes(), 11);
        assert_eq!(
            plan.first_rejection().map(|e| e.path.clone()),
            Some(PathBuf::from("site/link.html"))
        );
    }

    #[test]
    fn test_plan_enforces_entry_count() {
        let data = ZipTestBuilder::new()
            .add_file("a.html", b"a")
            .add_file("b.html", b"b")
            .build();
        let limits = ExtractionLimits {
            max_entry_count: 1,
            ..Default::default()
        };

        let result = plan_archive(&data, &limits, &EntryPolicy::default());
        assert!(matches!(result, Err(DeployError::TooManyEntries { .. })));
    }
}
