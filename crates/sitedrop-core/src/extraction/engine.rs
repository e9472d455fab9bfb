//! Core extraction engine.

use std::fs::File;
use std::fs::create_dir_all;
use std::io::BufWriter;
use std::io::Cursor;
use std::io::Write;

use tracing::debug;
use tracing::warn;

use crate::DeployError;
use crate::EntryPolicy;
use crate::ExtractionLimits;
use crate::ExtractionReport;
use crate::ProgressCallback;
use crate::Result;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_budget;
use crate::formats::ArchiveFormat;
use crate::formats::ZipFormat;
use crate::formats::has_zip_signature;
use crate::security::EntryInspector;
use crate::security::ExtractionBudget;
use crate::security::Verdict;
use crate::types::TargetDir;

/// Checks the raw upload before the container is parsed.
///
/// # Errors
///
/// - `DeployError::InputTooLarge` if `archive` is larger than the input
///   ceiling
/// - `DeployError::InvalidArchive` if `archive` does not start with a ZIP
///   signature
pub(crate) fn check_input(archive: &[u8], limits: &ExtractionLimits) -> Result<()> {
    let size = archive.len() as u64;
    if size > limits.max_input_size {
        return Err(DeployError::InputTooLarge {
            size,
            max: limits.max_input_size,
        });
    }
    if !has_zip_signature(archive) {
        return Err(DeployError::InvalidArchive(
            "missing ZIP signature".to_string(),
        ));
    }
    Ok(())
}

/// Streams archive entries into a target directory under a budget.
///
/// One engine can run any number of extractions; each run gets a fresh
/// [`ExtractionBudget`], so concurrent runs never share counters.
///
/// # Examples
///
/// ```no_run
/// use sitedrop_core::EntryPolicy;
/// use sitedrop_core::ExtractionLimits;
/// use sitedrop_core::NoopProgress;
/// use sitedrop_core::extraction::ExtractionEngine;
/// use sitedrop_core::types::TargetDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limits = ExtractionLimits::default();
/// let policy = EntryPolicy::default();
/// let engine = ExtractionEngine::new(&limits, &policy);
///
/// let archive = std::fs::read("site.zip")?;
/// let target = TargetDir::ensure("/srv/sites/alice.example.com")?;
/// let report = engine.extract(&archive, &target, &mut NoopProgress)?;
/// println!("{} files written", report.files_extracted);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExtractionEngine<'a> {
    limits: &'a ExtractionLimits,
    policy: &'a EntryPolicy,
}

impl<'a> ExtractionEngine<'a> {
    /// Creates an engine with the given limits and policy.
    #[must_use]
    pub fn new(limits: &'a ExtractionLimits, policy: &'a EntryPolicy) -> Self {
        Self { limits, policy }
    }

    /// Extracts a buffered ZIP archive into `target`.
    ///
    /// The input size is checked before the central directory is read.
    /// Writes performed before an error stay on disk; discarding them is
    /// the caller's job.
    ///
    /// # Errors
    ///
    /// - `DeployError::InputTooLarge` if the archive exceeds the input ceiling
    /// - `DeployError::InvalidArchive` if the archive cannot be parsed
    /// - `DeployError::TooManyEntries` if the archive declares too many entries
    /// - `DeployError::UnsafeEntry` on the first rejected entry
    /// - `DeployError::ExtractionTooLarge` if decompressed bytes cross the
    ///   extraction ceiling
    /// - `DeployError::ExtractionTimeout` if the wall-clock budget runs out
    /// - `DeployError::Io` for filesystem failures
    pub fn extract(
        &self,
        archive: &[u8],
        target: &TargetDir,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExtractionReport> {
        check_input(archive, self.limits)?;
        let mut format = ZipFormat::new(Cursor::new(archive))?;
        self.extract_format(&mut format, target, progress)
    }

    /// Extracts entries from an already opened archive into `target`.
    ///
    /// Entries are processed strictly in archive order. Each entry is
    /// decompressed completely (or aborted) before the next is inspected.
    ///
    /// # Errors
    ///
    /// Same as [`ExtractionEngine::extract`], minus the input-size check.
    pub fn extract_format(
        &self,
        format: &mut dyn ArchiveFormat,
        target: &TargetDir,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExtractionReport> {
        let span = tracing::debug_span!(
            "extract",
            format = format.format_name(),
            target = %target.as_path().display(),
        );
        let _guard = span.enter();

        let mut budget = ExtractionBudget::new(self.limits);
        let declared = format.len();
        budget.check_entry_count(declared)?;

        let inspector = EntryInspector::new(self.policy, target);
        let mut buffer = CopyBuffer::new();
        let mut report = ExtractionReport::new();
        report.entries_declared = declared;

        for index in 0..declared {
            budget.check_deadline()?;
            budget.record_entry()?;

            let entry = format.entry(index)?;
            progress.on_entry_start(entry.path(), declared, index + 1);

            match inspector.inspect(&entry)? {
                Verdict::Reject(reason) => {
                    warn!(path = %entry.path().display(), %reason, "rejecting archive");
                    return Err(DeployError::unsafe_entry(entry.path(), reason));
                }
                Verdict::Skip(reason) => {
                    warn!(path = %entry.path().display(), %reason, "skipping entry");
                    report.skipped.push((entry.path().to_path_buf(), reason));
                }
                Verdict::Accept(safe_path) => {
                    let output_path = target.join(&safe_path);
                    if entry.is_dir() {
                        create_dir_all(&output_path)?;
                        report.directories_created += 1;
                    } else {
                        if let Some(parent) = output_path.parent() {
                            create_dir_all(parent)?;
                        }
                        let mut reader = format.open(index)?;
                        let file = File::create(&output_path)?;
                        let mut writer = BufWriter::with_capacity(buffer.size(), file);
                        let written = copy_with_budget(
                            &mut reader,
                            &mut writer,
                            &mut buffer,
                            &mut budget,
                            progress,
                        )?;
                        writer.flush()?;
                        report.files_extracted += 1;
                        debug!(
                            path = %safe_path.as_path().display(),
                            bytes = written,
                            "extracted file"
                        );
                    }
                }
            }

            progress.on_entry_complete(entry.path());
        }

        report.entries_processed = budget.entries_processed();
        report.bytes_written = budget.bytes_extracted();
        report.duration = budget.elapsed();
        progress.on_complete();

        debug!(
            files = report.files_extracted,
            directories = report.directories_created,
            skipped = report.files_skipped(),
            bytes = report.bytes_written,
            "extraction complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::NoopProgress;
    use crate::UnsafeReason;
    use crate::security::SkipReason;
    use crate::test_utils::ZipTestBuilder;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_dest() -> (TempDir, TargetDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let target = TargetDir::new(temp.path()).expect("failed to create target");
        (temp, target)
    }

    fn extract_with(
        data: &[u8],
        target: &TargetDir,
        limits: &ExtractionLimits,
    ) -> Result<ExtractionReport> {
        let policy = EntryPolicy::default();
        ExtractionEngine::new(limits, &policy).extract(data, target, &mut NoopProgress)
    }

    fn extract(data: &[u8], target: &TargetDir) -> Result<ExtractionReport> {
        extract_with(data, target, &ExtractionLimits::default())
    }

    #[test]
    fn test_extract_simple_site() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("index.html", b"<h1>hi</h1>")
            .add_directory("css/")
            .add_deflated_file("css/site.css", b"body { color: red }")
            .build();

        let report = extract(&data, &target).unwrap();
        assert_eq!(report.entries_declared, 3);
        assert_eq!(report.entries_processed, 3);
        assert_eq!(report.files_extracted, 2);
        assert_eq!(report.directories_created, 1);
        assert_eq!(report.bytes_written, 11 + 19);
        assert_eq!(
            fs::read(target.as_path().join("index.html")).unwrap(),
            b"<h1>hi</h1>"
        );
        assert!(target.as_path().join("css/site.css").is_file());
    }

    #[test]
    fn test_extract_creates_missing_parents() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("a/b/c/index.html", b"deep")
            .build();

        extract(&data, &target).unwrap();
        assert!(target.as_path().join("a/b/c/index.html").is_file());
    }

    #[test]
    fn test_traversal_aborts_before_later_entries() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("../../etc/passwd", b"root")
            .add_file("index.html", b"never written")
            .build();

        let err = extract(&data, &target).unwrap_err();
        assert!(matches!(
            err,
            DeployError::UnsafeEntry {
                reason: UnsafeReason::ParentTraversal,
                ..
            }
        ));
        assert!(!target.as_path().join("index.html").exists());
        assert_eq!(fs::read_dir(target.as_path()).unwrap().count(), 0);
    }

    #[test]
    fn test_absolute_path_rejected() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("/tmp/evil.html", b"x")
            .build();

        let err = extract(&data, &target).unwrap_err();
        assert!(matches!(
            err,
            DeployError::UnsafeEntry {
                reason: UnsafeReason::AbsolutePath,
                ..
            }
        ));
    }

    #[test]
    fn test_symlink_rejected_whatever_the_target() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("index.html", b"ok")
            .add_symlink("style.css", "index.html")
            .build();

        let err = extract(&data, &target).unwrap_err();
        assert!(matches!(
            err,
            DeployError::UnsafeEntry {
                reason: UnsafeReason::Symlink,
                ..
            }
        ));
        // Earlier entries stay on disk for the caller to discard
        assert!(target.as_path().join("index.html").exists());
        assert!(!target.as_path().join("style.css").exists());
    }

    #[test]
    fn test_unwanted_entries_skipped() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("index.html", b"ok")
            .add_file(".env", b"SECRET=1")
            .add_file("package.json", b"{}")
            .add_file("node_modules/x/index.js", b"x")
            .add_file("deploy.sh", b"rm -rf /")
            .build();

        let report = extract(&data, &target).unwrap();
        assert_eq!(report.files_extracted, 1);
        assert_eq!(report.files_skipped(), 4);
        assert!(
            report
                .skipped
                .contains(&(Path::new(".env").to_path_buf(), SkipReason::Hidden))
        );
        assert!(
            report
                .skipped
                .contains(&(Path::new("deploy.sh").to_path_buf(), SkipReason::ExtensionNotAllowed))
        );
        assert!(!target.as_path().join("node_modules").exists());
        assert!(!target.as_path().join("package.json").exists());
    }

    #[test]
    fn test_too_many_entries_before_decompression() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("a.html", b"a")
            .add_file("b.html", b"b")
            .add_file("c.html", b"c")
            .build();
        let limits = ExtractionLimits {
            max_entry_count: 2,
            ..Default::default()
        };

        let err = extract_with(&data, &target, &limits).unwrap_err();
        assert!(matches!(err, DeployError::TooManyEntries { count: 3, max: 2 }));
        assert_eq!(fs::read_dir(target.as_path()).unwrap().count(), 0);
    }

    #[test]
    fn test_entry_count_at_ceiling_allowed() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("a.html", b"a")
            .add_file("b.html", b"b")
            .build();
        let limits = ExtractionLimits {
            max_entry_count: 2,
            ..Default::default()
        };

        assert!(extract_with(&data, &target, &limits).is_ok());
    }

    #[test]
    fn test_zip_bomb_aborts_mid_stream() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_deflated_file("index.html", &vec![b'0'; 1024 * 1024])
            .build();
        let limits = ExtractionLimits {
            max_extracted_size: 100 * 1024,
            ..Default::default()
        };
        // Highly compressible payload: the archive itself is tiny
        assert!(data.len() < 100 * 1024);

        let err = extract_with(&data, &target, &limits).unwrap_err();
        assert!(matches!(
            err,
            DeployError::ExtractionTooLarge { max } if max == 100 * 1024
        ));
        let written = fs::metadata(target.as_path().join("index.html"))
            .map(|m| m.len())
            .unwrap_or(0);
        assert!(written <= 100 * 1024);
    }

    #[test]
    fn test_input_too_large_before_parsing() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("index.html", &[b'x'; 2048])
            .build();
        let limits = ExtractionLimits {
            max_input_size: 1024,
            ..Default::default()
        };

        let err = extract_with(&data, &target, &limits).unwrap_err();
        assert!(matches!(err, DeployError::InputTooLarge { max: 1024, .. }));
    }

    #[test]
    fn test_not_a_zip() {
        let (_temp, target) = create_test_dest();
        let err = extract(b"GIF89a definitely not a zip", &target).unwrap_err();
        assert!(matches!(err, DeployError::InvalidArchive(_)));
    }

    #[test]
    fn test_timeout() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new().add_file("index.html", b"x").build();
        let limits = ExtractionLimits {
            timeout: Duration::ZERO,
            ..Default::default()
        };

        let err = extract_with(&data, &target, &limits).unwrap_err();
        assert!(matches!(err, DeployError::ExtractionTimeout { .. }));
    }

    #[test]
    fn test_empty_archive() {
        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new().build();

        let report = extract(&data, &target).unwrap();
        assert_eq!(report.entries_declared, 0);
        assert_eq!(report.total_items(), 0);
    }

    #[test]
    fn test_progress_callbacks() {
        #[derive(Default)]
        struct Recorder {
            started: Vec<(usize, usize)>,
            bytes: u64,
            completed: usize,
            finished: bool,
        }

        impl ProgressCallback for Recorder {
            fn on_entry_start(&mut self, _path: &Path, total: usize, current: usize) {
                self.started.push((current, total));
            }

            fn on_bytes_written(&mut self, bytes: u64) {
                self.bytes += bytes;
            }

            fn on_entry_complete(&mut self, _path: &Path) {
                self.completed += 1;
            }

            fn on_complete(&mut self) {
                self.finished = true;
            }
        }

        let (_temp, target) = create_test_dest();
        let data = ZipTestBuilder::new()
            .add_file("index.html", b"12345")
            .add_file("README", b"skipped")
            .build();
        let limits = ExtractionLimits::default();
        let policy = EntryPolicy::default();
        let mut recorder = Recorder::default();

        ExtractionEngine::new(&limits, &policy)
            .extract(&data, &target, &mut recorder)
            .unwrap();
        assert_eq!(recorder.started, vec![(1, 2), (2, 2)]);
        assert_eq!(recorder.bytes, 5);
        assert_eq!(recorder.completed, 2);
        assert!(recorder.finished);
    }
}
