//! Extraction and deployment reporting.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::security::SkipReason;
use crate::types::TenantId;

/// Report of one extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of entries the archive declared.
    pub entries_declared: usize,

    /// Number of entries processed (accepted or skipped).
    pub entries_processed: usize,

    /// Number of files written.
    pub files_extracted: usize,

    /// Number of directory entries created.
    pub directories_created: usize,

    /// Entries left out, with the reason.
    pub skipped: Vec<(PathBuf, SkipReason)>,

    /// Total decompressed bytes written to disk.
    pub bytes_written: u64,

    /// Duration of the extraction.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of skipped entries.
    #[must_use]
    pub fn files_skipped(&self) -> usize {
        self.skipped.len()
    }

    /// Returns total number of items written.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created
    }
}

/// A published deployment.
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Tenant that owns the site.
    pub tenant: TenantId,

    /// Externally reachable URL of the site.
    pub public_url: String,

    /// Directory the site is served from.
    pub target: PathBuf,

    /// Extraction statistics.
    pub report: ExtractionReport,

    /// Number of redundant directory levels collapsed.
    pub flatten_levels: usize,

    /// Wall-clock duration of the whole attempt.
    pub duration: Duration,
}

/// Callback trait for progress reporting during extraction.
///
/// Requires `Send` so a deployment can run on a worker thread.
///
/// # Examples
///
/// ```
/// use sitedrop_core::ProgressCallback;
/// use std::path::Path;
///
/// struct Counter(u64);
///
/// impl ProgressCallback for Counter {
///     fn on_entry_start(&mut self, _path: &Path, _total: usize, _current: usize) {}
///
///     fn on_bytes_written(&mut self, bytes: u64) {
///         self.0 += bytes;
///     }
///
///     fn on_entry_complete(&mut self, _path: &Path) {}
///
///     fn on_complete(&mut self) {}
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called when starting to process an entry.
    ///
    /// * `path` - Logical path of the entry
    /// * `total` - Entries declared by the archive
    /// * `current` - Current entry number (1-indexed)
    fn on_entry_start(&mut self, path: &Path, total: usize, current: usize);

    /// Called after each chunk is written.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called when an entry has been processed (written or skipped).
    fn on_entry_complete(&mut self, path: &Path);

    /// Called when extraction finishes successfully.
    fn on_complete(&mut self);
}

/// `ProgressCallback` that does nothing.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &Path, _total: usize, _current: usize) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &Path) {}

    fn on_complete(&mut self) {}
}
