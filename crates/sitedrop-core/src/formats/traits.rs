//! Common trait for container format adapters.

use std::io::Read;

use crate::Result;
use crate::types::ArchiveEntry;

/// Random-access view of an archive's entries.
///
/// Adapters translate format-specific metadata (including how links are
/// marked) into [`ArchiveEntry`], so the inspection policy never depends on
/// the container library.
pub trait ArchiveFormat {
    /// Returns the archive format name.
    fn format_name(&self) -> &str;

    /// Number of entries declared by the archive's index.
    fn len(&self) -> usize;

    /// Returns `true` if the archive declares no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads metadata for one entry without decompressing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry's header is unreadable.
    fn entry(&mut self, index: usize) -> Result<ArchiveEntry>;

    /// Opens a decompressing reader over one entry's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be decoded (e.g. unsupported
    /// method or encryption).
    fn open(&mut self, index: usize) -> Result<Box<dyn Read + '_>>;
}
