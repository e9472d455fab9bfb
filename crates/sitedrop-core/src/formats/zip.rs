//! ZIP archive adapter.

use std::io::Read;
use std::io::Seek;

use zip::ZipArchive;

use crate::DeployError;
use crate::Result;
use crate::types::ArchiveEntry;
use crate::types::EntryKind;

use super::traits::ArchiveFormat;

/// Local file header signature (`PK\x03\x04`).
const ZIP_LOCAL_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// End of central directory signature for an empty archive (`PK\x05\x06`).
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

/// Returns `true` if `bytes` start with a ZIP signature.
#[must_use]
pub fn has_zip_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(&ZIP_LOCAL_MAGIC) || bytes.starts_with(&ZIP_EMPTY_MAGIC)
}

/// ZIP archive handler.
///
/// Opening reads only the central directory. Entry content is decompressed
/// lazily through [`ArchiveFormat::open`].
pub struct ZipFormat<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipFormat<R> {
    /// Parses the central directory.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::InvalidArchive` if the central directory is
    /// missing or malformed.
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }
}

impl<R: Read + Seek> ArchiveFormat for ZipFormat<R> {
    fn format_name(&self) -> &str {
        "zip"
    }

    fn len(&self) -> usize {
        self.archive.len()
    }

    fn entry(&mut self, index: usize) -> Result<ArchiveEntry> {
        let file = self.archive.by_index_raw(index)?;

        // ZIP mandates '/', but some Windows tools write '\'
        let path = file.name().replace('\\', "/");
        let mode = file.unix_mode();

        let kind = if file.is_dir() {
            EntryKind::Directory
        } else {
            match mode.and_then(EntryKind::from_mode) {
                Some(EntryKind::Symlink) => EntryKind::Symlink,
                Some(EntryKind::Other) => EntryKind::Other,
                Some(EntryKind::Directory) => EntryKind::Directory,
                Some(EntryKind::File) | None => EntryKind::File,
            }
        };

        Ok(ArchiveEntry::new(path, kind, file.size(), mode))
    }

    fn open(&mut self, index: usize) -> Result<Box<dyn Read + '_>> {
        let file = self.archive.by_index(index).map_err(|e| match e {
            zip::result::ZipError::Io(io) => DeployError::Io(io),
            other => DeployError::InvalidArchive(format!("entry {index}: {other}")),
        })?;
        Ok(Box::new(file))
    }
}
