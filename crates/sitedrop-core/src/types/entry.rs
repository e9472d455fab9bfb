//! Archive entry metadata.

use std::path::Path;
use std::path::PathBuf;

/// File-type bits of a Unix mode.
const S_IFMT: u32 = 0o170_000;
/// Symbolic-link file type.
const S_IFLNK: u32 = 0o120_000;
/// Directory file type.
const S_IFDIR: u32 = 0o040_000;

/// Kind of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Anything else (device, fifo, socket).
    Other,
}

impl EntryKind {
    /// Derives the kind from raw Unix mode bits.
    ///
    /// Returns `None` when the mode carries no file-type bits, which is
    /// common for archives written on non-Unix hosts.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitedrop_core::EntryKind;
    ///
    /// assert_eq!(EntryKind::from_mode(0o120_777), Some(EntryKind::Symlink));
    /// assert_eq!(EntryKind::from_mode(0o100_644), Some(EntryKind::File));
    /// assert_eq!(EntryKind::from_mode(0o644), None);
    /// ```
    #[must_use]
    pub const fn from_mode(mode: u32) -> Option<Self> {
        match mode & S_IFMT {
            0 => None,
            S_IFLNK => Some(Self::Symlink),
            S_IFDIR => Some(Self::Directory),
            0o100_000 => Some(Self::File),
            _ => Some(Self::Other),
        }
    }
}

/// One entry of an archive, as recorded by an untrusted producer.
///
/// Exists only for the duration of one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Logical path as recorded in the archive (untrusted).
    pub path: PathBuf,

    /// Entry kind as reported by the container format.
    pub kind: EntryKind,

    /// Declared uncompressed size in bytes (untrusted).
    pub size: u64,

    /// Raw Unix mode bits, if the archive recorded them.
    pub mode: Option<u32>,
}

impl ArchiveEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind, size: u64, mode: Option<u32>) -> Self {
        Self {
            path: path.into(),
            kind,
            size,
            mode,
        }
    }

    /// Returns `true` if this entry is a link, either by its reported kind
    /// or by the file-type bits of its mode.
    ///
    /// Format adapters report the kind they can see; the mode check catches
    /// containers that only mark links in attribute bits.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.kind == EntryKind::Symlink
            || self
                .mode
                .and_then(EntryKind::from_mode)
                .is_some_and(|kind| kind == EntryKind::Symlink)
    }

    /// Returns `true` if this entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Returns the logical path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
