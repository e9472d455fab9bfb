//! Error types for archive extraction and deployment.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `DeployError`.
pub type Result<T> = std::result::Result<T, DeployError>;

/// Why an archive entry was classified as malicious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsafeReason {
    /// The path contains a `..` segment.
    ParentTraversal,
    /// The path is absolute or carries a drive/root prefix.
    AbsolutePath,
    /// The resolved destination is not a descendant of the target directory.
    EscapesTarget,
    /// The entry is a symbolic link.
    Symlink,
    /// The path contains a NUL byte.
    NullByte,
}

impl std::fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::ParentTraversal => "parent directory traversal",
            Self::AbsolutePath => "absolute path",
            Self::EscapesTarget => "destination escapes target directory",
            Self::Symlink => "symbolic link",
            Self::NullByte => "null byte in path",
        };
        f.write_str(text)
    }
}

/// Errors that can terminate a deployment attempt.
///
/// Every variant is terminal for the attempt that produced it. Nothing in
/// the pipeline retries internally.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Uploaded archive is larger than the configured input ceiling.
    #[error("archive too large: {size} bytes (max {max})")]
    InputTooLarge {
        /// Observed size in bytes (a lower bound for streamed input).
        size: u64,
        /// Configured maximum in bytes.
        max: u64,
    },

    /// Archive declares more entries than allowed.
    #[error("archive contains too many entries: {count} (max {max})")]
    TooManyEntries {
        /// Declared entry count.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// An entry indicates a malicious archive.
    #[error("unsafe archive entry '{}': {reason}", path.display())]
    UnsafeEntry {
        /// Logical path of the entry as recorded in the archive.
        path: PathBuf,
        /// What made the entry unsafe.
        reason: UnsafeReason,
    },

    /// Cumulative decompressed bytes crossed the extraction ceiling.
    #[error("extraction exceeded maximum allowed size of {max} bytes")]
    ExtractionTooLarge {
        /// Configured maximum in bytes.
        max: u64,
    },

    /// Extraction ran past its wall-clock budget.
    #[error("extraction timed out after {elapsed_ms} ms")]
    ExtractionTimeout {
        /// Elapsed time when the timeout fired.
        elapsed_ms: u128,
    },

    /// Directory nesting exceeded the flattening depth cap.
    #[error("directory structure too deep to flatten (max {max} levels)")]
    StructureTooDeep {
        /// Configured maximum number of collapsed levels.
        max: usize,
    },

    /// The entry-point file is not at the deployment root.
    #[error("{entry_point} not found after deployment")]
    EntryPointMissing {
        /// Expected entry-point filename.
        entry_point: String,
    },

    /// The tenant's storage could not be prepared or published.
    #[error("storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        /// Path that could not be created, purged or swapped.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Container is corrupted or not a supported archive.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Tenant identifier cannot be mapped to a sandbox.
    #[error("invalid tenant identifier '{tenant}': {reason}")]
    InvalidTenant {
        /// Identifier as supplied.
        tenant: String,
        /// Why it was refused.
        reason: &'static str,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless classification of a [`DeployError`], stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// See [`DeployError::InputTooLarge`].
    InputTooLarge,
    /// See [`DeployError::TooManyEntries`].
    TooManyEntries,
    /// See [`DeployError::UnsafeEntry`].
    UnsafeEntry,
    /// See [`DeployError::ExtractionTooLarge`].
    ExtractionTooLarge,
    /// See [`DeployError::ExtractionTimeout`].
    ExtractionTimeout,
    /// See [`DeployError::StructureTooDeep`].
    StructureTooDeep,
    /// See [`DeployError::EntryPointMissing`].
    EntryPointMissing,
    /// See [`DeployError::StorageUnavailable`].
    StorageUnavailable,
    /// See [`DeployError::InvalidArchive`].
    InvalidArchive,
    /// See [`DeployError::InvalidTenant`].
    InvalidTenant,
    /// See [`DeployError::Io`].
    Io,
}

/// Coarse outcome class a transport layer maps to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// Caller identity was not acceptable.
    Unauthorized,
    /// Archive was malformed or malicious.
    BadInput,
    /// Archive exceeded a size or count limit.
    TooLarge,
    /// Failure on the server side.
    ServerError,
}

impl ErrorKind {
    /// Maps this kind onto the transport's status classes.
    #[must_use]
    pub const fn status_class(self) -> StatusClass {
        match self {
            Self::InvalidTenant => StatusClass::Unauthorized,
            Self::UnsafeEntry
            | Self::InvalidArchive
            | Self::StructureTooDeep
            | Self::EntryPointMissing => StatusClass::BadInput,
            Self::InputTooLarge | Self::TooManyEntries | Self::ExtractionTooLarge => {
                StatusClass::TooLarge
            }
            Self::ExtractionTimeout | Self::StorageUnavailable | Self::Io => {
                StatusClass::ServerError
            }
        }
    }
}

impl DeployError {
    /// Returns the fieldless kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InputTooLarge { .. } => ErrorKind::InputTooLarge,
            Self::TooManyEntries { .. } => ErrorKind::TooManyEntries,
            Self::UnsafeEntry { .. } => ErrorKind::UnsafeEntry,
            Self::ExtractionTooLarge { .. } => ErrorKind::ExtractionTooLarge,
            Self::ExtractionTimeout { .. } => ErrorKind::ExtractionTimeout,
            Self::StructureTooDeep { .. } => ErrorKind::StructureTooDeep,
            Self::EntryPointMissing { .. } => ErrorKind::EntryPointMissing,
            Self::StorageUnavailable { .. } => ErrorKind::StorageUnavailable,
            Self::InvalidArchive(_) => ErrorKind::InvalidArchive,
            Self::InvalidTenant { .. } => ErrorKind::InvalidTenant,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns `true` if this error indicates a hostile or abusive archive.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitedrop_core::DeployError;
    /// use sitedrop_core::UnsafeReason;
    /// use std::path::PathBuf;
    ///
    /// let err = DeployError::UnsafeEntry {
    ///     path: PathBuf::from("../etc/passwd"),
    ///     reason: UnsafeReason::ParentTraversal,
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = DeployError::EntryPointMissing {
    ///     entry_point: "index.html".into(),
    /// };
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::UnsafeEntry { .. }
                | Self::TooManyEntries { .. }
                | Self::ExtractionTooLarge { .. }
                | Self::InputTooLarge { .. }
        )
    }

    /// Returns the status class for this error.
    #[must_use]
    pub const fn status_class(&self) -> StatusClass {
        self.kind().status_class()
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsafe_entry(path: impl Into<PathBuf>, reason: UnsafeReason) -> Self {
        Self::UnsafeEntry {
            path: path.into(),
            reason,
        }
    }
}

impl From<zip::result::ZipError> for DeployError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::InvalidArchive(other.to_string()),
        }
    }
}
