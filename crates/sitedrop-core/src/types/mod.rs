//! Type-safe wrappers for extraction and deployment.
//!
//! Security-relevant values are validated upon construction and cannot be
//! created from raw types without going through validation.
//!
//! # Design Principles
//!
//! - Type-driven security: Invalid states cannot be represented
//! - No `From<RawType>` implementations for security types
//! - All constructors perform validation

pub mod entry;
pub mod safe_path;
pub mod target_dir;
pub mod tenant;

pub use entry::ArchiveEntry;
pub use entry::EntryKind;
pub use safe_path::SafePath;
pub use target_dir::TargetDir;
pub use tenant::TenantId;
