//! Archive format implementations.

pub mod traits;
pub mod zip;

// Re-export main types for convenience
pub use traits::ArchiveFormat;
pub use zip::ZipFormat;
pub use zip::has_zip_signature;
