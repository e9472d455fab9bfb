//! Chunked copy with incremental budget accounting.
//!
//! Decompressed sizes are untrustworthy until the bytes actually come out of
//! the decoder, so every chunk is charged against the [`ExtractionBudget`]
//! and the deadline is checked before the chunk reaches the writer.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::DeployError;
use crate::ProgressCallback;
use crate::Result;
use crate::security::ExtractionBudget;

/// Chunk size for streaming extraction (64KB).
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Reusable heap buffer for chunked copying.
///
/// One buffer is allocated per extraction run and reused for every entry.
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Box<[u8]>,
}

impl CopyBuffer {
    /// Creates a buffer of [`COPY_BUFFER_SIZE`] bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(COPY_BUFFER_SIZE)
    }

    /// Creates a buffer of `size` bytes (at least one).
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            buf: vec![0u8; size.max(1)].into_boxed_slice(),
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies `reader` into `writer` one chunk at a time.
///
/// For each chunk: check the deadline, charge the budget, then write. A
/// chunk that would push the budget past its ceiling is never written, so
/// the bytes on disk never exceed the ceiling.
///
/// # Errors
///
/// - `DeployError::ExtractionTimeout` once the budget deadline passes
/// - `DeployError::ExtractionTooLarge` if the next chunk would cross the
///   byte ceiling
/// - `DeployError::InvalidArchive` if the decoder reports corrupt data
/// - `DeployError::Io` for write failures
pub fn copy_with_budget<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
    budget: &mut ExtractionBudget,
    progress: &mut dyn ProgressCallback,
) -> Result<u64> {
    let mut total: u64 = 0;

    loop {
        budget.check_deadline()?;

        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(DeployError::InvalidArchive(e.to_string()));
            }
            Err(e) => return Err(DeployError::Io(e)),
        };

        let chunk = bytes_read as u64;
        budget.charge(chunk)?;

        writer.write_all(&buffer.buf[..bytes_read])?;
        progress.on_bytes_written(chunk);

        total = total.saturating_add(chunk);
    }

    Ok(total)
}
