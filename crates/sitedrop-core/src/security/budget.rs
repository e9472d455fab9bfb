//! Resource accounting for one extraction run.

use std::time::Duration;
use std::time::Instant;

use crate::DeployError;
use crate::ExtractionLimits;
use crate::Result;

/// Mutable counters checked against fixed ceilings.
///
/// Owned by exactly one extraction run. Byte accounting happens per chunk,
/// before the chunk is written, so the ceiling holds while decompressing
/// and not only after the fact.
#[derive(Debug)]
pub struct ExtractionBudget {
    max_extracted_size: u64,
    max_entry_count: usize,
    started: Instant,
    /// `None` when the timeout is too large to represent as an instant.
    deadline: Option<Instant>,
    entries_processed: usize,
    bytes_extracted: u64,
}

impl ExtractionBudget {
    /// Starts a budget; the wall clock begins now.
    #[must_use]
    pub fn new(limits: &ExtractionLimits) -> Self {
        let started = Instant::now();
        Self {
            max_extracted_size: limits.max_extracted_size,
            max_entry_count: limits.max_entry_count,
            started,
            deadline: started.checked_add(limits.timeout),
            entries_processed: 0,
            bytes_extracted: 0,
        }
    }

    /// Checks a declared entry count against the ceiling.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::TooManyEntries` if `declared` exceeds the
    /// configured maximum.
    pub fn check_entry_count(&self, declared: usize) -> Result<()> {
        if declared > self.max_entry_count {
            return Err(DeployError::TooManyEntries {
                count: declared,
                max: self.max_entry_count,
            });
        }
        Ok(())
    }

    /// Records that one more entry was processed.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::TooManyEntries` if the archive yields more
    /// entries than the ceiling allows.
    pub fn record_entry(&mut self) -> Result<()> {
        self.entries_processed += 1;
        self.check_entry_count(self.entries_processed)
    }

    /// Charges `bytes` against the extraction ceiling.
    ///
    /// Call before writing the chunk. On error the counter is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::ExtractionTooLarge` if the charge would push
    /// the cumulative total past the ceiling (or overflow).
    pub fn charge(&mut self, bytes: u64) -> Result<()> {
        let total = self
            .bytes_extracted
            .checked_add(bytes)
            .filter(|total| *total <= self.max_extracted_size)
            .ok_or(DeployError::ExtractionTooLarge {
                max: self.max_extracted_size,
            })?;
        self.bytes_extracted = total;
        Ok(())
    }

    /// Checks the wall-clock deadline.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::ExtractionTimeout` once the deadline is reached.
    /// A timeout past the range of `Instant` never expires.
    pub fn check_deadline(&self) -> Result<()> {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(DeployError::ExtractionTimeout {
                elapsed_ms: self.elapsed().as_millis(),
            });
        }
        Ok(())
    }

    /// Returns the number of entries processed.
    #[must_use]
    pub fn entries_processed(&self) -> usize {
        self.entries_processed
    }

    /// Returns the cumulative bytes charged.
    #[must_use]
    pub fn bytes_extracted(&self) -> u64 {
        self.bytes_extracted
    }

    /// Returns the time since the budget started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
