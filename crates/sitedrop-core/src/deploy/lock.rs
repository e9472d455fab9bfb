//! Per-tenant mutual exclusion.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

/// Registry of one lock per target directory.
///
/// Attempts for the same directory run one at a time; attempts for
/// different directories never wait on each other beyond the registry
/// lookup itself.
#[derive(Debug, Default)]
pub(crate) struct TenantLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl TenantLocks {
    /// Returns the lock for `key`, creating it on first use.
    ///
    /// Locks nobody holds or waits on are dropped from the registry.
    pub(crate) fn handle(&self, key: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(key.to_path_buf()).or_default())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
