//! In-process slot storage with an optional byte quota.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::SlotStorage;
use crate::error::StorageError;

#[derive(Default)]
struct Inner {
    slots: HashMap<String, String>,
    quota: Option<usize>,
    fail_writes: bool,
}

/// Map-backed slots. Clones share the same storage, so a test can keep a
/// handle after moving one into an `AppStore`.
#[derive(Clone, Default)]
pub struct MemorySlots {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the total size (keys plus values)
    /// past `limit` bytes.
    pub fn with_quota(limit: usize) -> Self {
        let slots = Self::default();
        slots.lock().quota = Some(limit);
        slots
    }

    /// Simulate storage that refuses every write
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn set_quota(&self, limit: Option<usize>) {
        self.lock().quota = limit;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SlotStorage for MemorySlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().slots.get(key).cloned())
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::Backend("storage is disabled".to_string()));
        }
        if let Some(limit) = inner.quota {
            let others: usize = inner
                .slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        inner.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_slot(&self, key: &str) -> Result<bool, StorageError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::Backend("storage is disabled".to_string()));
        }
        Ok(inner.slots.remove(key).is_some())
    }
}
