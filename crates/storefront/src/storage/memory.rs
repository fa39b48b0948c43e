//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use super::{CHANGE_CHANNEL_CAPACITY, ChangeKind, Storage, StorageChange, StorageError, notify};

/// Process-local storage backed by a shared map.
///
/// Clones share the same map and notification channel, so two stores built
/// from clones of one `MemoryStorage` behave like two tabs of one browser.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<MemoryStorageInner>,
}

struct MemoryStorageInner {
    values: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryStorageInner {
                values: Mutex::new(HashMap::new()),
                changes,
            }),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Whether no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.inner
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        notify(&self.inner.changes, key, ChangeKind::Set);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        notify(&self.inner.changes, key, ChangeKind::Removed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.changes.subscribe()
    }
}
