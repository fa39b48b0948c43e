//! File-backed storage backend.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::{CHANGE_CHANNEL_CAPACITY, ChangeKind, Storage, StorageChange, StorageError, notify};

/// Storage that keeps each key in `<dir>/<key>.json`.
///
/// Writes go to a temporary file that is renamed over the target, so a crash
/// never leaves a half-written value behind. Change notifications are only
/// delivered to subscribers in this process.
#[derive(Clone)]
pub struct FileStorage {
    inner: Arc<FileStorageInner>,
}

struct FileStorageInner {
    dir: PathBuf,
    changes: broadcast::Sender<StorageChange>,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(FileStorageInner { dir, changes }),
        })
    }

    /// Directory holding the stored values.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.inner.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StorageError::InvalidEncoding(key.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        debug!(key, bytes = value.len(), "Stored value");

        notify(&self.inner.changes, key, ChangeKind::Set);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    source,
                });
            }
        }

        notify(&self.inner.changes, key, ChangeKind::Removed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.changes.subscribe()
    }
}
