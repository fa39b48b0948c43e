//! Durable client-side key/value storage.
//!
//! Session and cart state live in a small string key/value store, the same
//! way a browser keeps them in local storage. Values are opaque JSON blobs;
//! decoding and recovery from malformed values is the owning store's job.
//!
//! # Implementations
//!
//! - [`MemoryStorage`] - shared in-process map (tests, embedding)
//! - [`FileStorage`] - one JSON file per key under a data directory
//!
//! # Change notifications
//!
//! Every successful `set`/`remove` is published to subscribers as a
//! [`StorageChange`]. Several stores sharing one `Storage` use this to stay
//! consistent (last write wins, no locking across stores).

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of the change notification channel.
///
/// Slow subscribers that fall further behind than this skip ahead; a skipped
/// notification only means a redundant reload is missed.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Storage keys for persisted client state.
pub mod keys {
    /// Key for the signed-in session record.
    pub const SESSION: &str = "user";

    /// Key for the cart line list.
    pub const CART: &str = "cart";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not valid UTF-8.
    #[error("stored value for key '{0}' is not valid UTF-8")]
    InvalidEncoding(String),

    /// Key contains characters that cannot be stored.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Value could not be encoded as JSON.
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Removed,
}

/// Notification published after a key changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub kind: ChangeKind,
}

/// A string key/value store with change notifications.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to change notifications for all keys.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Publish a change, ignoring the no-subscriber case.
pub(crate) fn notify(tx: &broadcast::Sender<StorageChange>, key: &str, kind: ChangeKind) {
    let _ = tx.send(StorageChange {
        key: key.to_string(),
        kind,
    });
}
