//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Simulated sign-in, the [`SessionStore`](auth::SessionStore)
//! - `cart` - Cart mutations and persistence, the [`CartStore`](cart::CartStore)
//! - `checkout` - Order submission from the cart
//! - `search` - Product search and product-view notifications
//!
//! The session and cart stores share one [`CurrentSession`] handle: the
//! session store writes it, the cart store reads it to reject mutations
//! from signed-out users.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod search;

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::models::Session;
use crate::storage::{Storage, StorageError};

/// Shared view of the signed-in session.
#[derive(Clone, Default)]
pub struct CurrentSession(Arc<RwLock<Option<Session>>>);

impl CurrentSession {
    /// The current session, if any.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether someone is signed in.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Swap in a new session, returning the previous one.
    pub(crate) fn replace(&self, session: Option<Session>) -> Option<Session> {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, session)
    }
}

/// Read and decode a JSON value from storage.
///
/// A value that is not valid UTF-8 or fails to decode is logged, removed from
/// storage, and treated as absent. Other read failures are treated as absent
/// but left in place.
pub(crate) fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e @ StorageError::InvalidEncoding(_)) => {
            discard(storage, key, &e);
            return None;
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            discard(storage, key, &e);
            None
        }
    }
}

fn discard(storage: &dyn Storage, key: &str, error: &dyn std::error::Error) {
    warn!(key, error = %error, "Discarding malformed stored value");
    if let Err(e) = storage.remove(key) {
        warn!(key, error = %e, "Failed to remove malformed stored value");
    }
}

/// Encode a value as JSON and store it.
pub(crate) fn store_json<T: Serialize>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}
