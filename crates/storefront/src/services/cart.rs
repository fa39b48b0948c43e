//! Cart store.
//!
//! Wraps a [`Cart`] with persistence, the signed-in check, and change
//! notifications. Storage is authoritative: every mutation writes the whole
//! cart before it becomes visible to readers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use quickcart_core::{Price, Product, ProductId};

use crate::error::add_breadcrumb;
use crate::models::{Cart, CartEvent, CartLine, CartState};
use crate::storage::{Storage, StorageError, keys};

use super::{CurrentSession, load_json, store_json};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Errors that can occur when changing the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// No one is signed in.
    #[error("sign-in required")]
    AuthRequired,

    /// Persisting the cart failed; the change was not applied.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Persistent, observable cart shared by every view in one process.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn Storage>,
    session: CurrentSession,
    cart: Mutex<Cart>,
    events: broadcast::Sender<CartEvent>,
}

impl CartStore {
    /// Restore the cart from storage.
    ///
    /// A malformed stored cart is discarded and the store starts empty.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>, session: CurrentSession) -> Self {
        let cart = read_cart(storage.as_ref());
        debug!(item_count = cart.item_count(), "Cart restored");

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                session,
                cart: Mutex::new(cart),
                events,
            }),
        }
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AuthRequired` if no one is signed in, or
    /// `CartError::Storage` if the cart cannot be saved.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&self, product: &Product) -> Result<CartEvent, CartError> {
        self.require_session()?;
        let event = self.mutate(|cart| {
            cart.add(product);
            true
        })?;

        add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("product_id", product.id.as_str())]),
        );
        Ok(event)
    }

    /// Overwrite a line's quantity; `quantity <= 0` removes the line.
    ///
    /// Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AuthRequired` if no one is signed in, or
    /// `CartError::Storage` if the cart cannot be saved.
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub fn set_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<CartEvent, CartError> {
        self.require_session()?;
        self.mutate(|cart| cart.set_quantity(product_id, quantity))
    }

    /// Remove a line if present.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AuthRequired` if no one is signed in, or
    /// `CartError::Storage` if the cart cannot be saved.
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub fn remove_item(&self, product_id: &ProductId) -> Result<CartEvent, CartError> {
        self.require_session()?;
        let event = self.mutate(|cart| cart.remove(product_id))?;

        add_breadcrumb(
            "cart",
            "Removed item",
            Some(&[("product_id", product_id.as_str())]),
        );
        Ok(event)
    }

    /// Empty the cart and delete it from storage.
    ///
    /// Used on sign-out and after a successful checkout, so it does not
    /// require a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stored cart cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        let event = {
            let mut cart = self.lock();
            self.inner.storage.remove(keys::CART)?;
            if cart.is_empty() {
                return Ok(());
            }
            cart.clear();
            cart.event()
        };
        debug!("Cart cleared");
        self.publish(event);
        Ok(())
    }

    /// Copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().lines().to_vec()
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lock().total()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock().item_count()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        self.lock().state()
    }

    /// Re-read the cart from storage.
    ///
    /// Returns `true` and notifies subscribers if the stored cart differs from
    /// the one in memory.
    pub fn reload(&self) -> bool {
        let stored = read_cart(self.inner.storage.as_ref());
        let event = {
            let mut cart = self.lock();
            if *cart == stored {
                return false;
            }
            *cart = stored;
            cart.event()
        };
        debug!(item_count = event.item_count, "Cart reloaded from storage");
        self.publish(event);
        true
    }

    /// Subscribe to cart changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }

    fn require_session(&self) -> Result<(), CartError> {
        if self.inner.session.is_active() {
            Ok(())
        } else {
            Err(CartError::AuthRequired)
        }
    }

    /// Apply `change` to a copy of the cart, persist it, then commit.
    ///
    /// `change` returns whether it modified the cart; unchanged carts are
    /// neither written nor published.
    fn mutate<F>(&self, change: F) -> Result<CartEvent, CartError>
    where
        F: FnOnce(&mut Cart) -> bool,
    {
        let event = {
            let mut cart = self.lock();
            let mut next = cart.clone();
            if !change(&mut next) {
                return Ok(cart.event());
            }
            write_cart(self.inner.storage.as_ref(), &next)?;
            *cart = next;
            cart.event()
        };

        debug!(item_count = event.item_count, "Cart updated");
        self.publish(event);
        Ok(event)
    }

    fn publish(&self, event: CartEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.inner.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_cart(storage: &dyn Storage) -> Cart {
    load_json::<Vec<CartLine>>(storage, keys::CART)
        .map(Cart::from_lines)
        .unwrap_or_default()
}

fn write_cart(storage: &dyn Storage, cart: &Cart) -> Result<(), StorageError> {
    if cart.is_empty() {
        storage.remove(keys::CART)
    } else {
        store_json(storage, keys::CART, cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use quickcart_core::{Email, UserId};

    use super::*;
    use crate::models::Session;
    use crate::storage::MemoryStorage;

    fn product(id: &str, price: &str) -> Product {
        serde_json::from_value(json!({ "id": id, "title": format!("Product {id}"), "price": price }))
            .unwrap()
    }

    fn signed_in() -> CurrentSession {
        let current = CurrentSession::default();
        current.replace(Some(Session::local(
            UserId::new("u1"),
            Email::parse("ana@example.com").unwrap(),
            Utc::now(),
        )));
        current
    }

    fn store(storage: &MemoryStorage, session: CurrentSession) -> CartStore {
        CartStore::load(Arc::new(storage.clone()), session)
    }

    #[test]
    fn test_add_requires_session() {
        let storage = MemoryStorage::new();
        let cart = store(&storage, CurrentSession::default());

        let err = cart.add_item(&product("1", "10")).unwrap_err();
        assert!(matches!(err, CartError::AuthRequired));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_add_persists_and_totals() {
        let storage = MemoryStorage::new();
        let cart = store(&storage, signed_in());
        let a = product("a", "10");

        cart.add_item(&a).unwrap();
        cart.add_item(&a).unwrap();
        let event = cart.add_item(&product("b", "5")).unwrap();

        assert_eq!(event.item_count, 3);
        assert_eq!(cart.total(), Price::from(25_u32));

        let stored: serde_json::Value =
            serde_json::from_str(&storage.get(keys::CART).unwrap().unwrap()).unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 2);
        assert_eq!(stored[0]["quantity"], 2);
    }

    #[test]
    fn test_set_quantity_zero_removes_and_recomputes() {
        let storage = MemoryStorage::new();
        let cart = store(&storage, signed_in());
        let a = product("a", "10");
        cart.add_item(&a).unwrap();
        cart.add_item(&product("b", "5")).unwrap();

        cart.set_quantity(&a.id, 0).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total(), Price::from(5_u32));
    }

    #[test]
    fn test_removing_last_line_deletes_stored_cart() {
        let storage = MemoryStorage::new();
        let cart = store(&storage, signed_in());
        let a = product("a", "10");
        cart.add_item(&a).unwrap();

        let event = cart.remove_item(&a.id).unwrap();
        assert_eq!(event.state, CartState::Empty);
        assert!(storage.get(keys::CART).unwrap().is_none());
    }

    #[test]
    fn test_set_quantity_unknown_is_noop() {
        let storage = MemoryStorage::new();
        let cart = store(&storage, signed_in());
        let mut changes = storage.subscribe();

        let event = cart.set_quantity(&ProductId::new("missing"), 4).unwrap();
        assert_eq!(event.state, CartState::Empty);
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn test_malformed_stored_cart_loads_empty() {
        let storage = MemoryStorage::new();
        storage.set(keys::CART, "{not json").unwrap();

        let cart = store(&storage, signed_in());
        assert_eq!(cart.state(), CartState::Empty);
        assert!(storage.get(keys::CART).unwrap().is_none());
    }

    #[test]
    fn test_restores_stored_cart() {
        let storage = MemoryStorage::new();
        storage
            .set(
                keys::CART,
                r#"[{"id":1,"title":"Lamp","price":12.5,"quantity":2,"thumbnail":"x.png"}]"#,
            )
            .unwrap();

        let cart = store(&storage, CurrentSession::default());
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), "25".parse().unwrap());
    }

    #[test]
    fn test_clear_without_session() {
        let storage = MemoryStorage::new();
        let session = signed_in();
        let cart = store(&storage, session.clone());
        cart.add_item(&product("a", "1")).unwrap();

        session.replace(None);
        cart.clear().unwrap();
        assert_eq!(cart.state(), CartState::Empty);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_reload_picks_up_external_change() {
        let storage = MemoryStorage::new();
        let session = signed_in();
        let first = store(&storage, session.clone());
        let second = store(&storage, session);

        first.add_item(&product("a", "3")).unwrap();
        assert_eq!(second.item_count(), 0);

        let mut events = second.subscribe();
        assert!(second.reload());
        assert_eq!(second.item_count(), 1);
        assert_eq!(events.try_recv().unwrap().state, CartState::NonEmpty);

        // Nothing new in storage
        assert!(!second.reload());
    }

    #[tokio::test]
    async fn test_subscribers_see_item_count() {
        let storage = MemoryStorage::new();
        let cart = store(&storage, signed_in());
        let mut events = cart.subscribe();

        let a = product("a", "2");
        cart.add_item(&a).unwrap();
        cart.set_quantity(&a.id, 5).unwrap();

        assert_eq!(events.recv().await.unwrap().item_count, 1);
        assert_eq!(events.recv().await.unwrap().item_count, 5);
    }
}
