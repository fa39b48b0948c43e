//! Application state shared across views.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::StorefrontConfig;
use crate::services::CurrentSession;
use crate::services::auth::SessionStore;
use crate::services::cart::CartStore;
use crate::services::checkout::{CheckoutError, CheckoutService, OrderReceipt};
use crate::services::search::{SearchError, SearchService};
use crate::storage::{Storage, keys};
use crate::webhook::{SearchResults, WebhookClient};

/// Application state shared across all views.
///
/// This struct is cheaply cloneable via `Arc` and owns the session and cart
/// stores, the webhook client, and configuration. Several `AppState`s may
/// share one [`Storage`]; see [`spawn_storage_sync`](Self::spawn_storage_sync).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: Arc<dyn Storage>,
    session: SessionStore,
    cart: CartStore,
    checkout: CheckoutService,
    search: SearchService,
}

impl AppState {
    /// Create a new application state, restoring session and cart from
    /// `storage`.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `storage` - Client storage backend
    #[must_use]
    pub fn new(config: StorefrontConfig, storage: Arc<dyn Storage>) -> Self {
        let webhooks = WebhookClient::new(&config.webhooks);

        let current = CurrentSession::default();
        let cart = CartStore::load(storage.clone(), current.clone());
        let session = SessionStore::load(storage.clone(), current.clone(), cart.clone(), config.auth);
        let checkout = CheckoutService::new(current, cart.clone(), webhooks.clone());
        let search = SearchService::new(webhooks, config.page_size);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                session,
                cart,
                checkout,
                search,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the client storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the search service.
    #[must_use]
    pub fn search_service(&self) -> &SearchService {
        &self.inner.search
    }

    /// Submit the cart as an order.
    ///
    /// # Errors
    ///
    /// See [`CheckoutService::checkout`].
    pub async fn checkout(&self) -> Result<OrderReceipt, CheckoutError> {
        self.inner.checkout.checkout().await
    }

    /// Search products.
    ///
    /// # Errors
    ///
    /// See [`SearchService::search`].
    pub async fn search(&self, query: &str) -> Result<SearchResults, SearchError> {
        self.inner.search.search(query).await
    }

    /// Keep the stores in step with writes made through other `AppState`s.
    ///
    /// Spawns a task that reloads the session or cart whenever its storage
    /// key changes. Reloads of this state's own writes are no-ops. The task
    /// runs until aborted through the returned handle.
    pub fn spawn_storage_sync(&self) -> JoinHandle<()> {
        let mut changes = self.inner.storage.subscribe();
        let session = self.inner.session.clone();
        let cart = self.inner.cart.clone();

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => match change.key.as_str() {
                        keys::SESSION => {
                            session.reload();
                        }
                        keys::CART => {
                            cart.reload();
                        }
                        other => debug!(key = other, "Ignoring storage change"),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Storage sync lagged, reloading everything");
                        session.reload();
                        cart.reload();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
