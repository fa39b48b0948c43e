//! Integration tests for quickcart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p quickcart-integration-tests
//! ```
//!
//! Webhooks are served by an in-process `httpmock` server, so no external
//! services are needed.
//!
//! # Test Categories
//!
//! - `checkout_flow` - Sign in, fill the cart, submit orders
//! - `search_flow` - Search response shapes and pagination
//! - `storage_sync` - Several `AppState`s sharing one storage
//! - `persistence` - File-backed state across restarts

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use serde_json::json;

use quickcart_core::Product;
use quickcart_storefront::config::{AuthConfig, StorefrontConfig, WebhookConfig};
use quickcart_storefront::state::AppState;
use quickcart_storefront::storage::{MemoryStorage, Storage};

/// Order timeout used unless a test overrides it.
pub const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(5);

/// A mock webhook server plus a shared in-memory storage.
pub struct TestContext {
    pub server: MockServer,
    pub storage: MemoryStorage,
    order_timeout: Duration,
}

impl TestContext {
    /// Start a mock webhook server.
    pub async fn new() -> Self {
        Self::with_order_timeout(DEFAULT_ORDER_TIMEOUT).await
    }

    /// Start a mock webhook server with a custom order timeout.
    pub async fn with_order_timeout(order_timeout: Duration) -> Self {
        Self {
            server: MockServer::start_async().await,
            storage: MemoryStorage::new(),
            order_timeout,
        }
    }

    /// Configuration pointing every webhook at the mock server.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        config_for(&self.server.base_url(), self.order_timeout)
    }

    /// A fresh `AppState` over the shared storage.
    ///
    /// Each call behaves like another process sharing the same client state.
    #[must_use]
    pub fn state(&self) -> AppState {
        let storage: Arc<dyn Storage> = Arc::new(self.storage.clone());
        AppState::new(self.config(), storage)
    }
}

/// Configuration with all webhooks under `base_url` and no sign-in delay.
///
/// # Panics
///
/// Panics if `base_url` is not a valid URL.
#[must_use]
#[allow(clippy::expect_used)]
pub fn config_for(base_url: &str, order_timeout: Duration) -> StorefrontConfig {
    StorefrontConfig {
        data_dir: PathBuf::from(".quickcart-test"),
        webhooks: WebhookConfig::with_base_url(base_url, order_timeout)
            .expect("webhook base URL is valid"),
        auth: AuthConfig::immediate(),
        page_size: 20,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A product as the search webhook would return it.
///
/// # Panics
///
/// Panics if the generated record does not decode, which would be a bug in
/// this helper.
#[must_use]
#[allow(clippy::expect_used)]
pub fn product(id: u32, title: &str, price: f64) -> Product {
    serde_json::from_value(json!({
        "id": id,
        "title": title,
        "description": format!("{title} description"),
        "price": price,
        "rating": 4.2,
        "availabilityStatus": "In Stock",
        "thumbnail": format!("https://cdn.example.com/{id}.png"),
    }))
    .expect("product fixture decodes")
}
