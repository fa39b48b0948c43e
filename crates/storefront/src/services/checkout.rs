//! Checkout service.
//!
//! Turns the cart into an order, posts it to the order webhook, and empties
//! the cart once the webhook accepts it. Prices are the ones cached on the
//! cart lines when the products were added; they are not re-fetched.

use thiserror::Error;
use tracing::{info, instrument};

use quickcart_core::Price;

use crate::error::add_breadcrumb;
use crate::storage::StorageError;
use crate::webhook::{OrderSubmission, WebhookClient, WebhookError};

use super::CurrentSession;
use super::cart::CartStore;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No one is signed in.
    #[error("sign-in required")]
    AuthRequired,

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The order webhook failed; the cart is untouched.
    #[error("order submission failed: {0}")]
    Webhook(#[from] WebhookError),

    /// The order was accepted but the cart could not be cleared.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Summary of an accepted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    /// `"title quantity"` entries joined by `", "`.
    pub summary: String,
    pub total: Price,
    pub item_count: u32,
}

/// Submits the cart as an order.
#[derive(Clone)]
pub struct CheckoutService {
    session: CurrentSession,
    cart: CartStore,
    webhooks: WebhookClient,
}

impl CheckoutService {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(session: CurrentSession, cart: CartStore, webhooks: WebhookClient) -> Self {
        Self {
            session,
            cart,
            webhooks,
        }
    }

    /// Submit the current cart as an order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AuthRequired` if no one is signed in,
    /// `CheckoutError::EmptyCart` if there is nothing to order, and
    /// `CheckoutError::Webhook` if the order webhook fails or times out.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<OrderReceipt, CheckoutError> {
        let session = self.session.get().ok_or(CheckoutError::AuthRequired)?;
        let cart = self.cart.snapshot();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = OrderSubmission::from_cart(&cart, &session.email);
        add_breadcrumb("checkout", "Submitting order", None);
        self.webhooks.submit_order(&order).await?;

        self.cart.clear()?;

        let receipt = OrderReceipt {
            summary: order.order,
            total: order.total,
            item_count: cart.item_count(),
        };
        info!(
            user_id = %session.user_id,
            item_count = receipt.item_count,
            total = %receipt.total,
            "Order placed"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use httpmock::prelude::*;
    use serde_json::json;

    use quickcart_core::{Email, Product, UserId};

    use super::*;
    use crate::config::WebhookConfig;
    use crate::models::{CartState, Session};
    use crate::storage::{MemoryStorage, Storage};

    struct Fixture {
        session: CurrentSession,
        cart: CartStore,
        checkout: CheckoutService,
    }

    fn fixture(base_url: &str, timeout: Duration) -> Fixture {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let session = CurrentSession::default();
        session.replace(Some(Session::local(
            UserId::new("u1"),
            Email::parse("ana@example.com").unwrap(),
            Utc::now(),
        )));
        let cart = CartStore::load(storage, session.clone());
        let config = WebhookConfig::with_base_url(base_url, timeout).unwrap();
        let checkout =
            CheckoutService::new(session.clone(), cart.clone(), WebhookClient::new(&config));
        Fixture {
            session,
            cart,
            checkout,
        }
    }

    fn add(cart: &CartStore, id: u32, title: &str, price: f64) {
        let product: Product =
            serde_json::from_value(json!({ "id": id, "title": title, "price": price })).unwrap();
        cart.add_item(&product).unwrap();
    }

    #[tokio::test]
    async fn test_checkout_success_clears_cart() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/webhook/product-info").json_body(json!({
                    "order": "Lamp 2, Cable 1",
                    "total": 25.0,
                    "items": [
                        { "title": "Lamp", "quantity": 2, "price": 10.0 },
                        { "title": "Cable", "quantity": 1, "price": 5.0 }
                    ],
                    "mail": "ana@example.com"
                }));
                then.status(200);
            })
            .await;

        let f = fixture(&server.base_url(), Duration::from_secs(5));
        add(&f.cart, 1, "Lamp", 10.0);
        add(&f.cart, 1, "Lamp", 10.0);
        add(&f.cart, 2, "Cable", 5.0);

        let receipt = f.checkout.checkout().await.unwrap();
        mock.assert_async().await;

        assert_eq!(receipt.summary, "Lamp 2, Cable 1");
        assert_eq!(receipt.total, Price::from(25_u32));
        assert_eq!(receipt.item_count, 3);
        assert_eq!(f.cart.state(), CartState::Empty);
    }

    #[tokio::test]
    async fn test_checkout_requires_session() {
        let f = fixture("http://127.0.0.1:9", Duration::from_secs(1));
        add(&f.cart, 1, "Lamp", 10.0);
        f.session.replace(None);

        let err = f.checkout.checkout().await.unwrap_err();
        assert!(matches!(err, CheckoutError::AuthRequired));
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let f = fixture("http://127.0.0.1:9", Duration::from_secs(1));
        let err = f.checkout.checkout().await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_checkout_failure_keeps_cart() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/webhook/product-info");
                then.status(500);
            })
            .await;

        let f = fixture(&server.base_url(), Duration::from_secs(5));
        add(&f.cart, 1, "Lamp", 10.0);

        let err = f.checkout.checkout().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Webhook(WebhookError::Status(_))));
        assert_eq!(f.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/webhook/product-info");
                then.status(200).delay(Duration::from_millis(500));
            })
            .await;

        let f = fixture(&server.base_url(), Duration::from_millis(100));
        add(&f.cart, 1, "Lamp", 10.0);

        let err = f.checkout.checkout().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Webhook(WebhookError::Timeout(_))));
        assert_eq!(f.cart.item_count(), 1);
    }
}
