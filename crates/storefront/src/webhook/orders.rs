//! Order submission webhook.

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{info, instrument};

use quickcart_core::{Email, Price};

use crate::models::Cart;

use super::{WebhookClient, WebhookError};

/// Order payload posted to the order webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSubmission {
    /// Human-readable summary, e.g. `"Desk Lamp 2, USB Cable 1"`.
    pub order: String,
    pub total: Price,
    pub items: Vec<OrderItem>,
    /// Email of the signed-in user.
    pub mail: String,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub title: String,
    pub quantity: u32,
    /// Unit price as cached in the cart.
    pub price: Price,
}

impl OrderSubmission {
    /// Build an order from the cart's cached lines.
    #[must_use]
    pub fn from_cart(cart: &Cart, mail: &Email) -> Self {
        let items: Vec<OrderItem> = cart
            .lines()
            .iter()
            .map(|line| OrderItem {
                title: line.title.clone(),
                quantity: line.quantity,
                price: line.unit_price,
            })
            .collect();

        let order = items
            .iter()
            .map(|item| format!("{} {}", item.title, item.quantity))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            order,
            total: cart.total(),
            items,
            mail: mail.as_str().to_string(),
        }
    }
}

impl WebhookClient {
    /// Post an order to the order webhook.
    ///
    /// The whole round trip is bounded by the configured order timeout.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Timeout` if the webhook does not answer in time,
    /// `WebhookError::Http` on transport failure, and `WebhookError::Status`
    /// on a non-success response.
    #[instrument(skip(self, order), fields(items = order.items.len(), total = %order.total))]
    pub async fn submit_order(&self, order: &OrderSubmission) -> Result<StatusCode, WebhookError> {
        let timeout = self.config().order_timeout;

        let response = self
            .http()
            .post(self.config().order_url.clone())
            .timeout(timeout)
            .json(order)
            .send()
            .await
            .map_err(|e| WebhookError::from_reqwest(e, Some(timeout)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status));
        }

        info!(status = %status, "Order submitted");
        Ok(status)
    }
}
