//! Clients for the external webhook services.
//!
//! # Architecture
//!
//! - The webhooks are opaque collaborators: search ranking and order
//!   processing happen entirely on the other side
//! - One shared `reqwest::Client` for all endpoints
//! - No retries, no request deduplication, no caching
//!
//! # Endpoints
//!
//! - Product search: `GET ?q=<query>`, tolerant of several response shapes
//! - Order submission: `POST` JSON with a bounded timeout
//! - Product info: `GET ?title=<title>`, fire-and-forget

mod error;
mod orders;
mod product_info;
mod search;

pub use error::WebhookError;
pub use orders::{OrderItem, OrderSubmission};
pub use search::{SearchPage, SearchResults};

use std::sync::Arc;

use crate::config::WebhookConfig;

/// Client for the search, order, and product-info webhooks.
#[derive(Clone)]
pub struct WebhookClient {
    inner: Arc<WebhookClientInner>,
}

struct WebhookClientInner {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookClient {
    /// Create a new webhook client.
    #[must_use]
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            inner: Arc::new(WebhookClientInner {
                client: reqwest::Client::new(),
                config: config.clone(),
            }),
        }
    }

    /// Endpoint configuration in use.
    #[must_use]
    pub fn config(&self) -> &WebhookConfig {
        &self.inner.config
    }

    fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }
}
