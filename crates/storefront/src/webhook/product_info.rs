//! Product-info notification webhook.
//!
//! Viewing a product pings the webhook with its title. The outcome never
//! reaches the caller; failures are logged at debug level and dropped.

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span};

use super::WebhookClient;

impl WebhookClient {
    /// Notify the product-info webhook that `title` was viewed.
    ///
    /// Returns immediately. The returned handle may be awaited or dropped.
    /// Must be called from within a Tokio runtime.
    pub fn record_product_view(&self, title: &str) -> JoinHandle<()> {
        let mut url = self.config().product_info_url.clone();
        url.query_pairs_mut().append_pair("title", title);

        let client = self.http().clone();
        let span = info_span!("product_view", title = %title);

        tokio::spawn(
            async move {
                match client.get(url).send().await {
                    Ok(response) => debug!(status = %response.status(), "Product view recorded"),
                    Err(e) => debug!(error = %e, "Product view notification failed"),
                }
            }
            .instrument(span),
        )
    }
}
