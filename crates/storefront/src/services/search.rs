//! Product search service.

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::webhook::{SearchResults, WebhookClient, WebhookError};

/// Errors that can occur during a product search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query was blank.
    #[error("search query is empty")]
    EmptyQuery,

    /// The search webhook failed.
    #[error("search failed: {0}")]
    Webhook(#[from] WebhookError),
}

/// Product search and product-view notifications.
#[derive(Clone)]
pub struct SearchService {
    webhooks: WebhookClient,
    page_size: usize,
}

impl SearchService {
    /// Create a new search service.
    #[must_use]
    pub const fn new(webhooks: WebhookClient, page_size: usize) -> Self {
        Self {
            webhooks,
            page_size,
        }
    }

    /// Results per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Search products. Blank queries are rejected without a request.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::EmptyQuery` for a blank query and
    /// `SearchError::Webhook` if the search webhook fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchResults, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        add_breadcrumb("search", "Searched products", Some(&[("query", query)]));
        Ok(self.webhooks.search(query).await?)
    }

    /// Tell the product-info webhook that a product was viewed.
    ///
    /// Fire-and-forget; see [`WebhookClient::record_product_view`].
    pub fn record_product_view(&self, title: &str) -> JoinHandle<()> {
        self.webhooks.record_product_view(title)
    }
}
