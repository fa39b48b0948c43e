//! Product search webhook.

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use quickcart_core::Product;

use super::{WebhookClient, WebhookError};

/// Products and advisory warnings returned by a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub products: Vec<Product>,
    pub warnings: Vec<String>,
}

/// One page of search results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPage<'a> {
    /// 1-based page number.
    pub number: usize,
    /// Total number of pages (0 when there are no results).
    pub total_pages: usize,
    pub products: &'a [Product],
}

impl SearchResults {
    /// Slice out page `number` (1-based) of `page_size` products.
    ///
    /// Page 0 is treated as page 1. Pages past the end are empty.
    #[must_use]
    pub fn page(&self, number: usize, page_size: usize) -> SearchPage<'_> {
        let number = number.max(1);
        let page_size = page_size.max(1);
        let total_pages = self.products.len().div_ceil(page_size);
        let start = (number - 1).saturating_mul(page_size);
        let products = self
            .products
            .get(start..)
            .map_or(&[][..], |rest| rest.get(..page_size).unwrap_or(rest));

        SearchPage {
            number,
            total_pages,
            products,
        }
    }
}

impl WebhookClient {
    /// Search products by free-text query.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Http` on transport failure,
    /// `WebhookError::MalformedResponse` if the body is not JSON in an accepted
    /// shape, and `WebhookError::Status` if the webhook failed without
    /// returning any products.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchResults, WebhookError> {
        let mut url = self.config().search_url.clone();
        url.query_pairs_mut().append_pair("q", query);

        let response = self
            .http()
            .get(url)
            .send()
            .await
            .map_err(|e| WebhookError::from_reqwest(e, None))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if !is_json {
            if !status.is_success() {
                return Err(WebhookError::Status(status));
            }
            return Err(WebhookError::MalformedResponse(
                "response is not JSON".to_string(),
            ));
        }

        let body = response.text().await?;
        let results = parse_search_body(&body)?;

        // A failing status is tolerated as long as products came back
        if !status.is_success() {
            if results.products.is_empty() {
                return Err(WebhookError::Status(status));
            }
            warn!(status = %status, "Search webhook returned products with a failing status");
        }

        debug!(
            products = results.products.len(),
            warnings = results.warnings.len(),
            "Search completed"
        );
        Ok(results)
    }
}

/// Decode a search response body.
///
/// Accepted shapes:
/// - `[product, ...]`
/// - `[{"products": [...], "warnings": [...]}]` (only the first element is read)
/// - `{"products": [...], "warnings": [...]}`
pub(crate) fn parse_search_body(body: &str) -> Result<SearchResults, WebhookError> {
    if body.trim().is_empty() {
        return Err(WebhookError::MalformedResponse("empty response".to_string()));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| WebhookError::MalformedResponse(format!("invalid JSON: {e}")))?;

    match value {
        Value::Array(items) => {
            if let Some(Value::Object(first)) = items.first()
                && first.contains_key("products")
            {
                return envelope(first.get("products"), first.get("warnings"));
            }
            Ok(SearchResults {
                products: decode_products(Value::Array(items))?,
                warnings: Vec::new(),
            })
        }
        Value::Object(map) if map.contains_key("products") => {
            envelope(map.get("products"), map.get("warnings"))
        }
        other => Err(WebhookError::MalformedResponse(format!(
            "unexpected response shape: {}",
            shape_name(&other)
        ))),
    }
}

fn envelope(products: Option<&Value>, warnings: Option<&Value>) -> Result<SearchResults, WebhookError> {
    let products = decode_products(products.cloned().unwrap_or(Value::Null))?;
    let warnings = match warnings {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            WebhookError::MalformedResponse(format!("invalid warnings: {e}"))
        })?,
    };
    Ok(SearchResults { products, warnings })
}

fn decode_products(value: Value) -> Result<Vec<Product>, WebhookError> {
    if !value.is_array() {
        return Err(WebhookError::MalformedResponse(format!(
            "products must be an array, got {}",
            shape_name(&value)
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| WebhookError::MalformedResponse(format!("invalid product record: {e}")))
}

const fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::config::WebhookConfig;

    fn client_for(server: &MockServer) -> WebhookClient {
        let config = WebhookConfig::with_base_url(&server.base_url(), Duration::from_secs(5)).unwrap();
        WebhookClient::new(&config)
    }

    fn products(n: usize) -> Value {
        Value::Array(
            (0..n)
                .map(|i| json!({ "id": i, "title": format!("Item {i}"), "price": 1 }))
                .collect(),
        )
    }

    #[test]
    fn test_parse_bare_array() {
        let results = parse_search_body(&products(3).to_string()).unwrap();
        assert_eq!(results.products.len(), 3);
        assert!(results.warnings.is_empty());
    }

    #[test]
    fn test_parse_wrapped_array() {
        let body = json!([{ "products": products(2), "warnings": ["partial results"] }]);
        let results = parse_search_body(&body.to_string()).unwrap();
        assert_eq!(results.products.len(), 2);
        assert_eq!(results.warnings, vec!["partial results".to_string()]);
    }

    #[test]
    fn test_parse_object() {
        let body = json!({ "products": products(1) });
        let results = parse_search_body(&body.to_string()).unwrap();
        assert_eq!(results.products.len(), 1);
        assert!(results.warnings.is_empty());
    }

    #[test]
    fn test_parse_empty_array() {
        let results = parse_search_body("[]").unwrap();
        assert!(results.products.is_empty());
    }

    #[test]
    fn test_parse_rejects_unexpected_shapes() {
        for body in ["", "   ", "not json", "42", "\"text\"", "{\"items\": []}", "{\"products\": 5}"] {
            assert!(
                matches!(parse_search_body(body), Err(WebhookError::MalformedResponse(_))),
                "expected malformed for {body:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_product_record() {
        let body = json!([{ "title": "missing id" }]);
        assert!(matches!(
            parse_search_body(&body.to_string()),
            Err(WebhookError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_pagination() {
        let results = parse_search_body(&products(45).to_string()).unwrap();

        let first = results.page(1, 20);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.products.len(), 20);

        let last = results.page(3, 20);
        assert_eq!(last.products.len(), 5);
        assert_eq!(last.products.first().unwrap().title, "Item 40");

        assert!(results.page(4, 20).products.is_empty());
        assert_eq!(results.page(0, 20).number, 1);
    }

    #[test]
    fn test_pagination_empty() {
        let results = SearchResults::default();
        let page = results.page(1, 20);
        assert_eq!(page.total_pages, 0);
        assert!(page.products.is_empty());
    }

    #[tokio::test]
    async fn test_search_sends_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/webhook/search-products")
                    .query_param("q", "usb cable");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(products(2));
            })
            .await;

        let results = client_for(&server).search("usb cable").await.unwrap();
        assert_eq!(results.products.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_rejects_non_json_content_type() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/webhook/search-products");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<html></html>");
            })
            .await;

        let err = client_for(&server).search("x").await.unwrap_err();
        assert!(matches!(err, WebhookError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_search_failing_status_without_products() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/webhook/search-products");
                then.status(500)
                    .header("content-type", "application/json")
                    .json_body(json!({ "products": [] }));
            })
            .await;

        let err = client_for(&server).search("x").await.unwrap_err();
        assert!(matches!(err, WebhookError::Status(s) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_search_failing_status_with_products_is_accepted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/webhook/search-products");
                then.status(502)
                    .header("content-type", "application/json")
                    .json_body(products(1));
            })
            .await;

        let results = client_for(&server).search("x").await.unwrap();
        assert_eq!(results.products.len(), 1);
    }
}
