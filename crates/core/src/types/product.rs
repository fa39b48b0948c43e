//! Product records returned by the search webhook.

use serde::{Deserialize, Serialize};

use super::{AvailabilityStatus, Price, ProductId};

/// A product as returned by the search webhook.
///
/// Only `id` is required. Display fields that the webhook omits fall back to
/// empty values so that one sparse record does not fail a whole result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier (string or integer on the wire).
    pub id: ProductId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    #[serde(default)]
    pub price: Price,
    /// Average rating, if the webhook supplied one.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Stock availability label.
    #[serde(default)]
    pub availability_status: AvailabilityStatus,
    /// Thumbnail image URL.
    #[serde(default, alias = "thumbnailUrl")]
    pub thumbnail: Option<String>,
}

impl Product {
    /// Thumbnail URL, treating an empty string as absent.
    #[must_use]
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail.as_deref().filter(|url| !url.trim().is_empty())
    }
}
