//! Status enums for various entities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Stock availability as reported by the search webhook.
///
/// The webhook sends free text. Known values map to variants; anything else is
/// preserved in [`AvailabilityStatus::Other`] so it can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AvailabilityStatus {
    /// "In Stock"
    InStock,
    /// "Low Stock"
    LowStock,
    /// "Out of Stock"
    OutOfStock,
    /// Any other label, verbatim (possibly empty).
    Other(String),
}

impl AvailabilityStatus {
    /// Display label for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InStock => "In Stock",
            Self::LowStock => "Low Stock",
            Self::OutOfStock => "Out of Stock",
            Self::Other(label) => label,
        }
    }
}

impl Default for AvailabilityStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for AvailabilityStatus {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "in stock" => Self::InStock,
            "low stock" => Self::LowStock,
            "out of stock" => Self::OutOfStock,
            _ => Self::Other(label),
        }
    }
}

impl From<AvailabilityStatus> for String {
    fn from(status: AvailabilityStatus) -> Self {
        match status {
            AvailabilityStatus::Other(label) => label,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    /// Email and password form.
    #[default]
    Local,
    /// External identity provider (simulated).
    Federated,
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Federated => f.write_str("federated"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_known_labels() {
        assert_eq!(
            AvailabilityStatus::from("In Stock".to_string()),
            AvailabilityStatus::InStock
        );
        assert_eq!(
            AvailabilityStatus::from("out of stock".to_string()),
            AvailabilityStatus::OutOfStock
        );
    }

    #[test]
    fn test_availability_unknown_label_preserved() {
        let status: AvailabilityStatus = serde_json::from_str("\"Backordered\"").unwrap();
        assert_eq!(status, AvailabilityStatus::Other("Backordered".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"Backordered\"");
    }

    #[test]
    fn test_auth_provider_serde() {
        assert_eq!(
            serde_json::to_string(&AuthProvider::Federated).unwrap(),
            "\"federated\""
        );
        let local: AuthProvider = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(local, AuthProvider::Local);
    }
}
