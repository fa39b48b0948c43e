//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults point at a local webhook runner.
//!
//! - `QUICKCART_DATA_DIR` - Directory for persisted session/cart state (default: `.quickcart`)
//! - `QUICKCART_SEARCH_URL` - Product search webhook
//! - `QUICKCART_ORDER_URL` - Order submission webhook
//! - `QUICKCART_PRODUCT_INFO_URL` - Product-info notification webhook
//! - `QUICKCART_ORDER_TIMEOUT_SECS` - Order submission timeout (default: 30)
//! - `QUICKCART_LOGIN_DELAY_MS` - Simulated email login delay (default: 1000)
//! - `QUICKCART_FEDERATED_LOGIN_DELAY_MS` - Simulated federated login delay (default: 1500)
//! - `QUICKCART_PAGE_SIZE` - Search results per page (default: 20)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = ".quickcart";
const DEFAULT_SEARCH_URL: &str = "http://localhost:5678/webhook/search-products";
const DEFAULT_PRODUCT_INFO_URL: &str = "http://localhost:5678/webhook/product-info";
const DEFAULT_ORDER_TIMEOUT_SECS: &str = "30";
const DEFAULT_LOGIN_DELAY_MS: &str = "1000";
const DEFAULT_FEDERATED_LOGIN_DELAY_MS: &str = "1500";
const DEFAULT_PAGE_SIZE: &str = "20";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory holding persisted client state
    pub data_dir: PathBuf,
    /// Webhook endpoints
    pub webhooks: WebhookConfig,
    /// Simulated sign-in behaviour
    pub auth: AuthConfig,
    /// Search results per page
    pub page_size: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Webhook endpoint configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Product search endpoint (GET `?q=`)
    pub search_url: Url,
    /// Order submission endpoint (POST JSON)
    pub order_url: Url,
    /// Product-info notification endpoint (GET `?title=`)
    pub product_info_url: Url,
    /// Upper bound on an order submission round trip
    pub order_timeout: Duration,
}

/// Simulated authentication timing.
#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    /// Delay before an email/password login or signup completes
    pub login_delay: Duration,
    /// Delay before a federated login completes
    pub federated_login_delay: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_delay: Duration::from_millis(1000),
            federated_login_delay: Duration::from_millis(1500),
        }
    }
}

impl AuthConfig {
    /// No simulated delay. Useful for tests and scripted use.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            login_delay: Duration::ZERO,
            federated_login_delay: Duration::ZERO,
        }
    }
}

impl WebhookConfig {
    /// Endpoints rooted at `base`, using the default webhook paths.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if `base` is not a valid URL.
    pub fn with_base_url(base: &str, order_timeout: Duration) -> Result<Self, url::ParseError> {
        let base = Url::parse(base)?;
        Ok(Self {
            search_url: base.join("/webhook/search-products")?,
            order_url: base.join("/webhook/product-info")?,
            product_info_url: base.join("/webhook/product-info")?,
            order_timeout,
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let data_dir = PathBuf::from(env.or_default("QUICKCART_DATA_DIR", DEFAULT_DATA_DIR));

        let webhooks = WebhookConfig {
            search_url: env.url("QUICKCART_SEARCH_URL", DEFAULT_SEARCH_URL)?,
            order_url: env.url("QUICKCART_ORDER_URL", DEFAULT_PRODUCT_INFO_URL)?,
            product_info_url: env.url("QUICKCART_PRODUCT_INFO_URL", DEFAULT_PRODUCT_INFO_URL)?,
            order_timeout: Duration::from_secs(
                env.positive("QUICKCART_ORDER_TIMEOUT_SECS", DEFAULT_ORDER_TIMEOUT_SECS)?,
            ),
        };

        let auth = AuthConfig {
            login_delay: Duration::from_millis(
                env.parsed("QUICKCART_LOGIN_DELAY_MS", DEFAULT_LOGIN_DELAY_MS)?,
            ),
            federated_login_delay: Duration::from_millis(env.parsed(
                "QUICKCART_FEDERATED_LOGIN_DELAY_MS",
                DEFAULT_FEDERATED_LOGIN_DELAY_MS,
            )?),
        };

        let page_size = env.positive("QUICKCART_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;

        Ok(Self {
            data_dir,
            webhooks,
            auth,
            page_size,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn positive<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr + Default + PartialEq,
        T::Err: std::fmt::Display,
    {
        let value = self.parsed::<T>(key, default)?;
        if value == T::default() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        Ok(value)
    }

    fn url(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        let raw = self.or_default(key, default);
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }
}
