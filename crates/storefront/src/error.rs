//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that views return. Every variant is
//! recoverable: the view shows `user_message()` inline and keeps running.
//! Infrastructure failures are captured to Sentry by `report()`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::search::SearchError;
use crate::storage::StorageError;
use crate::webhook::WebhookError;

const MSG_TIMEOUT: &str = "Request timed out. Please check your backend and try again.";
const MSG_NETWORK: &str = "Network error. Please check your connection and try again.";
const MSG_SERVER: &str = "Server error. Please try again later.";
const MSG_ORDER_FAILED: &str = "Failed to submit order. Please try again.";
const MSG_AUTH_REQUIRED: &str = "Please log in to add items to your cart.";
const MSG_SEARCH_FAILED: &str = "Error fetching products. Please try again.";
const MSG_STORAGE: &str = "Could not save your changes. Please try again.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Sign-in or sign-out failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart mutation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order submission failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Product search failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Client storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid user input.
    Validation,
    /// Operation needs a signed-in user.
    AuthRequired,
    /// Transport failure or non-success status from a webhook.
    Network,
    /// A webhook did not answer within its time budget.
    Timeout,
    /// A webhook answered with a body in no accepted shape.
    MalformedResponse,
    /// Persisting client state failed.
    Storage,
    /// Invalid configuration.
    Config,
}

impl AppError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(err) => match err {
                AuthError::MissingField(_) | AuthError::InvalidEmail(_) => ErrorKind::Validation,
                AuthError::Storage(_) => ErrorKind::Storage,
            },
            Self::Cart(err) => match err {
                CartError::AuthRequired => ErrorKind::AuthRequired,
                CartError::Storage(_) => ErrorKind::Storage,
            },
            Self::Checkout(err) => match err {
                CheckoutError::AuthRequired => ErrorKind::AuthRequired,
                CheckoutError::EmptyCart => ErrorKind::Validation,
                CheckoutError::Webhook(e) => webhook_kind(e),
                CheckoutError::Storage(_) => ErrorKind::Storage,
            },
            Self::Search(err) => match err {
                SearchError::EmptyQuery => ErrorKind::Validation,
                SearchError::Webhook(e) => webhook_kind(e),
            },
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Message suitable for showing inline to the user.
    ///
    /// Internal details (URLs, I/O errors) are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::MissingField(_) => "Both fields are required.".to_string(),
                AuthError::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
                AuthError::Storage(_) => MSG_STORAGE.to_string(),
            },
            Self::Cart(err) => match err {
                CartError::AuthRequired => MSG_AUTH_REQUIRED.to_string(),
                CartError::Storage(_) => MSG_STORAGE.to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::AuthRequired => "Please log in to check out.".to_string(),
                CheckoutError::EmptyCart => "Your cart is empty.".to_string(),
                CheckoutError::Webhook(e) => webhook_message(e).to_string(),
                // The order went through; only clearing the cart failed
                CheckoutError::Storage(_) => MSG_STORAGE.to_string(),
            },
            Self::Search(err) => match err {
                SearchError::EmptyQuery => "Please enter a search term.".to_string(),
                SearchError::Webhook(_) => MSG_SEARCH_FAILED.to_string(),
            },
            Self::Storage(_) => MSG_STORAGE.to_string(),
            Self::Config(e) => format!("Configuration error: {e}"),
        }
    }

    /// Log the error and capture infrastructure failures to Sentry.
    ///
    /// Validation and auth errors are expected user mistakes and only logged
    /// at debug level.
    pub fn report(&self) {
        if matches!(
            self.kind(),
            ErrorKind::Network
                | ErrorKind::Timeout
                | ErrorKind::MalformedResponse
                | ErrorKind::Storage
        ) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                kind = ?self.kind(),
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::debug!(error = %self, kind = ?self.kind(), "Operation rejected");
        }
    }
}

const fn webhook_kind(err: &WebhookError) -> ErrorKind {
    match err {
        WebhookError::Timeout(_) => ErrorKind::Timeout,
        WebhookError::Http(_) | WebhookError::Status(_) => ErrorKind::Network,
        WebhookError::MalformedResponse(_) => ErrorKind::MalformedResponse,
    }
}

const fn webhook_message(err: &WebhookError) -> &'static str {
    match err {
        WebhookError::Timeout(_) => MSG_TIMEOUT,
        WebhookError::Http(_) => MSG_NETWORK,
        WebhookError::Status(_) => MSG_SERVER,
        WebhookError::MalformedResponse(_) => MSG_ORDER_FAILED,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
