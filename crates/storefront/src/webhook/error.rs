//! Webhook error types.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling an external webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request did not complete within its time budget.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Connection or transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-success status.
    #[error("webhook returned {0}")]
    Status(StatusCode),

    /// The response body was not in any accepted shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl WebhookError {
    /// Classify a `reqwest` error, separating timeouts from other failures.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(limit) if err.is_timeout() => Self::Timeout(limit),
            _ => Self::Http(err),
        }
    }
}
