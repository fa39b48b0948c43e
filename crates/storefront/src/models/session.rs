//! Session-related types.
//!
//! Types stored in client storage for authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quickcart_core::{AuthProvider, Email, UserId};

/// Display name given to federated sessions.
pub const FEDERATED_DISPLAY_NAME: &str = "Google User";

/// The signed-in identity.
///
/// There is no credential check behind a session; it only records who the
/// shopper said they were and how they signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Client-generated user ID.
    pub user_id: UserId,
    /// Email address, entered or synthesized.
    pub email: Email,
    /// Name shown in the header.
    #[serde(default)]
    pub display_name: Option<String>,
    /// How the session was established.
    #[serde(default)]
    pub provider: AuthProvider,
    /// When the session was established.
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    /// Create a session for an email/password sign-in.
    ///
    /// The display name is the part of the email before the @.
    #[must_use]
    pub fn local(user_id: UserId, email: Email, signed_in_at: DateTime<Utc>) -> Self {
        let display_name = Some(email.local_part().to_string()).filter(|name| !name.is_empty());
        Self {
            user_id,
            email,
            display_name,
            provider: AuthProvider::Local,
            signed_in_at,
        }
    }

    /// Create a session for a federated sign-in.
    #[must_use]
    pub fn federated(user_id: UserId, email: Email, signed_in_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            email,
            display_name: Some(FEDERATED_DISPLAY_NAME.to_string()),
            provider: AuthProvider::Federated,
            signed_in_at,
        }
    }

    /// Name to greet the user with, falling back to the email.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.email.as_str())
    }
}

/// Published by the session store when the signed-in identity changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}
