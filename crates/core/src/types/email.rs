//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
}

/// An email address as entered by the shopper.
///
/// Sign-in is simulated, so the only structural requirement is that the
/// address is present. Surrounding whitespace is trimmed. Anything else the
/// user typed is kept verbatim, however long.
///
/// ## Examples
///
/// ```
/// use quickcart_core::Email;
///
/// assert!(Email::parse("user@example.com").is_ok());
/// assert!(Email::parse("  shopper  ").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Trim and validate user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        match s.trim() {
            "" => Err(EmailError::Empty),
            t => Ok(Self(t.to_owned())),
        }
    }

    /// The address as entered, minus surrounding whitespace.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the local part of the email (before the first @).
    ///
    /// An address without an @ is all local part.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
