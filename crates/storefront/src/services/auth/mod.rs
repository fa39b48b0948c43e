//! Authentication service.
//!
//! Sign-in is simulated: any non-empty email and password are accepted and
//! no credential is ever checked. What this module does own is the session
//! lifecycle: persisting it, restoring it at startup, clearing the cart on
//! sign-out, and telling subscribers about changes.

mod error;

pub use error::AuthError;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use quickcart_core::{Email, UserId};

use crate::config::AuthConfig;
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::{Session, SessionEvent};
use crate::storage::{Storage, keys};

use super::cart::CartStore;
use super::{CurrentSession, load_json, store_json};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Domain used for synthesized federated accounts.
const FEDERATED_EMAIL_DOMAIN: &str = "gmail.com";

/// Owner of the signed-in session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Arc<dyn Storage>,
    current: CurrentSession,
    cart: CartStore,
    config: AuthConfig,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Restore the session from storage.
    ///
    /// A malformed stored session is discarded and the store starts signed
    /// out.
    #[must_use]
    pub fn load(
        storage: Arc<dyn Storage>,
        current: CurrentSession,
        cart: CartStore,
        config: AuthConfig,
    ) -> Self {
        let session = load_json::<Session>(storage.as_ref(), keys::SESSION);
        if let Some(session) = &session {
            debug!(user_id = %session.user_id, "Session restored");
            set_sentry_user(&session.user_id, Some(session.email.as_str()));
        }
        current.replace(session);

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SessionStoreInner {
                storage,
                current,
                cart,
                config,
                events,
            }),
        }
    }

    /// Sign in with email and password.
    ///
    /// The password is required but never checked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if either field is blank, or
    /// `AuthError::Storage` if the session cannot be saved.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = validate_credentials(email, password)?;
        pause(self.inner.config.login_delay).await;

        let session = Session::local(new_user_id(), email, Utc::now());
        self.establish(session, "Logged in")
    }

    /// Create an account with email and password.
    ///
    /// Behaves exactly like [`login`](Self::login); there is no account
    /// registry to add to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if either field is blank, or
    /// `AuthError::Storage` if the session cannot be saved.
    #[instrument(skip(self, email, password))]
    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = validate_credentials(email, password)?;
        pause(self.inner.config.login_delay).await;

        let session = Session::local(new_user_id(), email, Utc::now());
        self.establish(session, "Signed up")
    }

    /// Sign in through the federated provider.
    ///
    /// Always succeeds with a freshly synthesized account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the session cannot be saved.
    #[instrument(skip(self))]
    pub async fn login_with_federated_provider(&self) -> Result<Session, AuthError> {
        pause(self.inner.config.federated_login_delay).await;
        let session = federated_session()?;
        self.establish(session, "Logged in with federated provider")
    }

    /// Create an account through the federated provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the session cannot be saved.
    #[instrument(skip(self))]
    pub async fn signup_with_federated_provider(&self) -> Result<Session, AuthError> {
        pause(self.inner.config.federated_login_delay).await;
        let session = federated_session()?;
        self.establish(session, "Signed up with federated provider")
    }

    /// Sign out and empty the cart.
    ///
    /// Signing out while signed out is a no-op apart from clearing storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the stored session or cart cannot be
    /// removed.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), AuthError> {
        self.inner.storage.remove(keys::SESSION)?;
        let previous = self.inner.current.replace(None);
        self.inner.cart.clear()?;
        clear_sentry_user();

        if let Some(session) = previous {
            info!(user_id = %session.user_id, "Logged out");
            add_breadcrumb("auth", "Logged out", None);
            self.publish(SessionEvent::SignedOut);
        }
        Ok(())
    }

    /// The signed-in session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner.current.get()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.current.is_active()
    }

    /// Re-read the session from storage.
    ///
    /// Returns `true` and notifies subscribers if the stored session differs
    /// from the one in memory. A session removed elsewhere signs this store
    /// out without touching the cart; the cart is synced separately.
    pub fn reload(&self) -> bool {
        let stored = load_json::<Session>(self.inner.storage.as_ref(), keys::SESSION);
        if self.inner.current.get() == stored {
            return false;
        }

        let event = match &stored {
            Some(session) => {
                set_sentry_user(&session.user_id, Some(session.email.as_str()));
                SessionEvent::SignedIn(session.clone())
            }
            None => {
                clear_sentry_user();
                SessionEvent::SignedOut
            }
        };
        self.inner.current.replace(stored);
        debug!("Session reloaded from storage");
        self.publish(event);
        true
    }

    /// Subscribe to sign-in and sign-out events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    fn establish(&self, session: Session, message: &str) -> Result<Session, AuthError> {
        store_json(self.inner.storage.as_ref(), keys::SESSION, &session)?;
        self.inner.current.replace(Some(session.clone()));

        set_sentry_user(&session.user_id, Some(session.email.as_str()));
        let provider = session.provider.to_string();
        add_breadcrumb("auth", message, Some(&[("provider", provider.as_str())]));
        info!(user_id = %session.user_id, provider = %session.provider, "{message}");

        self.publish(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.inner.events.send(event);
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<Email, AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if password.trim().is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    Ok(Email::parse(email)?)
}

fn federated_session() -> Result<Session, AuthError> {
    let now = Utc::now();
    let email = Email::parse(&format!(
        "user{}@{FEDERATED_EMAIL_DOMAIN}",
        now.timestamp_millis()
    ))?;
    Ok(Session::federated(new_user_id(), email, now))
}

fn new_user_id() -> UserId {
    UserId::new(Uuid::new_v4().to_string())
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use quickcart_core::{AuthProvider, Product};

    use super::*;
    use crate::services::cart::CartError;
    use crate::storage::{MemoryStorage, StorageChange, StorageError};

    struct Fixture {
        storage: MemoryStorage,
        session: SessionStore,
        cart: CartStore,
    }

    fn fixture(storage: MemoryStorage) -> Fixture {
        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        let current = CurrentSession::default();
        let cart = CartStore::load(shared.clone(), current.clone());
        let session = SessionStore::load(shared, current, cart.clone(), AuthConfig::immediate());
        Fixture {
            storage,
            session,
            cart,
        }
    }

    fn product() -> Product {
        serde_json::from_value(json!({ "id": 1, "title": "Lamp", "price": 10 })).unwrap()
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let f = fixture(MemoryStorage::new());

        let err = f.session.login("", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingField("email")));

        let err = f.session.login("ana@example.com", "  ").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingField("password")));

        assert!(!f.session.is_authenticated());
        assert!(f.storage.is_empty());
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let f = fixture(MemoryStorage::new());
        let session = f.session.login("ana@example.com", "pw").await.unwrap();

        assert_eq!(session.display_name.as_deref(), Some("ana"));
        assert_eq!(session.provider, AuthProvider::Local);
        assert!(f.session.is_authenticated());

        let stored: Session =
            serde_json::from_str(&f.storage.get(keys::SESSION).unwrap().unwrap()).unwrap();
        assert_eq!(stored, session);
    }

    #[tokio::test]
    async fn test_federated_login_synthesizes_account() {
        let f = fixture(MemoryStorage::new());
        let session = f.session.login_with_federated_provider().await.unwrap();

        assert!(session.email.as_str().starts_with("user"));
        assert!(session.email.as_str().ends_with("@gmail.com"));
        assert_eq!(session.display_name.as_deref(), Some("Google User"));
        assert_eq!(session.provider, AuthProvider::Federated);
    }

    #[tokio::test]
    async fn test_signup_behaves_like_login() {
        let f = fixture(MemoryStorage::new());
        let session = f.session.signup("new@example.com", "pw").await.unwrap();
        assert_eq!(f.session.current(), Some(session));

        let federated = f.session.signup_with_federated_provider().await.unwrap();
        assert_eq!(f.session.current(), Some(federated));
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_cart() {
        let f = fixture(MemoryStorage::new());
        f.session.login("ana@example.com", "pw").await.unwrap();
        f.cart.add_item(&product()).unwrap();

        f.session.logout().unwrap();

        assert!(f.session.current().is_none());
        assert_eq!(f.cart.item_count(), 0);
        assert!(f.storage.is_empty());
        assert!(matches!(
            f.cart.add_item(&product()),
            Err(CartError::AuthRequired)
        ));
    }

    /// Storage that refuses to delete anything.
    struct UndeletableStorage(MemoryStorage);

    impl Storage for UndeletableStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::other("read-only"),
            })
        }

        fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
            self.0.subscribe()
        }
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_session() {
        let shared: Arc<dyn Storage> = Arc::new(UndeletableStorage(MemoryStorage::new()));
        let current = CurrentSession::default();
        let cart = CartStore::load(shared.clone(), current.clone());
        let session = SessionStore::load(shared.clone(), current, cart, AuthConfig::immediate());
        let signed_in = session.login("ana@example.com", "pw").await.unwrap();
        let mut events = session.subscribe();

        assert!(matches!(session.logout(), Err(AuthError::Storage(_))));
        assert_eq!(session.current(), Some(signed_in));
        assert!(shared.get(keys::SESSION).unwrap().is_some());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_login_accepts_long_email() {
        let f = fixture(MemoryStorage::new());
        let email = format!("{}@example.com", "a".repeat(250));

        let session = f.session.login(&email, "pw").await.unwrap();
        assert_eq!(session.email.as_str(), email);
        assert!(f.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let f = fixture(MemoryStorage::new());
        let mut events = f.session.subscribe();

        f.session.logout().unwrap();
        f.session.logout().unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let storage = MemoryStorage::new();
        let session = fixture(storage.clone())
            .session
            .login("ana@example.com", "pw")
            .await
            .unwrap();

        let restarted = fixture(storage);
        assert_eq!(restarted.session.current(), Some(session));
    }

    #[test]
    fn test_malformed_stored_session_is_discarded() {
        let storage = MemoryStorage::new();
        storage.set(keys::SESSION, r#"{"email": 42}"#).unwrap();

        let f = fixture(storage);
        assert!(!f.session.is_authenticated());
        assert!(f.storage.get(keys::SESSION).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reload_follows_other_instance() {
        let storage = MemoryStorage::new();
        let first = fixture(storage.clone());
        let second = fixture(storage);
        let mut events = second.session.subscribe();

        first.session.login("ana@example.com", "pw").await.unwrap();
        assert!(second.session.reload());
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedIn(_)));

        first.session.logout().unwrap();
        assert!(second.session.reload());
        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedOut);
        assert!(!second.session.reload());
    }
}
