//! Several `AppState`s sharing one storage.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use quickcart_integration_tests::{TestContext, product};
use quickcart_storefront::models::{CartEvent, CartState, SessionEvent};

async fn next<T: Clone>(events: &mut broadcast::Receiver<T>) -> T {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_second_instance_sees_login_and_cart() {
    let ctx = TestContext::new().await;
    let first = ctx.state();
    let second = ctx.state();
    let sync = second.spawn_storage_sync();
    let mut sessions = second.session().subscribe();
    let mut carts = second.cart().subscribe();

    first.session().login("ana@example.com", "secret").await.unwrap();
    let signed_in = next(&mut sessions).await;
    assert!(matches!(signed_in, SessionEvent::SignedIn(ref s) if s.email.as_str() == "ana@example.com"));

    first.cart().add_item(&product(1, "Desk Lamp", 10.0)).unwrap();
    let event: CartEvent = next(&mut carts).await;
    assert_eq!(event.item_count, 1);
    assert_eq!(second.cart().lines(), first.cart().lines());

    // The second instance can keep mutating the shared cart
    second.cart().add_item(&product(1, "Desk Lamp", 10.0)).unwrap();
    assert_eq!(ctx.state().cart().item_count(), 2);

    sync.abort();
}

#[tokio::test]
async fn test_logout_propagates() {
    let ctx = TestContext::new().await;
    let first = ctx.state();
    first.session().login("ana@example.com", "secret").await.unwrap();
    first.cart().add_item(&product(1, "Desk Lamp", 10.0)).unwrap();

    let second = ctx.state();
    assert!(second.session().is_authenticated());
    assert_eq!(second.cart().item_count(), 1);

    let sync = second.spawn_storage_sync();
    let mut sessions = second.session().subscribe();
    let mut carts = second.cart().subscribe();

    first.session().logout().unwrap();

    assert_eq!(next(&mut sessions).await, SessionEvent::SignedOut);
    assert_eq!(next(&mut carts).await.state, CartState::Empty);
    assert!(second.cart().add_item(&product(2, "USB Cable", 5.0)).is_err());

    sync.abort();
}
