//! Addresses and checkout against the fake backend.

#![allow(clippy::unwrap_used)]

use qkart_client::{AppError, MemoryStore, Storefront};
use qkart_core::{AddressId, LoginForm, Price};
use qkart_integration_tests::{FakeBackend, PASSWORD, RACQUET, STARTING_BALANCE, USERNAME, WATCH};

async fn logged_in(backend: &FakeBackend) -> Storefront<MemoryStore> {
    let storefront = backend.storefront();
    storefront
        .login(&LoginForm::new(USERNAME, PASSWORD))
        .await
        .unwrap();
    storefront
}

#[tokio::test]
async fn test_address_lifecycle() {
    let backend = FakeBackend::start().await;
    let storefront = logged_in(&backend).await;

    assert!(storefront.addresses().await.unwrap().is_empty());

    let addresses = storefront
        .add_address("221B Baker Street, London")
        .await
        .unwrap();
    assert_eq!(addresses.len(), 1);
    let id = addresses.first().unwrap().id.clone();

    let remaining = storefront.delete_address(&id).await.unwrap();
    assert!(remaining.is_empty());

    let err = storefront.delete_address(&id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_blank_address_sends_nothing() {
    let backend = FakeBackend::start().await;
    let storefront = logged_in(&backend).await;

    let err = storefront.add_address("  ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(backend.count("POST", "/user/addresses"), 0);
}

#[tokio::test]
async fn test_checkout_deducts_balance() {
    let backend = FakeBackend::start().await;
    backend.set_cart(USERNAME, &[(RACQUET, 2), (WATCH, 1)]);
    let address = backend.seed_address(USERNAME, "221B Baker Street, London");
    let storefront = logged_in(&backend).await;

    let remaining = storefront.checkout(Some(&address)).await.unwrap();

    assert_eq!(remaining, Price::new(STARTING_BALANCE - 260));
    assert_eq!(backend.balance_of(USERNAME), Some(STARTING_BALANCE - 260));
    assert!(backend.cart_of(USERNAME).is_empty());

    let session = storefront.current_session().unwrap().unwrap();
    assert_eq!(session.balance, remaining);
}

#[tokio::test]
async fn test_insufficient_balance_sends_no_order() {
    let backend = FakeBackend::start().await;
    backend.set_balance(USERNAME, 200);
    backend.set_cart(USERNAME, &[(RACQUET, 2), (WATCH, 1)]);
    let address = backend.seed_address(USERNAME, "221B Baker Street, London");
    let storefront = logged_in(&backend).await;

    let err = storefront.checkout(Some(&address)).await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "You do not have enough balance in your wallet for this purchase"
    );
    assert_eq!(backend.count("POST", "/cart/checkout"), 0);
    assert_eq!(backend.balance_of(USERNAME), Some(200));
}

#[tokio::test]
async fn test_checkout_requires_address() {
    let backend = FakeBackend::start().await;
    backend.set_cart(USERNAME, &[(RACQUET, 1)]);
    let storefront = logged_in(&backend).await;

    let err = storefront.checkout(None).await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "Please select one shipping address to proceed."
    );
    assert_eq!(backend.count("POST", "/cart/checkout"), 0);
}

#[tokio::test]
async fn test_empty_cart_checkout_refused() {
    let backend = FakeBackend::start().await;
    let address = backend.seed_address(USERNAME, "221B Baker Street, London");
    let storefront = logged_in(&backend).await;

    let err = storefront.checkout(Some(&address)).await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "You must have items in cart to proceed with checkout"
    );
    assert_eq!(backend.count("POST", "/cart/checkout"), 0);
}

#[tokio::test]
async fn test_backend_refusal_is_bad_request() {
    let backend = FakeBackend::start().await;
    backend.set_cart(USERNAME, &[(RACQUET, 1)]);
    let storefront = logged_in(&backend).await;

    let err = storefront
        .checkout(Some(&AddressId::new("not-an-address")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(m) if m == "Address not set"));
    let session = storefront.current_session().unwrap().unwrap();
    assert_eq!(session.balance, Price::new(STARTING_BALANCE));
}
