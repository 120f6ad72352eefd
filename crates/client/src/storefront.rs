//! Storefront facade shared by front ends.
//!
//! Wraps the API client and the session store and implements each page-level
//! action: browsing, login/registration, cart management, and checkout. Every
//! action validates locally first and returns an [`AppError`] the caller can
//! show as a notification.

use std::time::Duration;

use tracing::{info, instrument};

use qkart_core::checkout::validate_checkout;
use qkart_core::{
    Address, AddressId, CartEntry, CartView, LoginForm, Price, Product, ProductId, RegisterForm,
    Session,
};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::search::SearchDebouncer;
use crate::session::{FileStore, KeyValueStore, SessionStore};

const LOGIN_TO_ADD: &str = "Login to add an item to the Cart";
const LOGIN_TO_VIEW_CART: &str = "Login to view your cart";
const LOGIN_TO_MANAGE_ADDRESSES: &str = "Login to manage your addresses";
const LOGIN_TO_CHECKOUT: &str = "Login to proceed with checkout";
const ALREADY_IN_CART: &str =
    "Item already in cart. Use the cart sidebar to update quantity or remove item.";

/// Options for [`Storefront::add_to_cart`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions {
    /// Refuse to add a product that already has a cart line.
    pub prevent_duplicate: bool,
}

/// Page-level storefront actions over an injected session store.
pub struct Storefront<S: KeyValueStore> {
    api: ApiClient,
    session: SessionStore<S>,
    search_debounce: Duration,
}

impl Storefront<FileStore> {
    /// Build a storefront from configuration, persisting the session to the
    /// configured file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = ApiClient::new(&config.api)?;
        let session = SessionStore::new(FileStore::new(&config.session_file));
        Ok(Self::new(api, session, config.search_debounce))
    }
}

impl<S: KeyValueStore> Storefront<S> {
    /// Create a storefront.
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore<S>, search_debounce: Duration) -> Self {
        Self {
            api,
            session,
            search_debounce,
        }
    }

    /// The REST client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The session store.
    #[must_use]
    pub const fn session_store(&self) -> &SessionStore<S> {
        &self.session
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// The full catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Server` if the catalog cannot be fetched.
    pub async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.api.get_products().await?)
    }

    /// Search immediately, bypassing the debouncer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Server` if the search fails.
    pub async fn search(&self, text: &str) -> Result<Vec<Product>> {
        Ok(self.api.search_products(text).await?)
    }

    /// A debouncer over this storefront's API client.
    #[must_use]
    pub fn debouncer(&self) -> SearchDebouncer<ApiClient> {
        SearchDebouncer::new(self.api.clone(), self.search_debounce)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for empty fields (no request is sent),
    /// `AppError::Auth` with the backend's message for rejected credentials.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn login(&self, form: &LoginForm) -> Result<Session> {
        form.validate()?;

        let response = self
            .api
            .login(form)
            .await
            .map_err(AppError::from_auth_failure)?;

        let session = self.session.persist(
            &response.token,
            &response.username,
            Price::new(response.balance),
        )?;

        set_sentry_user(&session.username);
        info!("Logged in successfully");
        Ok(session)
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for invalid input, `AppError::Auth`
    /// when the backend rejects the registration.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegisterForm) -> Result<()> {
        form.validate()?;

        self.api
            .register(&form.credentials())
            .await
            .map_err(AppError::from_auth_failure)?;

        info!("Registered successfully");
        Ok(())
    }

    /// Log out.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the session cannot be removed.
    pub fn logout(&self) -> Result<()> {
        self.session.clear()?;
        clear_sentry_user();
        info!("Logged out");
        Ok(())
    }

    /// The logged-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the session cannot be read.
    pub fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read()?)
    }

    fn require_session(&self, message: &str) -> Result<Session> {
        self.session
            .read()?
            .ok_or_else(|| AppError::Unauthorized(message.to_string()))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The user's cart, joined against the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session.
    pub async fn cart(&self) -> Result<CartView> {
        let session = self.require_session(LOGIN_TO_VIEW_CART)?;
        self.cart_for(&session).await
    }

    async fn cart_for(&self, session: &Session) -> Result<CartView> {
        let (entries, products) =
            tokio::try_join!(self.api.get_cart(session), self.api.get_products())?;
        Ok(CartView::from_parts(Some(entries.as_slice()), &products))
    }

    async fn view_of(&self, entries: &[CartEntry]) -> Result<CartView> {
        let products = self.api.get_products().await?;
        Ok(CartView::from_parts(Some(entries), &products))
    }

    /// Put `qty` units of a product in the cart.
    ///
    /// With `prevent_duplicate`, a product that already has a cart line is
    /// refused without contacting the backend.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session,
    /// `AppError::Validation` for duplicates, `AppError::NotFound` for
    /// unknown products.
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        product_id: &ProductId,
        qty: u32,
        options: AddOptions,
    ) -> Result<CartView> {
        let session = self.require_session(LOGIN_TO_ADD)?;

        if options.prevent_duplicate && self.cart_for(&session).await?.contains(product_id) {
            return Err(AppError::Validation(ALREADY_IN_CART.to_string()));
        }

        add_breadcrumb("cart", "Added item", Some(&[("product_id", product_id.as_str())]));
        let entries = self.api.set_cart_item(&session, product_id, qty).await?;
        self.view_of(&entries).await
    }

    /// Change a product's quantity. Zero removes it from the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session,
    /// `AppError::NotFound` for unknown products.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, product_id: &ProductId, qty: u32) -> Result<CartView> {
        let session = self.require_session(LOGIN_TO_ADD)?;

        add_breadcrumb("cart", "Changed quantity", Some(&[("product_id", product_id.as_str())]));
        let entries = self.api.set_cart_item(&session, product_id, qty).await?;
        self.view_of(&entries).await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Saved shipping addresses.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session.
    pub async fn addresses(&self) -> Result<Vec<Address>> {
        let session = self.require_session(LOGIN_TO_MANAGE_ADDRESSES)?;
        Ok(self.api.get_addresses(&session).await?)
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for blank text.
    pub async fn add_address(&self, address: &str) -> Result<Vec<Address>> {
        let session = self.require_session(LOGIN_TO_MANAGE_ADDRESSES)?;

        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::Validation("Address cannot be empty".to_string()));
        }

        Ok(self.api.add_address(&session, address).await?)
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the address does not exist.
    pub async fn delete_address(&self, address_id: &AddressId) -> Result<Vec<Address>> {
        let session = self.require_session(LOGIN_TO_MANAGE_ADDRESSES)?;
        Ok(self.api.delete_address(&session, address_id).await?)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Place the order and return the remaining wallet balance.
    ///
    /// The cart, balance and address are checked before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a pre-flight check fails.
    #[instrument(skip(self))]
    pub async fn checkout(&self, address_id: Option<&AddressId>) -> Result<Price> {
        let session = self.require_session(LOGIN_TO_CHECKOUT)?;
        let cart = self.cart_for(&session).await?;

        let approved = validate_checkout(&cart, session.balance, address_id)?;
        let remaining = approved.remaining;

        add_breadcrumb("checkout", "Placing order", None);
        self.api.checkout(&session, approved.address).await?;

        self.session.update_balance(remaining)?;
        info!(total = %cart.total, remaining = %remaining, "Order placed");
        Ok(remaining)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::session::MemoryStore;

    /// A storefront pointed at a port nothing listens on.
    fn offline_storefront() -> Storefront<MemoryStore> {
        let api = ApiClient::new(&ApiConfig::new("http://127.0.0.1:9").unwrap()).unwrap();
        Storefront::new(
            api,
            SessionStore::new(MemoryStore::new()),
            Duration::from_millis(300),
        )
    }

    #[tokio::test]
    async fn test_login_validation_precedes_network() {
        let storefront = offline_storefront();
        let err = storefront
            .login(&LoginForm::new("", "secret"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Username is a required field");
    }

    #[tokio::test]
    async fn test_register_validation_precedes_network() {
        let storefront = offline_storefront();
        let err = storefront
            .register(&RegisterForm::new("criodo", "learnbydoing", "different"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "Passwords do not match"));
    }

    #[tokio::test]
    async fn test_cart_requires_session() {
        let storefront = offline_storefront();
        let err = storefront.cart().await.unwrap_err();
        assert!(err.requires_login());

        let err = storefront
            .add_to_cart(&ProductId::new("A"), 1, AddOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), LOGIN_TO_ADD);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_server_error() {
        let storefront = offline_storefront();
        let err = storefront.products().await.unwrap_err();
        assert!(matches!(err, AppError::Server(None)));
    }

    #[test]
    fn test_logout_clears_session() {
        let storefront = offline_storefront();
        storefront
            .session_store()
            .persist("testtoken", "criodo", Price::new(5000))
            .unwrap();
        assert!(storefront.current_session().unwrap().is_some());

        storefront.logout().unwrap();
        assert!(storefront.current_session().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_address_rejected() {
        let storefront = offline_storefront();
        storefront
            .session_store()
            .persist("testtoken", "criodo", Price::new(5000))
            .unwrap();

        let err = storefront.add_address("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
