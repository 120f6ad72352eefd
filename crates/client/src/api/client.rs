//! REST client implementation.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use qkart_core::{Address, AddressId, CartEntry, LoginForm, Product, ProductId, Session};

use super::ApiError;
use super::cache::CacheKey;
use super::types::{
    CartUpdateRequest, CheckoutRequest, ErrorBody, LoginResponse, NewAddressRequest,
    SuccessResponse,
};
use crate::config::ApiConfig;

/// Longest body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the QKart REST backend.
///
/// Cheap to clone; all clones share one connection pool and one cache.
/// The catalog listing is cached for the configured TTL.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    endpoint: Url,
    cache: Cache<CacheKey, Vec<Product>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                endpoint: config.endpoint.clone(),
                cache,
            }),
        })
    }

    /// Base URL requests are made against.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Build the URL for a path below the endpoint.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.endpoint.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send a request and decode a JSON success body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);

            tracing::warn!(
                status = %status,
                message = ?message,
                "Backend returned non-success status"
            );

            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Drop all cached product listings.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Fetch the full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a product list.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(products) = self.inner.cache.get(&CacheKey::Products).await {
            debug!("Cache hit for catalog");
            return Ok(products);
        }

        let url = self.url("products")?;
        let products: Vec<Product> = self.send(self.inner.client.get(url)).await?;
        debug!(count = products.len(), "Fetched catalog");

        self.inner
            .cache
            .insert(CacheKey::Products, products.clone())
            .await;

        Ok(products)
    }

    /// Search the catalog by name or category.
    ///
    /// An empty query returns the unfiltered catalog. The backend answers
    /// 404 when nothing matches; that is reported as an empty list. Results
    /// are never cached, every call reaches the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any other reason.
    #[instrument(skip(self), fields(query = %text))]
    pub async fn search_products(&self, text: &str) -> Result<Vec<Product>, ApiError> {
        let mut url = self.url("products/search")?;
        url.query_pairs_mut().append_pair("value", text);

        match self.send::<Vec<Product>>(self.inner.client.get(url)).await {
            Ok(products) => Ok(products),
            Err(ApiError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                debug!("No products matched");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 400 and the backend's message when
    /// the credentials are rejected.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn login(&self, form: &LoginForm) -> Result<LoginResponse, ApiError> {
        let url = self.url("auth/login")?;
        self.send(self.inner.client.post(url).json(form)).await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 400 when the username is taken.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &LoginForm) -> Result<SuccessResponse, ApiError> {
        let url = self.url("auth/register")?;
        self.send(self.inner.client.post(url).json(form)).await
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Fetch the user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected (401).
    #[instrument(skip(self, session), fields(username = %session.username))]
    pub async fn get_cart(&self, session: &Session) -> Result<Vec<CartEntry>, ApiError> {
        let url = self.url("cart")?;
        self.send(authorized(self.inner.client.get(url), session))
            .await
    }

    /// Set the quantity of a product in the cart. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 404 if the product is unknown.
    #[instrument(skip(self, session), fields(username = %session.username))]
    pub async fn set_cart_item(
        &self,
        session: &Session,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<CartEntry>, ApiError> {
        let url = self.url("cart")?;
        let body = CartUpdateRequest { product_id, qty };
        self.send(authorized(self.inner.client.post(url).json(&body), session))
            .await
    }

    /// Place an order for the whole cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 400 if the backend refuses the order.
    #[instrument(skip(self, session), fields(username = %session.username))]
    pub async fn checkout(
        &self,
        session: &Session,
        address_id: &AddressId,
    ) -> Result<SuccessResponse, ApiError> {
        let url = self.url("cart/checkout")?;
        let body = CheckoutRequest { address_id };
        self.send(authorized(self.inner.client.post(url).json(&body), session))
            .await
    }

    // =========================================================================
    // Address Methods
    // =========================================================================

    /// List saved shipping addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session), fields(username = %session.username))]
    pub async fn get_addresses(&self, session: &Session) -> Result<Vec<Address>, ApiError> {
        let url = self.url("user/addresses")?;
        self.send(authorized(self.inner.client.get(url), session))
            .await
    }

    /// Save a new shipping address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 400 if the backend rejects the text.
    #[instrument(skip(self, session, address), fields(username = %session.username))]
    pub async fn add_address(
        &self,
        session: &Session,
        address: &str,
    ) -> Result<Vec<Address>, ApiError> {
        let url = self.url("user/addresses")?;
        let body = NewAddressRequest { address };
        self.send(authorized(self.inner.client.post(url).json(&body), session))
            .await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with status 404 if the address does not exist.
    #[instrument(skip(self, session), fields(username = %session.username))]
    pub async fn delete_address(
        &self,
        session: &Session,
        address_id: &AddressId,
    ) -> Result<Vec<Address>, ApiError> {
        let url = self.url(&format!("user/addresses/{address_id}"))?;
        self.send(authorized(self.inner.client.delete(url), session))
            .await
    }
}

/// Attach the session's bearer token.
fn authorized(request: RequestBuilder, session: &Session) -> RequestBuilder {
    request.header(reqwest::header::AUTHORIZATION, session.bearer())
}
