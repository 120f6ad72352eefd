//! End-to-end tests for the QKart client.
//!
//! [`FakeBackend`] serves the QKart REST API from memory on an ephemeral
//! port. Tests point a real [`Storefront`] at it and inspect the recorded
//! requests and server-side state afterwards.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinHandle;

use qkart_client::{ApiClient, ApiConfig, MemoryStore, SessionStore, Storefront};
use qkart_core::{Address, AddressId, CartEntry, Price, Product, ProductId};

/// Path prefix the fake API is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Seeded user.
pub const USERNAME: &str = "criodo";
/// Seeded user's password.
pub const PASSWORD: &str = "learnbydoing";
/// Seeded user's wallet balance.
pub const STARTING_BALANCE: u64 = 5000;

/// Racquet, cost 100.
pub const RACQUET: &str = "KCRwjF7lN97HnEaY";
/// Watch, cost 60.
pub const WATCH: &str = "TwMM4OAhmK0VQ93S";
/// Duffle bag, cost 150.
pub const DUFFLE: &str = "PmInA797xJhMIPti";

const NO_TOKEN: &str = "Protected route, Oauth2 Bearer token not found";

/// The seeded catalog.
#[must_use]
pub fn catalog() -> Vec<Product> {
    let product = |id: &str, name: &str, category: &str, cost: u64, rating: f32| Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: category.to_string(),
        cost: Price::new(cost),
        rating,
        image_url: format!("https://assets.qkart.test/{id}.png"),
    };

    vec![
        product(RACQUET, "YONEX Smash Badminton Racquet", "Sports", 100, 5.0),
        product(WATCH, "The Minimalist Slim Leather Watch", "Electronics", 60, 5.0),
        product(DUFFLE, "Tan Leatherette Weekender Duffle", "Fashion", 150, 4.0),
    ]
}

// =============================================================================
// Backend State
// =============================================================================

/// A request as seen by the fake backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path below [`API_PREFIX`].
    pub path: String,
    pub query: Option<String>,
}

#[derive(Debug, Default)]
struct Account {
    password: String,
    balance: u64,
    cart: Vec<CartEntry>,
    addresses: Vec<Address>,
}

#[derive(Debug, Default)]
struct Inner {
    products: Vec<Product>,
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    next_address: u64,
    requests: Vec<RecordedRequest>,
    fail_next: Option<(StatusCode, Option<String>)>,
}

impl Inner {
    fn authenticate(&self, headers: &HeaderMap) -> Result<String, Response> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, Some(NO_TOKEN)))
    }

    fn cart_total(&self, cart: &[CartEntry]) -> u64 {
        cart.iter()
            .filter_map(|entry| {
                self.products
                    .iter()
                    .find(|p| p.id == entry.product_id)
                    .map(|p| p.cost.amount() * u64::from(entry.qty))
            })
            .sum()
    }
}

type Shared = Arc<Mutex<Inner>>;

fn reject(status: StatusCode, message: Option<&str>) -> Response {
    match message {
        Some(message) => (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response(),
        None => status.into_response(),
    }
}

// =============================================================================
// FakeBackend
// =============================================================================

/// In-process QKart backend. The server stops when this is dropped.
pub struct FakeBackend {
    state: Shared,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start a backend seeded with [`catalog`] and the [`USERNAME`] account.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Inner {
            products: catalog(),
            ..Inner::default()
        }));

        let api = Router::new()
            .route("/products", get(list_products))
            .route("/products/search", get(search_products))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/cart", get(get_cart).post(set_cart_item))
            .route("/cart/checkout", post(checkout))
            .route("/user/addresses", get(list_addresses).post(add_address))
            .route("/user/addresses/{id}", delete(delete_address));

        let app = Router::new()
            .nest(API_PREFIX, api)
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Listener has no address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake backend stopped");
        });

        let backend = Self {
            state,
            addr,
            server,
        };
        backend.add_user(USERNAME, PASSWORD, STARTING_BALANCE);
        backend
    }

    /// Base URL of the fake API.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}{API_PREFIX}", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the endpoint is always a valid URL.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.endpoint()).expect("Fake endpoint is a valid URL")
    }

    /// A fresh storefront with an in-memory session.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn storefront(&self) -> Storefront<MemoryStore> {
        let api = ApiClient::new(&self.api_config()).expect("Failed to build API client");
        Storefront::new(
            api,
            SessionStore::new(MemoryStore::new()),
            Duration::from_millis(300),
        )
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Create an account.
    pub fn add_user(&self, username: &str, password: &str, balance: u64) {
        self.state.lock().accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                balance,
                ..Account::default()
            },
        );
    }

    /// Overwrite a user's wallet balance.
    pub fn set_balance(&self, username: &str, balance: u64) {
        if let Some(account) = self.state.lock().accounts.get_mut(username) {
            account.balance = balance;
        }
    }

    /// Overwrite a user's cart.
    pub fn set_cart(&self, username: &str, entries: &[(&str, u32)]) {
        if let Some(account) = self.state.lock().accounts.get_mut(username) {
            account.cart = entries
                .iter()
                .map(|(id, qty)| CartEntry::new(*id, *qty))
                .collect();
        }
    }

    /// Save an address for a user and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the user does not exist.
    pub fn seed_address(&self, username: &str, text: &str) -> AddressId {
        let mut guard = self.state.lock();
        let inner = &mut *guard;
        inner.next_address += 1;
        let address = Address {
            id: AddressId::new(format!("addr-{}", inner.next_address)),
            address: text.to_string(),
        };
        let id = address.id.clone();
        inner
            .accounts
            .get_mut(username)
            .expect("Unknown user")
            .addresses
            .push(address);
        id
    }

    /// Answer the next request with `status` and an optional message.
    pub fn fail_next(&self, status: StatusCode, message: Option<&str>) {
        self.state.lock().fail_next = Some((status, message.map(String::from)));
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// How many `method` requests hit `path`.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// A user's wallet balance.
    #[must_use]
    pub fn balance_of(&self, username: &str) -> Option<u64> {
        self.state.lock().accounts.get(username).map(|a| a.balance)
    }

    /// A user's cart.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<CartEntry> {
        self.state
            .lock()
            .accounts
            .get(username)
            .map(|a| a.cart.clone())
            .unwrap_or_default()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let failure = {
        let mut inner = state.lock();
        let path = request.uri().path();
        inner.requests.push(RecordedRequest {
            method: request.method().to_string(),
            path: path.strip_prefix(API_PREFIX).unwrap_or(path).to_string(),
            query: request.uri().query().map(String::from),
        });
        inner.fail_next.take()
    };

    if let Some((status, message)) = failure {
        return reject(status, message.as_deref());
    }
    next.run(request).await
}

async fn list_products(State(state): State<Shared>) -> Response {
    Json(state.lock().products.clone()).into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    value: String,
}

async fn search_products(
    State(state): State<Shared>,
    Query(params): Query<SearchParams>,
) -> Response {
    let needle = params.value.to_lowercase();
    let found: Vec<Product> = state
        .lock()
        .products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    if found.is_empty() {
        return (StatusCode::NOT_FOUND, Json(json!([]))).into_response();
    }
    Json(found).into_response()
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut inner = state.lock();

    let Some(account) = inner.accounts.get(&body.username) else {
        return reject(StatusCode::BAD_REQUEST, Some("Username does not exist"));
    };
    if account.password != body.password {
        return reject(StatusCode::BAD_REQUEST, Some("Password is incorrect"));
    }
    let balance = account.balance;

    let token = format!("token-{}", body.username);
    inner.tokens.insert(token.clone(), body.username.clone());

    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "token": token,
            "username": body.username,
            "balance": balance,
        })),
    )
        .into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut inner = state.lock();

    if inner.accounts.contains_key(&body.username) {
        return reject(StatusCode::BAD_REQUEST, Some("Username is already taken"));
    }
    inner.accounts.insert(
        body.username,
        Account {
            password: body.password,
            balance: STARTING_BALANCE,
            ..Account::default()
        },
    );

    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let inner = state.lock();
    let username = match inner.authenticate(&headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    let cart = inner
        .accounts
        .get(&username)
        .map(|a| a.cart.clone())
        .unwrap_or_default();
    Json(cart).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartUpdate {
    product_id: ProductId,
    qty: u32,
}

async fn set_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartUpdate>,
) -> Response {
    let mut guard = state.lock();
    let inner = &mut *guard;
    let username = match inner.authenticate(&headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    if !inner.products.iter().any(|p| p.id == body.product_id) {
        return reject(StatusCode::NOT_FOUND, Some("Product doesn't exist"));
    }

    let Some(account) = inner.accounts.get_mut(&username) else {
        return reject(StatusCode::UNAUTHORIZED, Some(NO_TOKEN));
    };
    let cart = &mut account.cart;

    if body.qty == 0 {
        cart.retain(|entry| entry.product_id != body.product_id);
    } else if let Some(entry) = cart.iter_mut().find(|e| e.product_id == body.product_id) {
        entry.qty = body.qty;
    } else {
        cart.push(CartEntry::new(body.product_id, body.qty));
    }

    Json(cart.clone()).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBody {
    address_id: AddressId,
}

async fn checkout(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Response {
    let mut guard = state.lock();
    let inner = &mut *guard;
    let username = match inner.authenticate(&headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    let Some(cart) = inner.accounts.get(&username).map(|a| a.cart.clone()) else {
        return reject(StatusCode::UNAUTHORIZED, Some(NO_TOKEN));
    };
    let total = inner.cart_total(&cart);

    let Some(account) = inner.accounts.get_mut(&username) else {
        return reject(StatusCode::UNAUTHORIZED, Some(NO_TOKEN));
    };
    if cart.is_empty() {
        return reject(StatusCode::BAD_REQUEST, Some("Cart is empty"));
    }
    if !account.addresses.iter().any(|a| a.id == body.address_id) {
        return reject(StatusCode::BAD_REQUEST, Some("Address not set"));
    }
    if account.balance < total {
        return reject(
            StatusCode::BAD_REQUEST,
            Some("Wallet balance not sufficient to place order"),
        );
    }

    account.balance -= total;
    account.cart.clear();

    Json(json!({ "success": true })).into_response()
}

async fn list_addresses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let inner = state.lock();
    let username = match inner.authenticate(&headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    let addresses = inner
        .accounts
        .get(&username)
        .map(|a| a.addresses.clone())
        .unwrap_or_default();
    Json(addresses).into_response()
}

#[derive(Deserialize)]
struct NewAddress {
    address: String,
}

async fn add_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewAddress>,
) -> Response {
    let mut guard = state.lock();
    let inner = &mut *guard;
    let username = match inner.authenticate(&headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    inner.next_address += 1;
    let id = AddressId::new(format!("addr-{}", inner.next_address));

    let Some(account) = inner.accounts.get_mut(&username) else {
        return reject(StatusCode::UNAUTHORIZED, Some(NO_TOKEN));
    };
    account.addresses.push(Address {
        id,
        address: body.address,
    });

    Json(account.addresses.clone()).into_response()
}

async fn delete_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<AddressId>,
) -> Response {
    let mut guard = state.lock();
    let inner = &mut *guard;
    let username = match inner.authenticate(&headers) {
        Ok(username) => username,
        Err(response) => return response,
    };

    let Some(account) = inner.accounts.get_mut(&username) else {
        return reject(StatusCode::UNAUTHORIZED, Some(NO_TOKEN));
    };
    let before = account.addresses.len();
    account.addresses.retain(|a| a.id != id);
    if account.addresses.len() == before {
        return reject(StatusCode::NOT_FOUND, Some("Address to delete was not found"));
    }

    Json(account.addresses.clone()).into_response()
}
