//! Integration test fixtures for Pomelo.
//!
//! Provides a scriptable in-memory [`MockBackend`] plus token and product
//! fixtures, so the session/cart engine can be exercised end-to-end
//! without a network.
//!
//! # Test Categories
//!
//! - `session_lifecycle` - Token restore, confirmation, login, logout
//! - `checkout_flows` - Cart-to-order submission and stock reconciliation

// Fixture code may panic freely; it only ever runs under the test harness.
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Mutex;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rust_decimal::Decimal;
use secrecy::SecretString;

use pomelo_client::api::types::{
    CurrentUserResponse, OrderConfirmation, OrderLine, ProductPayload,
};
use pomelo_client::api::{ApiError, CommerceBackend};
use pomelo_core::{CurrencyCode, Email, OrderId, ProductId};

// =============================================================================
// Token Fixtures
// =============================================================================

/// Forge a structurally valid JWT with the given claims.
///
/// The signature is garbage; the client decodes claims without verifying.
#[must_use]
pub fn forge_token(sub: &str, roles: &[&str], exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::json!({ "sub": sub, "authorities": roles, "exp": exp });
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// A token that expired `secs_ago` seconds in the past.
#[must_use]
pub fn expired_token(sub: &str, roles: &[&str], secs_ago: i64) -> String {
    forge_token(sub, roles, chrono::Utc::now().timestamp() - secs_ago)
}

/// A token valid for another hour.
#[must_use]
pub fn fresh_token(sub: &str, roles: &[&str]) -> String {
    forge_token(sub, roles, chrono::Utc::now().timestamp() + 3600)
}

// =============================================================================
// Product Fixtures
// =============================================================================

/// A purchasable product payload.
#[must_use]
pub fn product_payload(id: &str, price: &str, stock: u32) -> ProductPayload {
    ProductPayload {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        price: price.parse::<Decimal>().unwrap(),
        currency: CurrencyCode::USD,
        discount: None,
        stock,
        active: true,
        image_url: None,
    }
}

// =============================================================================
// Mock Backend
// =============================================================================

struct MockAccount {
    password: String,
    roles: Vec<String>,
}

#[derive(Default)]
struct MockState {
    accounts: HashMap<String, MockAccount>,
    products: Vec<ProductPayload>,
    orders: Vec<Vec<OrderLine>>,
    offline: bool,
    tokens_revoked: bool,
    reject_orders: Option<String>,
    misdelivered_product: Option<ProductPayload>,
    order_counter: u32,
}

/// Scriptable stand-in for the commerce backend.
///
/// Failure modes are toggled per test: `set_offline` makes every call fail
/// with a 503 (a transport-class failure to the engine), `revoke_tokens`
/// makes token confirmation fail with a 401, `reject_orders` refuses order
/// submissions with a 409.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account the backend will authenticate.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, roles: &[&str]) -> Self {
        self.state.lock().unwrap().accounts.insert(
            email.to_owned(),
            MockAccount {
                password: password.to_owned(),
                roles: roles.iter().map(|&r| r.to_owned()).collect(),
            },
        );
        self
    }

    /// Add a product to the backend's listing.
    #[must_use]
    pub fn with_product(self, payload: ProductPayload) -> Self {
        self.state.lock().unwrap().products.push(payload);
        self
    }

    /// Make every subsequent call fail as unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Make token confirmation reject every token.
    pub fn revoke_tokens(&self) {
        self.state.lock().unwrap().tokens_revoked = true;
    }

    /// Make order submission fail with the given rejection message.
    pub fn reject_orders(&self, message: &str) {
        self.state.lock().unwrap().reject_orders = Some(message.to_owned());
    }

    /// Answer the next single-product fetch with this payload, regardless
    /// of the requested id (models a stale/misrouted response).
    pub fn misdeliver_product(&self, payload: ProductPayload) {
        self.state.lock().unwrap().misdelivered_product = Some(payload);
    }

    /// Orders the backend has accepted, oldest first.
    #[must_use]
    pub fn accepted_orders(&self) -> Vec<Vec<OrderLine>> {
        self.state.lock().unwrap().orders.clone()
    }

    fn check_online(state: &MockState) -> Result<(), ApiError> {
        if state.offline {
            return Err(ApiError::Status {
                status: 503,
                message: "backend unreachable".to_owned(),
            });
        }
        Ok(())
    }
}

impl CommerceBackend for MockBackend {
    async fn authenticate(&self, email: &Email, password: &str) -> Result<String, ApiError> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;

        match state.accounts.get(email.as_str()) {
            Some(account) if account.password == password => {
                let roles: Vec<&str> = account.roles.iter().map(String::as_str).collect();
                Ok(fresh_token(email.as_str(), &roles))
            }
            _ => Err(ApiError::Status {
                status: 401,
                message: "bad credentials".to_owned(),
            }),
        }
    }

    async fn current_user(
        &self,
        _token: &SecretString,
    ) -> Result<CurrentUserResponse, ApiError> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;

        if state.tokens_revoked {
            return Err(ApiError::Status {
                status: 401,
                message: "token revoked".to_owned(),
            });
        }

        Ok(CurrentUserResponse {
            email: "user@example.com".to_owned(),
            authorities: Vec::new(),
        })
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<ProductPayload, ApiError> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;

        if let Some(misdelivered) = state.misdelivered_product.take() {
            return Ok(misdelivered);
        }

        state
            .products
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: format!("no product {id}"),
            })
    }

    async fn fetch_products(&self) -> Result<Vec<ProductPayload>, ApiError> {
        let state = self.state.lock().unwrap();
        Self::check_online(&state)?;
        Ok(state.products.clone())
    }

    async fn submit_order(
        &self,
        _token: &SecretString,
        lines: &[OrderLine],
    ) -> Result<OrderConfirmation, ApiError> {
        let mut state = self.state.lock().unwrap();
        Self::check_online(&state)?;

        if let Some(message) = &state.reject_orders {
            return Err(ApiError::Status {
                status: 409,
                message: message.clone(),
            });
        }

        state.orders.push(lines.to_vec());
        state.order_counter += 1;
        Ok(OrderConfirmation {
            order_id: OrderId::new(format!("ord-{}", state.order_counter)),
            lines: lines.to_vec(),
        })
    }
}
