//! The application-state container wiring auth, cart, and catalog together.
//!
//! [`StorefrontSession`] is the single, explicitly owned state object the
//! UI layer holds - there are no hidden process-wide singletons. It is
//! also where the cross-slice rules live, as direct sequential calls
//! rather than implicit action interception:
//!
//! 1. A successful logout unconditionally clears the cart.
//! 2. A successful order submission clears the cart and reconciles
//!    displayed stock locally.
//! 3. Route guards consume [`RouteAccess`]: a pending session renders a
//!    loading state and decides nothing.
//!
//! Construction is explicit (`new`/`with_store`) and teardown is dropping
//! the value.

use thiserror::Error;

use pomelo_core::OrderId;

use crate::api::types::OrderLine;
use crate::api::{ApiError, CommerceBackend};
use crate::auth::{AuthError, AuthSessionManager, Identity, SessionState};
use crate::cart::CartEngine;
use crate::catalog::ProductCatalog;
use crate::config::{ClientConfig, DEFAULT_CATALOG_CAPACITY, DEFAULT_CATALOG_TTL};
use crate::store::SessionStore;

/// Errors that can occur when placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Orders require a confirmed session.
    #[error("not signed in")]
    NotAuthenticated,

    /// An order submission is already in flight.
    #[error("an order submission is already in flight")]
    RequestInFlight,

    /// The backend refused the order (e.g., stock changed server-side).
    #[error("order rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached; the order was not placed.
    #[error("could not reach the order service: {0}")]
    NetworkFailure(#[source] ApiError),
}

/// What a route needs from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Any confirmed session.
    Authenticated,
    /// A confirmed session with the administrative role.
    Admin,
}

/// What the routing layer should do with a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Render the route.
    Allow,
    /// The session is not resolved yet; render a loading indicator and
    /// decide nothing.
    ShowLoading,
    /// No session; send the user to the login view.
    RedirectToLogin,
    /// Confirmed session without the required role; send the user away.
    RedirectAway,
}

/// The storefront's client-side state: session, cart, and cached catalog.
pub struct StorefrontSession<B> {
    backend: B,
    auth: AuthSessionManager,
    cart: CartEngine,
    catalog: ProductCatalog,
    order_in_flight: bool,
}

impl<B: CommerceBackend> StorefrontSession<B> {
    /// Create a session over the configured on-disk storage area.
    #[must_use]
    pub fn new(config: &ClientConfig, backend: B) -> Self {
        Self::build(
            SessionStore::on_disk(&config.storage_dir),
            config.catalog_ttl,
            config.catalog_capacity,
            backend,
        )
    }

    /// Create a session over an existing store handle.
    ///
    /// Used when the embedder manages the storage area itself (and by
    /// tests, with [`SessionStore::in_memory`]).
    #[must_use]
    pub fn with_store(store: SessionStore, backend: B) -> Self {
        Self::build(store, DEFAULT_CATALOG_TTL, DEFAULT_CATALOG_CAPACITY, backend)
    }

    fn build(
        store: SessionStore,
        ttl: std::time::Duration,
        capacity: u64,
        backend: B,
    ) -> Self {
        let auth = AuthSessionManager::new(store.clone());
        let cart = CartEngine::restore(store);

        Self {
            backend,
            auth,
            cart,
            catalog: ProductCatalog::new(ttl, capacity),
            order_in_flight: false,
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Restore the stored session, if any. Call once at startup.
    pub fn start(&mut self) -> &SessionState {
        self.auth.restore_session()
    }

    /// Resolve a pending session against the backend.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` if the backend was unreachable;
    /// the session stays pending and the call can be retried.
    pub async fn confirm_identity(&mut self) -> Result<&SessionState, AuthError> {
        self.auth.confirm_session(&self.backend).await
    }

    /// Authenticate and install the resulting credential.
    ///
    /// # Errors
    ///
    /// See [`AuthSessionManager::login`].
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.auth.login(&self.backend, email, password).await
    }

    /// End the session: clear credential, identity, persisted token, and -
    /// unconditionally - the cart. A new anonymous session starts with
    /// zero purchase intent carried over.
    pub fn logout(&mut self) {
        self.auth.logout();
        self.cart.clear();
    }

    // =========================================================================
    // Orders and reconciliation
    // =========================================================================

    /// Submit the cart as an order.
    ///
    /// On success the cart is cleared and the purchased quantities are
    /// reconciled into every locally cached stock number, so displays stay
    /// consistent without waiting for a fresh fetch.
    ///
    /// # Errors
    ///
    /// - `OrderError::RequestInFlight` if a submission is outstanding
    /// - `OrderError::EmptyCart` if there is nothing to order
    /// - `OrderError::NotAuthenticated` without a confirmed session, or if
    ///   the backend rejects the credential
    /// - `OrderError::Rejected` if the backend refuses the order
    /// - `OrderError::NetworkFailure` if the backend is unreachable
    pub async fn place_order(&mut self) -> Result<OrderId, OrderError> {
        if self.order_in_flight {
            return Err(OrderError::RequestInFlight);
        }
        if self.cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        let Some(token) = self.auth.bearer_token().cloned() else {
            return Err(OrderError::NotAuthenticated);
        };

        let lines = self.cart.order_lines();

        self.order_in_flight = true;
        let result = self.backend.submit_order(&token, &lines).await;
        self.order_in_flight = false;

        let confirmation = result.map_err(|err| match err {
            err if err.is_unauthorized() => OrderError::NotAuthenticated,
            ApiError::Status { status, message } if (400..=499).contains(&status) => {
                OrderError::Rejected(message)
            }
            other => OrderError::NetworkFailure(other),
        })?;

        tracing::debug!(order_id = %confirmation.order_id, "order placed");
        self.cart.clear();
        self.apply_stock_decrease(&confirmation.lines);

        Ok(confirmation.order_id)
    }

    /// Apply an external stock decrease to every local stock copy: the
    /// cached catalog and any affected cart lines.
    pub fn apply_stock_decrease(&mut self, purchased: &[OrderLine]) {
        self.catalog.reconcile_stock(purchased);
        self.cart.reconcile_stock(purchased);
    }

    // =========================================================================
    // Route guarding
    // =========================================================================

    /// Decide what the routing layer should do with a guarded route.
    #[must_use]
    pub fn route_access(&self, requirement: RouteRequirement) -> RouteAccess {
        match self.auth.state() {
            SessionState::Idle | SessionState::Pending(_) => RouteAccess::ShowLoading,
            SessionState::Unauthenticated => RouteAccess::RedirectToLogin,
            SessionState::Authenticated(identity) => match requirement {
                RouteRequirement::Authenticated => RouteAccess::Allow,
                RouteRequirement::Admin if identity.is_admin() => RouteAccess::Allow,
                RouteRequirement::Admin => RouteAccess::RedirectAway,
            },
        }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Current session state.
    #[must_use]
    pub const fn session_state(&self) -> &SessionState {
        self.auth.state()
    }

    /// The confirmed identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.auth.identity()
    }

    /// Whether the confirmed identity carries the administrative role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.auth.is_admin()
    }

    /// Read-only cart view.
    #[must_use]
    pub const fn cart(&self) -> &CartEngine {
        &self.cart
    }

    /// Mutable cart access for UI-triggered mutations.
    pub const fn cart_mut(&mut self) -> &mut CartEngine {
        &mut self.cart
    }

    /// The cached product catalog.
    #[must_use]
    pub const fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// The backend this session talks to.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}
