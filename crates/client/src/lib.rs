//! Pomelo Client - Storefront session and cart engine.
//!
//! This crate is the state core of the Pomelo storefront UI: it owns the
//! authenticated session, the in-progress cart, and the locally cached
//! product catalog, and keeps all three consistent with each other without
//! a server round-trip.
//!
//! # Architecture
//!
//! - [`store`] - Durable per-profile key-value storage with a memory-only
//!   degraded mode
//! - [`auth`] - Credential lifecycle: token restore, claim decoding, login,
//!   logout
//! - [`cart`] - Cart line mutations under stock-bound quantity invariants,
//!   persisted as a whole snapshot after every change
//! - [`catalog`] - Cached product lists with TTL, via `moka`
//! - [`api`] - The remote commerce backend, behind the [`CommerceBackend`]
//!   trait
//! - [`session`] - The one application-state container wiring the slices
//!   together (logout clears the cart, order placement reconciles stock)
//!
//! The backend is consulted only to authenticate and to fetch fresh
//! product/order data; every consistency rule in this crate is local.
//!
//! # Example
//!
//! ```rust,ignore
//! use pomelo_client::{ClientConfig, HttpBackend, StorefrontSession};
//!
//! let config = ClientConfig::from_env()?;
//! let backend = HttpBackend::new(&config)?;
//! let mut session = StorefrontSession::new(&config, backend);
//!
//! // Restore whatever the previous run left behind.
//! session.start();
//! session.confirm_identity().await?;
//!
//! // Cart mutations persist synchronously.
//! session.cart_mut().add_line(&product, 2)?;
//! let order_id = session.place_order().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod models;
pub mod session;
pub mod store;

pub use api::{ApiError, CommerceBackend, HttpBackend};
pub use auth::{AuthError, AuthSessionManager, Identity, SessionState};
pub use cart::{CartEngine, CartError, CartLine};
pub use catalog::ProductCatalog;
pub use config::{ClientConfig, ConfigError};
pub use models::Product;
pub use session::{OrderError, RouteAccess, RouteRequirement, StorefrontSession};
pub use store::SessionStore;
