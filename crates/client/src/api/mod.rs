//! Commerce backend API client.
//!
//! The backend is an opaque REST service: it authenticates users, reports
//! products and stock, and accepts orders. Everything the engine needs from
//! it goes through the [`CommerceBackend`] trait so the state core can be
//! exercised without a network; [`HttpBackend`] is the production
//! implementation.
//!
//! Transport errors never leak past the auth/cart boundary - callers there
//! convert [`ApiError`] into their own user-facing taxonomies.

mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::{CurrentUserResponse, OrderConfirmation, OrderLine, ProductPayload};

use secrecy::SecretString;
use thiserror::Error;

use pomelo_core::{Email, ProductId};

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Best-effort human-readable message extracted from the body.
        message: String,
    },

    /// The backend answered 2xx but the body was not the expected shape.
    #[error("malformed backend response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the backend rejected the caller's credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }

    /// Whether the backend rejected the request itself (4xx other than auth).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status: 400..=499, .. })
    }
}

/// The remote commerce backend, as the state core consumes it.
///
/// All methods take `&self`; implementations are expected to be cheap to
/// share. The engine never issues two mutating calls concurrently.
#[allow(async_fn_in_trait)] // the engine runs single-threaded; futures need not be Send
pub trait CommerceBackend {
    /// Exchange credentials for an opaque bearer token.
    async fn authenticate(&self, email: &Email, password: &str) -> Result<String, ApiError>;

    /// Confirm a restored token still identifies a user.
    async fn current_user(&self, token: &SecretString) -> Result<CurrentUserResponse, ApiError>;

    /// Fetch a single product by id.
    async fn fetch_product(&self, id: &ProductId) -> Result<ProductPayload, ApiError>;

    /// Fetch the full product listing.
    async fn fetch_products(&self) -> Result<Vec<ProductPayload>, ApiError>;

    /// Submit an order; the backend echoes the accepted line items.
    async fn submit_order(
        &self,
        token: &SecretString,
        lines: &[OrderLine],
    ) -> Result<OrderConfirmation, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unauthorized() {
        let err = ApiError::Status {
            status: 401,
            message: "bad token".to_owned(),
        };
        assert!(err.is_unauthorized());
        assert!(err.is_client_error());

        let err = ApiError::Status {
            status: 503,
            message: "down".to_owned(),
        };
        assert!(!err.is_unauthorized());
        assert!(!err.is_client_error());
    }
}
