//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during authentication operations.
///
/// All variants are non-fatal and user-facing; the session manager itself
/// never crashes on them. Expired or undecodable *stored* tokens are not
/// errors at all - restore silently degrades to an unauthenticated session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] pomelo_core::EmailError),

    /// The backend rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The backend could not be reached; the operation can be retried.
    #[error("could not reach the authentication service: {0}")]
    NetworkFailure(#[source] ApiError),

    /// A freshly issued token is already past its expiry.
    #[error("session token expired")]
    TokenExpired,

    /// A freshly issued token could not be decoded.
    #[error("session token could not be decoded")]
    MalformedToken,

    /// An authentication request is already in flight.
    #[error("an authentication request is already in flight")]
    RequestInFlight,
}

impl AuthError {
    /// Convert a transport-layer failure into the auth taxonomy.
    pub(crate) fn from_api(err: ApiError) -> Self {
        if err.is_unauthorized() {
            Self::InvalidCredentials
        } else {
            Self::NetworkFailure(err)
        }
    }
}
