//! Auth session manager.
//!
//! Owns the current credential (an opaque bearer token) and the identity
//! derived from it. Identity is never stored independently: it is always
//! recomputed by decoding the token's claims, so no token means no
//! identity, ever.

pub mod claims;
mod error;

pub use claims::{ClaimsError, TokenClaims};
pub use error::AuthError;

use std::collections::BTreeSet;

use secrecy::SecretString;

use pomelo_core::{Email, Role};

use crate::api::CommerceBackend;
use crate::store::{SessionStore, keys};

/// Subject and roles decoded from the current credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The account's email, from the token's `sub` claim.
    pub subject: String,
    /// Role strings from the token's `authorities` claim.
    pub roles: BTreeSet<Role>,
}

impl Identity {
    /// Whether the role set contains the administrative marker.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}

/// Where the session currently stands.
///
/// `Idle -> Pending -> {Authenticated, Unauthenticated}`;
/// `Authenticated -> Unauthenticated` on logout. The only way back to
/// `Pending` is a full [`AuthSessionManager::restore_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing restored yet.
    Idle,
    /// A locally valid token was restored; the identity is provisional
    /// until the backend confirms the token.
    Pending(Identity),
    /// The session is live.
    Authenticated(Identity),
    /// No session.
    Unauthenticated,
}

impl SessionState {
    /// The confirmed identity, if any.
    ///
    /// A `Pending` identity is provisional and deliberately not exposed
    /// here; route guards must not make decisions from it.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// Whether the session is confirmed live.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Maintains the credential/identity pair and its derivation rule.
pub struct AuthSessionManager {
    store: SessionStore,
    token: Option<SecretString>,
    state: SessionState,
    login_in_flight: bool,
}

impl AuthSessionManager {
    /// Create a manager over the given store. No state is restored yet.
    #[must_use]
    pub const fn new(store: SessionStore) -> Self {
        Self {
            store,
            token: None,
            state: SessionState::Idle,
            login_in_flight: false,
        }
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// The confirmed identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.state.identity()
    }

    /// Whether the confirmed identity carries the administrative role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(Identity::is_admin)
    }

    /// The bearer token of the confirmed session, for backend calls.
    #[must_use]
    pub const fn bearer_token(&self) -> Option<&SecretString> {
        match self.state {
            SessionState::Authenticated(_) => self.token.as_ref(),
            _ => None,
        }
    }

    /// Restore a previously stored session at startup.
    ///
    /// An absent, undecodable, or expired token silently produces an
    /// unauthenticated session and clears the stored entry - an expired
    /// session is a normal state, not an error. A locally valid token
    /// moves the session to `Pending` until
    /// [`confirm_session`](Self::confirm_session) resolves it.
    pub fn restore_session(&mut self) -> &SessionState {
        let Some(raw) = self.store.get(keys::AUTH_TOKEN) else {
            self.state = SessionState::Unauthenticated;
            return &self.state;
        };

        match claims::decode(&raw) {
            Ok(decoded) if !decoded.is_expired() => {
                let identity = decoded.identity();
                tracing::debug!(subject = %identity.subject, "restored stored session, awaiting confirmation");
                self.token = Some(SecretString::from(raw));
                self.state = SessionState::Pending(identity);
            }
            Ok(_) => {
                tracing::debug!("stored token expired, starting unauthenticated");
                self.discard_session();
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored token undecodable, starting unauthenticated");
                self.discard_session();
            }
        }

        &self.state
    }

    /// Resolve a `Pending` session by confirming the token with the backend.
    ///
    /// In any other state this is a no-op returning the current state.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` if the backend could not be
    /// reached; the session stays `Pending` so the caller can retry. A
    /// backend that *rejects* the token is not an error: the session
    /// becomes unauthenticated, as with any expired credential.
    pub async fn confirm_session<B: CommerceBackend>(
        &mut self,
        backend: &B,
    ) -> Result<&SessionState, AuthError> {
        let identity = match &self.state {
            SessionState::Pending(identity) => identity.clone(),
            _ => return Ok(&self.state),
        };

        let Some(token) = self.token.clone() else {
            // Pending without a token cannot happen through the public API;
            // resolve it the safe way.
            self.discard_session();
            return Ok(&self.state);
        };

        match backend.current_user(&token).await {
            Ok(_) => {
                tracing::debug!(subject = %identity.subject, "session confirmed");
                self.state = SessionState::Authenticated(identity);
                Ok(&self.state)
            }
            Err(err) if err.is_unauthorized() => {
                tracing::debug!("backend rejected restored token, starting unauthenticated");
                self.discard_session();
                Ok(&self.state)
            }
            Err(err) => Err(AuthError::NetworkFailure(err)),
        }
    }

    /// Authenticate with the backend and install the returned credential.
    ///
    /// On success the token is stored in memory and in the persistent
    /// store, and the derived identity is returned. On failure the prior
    /// session state is untouched.
    ///
    /// # Errors
    ///
    /// - `AuthError::RequestInFlight` if a login is already outstanding
    /// - `AuthError::InvalidEmail` if the email is structurally invalid
    /// - `AuthError::InvalidCredentials` if the backend rejects them
    /// - `AuthError::NetworkFailure` if the backend is unreachable
    /// - `AuthError::MalformedToken` / `AuthError::TokenExpired` if the
    ///   backend issues an unusable token
    pub async fn login<B: CommerceBackend>(
        &mut self,
        backend: &B,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        if self.login_in_flight {
            return Err(AuthError::RequestInFlight);
        }

        let email = Email::parse(email)?;

        self.login_in_flight = true;
        let result = backend.authenticate(&email, password).await;
        self.login_in_flight = false;

        let raw = result.map_err(AuthError::from_api)?;

        let decoded = claims::decode(&raw).map_err(|err| {
            tracing::warn!(error = %err, "backend issued an undecodable token");
            AuthError::MalformedToken
        })?;
        if decoded.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        let identity = decoded.identity();
        self.store.put(keys::AUTH_TOKEN, &raw);
        self.token = Some(SecretString::from(raw));
        self.state = SessionState::Authenticated(identity.clone());
        tracing::debug!(subject = %identity.subject, "login succeeded");

        Ok(identity)
    }

    /// Clear the credential, identity, and persisted token synchronously.
    pub fn logout(&mut self) {
        tracing::debug!("logging out");
        self.discard_session();
    }

    fn discard_session(&mut self) {
        self.token = None;
        self.state = SessionState::Unauthenticated;
        self.store.remove(keys::AUTH_TOKEN);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    fn forge_token(sub: &str, roles: &[&str], exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = serde_json::json!({ "sub": sub, "authorities": roles, "exp": exp });
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    fn far_future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_restore_without_token_is_unauthenticated() {
        let store = SessionStore::in_memory();
        let mut auth = AuthSessionManager::new(store);

        assert_eq!(*auth.restore_session(), SessionState::Unauthenticated);
        assert!(auth.identity().is_none());
    }

    #[test]
    fn test_restore_with_valid_token_is_pending() {
        let store = SessionStore::in_memory();
        store.put(
            keys::AUTH_TOKEN,
            &forge_token("user@example.com", &["ROLE_USER"], far_future()),
        );

        let mut auth = AuthSessionManager::new(store);
        let state = auth.restore_session();

        assert!(matches!(state, SessionState::Pending(_)));
        // Provisional identity is not exposed as confirmed
        assert!(auth.identity().is_none());
        assert!(auth.bearer_token().is_none());
    }

    #[test]
    fn test_restore_with_expired_token_clears_storage() {
        let store = SessionStore::in_memory();
        let expired = chrono::Utc::now().timestamp() - 10;
        store.put(
            keys::AUTH_TOKEN,
            &forge_token("user@example.com", &["ROLE_USER"], expired),
        );

        let mut auth = AuthSessionManager::new(store.clone());
        assert_eq!(*auth.restore_session(), SessionState::Unauthenticated);
        assert_eq!(store.get(keys::AUTH_TOKEN), None);
    }

    #[test]
    fn test_restore_with_garbage_token_clears_storage() {
        let store = SessionStore::in_memory();
        store.put(keys::AUTH_TOKEN, "not-a-jwt");

        let mut auth = AuthSessionManager::new(store.clone());
        assert_eq!(*auth.restore_session(), SessionState::Unauthenticated);
        assert_eq!(store.get(keys::AUTH_TOKEN), None);
    }

    #[test]
    fn test_logout_clears_everything() {
        let store = SessionStore::in_memory();
        store.put(
            keys::AUTH_TOKEN,
            &forge_token("user@example.com", &["ROLE_USER"], far_future()),
        );

        let mut auth = AuthSessionManager::new(store.clone());
        auth.restore_session();
        auth.logout();

        assert_eq!(*auth.state(), SessionState::Unauthenticated);
        assert!(auth.identity().is_none());
        assert_eq!(store.get(keys::AUTH_TOKEN), None);
    }

    #[test]
    fn test_is_admin_requires_confirmed_identity() {
        let store = SessionStore::in_memory();
        store.put(
            keys::AUTH_TOKEN,
            &forge_token("admin@example.com", &["ROLE_ADMIN"], far_future()),
        );

        let mut auth = AuthSessionManager::new(store);
        auth.restore_session();

        // Pending: not admin until confirmed
        assert!(!auth.is_admin());
    }
}
