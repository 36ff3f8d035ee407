//! Bearer token claim decoding.
//!
//! Tokens are JWTs whose payload carries the identity claims. Decoding is
//! purely structural - the signature is the backend's concern, not ours -
//! but it fails closed: a token missing any required claim yields no
//! identity at all, never a partial one.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use thiserror::Error;

use pomelo_core::Role;

use super::Identity;

/// Errors from decoding a token's claims.
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// The token is not a three-part JWT.
    #[error("token is not a three-part JWT")]
    Structure,

    /// The payload segment is not valid base64url.
    #[error("token payload is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The payload is not a claims object with the required fields.
    #[error("token payload is missing required claims: {0}")]
    Claims(#[from] serde_json::Error),
}

/// The claims this client requires from a token.
///
/// Every field is mandatory; serde rejects payloads that omit any of them.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject (the account's email).
    pub sub: String,
    /// Role strings granted to the subject.
    pub authorities: Vec<Role>,
    /// Expiry as epoch seconds.
    pub exp: i64,
}

impl TokenClaims {
    /// Whether the token was expired at `now` (epoch seconds).
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Whether the token is expired right now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    /// Derive the identity these claims describe.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            subject: self.sub.clone(),
            roles: self.authorities.iter().cloned().collect(),
        }
    }
}

/// Decode the claims embedded in a bearer token.
///
/// # Errors
///
/// Returns `ClaimsError` if the token is structurally not a JWT, its payload
/// is not base64url, or the payload lacks any required claim.
pub fn decode(token: &str) -> Result<TokenClaims, ClaimsError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ClaimsError::Structure);
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn forge(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_decode_valid_token() {
        let token = forge(&serde_json::json!({
            "sub": "user@example.com",
            "authorities": ["ROLE_USER", "ROLE_ADMIN"],
            "exp": 4_102_444_800_i64
        }));

        let claims = decode(&token).unwrap();
        assert_eq!(claims.sub, "user@example.com");
        assert_eq!(claims.authorities.len(), 2);
        assert!(!claims.is_expired_at(4_102_444_799));
        assert!(claims.is_expired_at(4_102_444_800));

        let identity = claims.identity();
        assert_eq!(identity.subject, "user@example.com");
        assert!(identity.is_admin());
    }

    #[test]
    fn test_decode_rejects_wrong_segment_count() {
        assert!(matches!(decode("notajwt"), Err(ClaimsError::Structure)));
        assert!(matches!(decode("a.b"), Err(ClaimsError::Structure)));
        assert!(matches!(decode("a.b.c.d"), Err(ClaimsError::Structure)));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode("header.!!not-base64!!.sig"),
            Err(ClaimsError::Encoding(_))
        ));
    }

    #[test]
    fn test_decode_fails_closed_on_missing_claims() {
        // No exp claim: the whole decode fails, no partial identity
        let token = forge(&serde_json::json!({
            "sub": "user@example.com",
            "authorities": ["ROLE_USER"]
        }));
        assert!(matches!(decode(&token), Err(ClaimsError::Claims(_))));

        // authorities of the wrong shape
        let token = forge(&serde_json::json!({
            "sub": "user@example.com",
            "authorities": "ROLE_USER",
            "exp": 4_102_444_800_i64
        }));
        assert!(matches!(decode(&token), Err(ClaimsError::Claims(_))));
    }
}
