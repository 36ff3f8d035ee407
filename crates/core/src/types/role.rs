//! Authority roles carried in a session token.
//!
//! The backend issues role strings in the token's `authorities` claim
//! (e.g., `ROLE_USER`, `ROLE_ADMIN`). The wrapper keeps them opaque apart
//! from the administrative marker check.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Role marker that grants administrative access.
const ADMIN_MARKER: &str = "ROLE_ADMIN";

/// A single authority role string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a role from anything string-like.
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    /// The administrative role marker.
    #[must_use]
    pub fn admin() -> Self {
        Self(ADMIN_MARKER.to_owned())
    }

    /// Whether this role grants administrative access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_MARKER
    }

    /// Get the role as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        Self(role.to_owned())
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        Self(role)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_marker() {
        assert!(Role::admin().is_admin());
        assert!(Role::new("ROLE_ADMIN").is_admin());
        assert!(!Role::new("ROLE_USER").is_admin());
        assert!(!Role::new("role_admin").is_admin());
    }

    #[test]
    fn test_serde_transparent() {
        let role = Role::new("ROLE_USER");
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"ROLE_USER\"");

        let parsed: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, role);
    }
}
