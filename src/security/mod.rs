//! # Security Module
//!
//! Named security schemes and the verifiers that back them.
//!
//! ## Overview
//!
//! A route lists the scheme names it accepts (`basicAuth`, `apiKeyAuth`, ...).
//! At request time the authorization pipeline looks each name up in the
//! [`SecuritySchemes`] registry and asks the registered [`SecurityVerifier`] to
//! turn the request's credentials into an [`Identity`]. Names with no
//! registered verifier are skipped, not treated as failures.
//!
//! The crate ships two reference verifiers whose credential *checks* stay
//! pluggable:
//!
//! - [`BasicAuthVerifier`] - decodes `Authorization: Basic ...` and hands the
//!   username/password pair to a user predicate
//! - [`ApiKeyVerifier`] - reads a key from a header, query parameter or cookie
//!   and hands it to a user lookup
//!
//! ## Example
//!
//! ```rust
//! use ctlroute::security::{BasicAuthVerifier, SecuritySchemes, BASIC_AUTH};
//! use std::sync::Arc;
//!
//! let mut schemes = SecuritySchemes::new();
//! schemes.register(
//!     BASIC_AUTH,
//!     Arc::new(BasicAuthVerifier::new("api", |user, pass| user == "admin" && pass == "secret")),
//! );
//! assert!(schemes.get(BASIC_AUTH).is_some());
//! ```

mod api_key;
mod basic;

pub use api_key::{ApiKeyLocation, ApiKeyVerifier};
pub use basic::BasicAuthVerifier;

use crate::dispatcher::HeaderVec;
use crate::router::ParamVec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Scheme name for HTTP Basic authentication
pub const BASIC_AUTH: &str = "basicAuth";
/// Scheme name for HTTP Digest authentication
pub const DIGEST_AUTH: &str = "digestAuth";
/// Scheme name for API key authentication
pub const API_KEY_AUTH: &str = "apiKeyAuth";

/// Authenticated principal
///
/// Produced by a security scheme or by session validation. The username is what
/// the permission check sees; `claims` carries whatever else the verifier knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Value>,
}

impl Identity {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            claims: None,
        }
    }

    #[must_use]
    pub fn with_claims(mut self, claims: Value) -> Self {
        self.claims = Some(claims);
        self
    }
}

/// Why a request could not be authenticated
///
/// Returned by verifiers and session stores. Only the authorization pipeline
/// interprets these; they never reach callers outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The scheme's credentials were not present on the request
    MissingCredentials {
        /// Scheme that looked for them
        scheme: String,
    },
    /// Credentials were present but rejected
    InvalidCredentials {
        /// Scheme that rejected them
        scheme: String,
        /// Human readable reason
        reason: String,
    },
    /// No session cookie on the request
    SessionMissing,
    /// The session cookie does not name a live session
    SessionInvalid {
        /// Human readable reason
        reason: String,
    },
    /// The session exists but has been idle longer than the configured expiry
    SessionExpired,
}

impl AuthError {
    #[must_use]
    pub fn missing(scheme: &str) -> Self {
        AuthError::MissingCredentials {
            scheme: scheme.to_string(),
        }
    }

    #[must_use]
    pub fn invalid(scheme: &str, reason: impl Into<String>) -> Self {
        AuthError::InvalidCredentials {
            scheme: scheme.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from session validation rather than a scheme
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            AuthError::SessionMissing | AuthError::SessionInvalid { .. } | AuthError::SessionExpired
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredentials { scheme } => {
                write!(f, "{scheme}: credentials missing")
            }
            AuthError::InvalidCredentials { scheme, reason } => {
                write!(f, "{scheme}: invalid credentials: {reason}")
            }
            AuthError::SessionMissing => write!(f, "session: cookie missing"),
            AuthError::SessionInvalid { reason } => write!(f, "session: invalid: {reason}"),
            AuthError::SessionExpired => write!(f, "session: expired"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Request context for security validation.
///
/// Borrows the credentials-bearing parts of the request so verifiers never
/// see (or copy) the body.
pub struct SecurityRequest<'a> {
    /// HTTP method, for schemes that sign it (digest)
    pub method: &'a http::Method,
    /// Request path
    pub path: &'a str,
    /// HTTP headers from the request
    pub headers: &'a HeaderVec,
    /// Query parameters from the request URL
    pub query: &'a ParamVec,
    /// Cookies from the request
    pub cookies: &'a HeaderVec,
}

impl SecurityRequest<'_> {
    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    #[inline]
    #[must_use]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name
    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Turns request credentials into an [`Identity`] for one named scheme.
pub trait SecurityVerifier: Send + Sync {
    /// Verify the request's credentials.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if credentials are missing or rejected.
    fn verify(&self, req: &SecurityRequest<'_>) -> Result<Identity, AuthError>;

    /// Value for the `WWW-Authenticate` header when this scheme rejects a request
    fn challenge(&self) -> Option<String> {
        None
    }
}

/// Registry mapping scheme names to verifiers
#[derive(Clone, Default)]
pub struct SecuritySchemes {
    verifiers: HashMap<String, Arc<dyn SecurityVerifier>>,
}

impl SecuritySchemes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, verifier: Arc<dyn SecurityVerifier>) {
        self.verifiers.insert(name.to_string(), verifier);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn SecurityVerifier>> {
        self.verifiers.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }
}

impl fmt::Debug for SecuritySchemes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.verifiers.keys().collect();
        names.sort();
        f.debug_struct("SecuritySchemes")
            .field("schemes", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::invalid(BASIC_AUTH, "bad password").to_string(),
            "basicAuth: invalid credentials: bad password"
        );
        assert!(AuthError::SessionExpired.is_session_error());
        assert!(!AuthError::missing(API_KEY_AUTH).is_session_error());
    }
}
