//! # Session Module
//!
//! Cookie sessions as seen by the authorization pipeline.
//!
//! The pipeline never persists anything itself. It asks a [`SessionStore`] to
//! validate cookie values and to mint new session IDs, and it attaches a
//! [`Session`] record to the request so handlers can see which session they
//! are running under. Cookie name, expiry and the login redirect live in
//! [`SessionSettings`], which deserializes straight from the `[session]` table
//! of the server configuration.
//!
//! [`MemorySessionStore`] is a process-local store suitable for a single
//! instance; multi-instance deployments plug in their own store.

mod memory;

pub use memory::MemorySessionStore;

use crate::security::{AuthError, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Session lifecycle applied by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionMode {
    /// No session logic
    #[default]
    None,
    /// Require a valid session unless a security scheme already authenticated
    Is,
    /// Start a new session and set its cookie
    On,
    /// End the session, clear its cookie and redirect
    Off,
}

/// An active session as attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Cookie name the session travels under
    pub key: String,
    /// Session ID (the cookie value)
    pub value: String,
    pub created: SystemTime,
    pub last_activity: SystemTime,
}

impl Session {
    #[must_use]
    pub fn new(key: &str, value: &str) -> Self {
        let now = SystemTime::now();
        Self {
            key: key.to_string(),
            value: value.to_string(),
            created: now,
            last_activity: now,
        }
    }
}

fn default_cookie_name() -> String {
    "session_id".to_string()
}

fn default_expires_secs() -> u64 {
    24 * 60 * 60
}

fn default_redirect_path() -> String {
    "/login".to_string()
}

fn default_redirect_status() -> u16 {
    302
}

/// Cookie and redirect settings shared by every session-aware route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Cookie lifetime in seconds
    #[serde(default = "default_expires_secs")]
    pub expires_secs: u64,
    /// Where unauthenticated and logged-out users are sent
    #[serde(default = "default_redirect_path")]
    pub redirect_path: String,
    #[serde(default = "default_redirect_status")]
    pub redirect_status: u16,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            expires_secs: default_expires_secs(),
            redirect_path: default_redirect_path(),
            redirect_status: default_redirect_status(),
        }
    }
}

impl SessionSettings {
    #[must_use]
    pub fn expires(&self) -> Duration {
        Duration::from_secs(self.expires_secs)
    }
}

/// Backend that owns session state
///
/// Implementations must be safe to call from many request coroutines at once.
pub trait SessionStore: Send + Sync {
    /// Resolve a cookie value to the identity bound to it.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the session is unknown, unbound or expired.
    fn validate(&self, value: &str) -> Result<Identity, AuthError>;

    /// Mint a fresh session ID
    fn generate_id(&self) -> String;

    /// Record activity on a validated session, returning its refreshed record
    fn touch(&self, value: &str) -> Option<Session> {
        let _ = value;
        None
    }

    /// Forget a session on logout
    fn invalidate(&self, value: &str) {
        let _ = value;
    }
}

/// Session store plus the settings the pipeline applies around it
#[derive(Clone)]
pub struct SessionConfig {
    pub settings: SessionSettings,
    pub store: Arc<dyn SessionStore>,
}

impl SessionConfig {
    #[must_use]
    pub fn new(settings: SessionSettings, store: Arc<dyn SessionStore>) -> Self {
        Self { settings, store }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let settings: SessionSettings = toml::from_str("cookie_name = \"sid\"").unwrap();
        assert_eq!(settings.cookie_name, "sid");
        assert_eq!(settings.redirect_path, "/login");
        assert_eq!(settings.redirect_status, 302);
        assert_eq!(settings.expires(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_default_mode_is_none() {
        assert_eq!(SessionMode::default(), SessionMode::None);
    }
}
