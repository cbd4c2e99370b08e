//! # Server Configuration
//!
//! [`ServerConfig`] is loaded from a TOML file and then overridden from the
//! environment:
//!
//! ```toml
//! host = "api.example.com"
//! port = 8443
//! secure = true
//! stack_size = "0x8000"
//!
//! [session]
//! cookie_name = "sid"
//! expires_secs = 3600
//! redirect_path = "/login"
//! redirect_status = 303
//! ```
//!
//! ## Environment Variables
//!
//! - `CTLR_HOST`, `CTLR_PORT`, `CTLR_SECURE`
//! - `CTLR_STACK_SIZE` - coroutine stack size, decimal (`16384`) or hex
//!   (`0x4000`)
//!
//! Unparseable values are ignored with a warning and the file value stays.
//!
//! `host`, `port` and `secure` describe how clients reach the server and end up
//! in the documentation root; the listen address is passed to `Server::start`.

use crate::session::SessionSettings;
use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::warn;

/// Default coroutine stack size (16 KB)
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Advertise `https` in the documentation root
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_stack_size", deserialize_with = "deserialize_stack_size")]
    pub stack_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSettings>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure: false,
            stack_size: DEFAULT_STACK_SIZE,
            session: None,
        }
    }
}

impl ServerConfig {
    /// Read a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Parse TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `CTLR_*` overrides from the process environment
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `CTLR_*` overrides from an arbitrary lookup
    #[must_use]
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CTLR_HOST") {
            self.host = host;
        }
        if let Some(val) = lookup("CTLR_PORT") {
            match val.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %val, "Ignoring invalid CTLR_PORT"),
            }
        }
        if let Some(val) = lookup("CTLR_SECURE") {
            match parse_bool(&val) {
                Some(secure) => self.secure = secure,
                None => warn!(value = %val, "Ignoring invalid CTLR_SECURE"),
            }
        }
        if let Some(val) = lookup("CTLR_STACK_SIZE") {
            match parse_size(&val) {
                Some(size) => self.stack_size = size,
                None => warn!(value = %val, "Ignoring invalid CTLR_STACK_SIZE"),
            }
        }
        self
    }

    /// `scheme://host:port` as advertised in the documentation
    #[must_use]
    pub fn base_uri(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// Decimal or `0x`-prefixed hex
#[must_use]
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn deserialize_stack_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(usize),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => parse_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stack size: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.base_uri(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_hex_and_decimal_stack_size() {
        assert_eq!(parse_size("0x8000"), Some(0x8000));
        assert_eq!(parse_size("16384"), Some(16384));
        assert_eq!(parse_size("lots"), None);
        let cfg = ServerConfig::from_toml_str("stack_size = \"0x8000\"").unwrap();
        assert_eq!(cfg.stack_size, 0x8000);
        let cfg = ServerConfig::from_toml_str("stack_size = 4096").unwrap();
        assert_eq!(cfg.stack_size, 4096);
    }

    #[test]
    fn test_session_table() {
        let cfg = ServerConfig::from_toml_str("[session]\nredirect_status = 303\n").unwrap();
        let session = cfg.session.unwrap();
        assert_eq!(session.redirect_status, 303);
        assert_eq!(session.cookie_name, "session_id");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CTLR_HOST", "example.org"),
            ("CTLR_PORT", "443"),
            ("CTLR_SECURE", "true"),
            ("CTLR_STACK_SIZE", "not-a-size"),
        ]);
        let cfg = ServerConfig::default().apply_env_from(|k| env.get(k).map(|v| (*v).to_string()));
        assert_eq!(cfg.base_uri(), "https://example.org:443");
        assert_eq!(cfg.stack_size, DEFAULT_STACK_SIZE);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(ServerConfig::from_toml_str("port = \"eighty\"").is_err());
    }
}
