//! Canonical route names and paths.
//!
//! A controller's path is derived from its logical namespace, the part of its
//! declared location after the `controllers` boundary, with the lower-cased
//! controller name appended:
//!
//! ```rust
//! use ctlroute::naming::{resolve, Registration};
//!
//! let resolved = resolve("app::controllers::api::v1", "Messages", &Registration::new());
//! assert_eq!(resolved.name, "Messages");
//! assert_eq!(resolved.path, "/api/v1/messages");
//!
//! let versioned = resolve(
//!     "controllers/api",
//!     "Messages",
//!     &Registration::new().suffix(1, "v2"),
//! );
//! assert_eq!(versioned.path, "/api/v2/messages");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::|/").expect("separator regex should be valid"));

/// Token separating a controller's crate location from its logical namespace
pub const CONTROLLERS_BOUNDARY: &str = "controllers";

/// Optional overrides for one controller registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Explicit path; skips derivation entirely
    pub path: Option<String>,
    /// Explicit name; title-cased before use
    pub name: Option<String>,
    /// Namespace used instead of `Controller::namespace`
    pub namespace: Option<String>,
    /// `(index, segment)` insertions applied in order
    pub suffixes: Vec<(usize, String)>,
}

impl Registration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Insert `segment` at `index` of the namespace segments
    #[must_use]
    pub fn suffix(mut self, index: usize, segment: &str) -> Self {
        self.suffixes.push((index, segment.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub name: String,
    pub path: String,
}

/// Resolve the canonical name and path for a controller.
///
/// `namespace` is the controller's declared location (the registration's
/// override wins), `type_name` the fallback name.
#[must_use]
pub fn resolve(namespace: &str, type_name: &str, reg: &Registration) -> ResolvedRoute {
    let name = title_case(reg.name.as_deref().unwrap_or(type_name));
    if let Some(path) = reg.path.as_deref().filter(|p| !p.is_empty()) {
        return ResolvedRoute {
            name,
            path: path.to_string(),
        };
    }

    let location = reg.namespace.as_deref().unwrap_or(namespace);
    let mut segments = namespace_segments(location);
    for (index, segment) in &reg.suffixes {
        insert_segment(&mut segments, *index, segment);
    }

    let mut path = String::from("/");
    for segment in &segments {
        path.push_str(segment);
        path.push('/');
    }
    path.push_str(&name.to_lowercase());
    debug!(name = %name, location = %location, path = %path, "Derived controller path");
    ResolvedRoute { name, path }
}

/// Split a location into namespace segments after the `controllers` boundary.
///
/// Both `/` and `::` separate segments; empty segments are dropped. A location
/// without the boundary is used whole.
#[must_use]
pub fn namespace_segments(location: &str) -> Vec<String> {
    let parts: Vec<&str> = SEPARATOR
        .split(location)
        .filter(|s| !s.is_empty())
        .collect();
    let start = parts
        .iter()
        .position(|s| *s == CONTROLLERS_BOUNDARY)
        .map_or(0, |i| i + 1);
    parts[start..].iter().map(|s| (*s).to_string()).collect()
}

/// Insert `value` at `index`, shifting later segments right; past the end appends
pub fn insert_segment(segments: &mut Vec<String>, index: usize, value: &str) {
    if index >= segments.len() {
        segments.push(value.to_string());
    } else {
        segments.insert(index, value.to_string());
    }
}

/// Upper-case the first letter of every word
///
/// Words are separated by anything that is not a letter, digit, `_` or `'`.
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_' || c == '\'');
    }
    out
}

/// Bare identifier of `T`: module path and generic arguments stripped
#[must_use]
pub fn type_ident<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
