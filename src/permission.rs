//! Route-level access control.
//!
//! A [`Permission`] pairs a process-wide predicate `(username, path) -> allowed`
//! with an optional handler that renders refusals. Routes opt in with
//! `RouteDescriptor::permission()`, or every route is checked when
//! `all_routes` is set. With no predicate configured everything is allowed.

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether `username` may access `path`
pub type PermissionHandler = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Renders an error response: `(request, status, message)`
pub type ErrorHandler =
    Arc<dyn Fn(&mut HandlerRequest, u16, &str) -> anyhow::Result<HandlerResponse> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Permission {
    /// Check every route, not only those marked with `permission()`
    pub all_routes: bool,
    handler: Option<PermissionHandler>,
    not_permitted: Option<ErrorHandler>,
}

impl Permission {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn not_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HandlerRequest, u16, &str) -> anyhow::Result<HandlerResponse>
            + Send
            + Sync
            + 'static,
    {
        self.not_permitted = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn all_routes(mut self, all: bool) -> Self {
        self.all_routes = all;
        self
    }

    /// Whether a predicate is installed
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.handler.is_some()
    }

    /// Evaluate the predicate; allowed when none is installed
    #[must_use]
    pub fn check(&self, username: &str, path: &str) -> bool {
        match &self.handler {
            Some(h) => h(username, path),
            None => true,
        }
    }

    #[must_use]
    pub fn not_permitted_handler(&self) -> Option<&ErrorHandler> {
        self.not_permitted.as_ref()
    }

    /// Whether a route with the given flag is subject to the check
    #[must_use]
    pub fn applies_to(&self, route_flag: bool) -> bool {
        route_flag || self.all_routes
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permission")
            .field("all_routes", &self.all_routes)
            .field("handler", &self.handler.is_some())
            .field("not_permitted", &self.not_permitted.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_predicate_allows_everything() {
        let p = Permission::new();
        assert!(!p.is_configured());
        assert!(p.check("anyone", "/anything"));
    }

    #[test]
    fn test_predicate_sees_username_and_path() {
        let p = Permission::new().handler(|user, path| user == "admin" || !path.starts_with("/admin"));
        assert!(p.check("admin", "/admin/users"));
        assert!(!p.check("guest", "/admin/users"));
        assert!(p.check("guest", "/public"));
    }

    #[test]
    fn test_all_routes_overrides_route_flag() {
        assert!(!Permission::new().applies_to(false));
        assert!(Permission::new().all_routes(true).applies_to(false));
    }
}
