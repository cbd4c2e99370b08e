//! # Router Module
//!
//! Path matching for the in-process HTTP engine. Every route registered by the
//! [`Server`](crate::server::Server) ends up here as a `(method, path pattern,
//! handler)` triple.
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Compilation**: when a route is added, its pattern (e.g. `/api/messages/{id}`
//!    or `/api/messages/:id`) is converted into an anchored regex that captures the
//!    path parameters.
//!
//! 2. **Matching**: for each incoming request, the router tests the request path
//!    against the compiled patterns of the request method and returns the stored
//!    value together with the extracted parameters.
//!
//! Literal routes are ordered before parameterized ones, so `/users/me` wins over
//! `/users/{id}` regardless of registration order.
//!
//! ## Example
//!
//! ```rust
//! use ctlroute::router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add(Method::GET, "/messages/{id}", "get_message").unwrap();
//!
//! let m = router.route(&Method::GET, "/messages/42").unwrap();
//! assert_eq!(*m.value, "get_message");
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
