//! # Dispatcher Module
//!
//! The request/response model shared by controllers, the authorization
//! pipeline and the HTTP engine, plus the in-process engine itself.
//!
//! - [`HandlerRequest`] - the per-request context a handler sees, including the
//!   identity and session established by the pipeline
//! - [`HandlerResponse`] - status, headers, cookies and body
//! - [`Handler`] - the shared closure type every route resolves to
//! - [`HttpEngine`] - the one capability registration needs from an engine
//! - [`Dispatcher`] - routes parsed requests to registered handlers

mod core;
mod request;
mod response;

use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers/cookies before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header/cookie storage for the hot path
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

pub use core::{handler, Dispatcher, Handler, HttpEngine};
pub use request::HandlerRequest;
pub use response::{HandlerResponse, SetCookie};
