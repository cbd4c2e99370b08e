//! # Route Module
//!
//! [`RouteDescriptor`] is the record a controller fills in for one HTTP method:
//! documented parameters and responses, content types, the security schemes it
//! accepts, its [`SessionMode`](crate::session::SessionMode), whether the
//! permission check applies, and the handler itself.
//!
//! Descriptors are built once at registration and are immutable afterwards.

mod descriptor;

pub use descriptor::{ParameterLocation, ParameterMeta, ResponseDoc, RouteDescriptor};
