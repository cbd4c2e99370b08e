//! # ctlroute
//!
//! **ctlroute** binds controller objects to HTTP routes and runs every route
//! behind a configurable authorization pipeline, on top of the `may` coroutine
//! runtime and `may_minihttp`.
//!
//! ## Overview
//!
//! A controller declares which HTTP methods it serves by implementing verb
//! traits. At registration the server works out the supported methods, derives
//! a canonical name and path from the controller's namespace, lets the
//! controller describe each method on a [`route::RouteDescriptor`], wraps the
//! handler in the [`pipeline::AuthPipeline`] and binds it to the engine. Every
//! registered route is mirrored into a documentation model.
//!
//! ## Architecture
//!
//! - **[`controller`]** - `Controller` and the `Get`/`Post`/`Put`/`Delete`/`Options` capabilities
//! - **[`naming`]** - name and path derivation, including segment injection
//! - **[`route`]** - the per-method route descriptor builder
//! - **[`pipeline`]** - security, session, permission and dispatch for every request
//! - **[`security`]** - named security schemes and reference verifiers
//! - **[`session`]** - session modes, settings and stores
//! - **[`permission`]** - the `(username, path)` access predicate
//! - **[`docs`]** - the route documentation model and its snapshot
//! - **[`dispatcher`]** - request/response model and the in-process engine
//! - **[`router`]** - path pattern matching
//! - **[`server`]** - registration entry point and the `may_minihttp` adapter
//! - **[`config`]**, **[`otel`]**, **[`ids`]** - configuration, logging, identifiers
//!
//! ### Registration Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Server
//!     participant Controller
//!     participant Pipeline as AuthPipeline
//!     participant Engine as HttpEngine
//!     participant Docs as DocsAggregator
//!
//!     App->>Server: register(&controller, "")
//!     Server->>Controller: capabilities (as_get, as_post, ...)
//!     Server->>Server: resolve name and path
//!     loop each supported verb
//!         Server->>Controller: get/post/...(RouteDescriptor)
//!         Controller-->>Server: configured descriptor
//!         Server->>Pipeline: wrap handler
//!         Server->>Engine: add(method, path, handler)
//!         Server->>Docs: record(name, path, method)
//!     end
//! ```
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Service as AppService
//!     participant Dispatcher
//!     participant Pipeline as AuthPipeline
//!     participant Handler
//!
//!     Client->>Service: HTTP request
//!     Service->>Dispatcher: HandlerRequest
//!     Dispatcher->>Pipeline: matched route
//!     Pipeline->>Pipeline: security schemes
//!     Pipeline->>Pipeline: session (Is / On / Off)
//!     alt authorization failed
//!         Pipeline-->>Client: 401 or redirect
//!     end
//!     Pipeline->>Pipeline: permission predicate
//!     alt refused
//!         Pipeline-->>Client: 403
//!     end
//!     Pipeline->>Handler: request with identity, session, docs
//!     Handler-->>Client: HandlerResponse (+ cookies)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ctlroute::config::ServerConfig;
//! use ctlroute::controller::{Controller, Get, Post};
//! use ctlroute::dispatcher::{HandlerRequest, HandlerResponse};
//! use ctlroute::route::{ParameterMeta, RouteDescriptor};
//! use ctlroute::server::Server;
//! use http::Method;
//!
//! struct Messages;
//!
//! impl Get for Messages {
//!     fn get(&self, route: RouteDescriptor) -> RouteDescriptor {
//!         route
//!             .set_parameters(true, [ParameterMeta::path("id")])
//!             .set_summary("Read messages")
//!             .set_handler(|req| {
//!                 let id = req.get_path_param("id").unwrap_or("all").to_string();
//!                 Ok(HandlerResponse::text(200, id))
//!             })
//!     }
//! }
//!
//! impl Post for Messages {
//!     fn post(&self, route: RouteDescriptor) -> RouteDescriptor {
//!         route.set_handler(|_| Ok(HandlerResponse::status(201)))
//!     }
//! }
//!
//! impl Controller for Messages {
//!     fn namespace(&self) -> &str {
//!         "chat::controllers::api"
//!     }
//!     fn as_get(&self) -> Option<&dyn Get> {
//!         Some(self)
//!     }
//!     fn as_post(&self) -> Option<&dyn Post> {
//!         Some(self)
//!     }
//! }
//!
//! let mut server = Server::new("chat", ServerConfig::default());
//! server.register(&Messages, "");
//!
//! let service = server.into_service();
//! let res = service.handle(HandlerRequest::new(Method::GET, "/api/messages/42"));
//! assert_eq!(res.body, serde_json::Value::String("42".into()));
//! ```

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod docs;
pub mod ids;
pub mod naming;
pub mod otel;
pub mod permission;
pub mod pipeline;
pub mod route;
pub mod router;
pub mod security;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use controller::{Controller, Delete, Get, Options, Post, Put};
pub use dispatcher::{HandlerRequest, HandlerResponse};
pub use naming::Registration;
pub use permission::Permission;
pub use pipeline::AuthConfig;
pub use route::RouteDescriptor;
pub use security::{AuthError, Identity};
pub use server::Server;
pub use session::SessionMode;
