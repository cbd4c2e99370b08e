//! # Server Module
//!
//! [`Server`] is the registration entry point: it inspects controllers, wraps
//! their handlers in the authorization pipeline, binds them to an
//! [`HttpEngine`](crate::dispatcher::HttpEngine) and records them in the
//! documentation model.
//!
//! With the default [`Dispatcher`](crate::dispatcher::Dispatcher) engine the
//! finished server becomes an [`AppService`] served by `may_minihttp`:
//!
//! ```no_run
//! use ctlroute::config::ServerConfig;
//! use ctlroute::server::Server;
//!
//! let config = ServerConfig::default();
//! let mut server = Server::new("my-api", config);
//! // server.register(&MyController, "");
//! let handle = server.start("0.0.0.0:8080").expect("bind failed");
//! handle.join().ok();
//! ```

mod http_server;
mod registry;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use registry::Server;
pub use request::{parse_body, parse_cookies, parse_query_params, parse_request};
pub use response::write_handler_response;
pub use service::{health_response, AppService};
