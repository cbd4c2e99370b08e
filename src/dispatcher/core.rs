use super::{HandlerRequest, HandlerResponse};
use crate::router::Router;
use http::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A request handler as registered with an [`HttpEngine`]
///
/// Handlers run concurrently on the engine's worker coroutines, so they must be
/// `Send + Sync` and must not rely on exclusive access to shared state.
pub type Handler =
    Arc<dyn Fn(&mut HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync>;

/// Wrap a closure into a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The surface the registration layer needs from an HTTP engine
///
/// Anything that can bind a `(method, path, handler)` triple can host
/// controllers. [`Dispatcher`] is the in-process implementation.
pub trait HttpEngine {
    /// Bind `handler` to `method` and `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the path pattern.
    fn add(&mut self, method: Method, path: &str, handler: Handler) -> anyhow::Result<()>;
}

/// In-process HTTP engine: a routing table of wrapped handlers
///
/// `dispatch` never fails. Unknown paths become 404, known paths under another
/// method become 405, and handler errors become 500.
#[derive(Default)]
pub struct Dispatcher {
    router: Router<Handler>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The routing table backing this dispatcher
    #[must_use]
    pub fn router(&self) -> &Router<Handler> {
        &self.router
    }

    /// Route a request and run its handler
    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let started = Instant::now();
        let Some(route_match) = self.router.route(&req.method, &req.path) else {
            return self.unmatched(&req);
        };

        req.path_params = route_match.path_params;
        let handler = Arc::clone(route_match.value);
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            route_pattern = %route_match.pattern,
            "Dispatching request"
        );

        let response = match handler(&mut req) {
            Ok(res) => res,
            Err(err) => {
                error!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    error = %err,
                    "Handler failed"
                );
                HandlerResponse::json(
                    500,
                    json!({
                        "error": "Handler failed",
                        "message": err.to_string(),
                        "method": req.method.as_str(),
                        "path": req.path,
                    }),
                )
            }
        };

        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            status = response.status,
            latency_us = started.elapsed().as_micros() as u64,
            "Request completed"
        );
        response
    }

    fn unmatched(&self, req: &HandlerRequest) -> HandlerResponse {
        let allowed = self.router.allowed_methods(&req.path);
        if allowed.is_empty() {
            warn!(method = %req.method, path = %req.path, "No route matched");
            return HandlerResponse::json(
                404,
                json!({"error": "Not Found", "method": req.method.as_str(), "path": req.path}),
            );
        }

        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        warn!(method = %req.method, path = %req.path, allow = %allow, "Method not allowed");
        HandlerResponse::json(
            405,
            json!({"error": "Method Not Allowed", "method": req.method.as_str(), "path": req.path}),
        )
        .with_header("allow", &allow)
    }
}

impl HttpEngine for Dispatcher {
    fn add(&mut self, method: Method, path: &str, handler: Handler) -> anyhow::Result<()> {
        self.router.add(method, path, handler)?;
        Ok(())
    }
}
