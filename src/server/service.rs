use super::request::parse_request;
use super::response::write_handler_response;
use crate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::Arc;
use tracing::warn;

/// `may_minihttp` service running a [`Dispatcher`]
///
/// Cloned once per connection; every clone shares the same routing table.
#[derive(Clone)]
pub struct AppService {
    dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Answer one parsed request; `GET /health` bypasses routing
    #[must_use]
    pub fn handle(&self, req: HandlerRequest) -> HandlerResponse {
        if req.method == Method::GET && req.path == "/health" {
            return health_response();
        }
        self.dispatcher.dispatch(req)
    }
}

/// Liveness probe body
#[must_use]
pub fn health_response() -> HandlerResponse {
    HandlerResponse::json(200, json!({ "status": "ok" }))
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let response = match parse_request(req) {
            Ok(parsed) => self.handle(parsed),
            Err(err) => {
                warn!(error = %err, "Rejecting request with invalid method");
                HandlerResponse::error(400, "Invalid method")
            }
        };
        write_handler_response(res, response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::handler;
    use crate::dispatcher::HttpEngine;

    #[test]
    fn test_health_bypasses_router() {
        let service = AppService::new(Dispatcher::new());
        let res = service.handle(HandlerRequest::new(Method::GET, "/health"));
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ok");
    }

    #[test]
    fn test_routes_through_dispatcher() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .add(Method::GET, "/ping", handler(|_| Ok(HandlerResponse::text(200, "pong"))))
            .unwrap();
        let service = AppService::new(dispatcher);
        let res = service.handle(HandlerRequest::new(Method::GET, "/ping"));
        assert_eq!(res.body, serde_json::Value::String("pong".into()));
        assert_eq!(service.handle(HandlerRequest::new(Method::GET, "/nope")).status, 404);
    }
}
