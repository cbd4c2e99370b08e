mod common;

use common::controllers::{Inert, Messages, Status};
use ctlroute::config::ServerConfig;
use ctlroute::dispatcher::{HandlerRequest, HttpEngine};
use ctlroute::naming::Registration;
use ctlroute::server::Server;
use http::Method;

fn patterns(server: &Server) -> Vec<(Method, String)> {
    let mut p = server.engine().router().patterns();
    p.sort_by(|a, b| (a.1.as_str(), a.0.as_str()).cmp(&(b.1.as_str(), b.0.as_str())));
    p
}

#[test]
fn test_get_only_controller_yields_one_route() {
    let mut server = Server::new("api", ServerConfig::default());
    server.register(&Status, "");
    assert_eq!(patterns(&server), [(Method::GET, "/api/status".to_string())]);
}

#[test]
fn test_full_rest_controller_yields_every_verb() {
    let mut server = Server::new("chat", ServerConfig::default());
    server.register(&Messages, "");

    let p = patterns(&server);
    let methods_at = |path: &str| -> Vec<Method> {
        p.iter()
            .filter(|(_, pat)| pat == path)
            .map(|(m, _)| m.clone())
            .collect()
    };
    // GET allows an omitted id, PUT/DELETE require it
    assert_eq!(methods_at("/api/messages"), [Method::GET, Method::OPTIONS, Method::POST]);
    assert_eq!(methods_at("/api/messages/{id}"), [Method::DELETE, Method::GET, Method::PUT]);
}

#[test]
fn test_controller_without_capabilities_is_ignored() {
    let mut server = Server::new("api", ServerConfig::default());
    server.register(&Inert, "");
    assert!(server.engine().router().is_empty());
    assert!(server.api_docs().is_none());
}

#[test]
fn test_derivation_is_deterministic() {
    let reg = || Registration::new().suffix(1, "v1");
    let mut first = Server::new("a", ServerConfig::default());
    first.register_ext(&Messages, reg());
    let mut second = Server::new("b", ServerConfig::default());
    second.register_ext(&Messages, reg());
    assert_eq!(patterns(&first), patterns(&second));
}

#[test]
fn test_suffix_injection() {
    let mut server = Server::new("api", ServerConfig::default());
    server.register_ext(&Status, Registration::new().suffix(1, "v2"));
    assert_eq!(patterns(&server)[0].1, "/api/v2/status");

    let mut server = Server::new("api", ServerConfig::default());
    server.register_ext(&Status, Registration::new().suffix(0, "public"));
    assert_eq!(patterns(&server)[0].1, "/public/api/status");
}

#[test]
fn test_namespace_override_and_explicit_name() {
    let mut server = Server::new("api", ServerConfig::default());
    server.register_ext(
        &Status,
        Registration::new()
            .namespace("ops/controllers/internal")
            .name("probe"),
    );
    assert_eq!(patterns(&server)[0].1, "/internal/probe");
    let docs = server.api_docs().unwrap();
    assert!(docs.routes.contains_key("Probe"));
}

#[test]
fn test_registered_routes_dispatch() {
    let mut server = Server::new("chat", ServerConfig::default());
    server.register(&Messages, "");
    let service = server.into_service();

    let res = service.handle(HandlerRequest::new(Method::PUT, "/api/messages/7"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body["verb"], "put");

    // PUT has no id-less variant
    let res = service.handle(HandlerRequest::new(Method::PUT, "/api/messages"));
    assert_eq!(res.status, 405);
}

#[test]
fn test_docs_mirror_every_registration() {
    let mut server = Server::new("chat", ServerConfig::default());
    server.register(&Messages, "");
    let docs = server.docs_handle().snapshot().unwrap();

    assert_eq!(docs.uri, "http://127.0.0.1:8080");
    assert_eq!(docs.operation_count(), 6);
    let get = docs.operation("Messages", "/api/messages/{id}", &Method::GET).unwrap();
    assert_eq!(get.produces, ["application/json"]);
    assert!(get.responses.contains_key("200"));
    assert!(get.parameters[0].allow_empty_value);

    let post = docs.operation("Messages", "/api/messages", &Method::POST).unwrap();
    assert_eq!(post.operation_id.as_deref(), Some("createMessage"));
    assert!(post.responses.contains_key("default"));
}

#[test]
fn test_secure_config_changes_docs_scheme() {
    let config = ServerConfig {
        host: "api.example.com".to_string(),
        port: 8443,
        secure: true,
        ..ServerConfig::default()
    };
    let mut server = Server::new("chat", config);
    server.register(&Status, "");
    assert_eq!(server.api_docs().unwrap().uri, "https://api.example.com:8443");
}

#[test]
fn test_options_serves_discovery() {
    let mut server = Server::new("chat", ServerConfig::default());
    server.register(&Messages, "");
    let service = server.into_service();

    let res = service.handle(HandlerRequest::new(Method::OPTIONS, "/api/messages"));
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("allow"), Some("GET, OPTIONS, POST"));
    assert!(res.body["routes"]["Messages"].is_object());
}

#[test]
fn test_custom_engine_receives_triples() {
    #[derive(Default)]
    struct Collect(Vec<String>);
    impl HttpEngine for Collect {
        fn add(
            &mut self,
            method: Method,
            path: &str,
            _handler: ctlroute::dispatcher::Handler,
        ) -> anyhow::Result<()> {
            self.0.push(format!("{method} {path}"));
            Ok(())
        }
    }

    let mut server = Server::with_engine("x", ServerConfig::default(), Collect::default());
    server.register(&Status, "/status");
    assert_eq!(server.engine().0, ["GET /status"]);
}
