mod common;

use common::controllers::{Messages, Status};
use common::net::{free_addr, header, parse_response, send_request};
use common::test_server::setup_may_runtime;
use common::basic_header;
use ctlroute::config::ServerConfig;
use ctlroute::controller::{Controller, Get};
use ctlroute::dispatcher::HandlerResponse;
use ctlroute::pipeline::AuthConfig;
use ctlroute::route::RouteDescriptor;
use ctlroute::security::{BasicAuthVerifier, BASIC_AUTH};
use ctlroute::server::{ServerHandle, Server};
use ctlroute::session::{MemorySessionStore, SessionMode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

struct Logout;

impl Get for Logout {
    fn get(&self, route: RouteDescriptor) -> RouteDescriptor {
        route
            .session_mode(SessionMode::Off)
            .set_handler(|_| Ok(HandlerResponse::status(200)))
    }
}

impl Controller for Logout {
    fn as_get(&self) -> Option<&dyn Get> {
        Some(self)
    }
}

struct Secret;

impl Get for Secret {
    fn get(&self, route: RouteDescriptor) -> RouteDescriptor {
        route
            .set_security([BASIC_AUTH])
            .set_handler(|req| Ok(HandlerResponse::text(200, req.username().unwrap_or("-"))))
    }
}

impl Controller for Secret {
    fn as_get(&self) -> Option<&dyn Get> {
        Some(self)
    }
}

fn start() -> ServerHandle {
    setup_may_runtime();
    let config = ServerConfig::from_toml_str(
        "stack_size = \"0x8000\"\n[session]\ncookie_name = \"sid\"\nredirect_path = \"/bye\"\n",
    )
    .unwrap();
    let store = Arc::new(MemorySessionStore::new("sid", Duration::from_secs(60)));
    let verifier = Arc::new(BasicAuthVerifier::new("ctl", |u, p| u == "ops" && p == "pw"));

    let mut server = Server::new("chat", config)
        .with_auth(AuthConfig::new().with_scheme(BASIC_AUTH, verifier))
        .with_session_store(store);
    server
        .register(&Status, "")
        .register(&Messages, "")
        .register(&Logout, "/logout")
        .register(&Secret, "/secret");

    let handle = server.start(free_addr()).unwrap();
    handle.wait_ready().unwrap();
    handle
}

fn get(handle: &ServerHandle, path: &str, extra: &str) -> (u16, Vec<String>, String) {
    let raw = send_request(
        &handle.addr(),
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n{extra}\r\n"),
    );
    parse_response(&raw)
}

#[test]
fn test_health_endpoint() {
    let handle = start();
    let (status, headers, body) = get(&handle, "/health", "");
    assert_eq!(status, 200);
    assert_eq!(header(&headers, "content-type"), Some("application/json"));
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    handle.stop();
}

#[test]
fn test_controller_route_over_the_wire() {
    let handle = start();

    let (status, _, body) = get(&handle, "/api/messages/9?fields=all", "");
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["verb"], "get");
    assert_eq!(json["path"], "/api/messages/9");

    let (status, _, _) = get(&handle, "/nowhere", "");
    assert_eq!(status, 404);
    handle.stop();
}

#[test]
fn test_logout_sets_location_and_expires_cookie() {
    let handle = start();
    let (status, headers, _) = get(&handle, "/logout", "Cookie: sid=abc\r\n");
    assert_eq!(status, 302);
    assert_eq!(header(&headers, "location"), Some("/bye"));
    let cookie = header(&headers, "set-cookie").unwrap();
    assert!(cookie.starts_with("sid=;"));
    assert!(cookie.contains("Max-Age=0"));
    handle.stop();
}

#[test]
fn test_basic_auth_over_the_wire() {
    let handle = start();

    let (status, headers, _) = get(&handle, "/secret", "");
    assert_eq!(status, 401);
    assert_eq!(header(&headers, "www-authenticate"), Some("Basic realm=\"ctl\""));

    let auth = format!("Authorization: {}\r\n", basic_header("ops", "pw"));
    let (status, headers, body) = get(&handle, "/secret", &auth);
    assert_eq!(status, 200);
    assert!(header(&headers, "content-type").unwrap().starts_with("text/plain"));
    assert_eq!(body, "ops");
    handle.stop();
}
