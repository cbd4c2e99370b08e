#![allow(dead_code)]

pub mod controllers {
    use ctlroute::controller::{Controller, Delete, Get, Options, Post, Put};
    use ctlroute::dispatcher::HandlerResponse;
    use ctlroute::docs;
    use ctlroute::route::{ParameterMeta, ResponseDoc, RouteDescriptor};
    use serde_json::json;

    fn echo(route: RouteDescriptor, verb: &'static str) -> RouteDescriptor {
        route.set_handler(move |req| {
            Ok(HandlerResponse::json(
                200,
                json!({ "verb": verb, "user": req.username(), "path": req.path }),
            ))
        })
    }

    /// Serves GET only
    pub struct Status;

    impl Get for Status {
        fn get(&self, route: RouteDescriptor) -> RouteDescriptor {
            echo(route.set_summary("Service status"), "get")
        }
    }

    impl Controller for Status {
        fn namespace(&self) -> &str {
            "app::controllers::api"
        }
        fn as_get(&self) -> Option<&dyn Get> {
            Some(self)
        }
    }

    /// Full REST plus OPTIONS discovery
    pub struct Messages;

    impl Get for Messages {
        fn get(&self, route: RouteDescriptor) -> RouteDescriptor {
            echo(
                route
                    .set_parameters(true, [ParameterMeta::path("id")])
                    .set_produces(["application/json"])
                    .set_response(200, ResponseDoc::new("message list or message")),
                "get",
            )
        }
    }

    impl Post for Messages {
        fn post(&self, route: RouteDescriptor) -> RouteDescriptor {
            echo(route.set_consumes(["application/json"]).set_operation_id("createMessage"), "post")
        }
    }

    impl Put for Messages {
        fn put(&self, route: RouteDescriptor) -> RouteDescriptor {
            echo(route.set_parameters(false, [ParameterMeta::path("id")]), "put")
        }
    }

    impl Delete for Messages {
        fn delete(&self, route: RouteDescriptor) -> RouteDescriptor {
            echo(route.set_parameters(false, [ParameterMeta::path("id")]), "delete")
        }
    }

    impl Options for Messages {
        fn options(&self, route: RouteDescriptor) -> RouteDescriptor {
            route.set_handler(docs::discovery)
        }
    }

    impl Controller for Messages {
        fn namespace(&self) -> &str {
            "chat::controllers::api"
        }
        fn as_get(&self) -> Option<&dyn Get> {
            Some(self)
        }
        fn as_post(&self) -> Option<&dyn Post> {
            Some(self)
        }
        fn as_put(&self) -> Option<&dyn Put> {
            Some(self)
        }
        fn as_delete(&self) -> Option<&dyn Delete> {
            Some(self)
        }
        fn as_options(&self) -> Option<&dyn Options> {
            Some(self)
        }
    }

    /// Implements nothing
    pub struct Inert;

    impl Controller for Inert {}
}

pub mod net {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::time::Duration;

    /// Reserve a free local port
    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Status code, header lines and body of a raw response
    pub fn parse_response(resp: &str) -> (u16, Vec<String>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        (status, lines.map(str::to_string).collect(), body.to_string())
    }

    pub fn header<'a>(headers: &'a [String], name: &str) -> Option<&'a str> {
        headers.iter().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

pub fn basic_header(user: &str, pass: &str) -> String {
    use base64::Engine as _;
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
}

pub mod test_server {
    use std::sync::Once;

    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}
