use crate::dispatcher::HandlerResponse;
use dashmap::DashMap;
use http::StatusCode;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::error;

pub(crate) fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

/// Header names whose values come from a small fixed set (route method lists,
/// content types, verifier challenges)
const BOUNDED_HEADERS: [&str; 3] = ["allow", "content-type", "www-authenticate"];

static INTERNED: Lazy<DashMap<String, &'static str>> = Lazy::new(DashMap::new);

/// Render one header line as the `&'static str` may_minihttp requires
fn header_line(name: &str, value: &str) -> &'static str {
    if name.eq_ignore_ascii_case("content-type") {
        match value {
            "application/json" => return JSON_CONTENT_TYPE,
            "text/plain; charset=utf-8" => return TEXT_CONTENT_TYPE,
            _ => {}
        }
    }

    let line = format!("{name}: {value}");
    if BOUNDED_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
        if let Some(interned) = INTERNED.get(&line) {
            return *interned;
        }
        let leaked: &'static str = Box::leak(line.clone().into_boxed_str());
        return *INTERNED.entry(line).or_insert(leaked);
    }

    // Per-request values (Set-Cookie, Location, handler headers) have no
    // bounded set to intern into; each line is leaked once per response.
    Box::leak(line.into_boxed_str())
}

static JSON_CONTENT_TYPE: &str = "Content-Type: application/json";
static TEXT_CONTENT_TYPE: &str = "Content-Type: text/plain; charset=utf-8";

/// Write a [`HandlerResponse`] onto the wire
pub fn write_handler_response(res: &mut Response, hr: HandlerResponse) {
    res.status_code(usize::from(hr.status), status_reason(hr.status));

    let has_content_type = hr.get_header("content-type").is_some();
    for (name, value) in &hr.headers {
        res.header(header_line(name, value));
    }
    for cookie in &hr.cookies {
        res.header(header_line("Set-Cookie", &cookie.header_value()));
    }

    match hr.body {
        Value::Null => {}
        Value::String(s) => {
            if !has_content_type {
                res.header(TEXT_CONTENT_TYPE);
            }
            res.body_vec(s.into_bytes());
        }
        other => {
            if !has_content_type {
                res.header(JSON_CONTENT_TYPE);
            }
            match serde_json::to_vec(&other) {
                Ok(bytes) => res.body_vec(bytes),
                Err(err) => error!(error = %err, "Failed to serialize response body"),
            }
        }
    }
}
