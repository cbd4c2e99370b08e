use crate::dispatcher::{HandlerRequest, HeaderVec};
use crate::ids::RequestId;
use crate::router::ParamVec;
use http::Method;
use may_minihttp::Request;
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};

/// Split a `Cookie` header into name/value pairs
#[must_use]
pub fn parse_cookies(header: Option<&str>) -> HeaderVec {
    let Some(header) = header else {
        return HeaderVec::new();
    };
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((Arc::from(name), value.to_string()))
        })
        .collect()
}

/// URL-decoded query parameters of a request target
#[must_use]
pub fn parse_query_params(target: &str) -> ParamVec {
    match target.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Parse a request body: JSON when it parses, raw text otherwise
#[must_use]
pub fn parse_body(raw: String) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str(&raw) {
        Ok(json) => Some(json),
        Err(_) => Some(Value::String(raw)),
    }
}

/// Convert a raw `may_minihttp` request into a [`HandlerRequest`].
///
/// # Errors
///
/// Fails when the method is not a valid HTTP token.
pub fn parse_request(req: Request) -> Result<HandlerRequest, http::method::InvalidMethod> {
    let method = Method::from_bytes(req.method().as_bytes())?;
    let target = req.path().to_string();
    let path = target.split('?').next().unwrap_or("/").to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase()),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();
    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    };

    let request_id = RequestId::from_header_or_new(header("x-request-id"));
    let cookies = parse_cookies(header("cookie"));
    let query_params = parse_query_params(&target);

    let mut raw = String::new();
    let body = match req.body().read_to_string(&mut raw) {
        Ok(_) => parse_body(raw),
        Err(err) => {
            warn!(request_id = %request_id, error = %err, "Failed to read request body");
            None
        }
    };

    debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        header_count = headers.len(),
        cookie_count = cookies.len(),
        query_count = query_params.len(),
        has_body = body.is_some(),
        "HTTP request parsed"
    );

    let mut parsed = HandlerRequest::new(method, &path);
    parsed.request_id = request_id;
    parsed.headers = headers;
    parsed.cookies = cookies;
    parsed.query_params = query_params;
    parsed.body = body;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies(Some("a=b; c=d;  ; e"));
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0], (Arc::from("a"), "b".to_string()));
        assert_eq!(cookies[1], (Arc::from("c"), "d".to_string()));
        assert_eq!(cookies[2], (Arc::from("e"), String::new()));
        assert!(parse_cookies(None).is_empty());
    }

    #[test]
    fn test_parse_query_params_decodes() {
        let q = parse_query_params("/p?x=1&name=J%C3%BCrgen&sp=a+b");
        assert_eq!(q.len(), 3);
        assert_eq!(q[1].1, "Jürgen");
        assert_eq!(q[2].1, "a b");
        assert!(parse_query_params("/p").is_empty());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(String::new()), None);
        assert_eq!(parse_body("{\"a\":1}".into()), Some(serde_json::json!({"a": 1})));
        assert_eq!(
            parse_body("user=alice".into()),
            Some(Value::String("user=alice".into()))
        );
    }
}
