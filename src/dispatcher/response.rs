use super::HeaderVec;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A `Set-Cookie` directive attached to a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// Lifetime relative to now; `Some(ZERO)` expires the cookie immediately
    pub max_age: Option<Duration>,
    pub path: String,
    pub http_only: bool,
}

impl SetCookie {
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            max_age: None,
            path: "/".to_string(),
            http_only: true,
        }
    }

    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// A cookie that tells the client to drop `name`
    #[must_use]
    pub fn expired(name: &str) -> Self {
        Self::new(name, "").max_age(Duration::ZERO)
    }

    /// Render as the value of a `Set-Cookie` header
    #[must_use]
    pub fn header_value(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", age.as_secs()));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

/// Response produced by a handler or by the authorization pipeline
///
/// A `Value::String` body is sent as `text/plain`, `Value::Null` as an empty
/// body, anything else as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Cookies to set or clear
    pub cookies: Vec<SetCookie>,
    /// Response body
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            cookies: Vec::new(),
            body,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    /// Plain text response
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, HeaderVec::new(), Value::String(body.into()))
    }

    /// Status-only response with an empty body
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Redirect to `location` with the given status (302, 303, 307, ...)
    #[must_use]
    pub fn redirect(location: &str, status: u16) -> Self {
        let mut res = Self::status(status);
        res.set_header("location", location.to_string());
        res
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value.to_string());
        self
    }

    /// Cookie by name, as queued on this response
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&SetCookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Whether this response sends the client elsewhere
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.get_header("location").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_value() {
        let c = SetCookie::new("sid", "abc").max_age(Duration::from_secs(60));
        assert_eq!(c.header_value(), "sid=abc; Path=/; Max-Age=60; HttpOnly");
        assert_eq!(
            SetCookie::expired("sid").header_value(),
            "sid=; Path=/; Max-Age=0; HttpOnly"
        );
    }

    #[test]
    fn test_redirect() {
        let res = HandlerResponse::redirect("/login", 302);
        assert!(res.is_redirect());
        assert_eq!(res.get_header("Location"), Some("/login"));
    }
}
