use super::response::SetCookie;
use super::HeaderVec;
use crate::docs::ApiDocs;
use crate::ids::RequestId;
use crate::router::ParamVec;
use crate::security::Identity;
use crate::session::Session;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Request context handed to every handler
///
/// Carries the parsed HTTP request plus the state the authorization pipeline
/// establishes before the user handler runs: the authenticated [`Identity`],
/// the active [`Session`] record, and a snapshot of the documentation model.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Path parameters extracted from the URL
    pub path_params: ParamVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// HTTP headers (lowercase names)
    pub headers: HeaderVec,
    /// Cookies parsed from the Cookie header
    pub cookies: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// Principal established by a security scheme or a session cookie
    pub identity: Option<Identity>,
    /// Session record attached by the pipeline (`Is` refresh or `On` creation)
    pub session: Option<Session>,
    /// Documentation snapshot, set by the pipeline before dispatch
    pub docs: Option<Arc<ApiDocs>>,
    pending_cookies: Vec<SetCookie>,
}

impl HandlerRequest {
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            path_params: ParamVec::new(),
            query_params: ParamVec::new(),
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            body: None,
            identity: None,
            session: None,
            docs: None,
            pending_cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query_params.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name
    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Username of the authenticated principal, if any
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }

    /// Queue a `Set-Cookie` for whatever response ends this request
    pub fn set_cookie(&mut self, cookie: SetCookie) {
        self.pending_cookies.retain(|c| c.name != cookie.name);
        self.pending_cookies.push(cookie);
    }

    /// Queue an expiring `Set-Cookie` that removes `name` on the client
    pub fn clear_cookie(&mut self, name: &str) {
        self.set_cookie(SetCookie::expired(name));
    }

    /// Cookies queued so far, in queue order
    #[must_use]
    pub fn pending_cookies(&self) -> &[SetCookie] {
        &self.pending_cookies
    }

    pub(crate) fn take_pending_cookies(&mut self) -> Vec<SetCookie> {
        std::mem::take(&mut self.pending_cookies)
    }

    /// Convert query_params to HashMap
    /// Note: This allocates - use get_query_param() in hot paths
    #[must_use]
    pub fn query_params_map(&self) -> HashMap<String, String> {
        self.query_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HandlerRequest::new(Method::GET, "/").with_header("Authorization", "Basic x");
        assert_eq!(req.get_header("authorization"), Some("Basic x"));
        assert_eq!(req.get_header("AUTHORIZATION"), Some("Basic x"));
    }

    #[test]
    fn test_set_cookie_replaces_same_name() {
        let mut req = HandlerRequest::new(Method::GET, "/");
        req.set_cookie(SetCookie::new("sid", "a"));
        req.clear_cookie("sid");
        assert_eq!(req.pending_cookies().len(), 1);
        assert_eq!(req.pending_cookies()[0].value, "");
    }
}
