use crate::dispatcher::{HandlerRequest, HandlerResponse, Handler};
use crate::session::SessionMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "Path"),
            ParameterLocation::Query => write!(f, "Query"),
            ParameterLocation::Header => write!(f, "Header"),
            ParameterLocation::Cookie => write!(f, "Cookie"),
        }
    }
}

/// A documented request parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMeta {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(rename = "allowEmptyValue", default)]
    pub allow_empty_value: bool,
}

impl ParameterMeta {
    #[must_use]
    pub fn new(name: &str, location: ParameterLocation) -> Self {
        Self {
            name: name.to_string(),
            location,
            // path parameters are required unless the route allows empty variants
            required: location == ParameterLocation::Path,
            description: None,
            schema: None,
            allow_empty_value: false,
        }
    }

    #[must_use]
    pub fn path(name: &str) -> Self {
        Self::new(name, ParameterLocation::Path)
    }

    #[must_use]
    pub fn query(name: &str) -> Self {
        Self::new(name, ParameterLocation::Query)
    }

    #[must_use]
    pub fn header(name: &str) -> Self {
        Self::new(name, ParameterLocation::Header)
    }

    #[must_use]
    pub fn cookie(name: &str) -> Self {
        Self::new(name, ParameterLocation::Cookie)
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// A documented response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDoc {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ResponseDoc {
    #[must_use]
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            schema: None,
        }
    }

    #[must_use]
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Everything a controller declares about one HTTP method on its path
///
/// Controllers receive a fresh descriptor per verb and configure it fluently:
///
/// ```rust
/// use ctlroute::route::{ParameterMeta, ResponseDoc, RouteDescriptor};
/// use ctlroute::dispatcher::HandlerResponse;
/// use ctlroute::security::BASIC_AUTH;
///
/// let route = RouteDescriptor::new()
///     .set_parameters(true, [ParameterMeta::path("id")])
///     .set_produces(["application/json"])
///     .set_summary("Fetch a message")
///     .set_response(200, ResponseDoc::new("the message"))
///     .set_security([BASIC_AUTH])
///     .permission()
///     .set_handler(|req| Ok(HandlerResponse::text(200, req.get_path_param("id").unwrap_or("all"))));
///
/// assert!(route.has_handler());
/// assert_eq!(route.path_variants("/api/messages"), ["/api/messages", "/api/messages/{id}"]);
/// ```
///
/// Once the server wraps the handler the descriptor is frozen behind an `Arc`.
#[derive(Clone, Default)]
pub struct RouteDescriptor {
    allow_empty_params: bool,
    parameters: Vec<ParameterMeta>,
    consumes: Vec<String>,
    produces: Vec<String>,
    operation_id: Option<String>,
    responses: BTreeMap<String, ResponseDoc>,
    summary: Option<String>,
    description: Option<String>,
    security: Vec<String>,
    session: SessionMode,
    permission: bool,
    handler: Option<Handler>,
}

impl RouteDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the route's parameters
    ///
    /// Path parameters become `{name}` placeholders appended to the controller
    /// path in declaration order. With `allow_empty` every shorter prefix is
    /// routed as well, down to the bare path, and the path parameters are
    /// documented as optional.
    #[must_use]
    pub fn set_parameters(
        mut self,
        allow_empty: bool,
        params: impl IntoIterator<Item = ParameterMeta>,
    ) -> Self {
        self.allow_empty_params = allow_empty;
        for mut param in params {
            if param.location == ParameterLocation::Path {
                param.allow_empty_value = allow_empty;
                param.required = !allow_empty;
            }
            self.parameters.push(param);
        }
        self
    }

    /// Request content types
    #[must_use]
    pub fn set_consumes<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.consumes = types.into_iter().map(Into::into).collect();
        self
    }

    /// Response content types
    #[must_use]
    pub fn set_produces<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.produces = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn set_operation_id(mut self, id: &str) -> Self {
        self.operation_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn set_default_response(mut self, response: ResponseDoc) -> Self {
        self.responses.insert("default".to_string(), response);
        self
    }

    #[must_use]
    pub fn set_response(mut self, status: u16, response: ResponseDoc) -> Self {
        self.responses.insert(status.to_string(), response);
        self
    }

    #[must_use]
    pub fn set_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    #[must_use]
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Append security scheme names; they are tried in order at request time
    #[must_use]
    pub fn set_security<S: Into<String>>(mut self, schemes: impl IntoIterator<Item = S>) -> Self {
        self.security.extend(schemes.into_iter().map(Into::into));
        self
    }

    /// Require a valid session (`SessionMode::Is`)
    #[must_use]
    pub fn session(self) -> Self {
        self.session_mode(SessionMode::Is)
    }

    #[must_use]
    pub fn session_mode(mut self, mode: SessionMode) -> Self {
        self.session = mode;
        self
    }

    /// Subject the route to the permission predicate
    #[must_use]
    pub fn permission(mut self) -> Self {
        self.permission = true;
        self
    }

    #[must_use]
    pub fn set_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(f));
        self
    }

    /// Install an already shared handler
    #[must_use]
    pub fn set_shared_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Declare that this verb is not served; the route is skipped at registration
    #[must_use]
    pub fn empty_handler(mut self) -> Self {
        self.handler = None;
        self
    }

    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    #[must_use]
    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    #[must_use]
    pub fn allows_empty_params(&self) -> bool {
        self.allow_empty_params
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterMeta] {
        &self.parameters
    }

    #[must_use]
    pub fn consumes(&self) -> &[String] {
        &self.consumes
    }

    #[must_use]
    pub fn produces(&self) -> &[String] {
        &self.produces
    }

    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    #[must_use]
    pub fn responses(&self) -> &BTreeMap<String, ResponseDoc> {
        &self.responses
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn security(&self) -> &[String] {
        &self.security
    }

    #[must_use]
    pub fn session_kind(&self) -> SessionMode {
        self.session
    }

    #[must_use]
    pub fn requires_permission(&self) -> bool {
        self.permission
    }

    /// Names of the path parameters, in declaration order
    #[must_use]
    pub fn path_placeholders(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Concrete path patterns this route is registered under
    #[must_use]
    pub fn path_variants(&self, base: &str) -> Vec<String> {
        let placeholders = self.path_placeholders();
        let mut current = base.trim_end_matches('/').to_string();
        if placeholders.is_empty() || self.allow_empty_params {
            let mut variants = vec![if current.is_empty() {
                "/".to_string()
            } else {
                current.clone()
            }];
            for name in placeholders {
                current = format!("{current}/{{{name}}}");
                variants.push(current.clone());
            }
            return variants;
        }
        for name in placeholders {
            current = format!("{current}/{{{name}}}");
        }
        vec![current]
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("parameters", &self.parameters)
            .field("operation_id", &self.operation_id)
            .field("security", &self.security)
            .field("session", &self.session)
            .field("permission", &self.permission)
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults_to_is() {
        let route = RouteDescriptor::new().session();
        assert_eq!(route.session_kind(), SessionMode::Is);
        assert_eq!(RouteDescriptor::new().session_kind(), SessionMode::None);
    }

    #[test]
    fn test_responses_keyed_by_status_and_default() {
        let route = RouteDescriptor::new()
            .set_response(404, ResponseDoc::new("missing"))
            .set_default_response(ResponseDoc::new("anything else"));
        let keys: Vec<&String> = route.responses().keys().collect();
        assert_eq!(keys, ["404", "default"]);
    }

    #[test]
    fn test_security_is_ordered_and_appends() {
        let route = RouteDescriptor::new()
            .set_security(["basicAuth"])
            .set_security(["apiKeyAuth", "digestAuth"]);
        assert_eq!(route.security(), ["basicAuth", "apiKeyAuth", "digestAuth"]);
    }

    #[test]
    fn test_path_parameters_follow_allow_empty_flag() {
        let route = RouteDescriptor::new().set_parameters(
            true,
            [ParameterMeta::path("id"), ParameterMeta::query("limit")],
        );
        let id = &route.parameters()[0];
        assert!(id.allow_empty_value);
        assert!(!id.required);
        assert!(!route.parameters()[1].allow_empty_value);
    }

    #[test]
    fn test_path_variants() {
        let strict = RouteDescriptor::new()
            .set_parameters(false, [ParameterMeta::path("a"), ParameterMeta::path("b")]);
        assert_eq!(strict.path_variants("/x/"), ["/x/{a}/{b}"]);

        let optional = RouteDescriptor::new()
            .set_parameters(true, [ParameterMeta::path("a"), ParameterMeta::path("b")]);
        assert_eq!(optional.path_variants("/x"), ["/x", "/x/{a}", "/x/{a}/{b}"]);

        assert_eq!(RouteDescriptor::new().path_variants("/"), ["/"]);
        assert_eq!(RouteDescriptor::new().path_variants("/x"), ["/x"]);
    }

    #[test]
    fn test_empty_handler_clears() {
        let route = RouteDescriptor::new()
            .set_handler(|_| Ok(HandlerResponse::status(200)))
            .empty_handler();
        assert!(!route.has_handler());
    }
}
