//! # Docs Module
//!
//! A machine-readable description of every registered route.
//!
//! The [`DocsAggregator`] is fed by the server at registration time: each
//! `(name, path, method)` registration copies the documentation fields of its
//! [`RouteDescriptor`] into an [`ApiDocs`] model grouped by controller name,
//! then path, then method. After every write the whole model is republished as
//! an immutable snapshot through a [`DocsHandle`], so request-time readers
//! always see a complete model. The authorization pipeline attaches the
//! current snapshot to each request as `HandlerRequest::docs`.
//!
//! [`discovery`] is a ready-made handler, typically returned from an `OPTIONS`
//! capability, that serves the snapshot as JSON with an `Allow` header.

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::route::{ParameterMeta, ResponseDoc, RouteDescriptor};
use crate::router::Router;
use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Documentation of one method on one path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterMeta>,
    /// One requirement object per scheme name, each with an empty scope list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<BTreeMap<String, Vec<String>>>,
    pub responses: BTreeMap<String, ResponseDoc>,
}

impl OperationDoc {
    /// Copy the documentation fields of `route`
    ///
    /// A route declaring no responses gets a `default` one.
    #[must_use]
    pub fn from_route(route: &RouteDescriptor) -> Self {
        let mut responses = route.responses().clone();
        if responses.is_empty() {
            responses.insert("default".to_string(), ResponseDoc::new("Default response"));
        }
        Self {
            summary: route.summary().map(str::to_string),
            description: route.description().map(str::to_string),
            operation_id: route.operation_id().map(str::to_string),
            consumes: route.consumes().to_vec(),
            produces: route.produces().to_vec(),
            parameters: route.parameters().to_vec(),
            security: route
                .security()
                .iter()
                .map(|name| BTreeMap::from([(name.clone(), Vec::new())]))
                .collect(),
            responses,
        }
    }
}

/// Methods keyed by lower-case method name
pub type PathDocs = BTreeMap<String, OperationDoc>;

/// The documentation model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiDocs {
    /// `scheme://host:port` of the server
    pub uri: String,
    pub title: String,
    /// name -> path -> method -> operation
    pub routes: BTreeMap<String, BTreeMap<String, PathDocs>>,
}

impl ApiDocs {
    #[must_use]
    pub fn new(uri: &str, title: &str) -> Self {
        Self {
            uri: uri.to_string(),
            title: title.to_string(),
            routes: BTreeMap::new(),
        }
    }

    /// Insert or overwrite one operation
    pub fn insert(&mut self, name: &str, path: &str, method: &http::Method, doc: OperationDoc) {
        self.routes
            .entry(name.to_string())
            .or_default()
            .entry(path.to_string())
            .or_default()
            .insert(method.as_str().to_ascii_lowercase(), doc);
    }

    #[must_use]
    pub fn operation(&self, name: &str, path: &str, method: &http::Method) -> Option<&OperationDoc> {
        self.routes
            .get(name)?
            .get(path)?
            .get(&method.as_str().to_ascii_lowercase())
    }

    /// Number of documented (name, path, method) triples
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.routes
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Upper-case methods documented for any path pattern matching `path`
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        let mut methods: Vec<String> = Vec::new();
        for (pattern, ops) in self.routes.values().flatten() {
            let matches = Router::<()>::path_to_regex(pattern)
                .map(|(re, _)| re.is_match(path))
                .unwrap_or(false);
            if !matches {
                continue;
            }
            for method in ops.keys() {
                let upper = method.to_ascii_uppercase();
                if !methods.contains(&upper) {
                    methods.push(upper);
                }
            }
        }
        methods.sort();
        methods
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if a documented schema cannot be serialized.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// YAML rendition
    ///
    /// # Errors
    ///
    /// Returns an error if a documented schema cannot be serialized.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Shared read access to the latest published [`ApiDocs`]
#[derive(Clone, Default)]
pub struct DocsHandle {
    current: Arc<ArcSwapOption<ApiDocs>>,
}

impl DocsHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, `None` until the first route is registered
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<ApiDocs>> {
        self.current.load_full()
    }

    fn publish(&self, docs: ApiDocs) {
        self.current.store(Some(Arc::new(docs)));
    }
}

impl std::fmt::Debug for DocsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.snapshot().map_or(0, |d| d.operation_count());
        f.debug_struct("DocsHandle").field("operations", &count).finish()
    }
}

/// Registration-time writer of the documentation model
#[derive(Debug, Default)]
pub struct DocsAggregator {
    docs: Option<ApiDocs>,
    handle: DocsHandle,
}

impl DocsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader side, for pipelines and tests
    #[must_use]
    pub fn handle(&self) -> DocsHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.docs.is_some()
    }

    /// Create the root entry unless it already exists
    pub fn init_root(&mut self, uri: &str, title: &str) {
        if self.docs.is_none() {
            debug!(uri = %uri, title = %title, "Documentation root created");
            self.docs = Some(ApiDocs::new(uri, title));
        }
    }

    /// Record one registered route and publish the updated model
    pub fn record(&mut self, name: &str, path: &str, method: &http::Method, route: &RouteDescriptor) {
        let docs = self.docs.get_or_insert_with(ApiDocs::default);
        docs.insert(name, path, method, OperationDoc::from_route(route));
        self.handle.publish(docs.clone());
    }

    #[must_use]
    pub fn docs(&self) -> Option<&ApiDocs> {
        self.docs.as_ref()
    }
}

/// Serve the documentation snapshot as JSON
///
/// The `Allow` header lists the methods documented for the request path.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be serialized.
pub fn discovery(req: &mut HandlerRequest) -> anyhow::Result<HandlerResponse> {
    let Some(docs) = req.docs.as_ref() else {
        return Ok(HandlerResponse::error(404, "No documentation published"));
    };
    let allow = docs.allowed_methods(&req.path).join(", ");
    let body = serde_json::to_value(docs.as_ref())?;
    Ok(HandlerResponse::json(200, body).with_header("allow", &allow))
}
