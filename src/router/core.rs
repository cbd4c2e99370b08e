use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path/query parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the route table built at
/// startup; cloning them per request is an atomic increment.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request path to a route
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// The registered pattern that matched (e.g. `/messages/{id}`)
    pub pattern: &'a str,
    /// The value stored for this route
    pub value: &'a T,
    /// Path parameters extracted from the URL (e.g., `{id}` → `("id", "123")`)
    pub path_params: ParamVec,
}

impl<T> RouteMatch<'_, T> {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when a name repeats at different depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

struct RouteEntry<T> {
    method: Method,
    pattern: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    value: T,
}

/// Router that matches HTTP requests against registered path patterns
///
/// Routes are kept in a flat table: literal routes first, then by descending
/// pattern length. Lookups are a linear scan over the routes of one method,
/// which is plenty for controller-sized route tables.
pub struct Router<T> {
    routes: Vec<RouteEntry<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> Router<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route, replacing any previous value for the same method and pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern cannot be compiled into a regex.
    pub fn add(&mut self, method: Method, pattern: &str, value: T) -> Result<(), regex::Error> {
        if let Some(existing) = self
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.pattern == pattern)
        {
            warn!(method = %method, pattern = %pattern, "Route re-registered, replacing handler");
            existing.value = value;
            return Ok(());
        }

        let (regex, param_names) = Self::path_to_regex(pattern)?;
        self.routes.push(RouteEntry {
            method,
            pattern: pattern.to_string(),
            regex,
            param_names: param_names.into_iter().map(Arc::from).collect(),
            value,
        });
        // Literal routes first, then longest patterns first
        self.routes
            .sort_by_key(|r| (r.param_names.len(), std::cmp::Reverse(r.pattern.len())));

        info!(
            routes_count = self.routes.len(),
            pattern = %pattern,
            "Route added to routing table"
        );
        Ok(())
    }

    /// Match an HTTP request to a route
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - If a matching route is found
    /// * `None` - If no route matches for this method
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        for entry in self.routes.iter().filter(|r| r.method == *method) {
            if let Some(captures) = entry.regex.captures(path) {
                let mut params = ParamVec::new();
                for (i, name) in entry.param_names.iter().enumerate() {
                    if let Some(val) = captures.get(i + 1) {
                        params.push((Arc::clone(name), val.as_str().to_string()));
                    }
                }
                debug!(
                    method = %method,
                    path = %path,
                    route_pattern = %entry.pattern,
                    path_params = ?params,
                    "Route matched"
                );
                return Some(RouteMatch {
                    pattern: &entry.pattern,
                    value: &entry.value,
                    path_params: params,
                });
            }
        }

        debug!(method = %method, path = %path, "No route matched");
        None
    }

    /// Methods registered for patterns matching `path`, in registration table order.
    ///
    /// Used to answer `405 Method Not Allowed` with a proper `Allow` header.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for entry in &self.routes {
            if entry.regex.is_match(path) && !methods.contains(&entry.method) {
                methods.push(entry.method.clone());
            }
        }
        methods
    }

    /// Number of registered (method, pattern) pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// All registered `(method, pattern)` pairs
    #[must_use]
    pub fn patterns(&self) -> Vec<(Method, String)> {
        self.routes
            .iter()
            .map(|r| (r.method.clone(), r.pattern.clone()))
            .collect()
    }

    /// Convert a path pattern to a regex and extract parameter names
    ///
    /// Both `{id}` and `:id` placeholder forms are accepted. Literal segments are
    /// escaped, and a trailing slash on the request is tolerated.
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), regex::Error> {
        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut param_names = Vec::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let name = if segment.starts_with('{') && segment.ends_with('}') {
                Some(segment.trim_start_matches('{').trim_end_matches('}'))
            } else {
                segment.strip_prefix(':')
            };
            match name {
                Some(name) => {
                    pattern.push_str("/([^/]+)");
                    param_names.push(name.to_string());
                }
                None => {
                    pattern.push('/');
                    pattern.push_str(&regex::escape(segment));
                }
            }
        }

        pattern.push_str("/?$");
        Ok((Regex::new(&pattern)?, param_names))
    }
}
