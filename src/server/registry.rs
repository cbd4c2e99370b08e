use super::http_server::{HttpServer, ServerHandle};
use super::service::AppService;
use crate::config::ServerConfig;
use crate::controller::{supported_verbs, Controller, Verb};
use crate::dispatcher::{Dispatcher, HttpEngine};
use crate::docs::{ApiDocs, DocsAggregator, DocsHandle};
use crate::naming::{resolve, type_ident, Registration};
use crate::pipeline::{AuthConfig, AuthPipeline};
use crate::route::RouteDescriptor;
use crate::session::{SessionConfig, SessionStore};
use std::io;
use std::net::ToSocketAddrs;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Binds controllers to an [`HttpEngine`]
///
/// Registration is sequential and happens before serving. Authorization
/// settings must be installed with [`with_auth`](Self::with_auth) (or
/// [`with_session_store`](Self::with_session_store)) before the first
/// `register` call; routes capture the settings current at registration.
pub struct Server<E: HttpEngine = Dispatcher> {
    name: String,
    config: ServerConfig,
    auth: Arc<AuthConfig>,
    engine: E,
    docs: DocsAggregator,
}

impl Server<Dispatcher> {
    /// Server backed by the in-process [`Dispatcher`]
    #[must_use]
    pub fn new(name: &str, config: ServerConfig) -> Self {
        Self::with_engine(name, config, Dispatcher::new())
    }

    /// Freeze the routing table into a `may_minihttp` service
    #[must_use]
    pub fn into_service(self) -> AppService {
        AppService::new(self.engine)
    }

    /// Apply the configured coroutine stack size and start serving on `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        may::config().set_stack_size(self.config.stack_size);
        info!(
            server = %self.name,
            stack_size = self.config.stack_size,
            routes = self.engine.router().len(),
            "Starting HTTP server"
        );
        HttpServer(self.into_service()).start(addr)
    }
}

impl<E: HttpEngine> Server<E> {
    #[must_use]
    pub fn with_engine(name: &str, config: ServerConfig, engine: E) -> Self {
        Self {
            name: name.to_string(),
            config,
            auth: Arc::new(AuthConfig::default()),
            engine,
            docs: DocsAggregator::new(),
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    /// Enable sessions using the `[session]` settings of the server config
    /// (defaults when absent) backed by `store`
    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        let settings = self.config.session.clone().unwrap_or_default();
        Arc::make_mut(&mut self.auth).session = Some(SessionConfig::new(settings, store));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Documentation recorded so far
    #[must_use]
    pub fn api_docs(&self) -> Option<&ApiDocs> {
        self.docs.docs()
    }

    /// Reader for the published documentation snapshot
    #[must_use]
    pub fn docs_handle(&self) -> DocsHandle {
        self.docs.handle()
    }

    /// Register `controller` at `path`; an empty path is derived from the
    /// controller's namespace and type name
    pub fn register<C: Controller>(&mut self, controller: &C, path: &str) -> &mut Self {
        let mut reg = Registration::new();
        if !path.is_empty() {
            reg = reg.path(path);
        }
        self.register_ext(controller, reg)
    }

    /// Register `controller` with explicit overrides
    pub fn register_ext<C: Controller>(&mut self, controller: &C, reg: Registration) -> &mut Self {
        let verbs = supported_verbs(controller);
        if verbs.is_empty() {
            debug!(controller = %type_ident::<C>(), "Controller exposes no verb capability, ignored");
            return self;
        }

        let resolved = resolve(controller.namespace(), &type_ident::<C>(), &reg);
        for verb in verbs {
            if let Some(route) = verb.configure(controller, RouteDescriptor::new()) {
                self.add(&resolved.name, verb, &resolved.path, &route);
            }
        }
        self
    }

    fn add(&mut self, name: &str, verb: Verb, path: &str, route: &RouteDescriptor) {
        let method = verb.method();
        let Some(pipeline) = AuthPipeline::new(route, Arc::clone(&self.auth), self.docs.handle())
        else {
            debug!(controller = %name, method = %method, path = %path, "No handler, route skipped");
            return;
        };
        let handler = pipeline.into_handler();

        for variant in route.path_variants(path) {
            if let Err(err) = self.engine.add(method.clone(), &variant, Arc::clone(&handler)) {
                error!(
                    controller = %name,
                    method = %method,
                    path = %variant,
                    error = %err,
                    "Failed to register route"
                );
                continue;
            }
            if !self.docs.is_initialized() {
                self.docs.init_root(&self.config.base_uri(), &self.name);
            }
            self.docs.record(name, &variant, &method, route);
            info!(
                controller = %name,
                method = %method,
                path = %variant,
                security = ?route.security(),
                session = ?route.session_kind(),
                permission = route.requires_permission(),
                "Route registered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Get, Options, Post};
    use crate::dispatcher::{Handler, HandlerResponse};
    use crate::route::ParameterMeta;
    use http::Method;

    #[derive(Default)]
    struct RecordingEngine {
        added: Vec<(Method, String)>,
    }

    impl HttpEngine for RecordingEngine {
        fn add(&mut self, method: Method, path: &str, _handler: Handler) -> anyhow::Result<()> {
            self.added.push((method, path.to_string()));
            Ok(())
        }
    }

    struct Items;
    impl Get for Items {
        fn get(&self, route: RouteDescriptor) -> RouteDescriptor {
            route
                .set_parameters(true, [ParameterMeta::path("id")])
                .set_handler(|_| Ok(HandlerResponse::status(200)))
        }
    }
    impl Post for Items {
        fn post(&self, route: RouteDescriptor) -> RouteDescriptor {
            route.empty_handler()
        }
    }
    impl Controller for Items {
        fn namespace(&self) -> &str {
            "shop::controllers::catalog"
        }
        fn as_get(&self) -> Option<&dyn Get> {
            Some(self)
        }
        fn as_post(&self) -> Option<&dyn Post> {
            Some(self)
        }
    }

    struct Orphan;
    impl Options for Orphan {
        fn options(&self, route: RouteDescriptor) -> RouteDescriptor {
            route.set_handler(|_| Ok(HandlerResponse::status(200)))
        }
    }
    impl Controller for Orphan {
        fn as_options(&self) -> Option<&dyn Options> {
            Some(self)
        }
    }

    fn server() -> Server<RecordingEngine> {
        Server::with_engine("test", ServerConfig::default(), RecordingEngine::default())
    }

    #[test]
    fn test_derived_path_and_variants() {
        let mut s = server();
        s.register(&Items, "");
        assert_eq!(
            s.engine().added,
            [
                (Method::GET, "/catalog/items".to_string()),
                (Method::GET, "/catalog/items/{id}".to_string()),
            ]
        );
        let docs = s.api_docs().unwrap();
        assert_eq!(docs.uri, "http://127.0.0.1:8080");
        assert_eq!(docs.title, "test");
        assert!(docs.operation("Items", "/catalog/items/{id}", &Method::GET).is_some());
        assert!(docs.operation("Items", "/catalog/items", &Method::POST).is_none());
    }

    #[test]
    fn test_options_alone_registers_nothing() {
        let mut s = server();
        s.register(&Orphan, "/x");
        assert!(s.engine().added.is_empty());
        assert!(s.api_docs().is_none());
    }

    #[test]
    fn test_explicit_path_wins() {
        let mut s = server();
        s.register(&Items, "/v2/things");
        assert_eq!(s.engine().added[0].1, "/v2/things");
    }

    #[test]
    fn test_session_store_uses_config_settings() {
        let mut config = ServerConfig::default();
        config.session = Some(crate::session::SessionSettings {
            cookie_name: "sid".to_string(),
            ..Default::default()
        });
        let store = Arc::new(crate::session::MemorySessionStore::new(
            "sid",
            std::time::Duration::from_secs(60),
        ));
        let s = Server::new("t", config).with_session_store(store);
        let session = s.auth().session.as_ref().unwrap();
        assert_eq!(session.settings.cookie_name, "sid");
    }
}
