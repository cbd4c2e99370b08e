//! # Authorization Pipeline
//!
//! Every registered route handler runs behind an [`AuthPipeline`]. For each
//! request it walks a fixed sequence:
//!
//! 1. **Security** - each scheme named by the route is tried in order against
//!    its configured verifier. Names without a verifier are skipped. The first
//!    success establishes the identity; the remaining schemes still run. When
//!    none succeeds only the last error is kept.
//! 2. **Session** - depending on the route's [`SessionMode`]:
//!    `Is` validates the session cookie unless security already succeeded,
//!    `On` starts a session and sets its cookie, and `Off` ends the session and
//!    redirects.
//! 3. **Failure** - a remaining error becomes a login redirect when the route
//!    uses sessions, a 401 when a verifier ran for a session-less route, and is
//!    otherwise ignored so the request proceeds anonymously.
//! 4. **Permission** - for permission-checked routes with an identity, the
//!    configured predicate may refuse with 403.
//! 5. **Dispatch** - the handler runs with the identity, session and
//!    documentation snapshot on the request.
//!
//! Cookies queued by the pipeline are attached to whichever response ends the
//! request.

use crate::dispatcher::{Handler, HandlerRequest, HandlerResponse, SetCookie};
use crate::docs::DocsHandle;
use crate::permission::Permission;
use crate::route::RouteDescriptor;
use crate::security::{AuthError, Identity, SecurityRequest, SecuritySchemes, SecurityVerifier};
use crate::session::{Session, SessionConfig, SessionMode};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether a 401 carries the error text as its body
pub type UnauthorizedHandler = Arc<dyn Fn(&AuthError) -> bool + Send + Sync>;

/// Process-wide authorization settings shared by every route
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub schemes: SecuritySchemes,
    pub session: Option<SessionConfig>,
    pub permission: Option<Permission>,
    unauthorized: Option<UnauthorizedHandler>,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_scheme(mut self, name: &str, verifier: Arc<dyn SecurityVerifier>) -> Self {
        self.schemes.register(name, verifier);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    #[must_use]
    pub fn with_unauthorized<F>(mut self, f: F) -> Self
    where
        F: Fn(&AuthError) -> bool + Send + Sync + 'static,
    {
        self.unauthorized = Some(Arc::new(f));
        self
    }

    fn expose_error(&self, err: &AuthError) -> bool {
        self.unauthorized.as_ref().is_some_and(|f| f(err))
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("schemes", &self.schemes)
            .field("session", &self.session)
            .field("permission", &self.permission)
            .field("unauthorized", &self.unauthorized.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct AuthState {
    identity: Option<Identity>,
    error: Option<AuthError>,
    /// Some scheme produced an identity
    satisfied: bool,
    /// Some configured verifier ran
    engaged: bool,
    challenge: Option<String>,
}

/// A route handler wrapped in the authorization sequence
pub struct AuthPipeline {
    security: Vec<String>,
    session: SessionMode,
    permission: bool,
    handler: Handler,
    config: Arc<AuthConfig>,
    docs: DocsHandle,
}

impl AuthPipeline {
    /// Wrap `route`'s handler; `None` when the route has no handler
    #[must_use]
    pub fn new(route: &RouteDescriptor, config: Arc<AuthConfig>, docs: DocsHandle) -> Option<Self> {
        let handler = Arc::clone(route.handler()?);
        Some(Self {
            security: route.security().to_vec(),
            session: route.session_kind(),
            permission: route.requires_permission(),
            handler,
            config,
            docs,
        })
    }

    /// The wrapped handler as registered with the engine
    #[must_use]
    pub fn into_handler(self) -> Handler {
        Arc::new(move |req: &mut HandlerRequest| self.execute(req))
    }

    /// Run the full sequence for one request.
    ///
    /// # Errors
    ///
    /// Only errors returned by the user handler or the not-permitted handler
    /// propagate; authorization failures become responses.
    pub fn execute(&self, req: &mut HandlerRequest) -> anyhow::Result<HandlerResponse> {
        let mut state = self.resolve_security(req);

        if let Some(response) = self.apply_session(req, &mut state) {
            return Ok(finish(req, response));
        }

        if let Some(err) = state.error.take() {
            if let Some(response) = self.reject(req, &err, &mut state) {
                return Ok(finish(req, response));
            }
            debug!(request_id = %req.request_id, error = %err, "Continuing anonymously");
        }

        req.identity = state.identity;

        if let Some(response) = self.check_permission(req)? {
            return Ok(finish(req, response));
        }

        req.docs = self.docs.snapshot();
        let response = (self.handler)(req)?;
        Ok(finish(req, response))
    }

    fn resolve_security(&self, req: &HandlerRequest) -> AuthState {
        let mut state = AuthState::default();
        if self.security.is_empty() {
            return state;
        }

        let sreq = SecurityRequest {
            method: &req.method,
            path: &req.path,
            headers: &req.headers,
            query: &req.query_params,
            cookies: &req.cookies,
        };
        let mut last_error = None;
        for name in &self.security {
            let Some(verifier) = self.config.schemes.get(name) else {
                debug!(scheme = %name, "Security scheme not configured, skipping");
                continue;
            };
            state.engaged = true;
            match verifier.verify(&sreq) {
                Ok(identity) => {
                    debug!(scheme = %name, username = %identity.username, "Security scheme accepted");
                    if !state.satisfied {
                        state.identity = Some(identity);
                        state.satisfied = true;
                    }
                }
                Err(err) => {
                    debug!(scheme = %name, error = %err, "Security scheme rejected");
                    if let Some(challenge) = verifier.challenge() {
                        state.challenge = Some(challenge);
                    }
                    last_error = Some(err);
                }
            }
        }
        if !state.satisfied {
            state.error = last_error;
        }
        state
    }

    /// Returns a terminal response for `Off`
    fn apply_session(&self, req: &mut HandlerRequest, state: &mut AuthState) -> Option<HandlerResponse> {
        if self.session == SessionMode::None {
            return None;
        }
        let Some(session) = self.config.session.as_ref() else {
            debug!(mode = ?self.session, "Route uses sessions but none are configured");
            return None;
        };
        let cookie_name = session.settings.cookie_name.as_str();

        match self.session {
            SessionMode::None => None,
            SessionMode::Is => {
                if state.satisfied {
                    return None;
                }
                let result = match req.get_cookie(cookie_name).map(str::to_string) {
                    None => Err(AuthError::SessionMissing),
                    Some(value) => session.store.validate(&value).map(|identity| {
                        req.session = session.store.touch(&value);
                        identity
                    }),
                };
                match result {
                    Ok(identity) => {
                        debug!(username = %identity.username, "Session valid");
                        state.identity = Some(identity);
                        state.error = None;
                    }
                    Err(err) => {
                        debug!(error = %err, "Session rejected");
                        state.error = Some(err);
                    }
                }
                None
            }
            SessionMode::On => {
                let value = session.store.generate_id();
                req.set_cookie(
                    SetCookie::new(cookie_name, &value).max_age(session.settings.expires()),
                );
                req.session = Some(Session::new(cookie_name, &value));
                debug!(request_id = %req.request_id, "Session started");
                None
            }
            SessionMode::Off => {
                if let Some(value) = req.get_cookie(cookie_name).map(str::to_string) {
                    if let Err(err) = session.store.validate(&value) {
                        debug!(error = %err, "Ending an invalid session");
                    }
                    session.store.invalidate(&value);
                }
                req.clear_cookie(cookie_name);
                req.session = None;
                debug!(request_id = %req.request_id, "Session ended");
                Some(HandlerResponse::redirect(
                    &session.settings.redirect_path,
                    session.settings.redirect_status,
                ))
            }
        }
    }

    /// 401 for security-only routes, a login redirect for session routes
    fn reject(
        &self,
        req: &HandlerRequest,
        err: &AuthError,
        state: &mut AuthState,
    ) -> Option<HandlerResponse> {
        if state.satisfied || (state.engaged && self.session == SessionMode::None) {
            warn!(request_id = %req.request_id, path = %req.path, error = %err, "Unauthorized");
            let mut response = if self.config.expose_error(err) {
                HandlerResponse::text(401, err.to_string())
            } else {
                HandlerResponse::status(401)
            };
            if let Some(challenge) = state.challenge.take() {
                response.set_header("www-authenticate", challenge);
            }
            return Some(response);
        }
        if self.session == SessionMode::None {
            return None;
        }
        match self.config.session.as_ref() {
            Some(session) => {
                debug!(
                    request_id = %req.request_id,
                    location = %session.settings.redirect_path,
                    error = %err,
                    "Redirecting to login"
                );
                Some(HandlerResponse::redirect(
                    &session.settings.redirect_path,
                    session.settings.redirect_status,
                ))
            }
            None => {
                warn!(request_id = %req.request_id, path = %req.path, error = %err, "Unauthorized");
                Some(HandlerResponse::status(401))
            }
        }
    }

    fn check_permission(&self, req: &mut HandlerRequest) -> anyhow::Result<Option<HandlerResponse>> {
        let Some(permission) = self.config.permission.as_ref() else {
            return Ok(None);
        };
        if !permission.applies_to(self.permission) || !permission.is_configured() {
            return Ok(None);
        }
        let Some(username) = req.username() else {
            return Ok(None);
        };
        if permission.check(username, &req.path) {
            return Ok(None);
        }

        warn!(request_id = %req.request_id, username = %username, path = %req.path, "Forbidden");
        let response = match permission.not_permitted_handler() {
            Some(handler) => handler(req, 403, "Forbidden")?,
            None => HandlerResponse::status(403),
        };
        Ok(Some(response))
    }
}

impl fmt::Debug for AuthPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPipeline")
            .field("security", &self.security)
            .field("session", &self.session)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

/// Attach cookies queued on the request unless the response set its own
fn finish(req: &mut HandlerRequest, mut response: HandlerResponse) -> HandlerResponse {
    for cookie in req.take_pending_cookies() {
        if response.get_cookie(&cookie.name).is_none() {
            response.cookies.push(cookie);
        }
    }
    response
}
