//! Endpoints: the declarative unit binding a route to a handler, an auth
//! policy and a serializer.
//!
//! # Dispatch pipeline
//!
//! ```text
//! Received ─▶ Authenticating ─▶ Authorizing ─▶ Buffering ─▶ Handling ─▶ Serializing ─▶ Responded
//!                   │                 │
//!                   └──▶ Rejected ◀───┘   (401, body never read, handler never invoked)
//! ```
//!
//! When served through an [`Api`](crate::Api) the request body is only read
//! once the request is admitted, so an unauthenticated caller gets 401 whatever
//! the size of its body.
//!
//! Handling runs the endpoint's [`RequestMiddleware`] chain and then the
//! handler. Errors from either go through the endpoint's [`ErrorMap`], then
//! each middleware's map, and otherwise become an [`AppError`].

use crate::error::AppError;
use crate::error_map::ErrorMap;
use crate::middleware::RequestMiddleware;
use crate::reply::{Outcome, Reply};
use crate::request::ApiRequest;
use crate::serializer::{Format, Serializer};
use axum::body::Body;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use rest_toolkit_auth::{AllowAll, Authenticator, Authorizer, NoAuthorization};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Result type returned by handlers.
pub type HandlerResult = anyhow::Result<Outcome>;

/// Application code run for a request that passed authentication and
/// authorization.
///
/// Implemented for every `Fn(&ApiRequest) -> anyhow::Result<O>` where `O`
/// converts into an [`Outcome`] (a [`Reply`], a `serde_json::Value`, a
/// `(Value, StatusCode)` pair, a raw `Response`, ...).
pub trait Handler: Send + Sync {
    /// Handle the request.
    ///
    /// # Errors
    ///
    /// Any error; the endpoint maps it to a response.
    fn call(&self, request: &ApiRequest) -> HandlerResult;
}

impl<F, O> Handler for F
where
    F: Fn(&ApiRequest) -> anyhow::Result<O> + Send + Sync,
    O: Into<Outcome>,
{
    fn call(&self, request: &ApiRequest) -> HandlerResult {
        self(request).map(Into::into)
    }
}

/// Pipeline stage, used in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Running the authenticator.
    Authenticating,
    /// Running the authorizer.
    Authorizing,
    /// Reading the request body.
    Buffering,
    /// Running middleware and the handler.
    Handling,
    /// Encoding the handler result.
    Serializing,
}

impl Stage {
    /// Lowercase name of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authenticating => "authenticating",
            Self::Authorizing => "authorizing",
            Self::Buffering => "buffering",
            Self::Handling => "handling",
            Self::Serializing => "serializing",
        }
    }

    /// Whether a failure at this stage is an authentication or authorization
    /// rejection.
    #[must_use]
    pub const fn is_access_check(self) -> bool {
        matches!(self, Self::Authenticating | Self::Authorizing)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable binding of methods, path, handler, auth policy and serializer.
///
/// Authentication defaults to [`AllowAll`] and authorization to
/// [`NoAuthorization`], i.e. an open endpoint. The serializer defaults to the
/// one of the [`Api`](crate::Api) the endpoint is registered with.
///
/// # Example
///
/// ```ignore
/// let endpoint = Endpoint::get("/task/basic", get_tasks)
///     .with_auth(BasicAuth::new(is_valid_user))
///     .on_error::<TaskConflict>(StatusCode::CONFLICT);
/// ```
pub struct Endpoint {
    methods: Vec<Method>,
    path: String,
    handler: Arc<dyn Handler>,
    authentication: Arc<dyn Authenticator<ApiRequest>>,
    authorization: Arc<dyn Authorizer<ApiRequest>>,
    serializer: Option<Arc<dyn Serializer>>,
    errors: ErrorMap,
    middleware: Vec<Arc<dyn RequestMiddleware>>,
}

impl Endpoint {
    /// Create an open endpoint answering `method` on `path`.
    ///
    /// `path` is relative to the API version prefix and uses Axum's syntax for
    /// parameters (`/task/:task_id/`).
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self {
            methods: vec![method],
            path: path.into(),
            handler: Arc::new(handler),
            authentication: Arc::new(AllowAll),
            authorization: Arc::new(NoAuthorization),
            serializer: None,
            errors: ErrorMap::new(),
            middleware: Vec::new(),
        }
    }

    /// `GET` endpoint.
    #[must_use]
    pub fn get(path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(Method::GET, path, handler)
    }

    /// `POST` endpoint.
    #[must_use]
    pub fn post(path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(Method::POST, path, handler)
    }

    /// `PUT` endpoint.
    #[must_use]
    pub fn put(path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(Method::PUT, path, handler)
    }

    /// `PATCH` endpoint.
    #[must_use]
    pub fn patch(path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(Method::PATCH, path, handler)
    }

    /// `DELETE` endpoint.
    #[must_use]
    pub fn delete(path: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self::new(Method::DELETE, path, handler)
    }

    /// Answer every method in `methods` with the same handler.
    #[must_use]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Use `authentication` for the authentication stage.
    #[must_use]
    pub fn with_authentication(
        mut self,
        authentication: impl Authenticator<ApiRequest> + 'static,
    ) -> Self {
        self.authentication = Arc::new(authentication);
        self
    }

    /// Use `authorization` for the authorization stage.
    #[must_use]
    pub fn with_authorization(mut self, authorization: impl Authorizer<ApiRequest> + 'static) -> Self {
        self.authorization = Arc::new(authorization);
        self
    }

    /// Use one strategy for both stages.
    #[must_use]
    pub fn with_auth<S>(mut self, strategy: S) -> Self
    where
        S: Authenticator<ApiRequest> + Authorizer<ApiRequest> + 'static,
    {
        let strategy = Arc::new(strategy);
        self.authentication = Arc::clone(&strategy) as Arc<dyn Authenticator<ApiRequest>>;
        self.authorization = strategy;
        self
    }

    /// Serialize replies with `serializer` instead of the API default.
    #[must_use]
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Serialize replies with the named `format` instead of the API default.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.serializer = Some(format.serializer());
        self
    }

    /// Replace the error rules.
    #[must_use]
    pub fn with_errors(mut self, errors: ErrorMap) -> Self {
        self.errors = errors;
        self
    }

    /// Answer handler errors of type `E` with `status` and an empty body.
    #[must_use]
    pub fn on_error<E>(mut self, status: StatusCode) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.errors = self.errors.on::<E>(status);
        self
    }

    /// Append a request middleware.
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl RequestMiddleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Methods this endpoint answers.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Path relative to the API version prefix.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn serializer(&self) -> Option<&Arc<dyn Serializer>> {
        self.serializer.as_ref()
    }

    /// Run the full pipeline for `request` and build the response.
    ///
    /// Synchronous: strategies, middleware and handler run on the calling
    /// task. `serializer` is used when the endpoint has none of its own.
    pub fn dispatch(&self, request: &ApiRequest, serializer: &dyn Serializer) -> Response {
        let started = Instant::now();
        let result = self
            .admit(request)
            .and_then(|()| self.respond(request, serializer));
        self.finish(request.path(), started, result)
    }

    /// Authentication then authorization.
    pub(crate) fn admit(&self, request: &ApiRequest) -> Result<(), (Stage, AppError)> {
        tracing::debug!(stage = %Stage::Authenticating, "dispatch");
        self.authentication
            .authenticate(request)
            .map_err(|e| (Stage::Authenticating, AppError::from(e)))?;

        tracing::debug!(stage = %Stage::Authorizing, "dispatch");
        self.authorization
            .authorize(request)
            .map_err(|e| (Stage::Authorizing, AppError::from(e)))
    }

    /// Middleware, handler and serialization for an admitted request.
    pub(crate) fn respond(
        &self,
        request: &ApiRequest,
        serializer: &dyn Serializer,
    ) -> Result<Response, (Stage, AppError)> {
        tracing::debug!(stage = %Stage::Handling, "dispatch");
        let outcome = match self.handle(request) {
            Ok(outcome) => outcome,
            Err(err) => self.recover(err).map_err(|e| (Stage::Handling, e))?,
        };

        tracing::debug!(stage = %Stage::Serializing, "dispatch");
        let serializer: &dyn Serializer = match &self.serializer {
            Some(own) => own.as_ref(),
            None => serializer,
        };
        render(outcome, serializer).map_err(|e| (Stage::Serializing, e))
    }

    /// Turn the pipeline result into a response and record it.
    pub(crate) fn finish(
        &self,
        route: &str,
        started: Instant,
        result: Result<Response, (Stage, AppError)>,
    ) -> Response {
        let response = match result {
            Ok(response) => response,
            Err((stage, err)) => {
                if stage.is_access_check() {
                    tracing::warn!(route = %route, stage = %stage, "request rejected");
                    metrics::counter!(
                        "rest_toolkit_auth_rejections_total",
                        "route" => self.path.clone(),
                        "stage" => stage.as_str()
                    )
                    .increment(1);
                }
                err.into_response()
            }
        };

        metrics::counter!(
            "rest_toolkit_requests_total",
            "route" => self.path.clone(),
            "status" => response.status().as_u16().to_string()
        )
        .increment(1);
        metrics::histogram!("rest_toolkit_request_duration_seconds", "route" => self.path.clone())
            .record(started.elapsed().as_secs_f64());

        response
    }

    fn handle(&self, request: &ApiRequest) -> HandlerResult {
        for middleware in &self.middleware {
            if let Some(outcome) = middleware.process_request(request)? {
                tracing::debug!("middleware answered the request");
                return Ok(outcome);
            }
        }
        self.handler.call(request)
    }

    fn recover(&self, err: anyhow::Error) -> Result<Outcome, AppError> {
        if let Some(outcome) = self.errors.resolve(&err) {
            return Ok(outcome);
        }
        self.middleware
            .iter()
            .find_map(|middleware| middleware.errors().resolve(&err))
            .ok_or_else(|| AppError::from(err))
    }
}

/// Turn an outcome into a response, serializing replies.
fn render(outcome: Outcome, serializer: &dyn Serializer) -> Result<Response, AppError> {
    let reply: Reply = match outcome {
        Outcome::Response(response) => return Ok(response),
        Outcome::Reply(reply) => reply,
    };

    let (data, status, headers) = reply.into_parts();
    let body = serializer
        .serialize(&data)
        .map_err(|e| AppError::internal("Failed to serialize response").with_source(e.into()))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().extend(headers);
    // A Content-Type chosen by the handler wins over the serializer's.
    if !response.headers().contains_key(header::CONTENT_TYPE) {
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(serializer.content_type()),
        );
    }
    Ok(response)
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("methods", &self.methods)
            .field("path", &self.path)
            .field("serializer", &self.serializer)
            .field("errors", &self.errors)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}
