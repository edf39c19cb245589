//! Versioned endpoint registry.
//!
//! An [`Api`] owns a version segment and a default serializer. Endpoints
//! registered with it are served under `/{version}{path}`. Once every endpoint
//! is registered, [`Api::into_router`] freezes the table into an Axum
//! [`Router`]; several versions are served side by side with `Router::merge`.
//!
//! ```ignore
//! let mut v1 = Api::new("v1");
//! v1.register_endpoint(Endpoint::get("/task/", list_tasks))?
//!   .register_endpoint(Endpoint::post("/task/", create_task))?;
//!
//! let app = v1.into_router().merge(v2.into_router());
//! ```

use crate::config::ApiConfig;
use crate::endpoint::{Endpoint, Stage};
use crate::error::{AppError, RegistrationError};
use crate::request::ApiRequest;
use crate::request_id::request_id_layer;
use crate::serializer::Serializer;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Request};
use axum::http::Method;
use axum::response::Response;
use axum::routing::{MethodFilter, MethodRouter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// One registered `(method, path)` pair.
#[derive(Debug)]
struct Route {
    method: Method,
    filter: MethodFilter,
    path: String,
    endpoint: Arc<Endpoint>,
}

/// Everything a route needs at request time.
#[derive(Debug)]
struct RouteContext {
    endpoint: Arc<Endpoint>,
    version: Arc<str>,
    serializer: Arc<dyn Serializer>,
    max_body_bytes: usize,
}

/// A versioned collection of endpoints.
#[derive(Debug)]
pub struct Api {
    version: Arc<str>,
    serializer: Arc<dyn Serializer>,
    max_body_bytes: usize,
    routes: Vec<Route>,
}

impl Api {
    /// Api served under `/{version}` with the default configuration.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self::from_config(ApiConfig::new(version))
    }

    /// Api built from `config`.
    #[must_use]
    pub fn from_config(config: ApiConfig) -> Self {
        Self {
            version: Arc::from(config.version),
            serializer: config.format.serializer(),
            max_body_bytes: config.max_body_bytes,
            routes: Vec::new(),
        }
    }

    /// Replace the default serializer.
    #[must_use]
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Version segment.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// URL prefix, `/{version}`.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("/{}", self.version)
    }

    /// Register an endpoint under this Api's prefix.
    ///
    /// Accepts an [`Endpoint`] or an `Arc<Endpoint>`; the latter lets one
    /// endpoint be shared by several Apis. Either every method of the endpoint
    /// is registered or none is.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EmptyMethods`] if the endpoint has no methods
    /// - [`RegistrationError::UnsupportedMethod`] if Axum cannot route a method
    /// - [`RegistrationError::DuplicateRoute`] if a method and path pair is
    ///   already taken
    pub fn register_endpoint(
        &mut self,
        endpoint: impl Into<Arc<Endpoint>>,
    ) -> Result<&mut Self, RegistrationError> {
        let endpoint = endpoint.into();
        let path = self.full_path(endpoint.path());

        if endpoint.methods().is_empty() {
            return Err(RegistrationError::EmptyMethods(path));
        }

        let mut pending = Vec::with_capacity(endpoint.methods().len());
        for method in endpoint.methods() {
            let filter = MethodFilter::try_from(method.clone())
                .map_err(|_| RegistrationError::UnsupportedMethod(method.clone()))?;

            let taken = self
                .routes
                .iter()
                .chain(pending.iter())
                .any(|route| route.method == *method && route.path == path);
            if taken {
                return Err(RegistrationError::DuplicateRoute {
                    method: method.clone(),
                    path,
                });
            }

            pending.push(Route {
                method: method.clone(),
                filter,
                path: path.clone(),
                endpoint: Arc::clone(&endpoint),
            });
        }

        for route in &pending {
            tracing::debug!(method = %route.method, path = %route.path, "endpoint registered");
        }
        self.routes.extend(pending);
        Ok(self)
    }

    /// Registered `(method, full path)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> + '_ {
        self.routes
            .iter()
            .map(|route| (&route.method, route.path.as_str()))
    }

    /// Freeze the registry into an Axum router.
    ///
    /// Routes sharing a path are served by one method router. The request id
    /// layer is applied to every route.
    #[must_use]
    pub fn into_router(self) -> Router {
        let mut by_path: Vec<(String, Vec<Route>)> = Vec::new();
        for route in self.routes {
            match by_path.iter_mut().find(|(path, _)| *path == route.path) {
                Some((_, routes)) => routes.push(route),
                None => by_path.push((route.path.clone(), vec![route])),
            }
        }

        let mut router: Router = Router::new();
        for (path, routes) in by_path {
            let mut methods: MethodRouter = MethodRouter::new();
            for route in routes {
                let context = Arc::new(RouteContext {
                    endpoint: route.endpoint,
                    version: Arc::clone(&self.version),
                    serializer: Arc::clone(&self.serializer),
                    max_body_bytes: self.max_body_bytes,
                });
                let handler =
                    move |params: Option<Path<HashMap<String, String>>>, request: Request| {
                        let context = Arc::clone(&context);
                        async move { serve(&context, params, request).await }
                    };
                methods = methods.on(route.filter, handler);
            }
            router = router.route(&path, methods);
        }

        router.layer(request_id_layer())
    }

    fn full_path(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("/{}{path}", self.version)
        } else {
            format!("/{}/{path}", self.version)
        }
    }
}

/// Build the [`ApiRequest`], admit it, then read the body and run the rest
/// of the endpoint pipeline.
///
/// Rejected requests are answered before the body is read.
async fn serve(
    context: &RouteContext,
    params: Option<Path<HashMap<String, String>>>,
    request: Request,
) -> Response {
    let started = Instant::now();
    let endpoint = &context.endpoint;
    let (parts, body) = request.into_parts();

    let params = params.map(|Path(params)| params).unwrap_or_default();
    let serializer = endpoint
        .serializer()
        .map_or_else(|| Arc::clone(&context.serializer), Arc::clone);

    let request = ApiRequest::from_parts(
        parts,
        params,
        Bytes::new(),
        Arc::clone(&context.version),
        Arc::clone(&serializer),
    );
    let route = request.path().to_string();

    if let Err(rejection) = endpoint.admit(&request) {
        return endpoint.finish(&route, started, Err(rejection));
    }

    let result = match axum::body::to_bytes(body, context.max_body_bytes).await {
        Ok(body) => {
            let request = request.with_body(body);
            endpoint.respond(&request, serializer.as_ref())
        }
        Err(err) => Err((
            Stage::Buffering,
            AppError::payload_too_large(format!(
                "Request body exceeds {} bytes",
                context.max_body_bytes
            ))
            .with_source(err.into()),
        )),
    };
    endpoint.finish(&route, started, result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use rest_toolkit_auth::{BasicAuth, Credentials};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn tasks(_: &ApiRequest) -> anyhow::Result<Value> {
        Ok(json!([]))
    }

    #[test]
    fn test_prefix() {
        let api = Api::new("v2");
        assert_eq!(api.version(), "v2");
        assert_eq!(api.prefix(), "/v2");
    }

    #[test]
    fn test_routes_in_registration_order() {
        let mut api = Api::new("v1");
        api.register_endpoint(Endpoint::get("/task/", tasks))
            .unwrap()
            .register_endpoint(Endpoint::post("task/", tasks))
            .unwrap();

        let routes: Vec<_> = api.routes().collect();
        assert_eq!(
            routes,
            vec![(&Method::GET, "/v1/task/"), (&Method::POST, "/v1/task/")]
        );
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut api = Api::new("v1");
        api.register_endpoint(Endpoint::get("/task/", tasks)).unwrap();

        let err = api
            .register_endpoint(Endpoint::get("/task/", tasks))
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateRoute {
                method: Method::GET,
                path: "/v1/task/".to_string()
            }
        );
    }

    #[test]
    fn test_failed_registration_registers_nothing() {
        let mut api = Api::new("v1");
        api.register_endpoint(Endpoint::post("/task/", tasks)).unwrap();

        let result = api.register_endpoint(
            Endpoint::get("/task/", tasks).with_methods([Method::GET, Method::POST]),
        );
        assert!(result.is_err());
        assert_eq!(api.routes().count(), 1);
    }

    #[test]
    fn test_empty_methods_rejected() {
        let mut api = Api::new("v1");
        let err = api
            .register_endpoint(Endpoint::get("/task/", tasks).with_methods([]))
            .unwrap_err();
        assert_eq!(err, RegistrationError::EmptyMethods("/v1/task/".to_string()));
    }

    #[test]
    fn test_unsupported_method_rejected() {
        let mut api = Api::new("v1");
        let method = Method::from_bytes(b"PURGE").unwrap();
        let err = api
            .register_endpoint(Endpoint::new(method.clone(), "/task/", tasks))
            .unwrap_err();
        assert_eq!(err, RegistrationError::UnsupportedMethod(method));
    }

    #[test]
    fn test_shared_endpoint_in_two_apis() {
        let endpoint = Arc::new(Endpoint::get("/task/", tasks));
        let mut v1 = Api::new("v1");
        let mut v2 = Api::new("v2");
        v1.register_endpoint(Arc::clone(&endpoint)).unwrap();
        v2.register_endpoint(endpoint).unwrap();

        assert_eq!(v1.routes().next().unwrap().1, "/v1/task/");
        assert_eq!(v2.routes().next().unwrap().1, "/v2/task/");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut api = Api::from_config(ApiConfig::new("v1").with_max_body_bytes(4));
        api.register_endpoint(Endpoint::post("/task/", tasks)).unwrap();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/task/")
            .body(Body::from("0123456789"))
            .unwrap();
        let response = api.into_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_oversized_body_without_credentials_is_unauthorized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut api = Api::from_config(ApiConfig::new("v1").with_max_body_bytes(4));
        api.register_endpoint(
            Endpoint::post("/task/", tasks)
                .with_auth(BasicAuth::new(move |user: &str, pass: &str| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    user == "user" && pass == "pass"
                })),
        )
        .unwrap();
        let router = api.into_router();

        let anonymous = Request::builder()
            .method(Method::POST)
            .uri("/v1/task/")
            .body(Body::from("0123456789"))
            .unwrap();
        let response = router.clone().oneshot(anonymous).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let authenticated = Request::builder()
            .method(Method::POST)
            .uri("/v1/task/")
            .header(header::AUTHORIZATION, Credentials::new("user", "pass").to_authorization_header())
            .body(Body::from("0123456789"))
            .unwrap();
        let response = router.oneshot(authenticated).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_admitted_request_sees_its_body() {
        let mut api = Api::new("v1");
        api.register_endpoint(Endpoint::post("/echo", |request: &ApiRequest| {
            Ok::<_, anyhow::Error>(request.json::<Value>()?)
        }))
        .unwrap();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"task": "Walk the dog"}"#))
            .unwrap();
        let response = api.into_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            serde_json::from_slice::<Value>(&body).unwrap(),
            json!({"task": "Walk the dog"})
        );
    }

    #[tokio::test]
    async fn test_path_params_reach_handler() {
        let mut api = Api::new("v1");
        api.register_endpoint(Endpoint::get("/task/:task_id/", |request: &ApiRequest| {
            let id: u32 = request.param("task_id")?;
            Ok::<_, anyhow::Error>(json!({ "id": id }))
        }))
        .unwrap();

        let request = Request::builder()
            .uri("/v1/task/7/")
            .body(Body::empty())
            .unwrap();
        let response = api.into_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"id": 7}));
    }
}
