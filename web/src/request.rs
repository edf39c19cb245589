//! The per-request view handed to strategies, middleware and handlers.

use crate::error::AppError;
use crate::request_id::RequestId;
use crate::serializer::{JsonSerializer, Serializer};
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri, header, request::Parts};
use rest_toolkit_auth::{CredentialSource, Credentials};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A request matched to an endpoint.
///
/// Built by the dispatch glue before the pipeline runs: path parameters are
/// captured and the `Authorization` header is decoded into [`Credentials`]
/// exactly once. The body is empty while strategies run and is filled in
/// once the request is admitted. Everything downstream only reads it.
pub struct ApiRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Bytes,
    credentials: Option<Credentials>,
    version: Arc<str>,
    request_id: Option<RequestId>,
    serializer: Arc<dyn Serializer>,
}

impl ApiRequest {
    /// Create a request with no headers, parameters or body.
    ///
    /// Mostly useful for exercising strategies and handlers directly.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            params: HashMap::new(),
            body: Bytes::new(),
            credentials: None,
            version: Arc::from(""),
            request_id: None,
            serializer: Arc::new(JsonSerializer),
        }
    }

    pub(crate) fn from_parts(
        parts: Parts,
        params: HashMap<String, String>,
        body: Bytes,
        version: Arc<str>,
        serializer: Arc<dyn Serializer>,
    ) -> Self {
        let credentials = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(Credentials::from_authorization_header);
        let request_id = parts.extensions.get::<RequestId>().copied();

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            body,
            credentials,
            version,
            request_id,
            serializer,
        }
    }

    /// Replace the headers, re-decoding the `Authorization` header.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.credentials = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(Credentials::from_authorization_header);
        self.headers = headers;
        self
    }

    /// Set already decoded credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Add a path parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the API version the request was routed through.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<Arc<str>>) -> Self {
        self.version = version.into();
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Full request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path (without query string).
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// All request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A single header as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Version of the [`Api`](crate::Api) that routed this request.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Id assigned by the request-id layer, if installed.
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    /// Raw path parameter.
    #[must_use]
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Path parameter parsed into `T`.
    ///
    /// # Errors
    ///
    /// Returns a 404 [`AppError`] when the parameter is missing or does not
    /// parse, matching how a typed route segment fails to match.
    pub fn param<T: FromStr>(&self, name: &str) -> Result<T, AppError> {
        let raw = self
            .param_str(name)
            .ok_or_else(|| AppError::not_found("Path parameter", name))?;
        raw.parse()
            .map_err(|_| AppError::not_found(name, raw))
    }

    /// Single query-string value.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .ok()?
            .into_iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Query string decoded into `T`.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`AppError`] when the query does not match `T`.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_urlencoded::from_str(self.uri.query().unwrap_or_default())
            .map_err(|e| AppError::bad_request(format!("Invalid query string: {e}")))
    }

    /// Raw body bytes.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded with the endpoint's serializer into `T`.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`AppError`] when the body cannot be decoded or does not
    /// match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let value = self
            .serializer
            .deserialize(&self.body)
            .map_err(|e| AppError::bad_request(e.to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| AppError::bad_request(format!("Invalid request body: {e}")))
    }
}

impl CredentialSource for ApiRequest {
    fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("version", &self.version)
            .field("params", &self.params)
            .field("credentials", &self.credentials)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde::Deserialize;

    fn get(uri: &'static str) -> ApiRequest {
        ApiRequest::new(Method::GET, Uri::from_static(uri))
    }

    #[test]
    fn test_credentials_decoded_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        let request = get("/v1/task/basic").with_headers(headers);

        assert_eq!(request.credentials(), Some(&Credentials::new("user", "pass")));
    }

    #[test]
    fn test_malformed_header_means_no_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic ???"));
        let request = get("/").with_headers(headers);

        assert!(request.credentials().is_none());
    }

    #[test]
    fn test_typed_param() {
        let request = get("/v1/task/2/").with_param("task_id", "2");

        assert_eq!(request.param::<u64>("task_id").unwrap(), 2);
        assert_eq!(
            request.param::<u64>("missing").unwrap_err().status(),
            axum::http::StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_unparseable_param_is_not_found() {
        let request = get("/v1/task/abc/").with_param("task_id", "abc");

        let err = request.param::<u64>("task_id").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_query_value() {
        let request = get("/v1/dummy-exception?exc_type=subclass&x=1");

        assert_eq!(request.query_value("exc_type").as_deref(), Some("subclass"));
        assert_eq!(request.query_value("nope"), None);
    }

    #[test]
    fn test_typed_query() {
        #[derive(Deserialize)]
        struct Filter {
            exc_type: Option<String>,
        }

        let filter: Filter = get("/?exc_type=other-subclass").query().unwrap();
        assert_eq!(filter.exc_type.as_deref(), Some("other-subclass"));

        let empty: Filter = get("/").query().unwrap();
        assert!(empty.exc_type.is_none());
    }

    #[test]
    fn test_json_body() {
        #[derive(Debug, Deserialize)]
        struct NewTask {
            task: String,
        }

        let request = ApiRequest::new(Method::POST, Uri::from_static("/v1/task/"))
            .with_body(r#"{"task": "New Task!"}"#);
        let body: NewTask = request.json().unwrap();
        assert_eq!(body.task, "New Task!");

        let bad = ApiRequest::new(Method::POST, Uri::from_static("/")).with_body("nope");
        assert_eq!(
            bad.json::<NewTask>().unwrap_err().status(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }
}
