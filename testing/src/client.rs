//! Fluent requests against an Axum router, without a socket.
//!
//! ```ignore
//! let response = TestClient::new(router)
//!     .post("/v1/task/")
//!     .basic_auth("user", "pass")
//!     .json(&json!({"task": "Water the plants"}))
//!     .send()
//!     .await;
//!
//! assert_eq!(response.status(), StatusCode::CREATED);
//! ```

use crate::helpers::basic_header;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

/// Sends requests through a router.
#[derive(Debug, Clone)]
pub struct TestClient {
    router: Router,
}

impl TestClient {
    /// Client for `router`.
    #[must_use]
    pub const fn new(router: Router) -> Self {
        Self { router }
    }

    /// Start a request with any method.
    #[must_use]
    pub fn request(&self, method: Method, uri: impl Into<String>) -> TestRequest {
        TestRequest {
            router: self.router.clone(),
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Start a `GET` request.
    #[must_use]
    pub fn get(&self, uri: impl Into<String>) -> TestRequest {
        self.request(Method::GET, uri)
    }

    /// Start a `POST` request.
    #[must_use]
    pub fn post(&self, uri: impl Into<String>) -> TestRequest {
        self.request(Method::POST, uri)
    }

    /// Start a `PUT` request.
    #[must_use]
    pub fn put(&self, uri: impl Into<String>) -> TestRequest {
        self.request(Method::PUT, uri)
    }

    /// Start a `PATCH` request.
    #[must_use]
    pub fn patch(&self, uri: impl Into<String>) -> TestRequest {
        self.request(Method::PATCH, uri)
    }

    /// Start a `DELETE` request.
    #[must_use]
    pub fn delete(&self, uri: impl Into<String>) -> TestRequest {
        self.request(Method::DELETE, uri)
    }
}

/// A request being built.
#[derive(Debug)]
pub struct TestRequest {
    router: Router,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestRequest {
    /// Add a header.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a valid header value.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        let value = HeaderValue::from_str(value).expect("test header value should be valid");
        self.headers.append(name, value);
        self
    }

    /// Send HTTP Basic credentials.
    #[must_use]
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let value = basic_header(username, password);
        self.header(header::AUTHORIZATION, &value)
    }

    /// Use `body` as the raw request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Send `value` as a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be serialized.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        let body = serde_json::to_vec(value).expect("test body should serialize");
        self.header(header::CONTENT_TYPE, "application/json").body(body)
    }

    /// Run the request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the method, URI or headers do not form a valid request, or
    /// if the response body cannot be read.
    #[allow(clippy::expect_used)]
    pub async fn send(self) -> TestResponse {
        let mut request = Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(Body::from(self.body))
            .expect("test request should be valid");
        request.headers_mut().extend(self.headers);

        let response = match self.router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("test response body should be readable");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// All headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Raw body.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, lossily decoded.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body decoded as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON for `T`.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("response body should be valid JSON")
    }
}
