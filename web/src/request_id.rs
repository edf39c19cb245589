//! Request id tracking.
//!
//! Every request routed through an [`Api`](crate::Api) gets a [`RequestId`]:
//! taken from the `X-Request-ID` header when it holds a valid UUID, generated
//! otherwise. The id is stored in request extensions (where [`ApiRequest`]
//! picks it up), recorded on an `http_request` tracing span, and echoed on the
//! response.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/v1/task/", get(list_tasks))
//!     .layer(request_id_layer());
//! ```
//!
//! [`Api::into_router`](crate::Api::into_router) applies the layer itself.
//!
//! [`ApiRequest`]: crate::ApiRequest

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for the request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Identifier of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// A fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The id a client sent in `X-Request-ID`, or a fresh one when the header
    /// is missing or not a UUID.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map_or_else(Self::generate, Self)
    }

    /// Header value echoed on the response.
    fn header_value(self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0.hyphenated().to_string()).ok()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Layer assigning a [`RequestId`] to every request.
#[must_use]
pub const fn request_id_layer() -> RequestIdLayer {
    RequestIdLayer
}

/// [`Layer`] wrapping a service in a [`RequestIdService`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Future returned by [`RequestIdService`].
pub type RequestIdFuture<E> = Pin<Box<dyn Future<Output = Result<Response, E>> + Send>>;

/// Service that resolves the request id before calling `inner`.
///
/// The inner call runs inside the `http_request` span, so every event the
/// endpoint pipeline logs carries `request_id`, `method` and `path`.
#[derive(Clone, Debug)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request> for RequestIdService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = RequestIdFuture<S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // No state of its own; readiness is the inner service's.
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let id = RequestId::from_headers(request.headers());
        request.extensions_mut().insert(id);

        let span = tracing::info_span!(
            "http_request",
            request_id = %id,
            method = %request.method(),
            path = %request.uri().path(),
        );

        // The inner future is created before boxing so `inner` is not borrowed
        // across the await.
        let response = self.inner.call(request).instrument(span);

        Box::pin(async move {
            let mut response = response.await?;
            if let Some(value) = id.header_value() {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}
