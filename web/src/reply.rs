//! What handlers and middleware hand back to the pipeline.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;

/// A payload to serialize, with its status and extra headers.
///
/// Status defaults to `200 OK`. `Content-Type` comes from the endpoint's
/// serializer unless a `Content-Type` header is added here, in which case
/// that header is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    data: Value,
    status: StatusCode,
    headers: HeaderMap,
}

impl Reply {
    /// Reply with `data` and status 200.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// Reply with any serializable value.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `data` cannot be represented as a
    /// JSON value (e.g. a map with non-string keys).
    pub fn from_value<T: Serialize + ?Sized>(data: &T) -> serde_json::Result<Self> {
        serde_json::to_value(data).map(Self::new)
    }

    /// Set the status code.
    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// The payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// The status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Extra headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn into_parts(self) -> (Value, StatusCode, HeaderMap) {
        (self.data, self.status, self.headers)
    }
}

/// Result of running a handler or a short-circuiting middleware.
#[derive(Debug)]
pub enum Outcome {
    /// Serialize this reply with the endpoint's serializer.
    Reply(Reply),
    /// Send this response as-is, bypassing serialization.
    Response(Response),
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<Value> for Outcome {
    fn from(data: Value) -> Self {
        Self::Reply(Reply::new(data))
    }
}

impl From<(Value, StatusCode)> for Outcome {
    fn from((data, status): (Value, StatusCode)) -> Self {
        Self::Reply(Reply::new(data).with_status(status))
    }
}

impl From<(Value, StatusCode, HeaderMap)> for Outcome {
    fn from((data, status, headers): (Value, StatusCode, HeaderMap)) -> Self {
        Self::Reply(Reply {
            data,
            status,
            headers,
        })
    }
}
