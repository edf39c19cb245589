//! Versioned, auth-guarded REST endpoints on top of Axum.
//!
//! An [`Endpoint`] binds HTTP methods and a path to a handler, an
//! authentication and an authorization strategy (from
//! [`rest_toolkit_auth`]), optional request middleware and a serializer. An
//! [`Api`] collects endpoints under a version prefix and turns them into an
//! Axum [`Router`](axum::Router).
//!
//! # Request Flow
//!
//! 1. **Route**: Axum matches `/{version}{path}` and the method; the
//!    `Authorization` header is decoded into [`ApiRequest`]
//! 2. **Authenticate**, then **authorize**: a rejection answers 401 and
//!    nothing else runs, not even the body read
//! 3. **Buffer**: the body is read, bounded by `max_body_bytes` (413 beyond)
//! 4. **Middleware**: each may answer early
//! 5. **Handle**: handler errors go through the [`ErrorMap`]s
//! 6. **Serialize**: the [`Reply`] is encoded and `Content-Type` defaults to
//!    the serializer's
//!
//! # Example
//!
//! ```ignore
//! use rest_toolkit_auth::BasicAuth;
//! use rest_toolkit_web::{Api, ApiRequest, Endpoint};
//! use serde_json::{json, Value};
//!
//! fn get_tasks(_: &ApiRequest) -> anyhow::Result<Value> {
//!     Ok(json!([{"id": 1, "task": "Do the laundry"}]))
//! }
//!
//! let mut api = Api::new("v1");
//! api.register_endpoint(
//!     Endpoint::get("/task/basic", get_tasks)
//!         .with_auth(BasicAuth::new(|user, pass| user == "user" && pass == "pass")),
//! )?;
//!
//! let app = api.into_router();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod error_map;
pub mod middleware;
pub mod reply;
pub mod request;
pub mod request_id;
pub mod serializer;

// Re-export key types for convenience
pub use api::Api;
pub use config::ApiConfig;
pub use endpoint::{Endpoint, Handler, HandlerResult, Stage};
pub use error::{AppError, RegistrationError};
pub use error_map::ErrorMap;
pub use middleware::RequestMiddleware;
pub use reply::{Outcome, Reply};
pub use request::ApiRequest;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_layer};
pub use serializer::{
    Format, JavaScriptSerializer, JsonSerializer, Serializer, SerializerError, TextSerializer,
    UnknownFormat,
};

/// Result type alias for code returning [`AppError`] directly.
pub type WebResult<T> = Result<T, AppError>;
