//! Mapping handler error types to HTTP statuses.
//!
//! An [`ErrorMap`] is an ordered list of rules. Each rule matches one concrete
//! error type (exact type, via `anyhow::Error::downcast_ref`) and names the
//! status to answer with, optionally with a payload taken from the error.
//! The first matching rule wins.
//!
//! ```ignore
//! let errors = ErrorMap::new()
//!     .on::<Conflict>(StatusCode::CONFLICT)
//!     .on_with::<Invalid, _>(StatusCode::UNPROCESSABLE_ENTITY, |e| json!({ "field": e.field }));
//! ```

use crate::reply::Outcome;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Matcher = Arc<dyn Fn(&anyhow::Error) -> Option<Option<Value>> + Send + Sync>;

#[derive(Clone)]
struct ErrorRule {
    status: StatusCode,
    type_name: &'static str,
    matcher: Matcher,
}

/// Ordered error-type to status rules.
#[derive(Clone, Default)]
pub struct ErrorMap {
    rules: Vec<ErrorRule>,
}

impl ErrorMap {
    /// Empty map: every error falls through.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Answer errors of type `E` with `status` and an empty body.
    #[must_use]
    pub fn on<E>(mut self, status: StatusCode) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.rules.push(ErrorRule {
            status,
            type_name: std::any::type_name::<E>(),
            matcher: Arc::new(|err: &anyhow::Error| err.downcast_ref::<E>().map(|_| None::<Value>)),
        });
        self
    }

    /// Answer errors of type `E` with `status` and the payload built by
    /// `payload`, serialized like a handler result.
    #[must_use]
    pub fn on_with<E, F>(mut self, status: StatusCode, payload: F) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        self.rules.push(ErrorRule {
            status,
            type_name: std::any::type_name::<E>(),
            matcher: Arc::new(move |err: &anyhow::Error| {
                err.downcast_ref::<E>().map(|e| Some(payload(e)))
            }),
        });
        self
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// No rules registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the first rule matching `err` and build its outcome.
    #[must_use]
    pub fn resolve(&self, err: &anyhow::Error) -> Option<Outcome> {
        self.rules.iter().find_map(|rule| {
            let payload = (rule.matcher)(err)?;
            tracing::debug!(error_type = rule.type_name, status = %rule.status, "error mapped");
            Some(match payload {
                Some(data) => Outcome::from((data, rule.status)),
                None => Outcome::Response(empty_response(rule.status)),
            })
        })
    }
}

fn empty_response(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

impl fmt::Debug for ErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| (rule.type_name, rule.status)))
            .finish()
    }
}
