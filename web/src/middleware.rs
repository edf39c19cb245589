//! Per-endpoint request middleware.
//!
//! Middleware runs after authentication and authorization, in registration
//! order, before the handler:
//!
//! - `Ok(None)`: continue with the next middleware, then the handler
//! - `Ok(Some(outcome))`: answer with `outcome`; nothing after it runs
//! - `Err(err)`: treated like a handler error (error maps, then 500)
//!
//! # Example
//!
//! ```ignore
//! struct MaintenanceMode(AtomicBool);
//!
//! impl RequestMiddleware for MaintenanceMode {
//!     fn process_request(&self, _request: &ApiRequest) -> anyhow::Result<Option<Outcome>> {
//!         if self.0.load(Ordering::Relaxed) {
//!             return Ok(Some((json!({"status": "maintenance"}), StatusCode::SERVICE_UNAVAILABLE).into()));
//!         }
//!         Ok(None)
//!     }
//! }
//! ```

use crate::error_map::ErrorMap;
use crate::reply::Outcome;
use crate::request::ApiRequest;

/// A hook that may answer a request before the handler runs.
pub trait RequestMiddleware: Send + Sync {
    /// Inspect the request and optionally answer it.
    ///
    /// # Errors
    ///
    /// Any error is resolved through the endpoint's [`ErrorMap`], then this
    /// middleware's [`errors`](Self::errors), and otherwise becomes a 500.
    fn process_request(&self, request: &ApiRequest) -> anyhow::Result<Option<Outcome>>;

    /// Error rules this middleware ships with.
    ///
    /// Consulted after the endpoint's own rules, so an endpoint can override
    /// them.
    fn errors(&self) -> ErrorMap {
        ErrorMap::new()
    }
}

impl<F> RequestMiddleware for F
where
    F: Fn(&ApiRequest) -> anyhow::Result<Option<Outcome>> + Send + Sync,
{
    fn process_request(&self, request: &ApiRequest) -> anyhow::Result<Option<Outcome>> {
        self(request)
    }
}
