//! # Rest Toolkit Testing
//!
//! Test doubles and request helpers for endpoints built with the rest toolkit.
//!
//! This crate provides:
//! - [`RecordingValidator`]: a Basic auth validator that records every call
//! - [`ScriptedStrategy`]: a strategy with fixed answers and call counters
//! - [`TestClient`]: a fluent way to send requests through an Axum router
//!
//! ## Example
//!
//! ```ignore
//! use rest_toolkit_testing::{RecordingValidator, TestClient};
//!
//! #[tokio::test]
//! async fn test_wrong_password_never_reaches_handler() {
//!     let validator = RecordingValidator::accepting("user", "pass");
//!     let router = tasks_api(validator.basic_auth()).into_router();
//!
//!     let response = TestClient::new(router)
//!         .get("/v1/task/basic")
//!         .basic_auth("wrong", "wrong")
//!         .send()
//!         .await;
//!
//!     assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
//!     assert_eq!(validator.calls(), vec![("wrong".into(), "wrong".into())]);
//! }
//! ```

pub mod client;
pub mod mocks;

/// Test helpers and utilities.
pub mod helpers {
    use rest_toolkit_auth::Credentials;

    /// `Authorization` header value for HTTP Basic credentials.
    ///
    /// ```
    /// use rest_toolkit_testing::helpers::basic_header;
    ///
    /// assert_eq!(basic_header("user", "pass"), "Basic dXNlcjpwYXNz");
    /// ```
    #[must_use]
    pub fn basic_header(username: &str, password: &str) -> String {
        Credentials::new(username, password).to_authorization_header()
    }

    /// Install a `fmt` subscriber writing through the test harness.
    ///
    /// Honors `RUST_LOG`. Safe to call from every test; only the first call
    /// installs the subscriber.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use client::{TestClient, TestRequest, TestResponse};
pub use helpers::{basic_header, init_test_tracing};
pub use mocks::{RecordingValidator, ScriptedStrategy};
