//! # Rest Toolkit Authentication & Authorization
//!
//! Composable strategies deciding whether a request may reach a handler.
//!
//! ## Capabilities
//!
//! Two independent traits, checked in order by the web layer:
//!
//! ```text
//! request ─▶ Authenticator::authenticate ─▶ Authorizer::authorize ─▶ handler
//!                     │                              │
//!                     └──────── Unauthorized ◀───────┘  (401, handler skipped)
//! ```
//!
//! ## Strategies
//!
//! - [`BasicAuth`]: HTTP Basic credentials checked by an injected validator
//! - [`NoAuthorization`]: authorizer that always succeeds
//! - [`AllowAll`]: open access at both stages
//! - [`And`] / [`Or`]: short-circuit combinators over ordered children
//!
//! Strategies are built once at startup and only read afterwards, so a single
//! instance is shared by every in-flight request without locking.
//!
//! ## Example
//!
//! ```
//! use rest_toolkit_auth::{And, Authenticator, BasicAuth, Credentials, CredentialSource, Result, Unauthorized};
//!
//! struct Request {
//!     credentials: Option<Credentials>,
//!     internal: bool,
//! }
//!
//! impl CredentialSource for Request {
//!     fn credentials(&self) -> Option<&Credentials> {
//!         self.credentials.as_ref()
//!     }
//! }
//!
//! struct InternalOnly;
//!
//! impl Authenticator<Request> for InternalOnly {
//!     fn authenticate(&self, request: &Request) -> Result {
//!         if request.internal { Ok(()) } else { Err(Unauthorized) }
//!     }
//! }
//!
//! let basic = BasicAuth::new(|user, pass| user == "ops" && pass == "s3cret");
//! let children: Vec<Box<dyn Authenticator<Request>>> = vec![Box::new(basic), Box::new(InternalOnly)];
//! let policy = And::new(children);
//!
//! let request = Request {
//!     credentials: Some(Credentials::new("ops", "s3cret")),
//!     internal: false,
//! };
//! assert_eq!(policy.authenticate(&request), Err(Unauthorized));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod basic;
pub mod combinators;
pub mod credentials;
pub mod error;
pub mod strategy;

pub use basic::{BasicAuth, UserValidator};
pub use combinators::{And, Or};
pub use credentials::{CredentialSource, Credentials};
pub use error::{Result, Unauthorized};
pub use strategy::{AllowAll, Authenticator, Authorizer, DynStrategy, NoAuthorization, Strategy};
