//! HTTP Basic authentication.

use crate::credentials::CredentialSource;
use crate::error::{Result, Unauthorized};
use crate::strategy::{Authenticator, Authorizer, NoAuthorization};
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether an `(identifier, secret)` pair is a valid user.
///
/// Supplied by the application, so the strategy stays independent of any
/// particular user store. Called once per request that carries credentials.
pub type UserValidator = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Basic-Auth strategy.
///
/// Authentication succeeds when the request carries credentials and the
/// validator accepts them. Authorization is [`NoAuthorization`]: a valid
/// username/password pair is the whole access decision.
///
/// # Example
///
/// ```
/// use rest_toolkit_auth::{Authenticator, BasicAuth, Credentials};
///
/// let auth = BasicAuth::new(|user, pass| user == "admin" && pass == "secret");
///
/// assert!(auth.authenticate(&Some(Credentials::new("admin", "secret"))).is_ok());
/// assert!(auth.authenticate(&Some(Credentials::new("admin", "nope"))).is_err());
/// assert!(auth.authenticate(&None::<Credentials>).is_err());
/// ```
#[derive(Clone)]
pub struct BasicAuth {
    is_valid_user: UserValidator,
}

impl BasicAuth {
    /// Create a Basic-Auth strategy from a validator function.
    #[must_use]
    pub fn new<F>(is_valid_user: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            is_valid_user: Arc::new(is_valid_user),
        }
    }

    /// Create a Basic-Auth strategy sharing an existing validator.
    #[must_use]
    pub const fn from_validator(is_valid_user: UserValidator) -> Self {
        Self { is_valid_user }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth").finish_non_exhaustive()
    }
}

impl<R> Authenticator<R> for BasicAuth
where
    R: CredentialSource + ?Sized,
{
    fn authenticate(&self, request: &R) -> Result {
        // Absent and empty credentials never reach the validator.
        let Some(credentials) = request.credentials().filter(|c| !c.is_empty()) else {
            tracing::debug!("basic auth rejected: no credentials");
            return Err(Unauthorized);
        };

        if (self.is_valid_user)(credentials.username(), credentials.password()) {
            Ok(())
        } else {
            tracing::debug!(username = %credentials.username(), "basic auth rejected: invalid user");
            Err(Unauthorized)
        }
    }
}

impl<R: ?Sized> Authorizer<R> for BasicAuth {
    fn authorize(&self, request: &R) -> Result {
        NoAuthorization.authorize(request)
    }
}
