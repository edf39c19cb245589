//! The two capabilities a strategy can have, and the trivial strategies.
//!
//! [`Authenticator`] answers *who* the caller is, [`Authorizer`] answers *what*
//! the caller may do. They are independent: a type implements either, both, or
//! neither. The request type is a parameter so strategies can be tested against
//! plain values and reused by any web layer.

use crate::error::Result;
use std::sync::Arc;

/// Verifies the identity of the caller.
pub trait Authenticator<R: ?Sized>: Send + Sync {
    /// Accept or reject the request.
    ///
    /// # Errors
    ///
    /// Returns [`Unauthorized`](crate::Unauthorized) when the caller cannot be
    /// authenticated.
    fn authenticate(&self, request: &R) -> Result;
}

/// Decides whether an authenticated caller may proceed.
///
/// Only invoked after authentication succeeded.
pub trait Authorizer<R: ?Sized>: Send + Sync {
    /// Accept or reject the request.
    ///
    /// # Errors
    ///
    /// Returns [`Unauthorized`](crate::Unauthorized) when the caller is not
    /// allowed to proceed.
    fn authorize(&self, request: &R) -> Result;
}

/// Anything that is both an [`Authenticator`] and an [`Authorizer`].
///
/// Use `Box<dyn Strategy<R>>` to put heterogeneous strategies in one
/// combinator.
pub trait Strategy<R: ?Sized>: Authenticator<R> + Authorizer<R> {}

impl<R: ?Sized, T> Strategy<R> for T where T: Authenticator<R> + Authorizer<R> + ?Sized {}

/// Boxed strategy implementing both capabilities.
pub type DynStrategy<R> = Box<dyn Strategy<R>>;

impl<R: ?Sized, T: Authenticator<R> + ?Sized> Authenticator<R> for Box<T> {
    fn authenticate(&self, request: &R) -> Result {
        (**self).authenticate(request)
    }
}

impl<R: ?Sized, T: Authenticator<R> + ?Sized> Authenticator<R> for Arc<T> {
    fn authenticate(&self, request: &R) -> Result {
        (**self).authenticate(request)
    }
}

impl<R: ?Sized, T: Authorizer<R> + ?Sized> Authorizer<R> for Box<T> {
    fn authorize(&self, request: &R) -> Result {
        (**self).authorize(request)
    }
}

impl<R: ?Sized, T: Authorizer<R> + ?Sized> Authorizer<R> for Arc<T> {
    fn authorize(&self, request: &R) -> Result {
        (**self).authorize(request)
    }
}

/// Authorizer that always succeeds.
///
/// Marks "authentication alone is the complete check". Inside an
/// [`And`](crate::And) it passes straight through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoAuthorization;

impl<R: ?Sized> Authorizer<R> for NoAuthorization {
    fn authorize(&self, _request: &R) -> Result {
        Ok(())
    }
}

/// Strategy that accepts every request at both stages.
///
/// The default for endpoints registered without an explicit policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllowAll;

impl<R: ?Sized> Authenticator<R> for AllowAll {
    fn authenticate(&self, _request: &R) -> Result {
        Ok(())
    }
}

impl<R: ?Sized> Authorizer<R> for AllowAll {
    fn authorize(&self, request: &R) -> Result {
        NoAuthorization.authorize(request)
    }
}
