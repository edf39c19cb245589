//! Boolean composition of strategies.
//!
//! - **[`And`]**: every child must succeed; stops at the first failure
//! - **[`Or`]**: one child must succeed; stops at the first success
//!
//! Children run in insertion order and evaluation short-circuits, so order is
//! observable: a child after the deciding one is never invoked. An [`And`]
//! implements [`Authenticator`] when its children do and [`Authorizer`] when
//! its children do. An [`Or`] authorizes only through a child that both
//! authenticates and authorizes the request, so its children must implement
//! both. Trees nest freely.
//!
//! # Example
//!
//! ```
//! use rest_toolkit_auth::{And, AllowAll, Authenticator, BasicAuth, Credentials, DynStrategy, Or};
//!
//! let admin = BasicAuth::new(|user, pass| user == "admin" && pass == "secret");
//! let guest = BasicAuth::new(|user, _| user == "guest");
//!
//! let either: Or<BasicAuth> = Or::new(vec![admin, guest]);
//! let strategies: Vec<DynStrategy<Option<Credentials>>> = vec![Box::new(AllowAll), Box::new(either)];
//! let policy = And::new(strategies);
//!
//! assert!(policy.authenticate(&Some(Credentials::new("guest", "anything"))).is_ok());
//! assert!(policy.authenticate(&Some(Credentials::new("mallory", "x"))).is_err());
//! ```

use crate::error::{Result, Unauthorized};
use crate::strategy::{Authenticator, Authorizer};

/// Conjunction: succeeds only if every child succeeds.
///
/// The first failing child's error is returned unchanged and no later child is
/// invoked. An empty `And` succeeds.
#[derive(Debug, Clone, Default)]
pub struct And<S> {
    strategies: Vec<S>,
}

impl<S> And<S> {
    /// Create a conjunction over `strategies`, evaluated in order.
    #[must_use]
    pub const fn new(strategies: Vec<S>) -> Self {
        Self { strategies }
    }

    /// The children, in evaluation order.
    #[must_use]
    pub fn strategies(&self) -> &[S] {
        &self.strategies
    }
}

impl<S> FromIterator<S> for And<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<R: ?Sized, S: Authenticator<R>> Authenticator<R> for And<S> {
    fn authenticate(&self, request: &R) -> Result {
        for (position, strategy) in self.strategies.iter().enumerate() {
            strategy.authenticate(request).inspect_err(|_| {
                tracing::trace!(position, "and: authentication short-circuited");
            })?;
        }
        Ok(())
    }
}

impl<R: ?Sized, S: Authorizer<R>> Authorizer<R> for And<S> {
    fn authorize(&self, request: &R) -> Result {
        for (position, strategy) in self.strategies.iter().enumerate() {
            strategy.authorize(request).inspect_err(|_| {
                tracing::trace!(position, "and: authorization short-circuited");
            })?;
        }
        Ok(())
    }
}

/// Disjunction: succeeds as soon as one child succeeds.
///
/// Later children are skipped after the first success. When every child fails
/// the **last** child's error is returned. An empty `Or` fails.
///
/// Authorization is paired: a child grants access only when it both
/// authenticates and authorizes the request. Passing authentication through
/// one child and authorization through another never succeeds.
#[derive(Debug, Clone, Default)]
pub struct Or<S> {
    strategies: Vec<S>,
}

impl<S> Or<S> {
    /// Create a disjunction over `strategies`, evaluated in order.
    #[must_use]
    pub const fn new(strategies: Vec<S>) -> Self {
        Self { strategies }
    }

    /// The children, in evaluation order.
    #[must_use]
    pub fn strategies(&self) -> &[S] {
        &self.strategies
    }
}

impl<S> FromIterator<S> for Or<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<R: ?Sized, S: Authenticator<R>> Authenticator<R> for Or<S> {
    fn authenticate(&self, request: &R) -> Result {
        first_success(&self.strategies, |strategy| strategy.authenticate(request))
    }
}

impl<R: ?Sized, S: Authenticator<R> + Authorizer<R>> Authorizer<R> for Or<S> {
    fn authorize(&self, request: &R) -> Result {
        first_success(&self.strategies, |strategy| {
            strategy
                .authenticate(request)
                .and_then(|()| strategy.authorize(request))
        })
    }
}

fn first_success<S>(strategies: &[S], mut check: impl FnMut(&S) -> Result) -> Result {
    let mut last = Unauthorized;
    for (position, strategy) in strategies.iter().enumerate() {
        match check(strategy) {
            Ok(()) => {
                tracing::trace!(position, "or: short-circuited on success");
                return Ok(());
            }
            Err(err) => last = err,
        }
    }
    Err(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{DynStrategy, NoAuthorization};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy with fixed answers that counts its invocations.
    #[derive(Clone)]
    struct Counting {
        authenticates: bool,
        authorizes: bool,
        authenticate_calls: Arc<AtomicUsize>,
        authorize_calls: Arc<AtomicUsize>,
    }

    impl Counting {
        fn new(authenticates: bool, authorizes: bool) -> Self {
            Self {
                authenticates,
                authorizes,
                authenticate_calls: Arc::new(AtomicUsize::new(0)),
                authorize_calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn passing() -> Self {
            Self::new(true, true)
        }

        fn failing() -> Self {
            Self::new(false, false)
        }

        fn authenticated(&self) -> usize {
            self.authenticate_calls.load(Ordering::SeqCst)
        }

        fn authorized(&self) -> usize {
            self.authorize_calls.load(Ordering::SeqCst)
        }
    }

    impl Authenticator<()> for Counting {
        fn authenticate(&self, _request: &()) -> Result {
            self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
            if self.authenticates { Ok(()) } else { Err(Unauthorized) }
        }
    }

    impl Authorizer<()> for Counting {
        fn authorize(&self, _request: &()) -> Result {
            self.authorize_calls.fetch_add(1, Ordering::SeqCst);
            if self.authorizes { Ok(()) } else { Err(Unauthorized) }
        }
    }

    #[test]
    fn test_and_runs_all_children_when_passing() {
        let (a, b) = (Counting::passing(), Counting::passing());
        let and = And::new(vec![a.clone(), b.clone()]);

        assert_eq!(and.authenticate(&()), Ok(()));
        assert_eq!((a.authenticated(), b.authenticated()), (1, 1));
    }

    #[test]
    fn test_and_stops_at_first_failure() {
        let (a, b) = (Counting::failing(), Counting::passing());
        let and = And::new(vec![a.clone(), b.clone()]);

        assert_eq!(and.authenticate(&()), Err(Unauthorized));
        assert_eq!(a.authenticated(), 1);
        assert_eq!(b.authenticated(), 0);
    }

    #[test]
    fn test_and_three_children_second_fails() {
        let (a, b, c) = (Counting::passing(), Counting::failing(), Counting::passing());
        let and = And::new(vec![a.clone(), b.clone(), c.clone()]);

        assert_eq!(and.authenticate(&()), Err(Unauthorized));
        assert_eq!(and.authorize(&()), Err(Unauthorized));

        assert_eq!((a.authenticated(), b.authenticated(), c.authenticated()), (1, 1, 0));
        assert_eq!((a.authorized(), b.authorized(), c.authorized()), (1, 1, 0));
    }

    #[test]
    fn test_and_authorize_is_independent_of_authenticate() {
        let (a, b) = (Counting::new(true, false), Counting::passing());
        let and = And::new(vec![a.clone(), b.clone()]);

        assert_eq!(and.authenticate(&()), Ok(()));
        assert_eq!(and.authorize(&()), Err(Unauthorized));
        assert_eq!(b.authenticated(), 1);
        assert_eq!(b.authorized(), 0);
    }

    #[test]
    fn test_empty_and_succeeds_empty_or_fails() {
        let and: And<Counting> = And::new(Vec::new());
        let or: Or<Counting> = Or::new(Vec::new());

        assert_eq!(and.authenticate(&()), Ok(()));
        assert_eq!(or.authenticate(&()), Err(Unauthorized));
        assert_eq!(or.authorize(&()), Err(Unauthorized));
    }

    #[test]
    fn test_or_stops_at_first_success() {
        let (a, b) = (Counting::passing(), Counting::passing());
        let or = Or::new(vec![a.clone(), b.clone()]);

        assert_eq!(or.authenticate(&()), Ok(()));
        assert_eq!((a.authenticated(), b.authenticated()), (1, 0));
    }

    #[test]
    fn test_or_fails_only_when_all_fail() {
        let (a, b, c) = (Counting::failing(), Counting::failing(), Counting::passing());

        let or = Or::new(vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(or.authorize(&()), Ok(()));
        assert_eq!(c.authorized(), 1);

        let all_failing = Or::new(vec![a.clone(), b.clone()]);
        assert_eq!(all_failing.authorize(&()), Err(Unauthorized));
        assert_eq!((a.authenticated(), b.authenticated()), (2, 2));
    }

    #[test]
    fn test_or_authorizes_through_the_child_that_authenticated() {
        // First child rejects the caller but would authorize anyone; the second
        // accepts the caller but refuses access.
        let rejects_caller = Counting::new(false, true);
        let refuses_access = Counting::new(true, false);
        let or = Or::new(vec![rejects_caller.clone(), refuses_access.clone()]);

        assert_eq!(or.authenticate(&()), Ok(()));
        assert_eq!(or.authorize(&()), Err(Unauthorized));
        assert_eq!(rejects_caller.authorized(), 0);
        assert_eq!(refuses_access.authorized(), 1);
    }

    #[test]
    fn test_or_authorize_skips_children_after_a_paired_success() {
        let (a, b) = (Counting::passing(), Counting::passing());
        let or = Or::new(vec![a.clone(), b.clone()]);

        assert_eq!(or.authorize(&()), Ok(()));
        assert_eq!((a.authenticated(), a.authorized()), (1, 1));
        assert_eq!((b.authenticated(), b.authorized()), (0, 0));
    }

    #[test]
    fn test_no_authorization_passes_through_and() {
        let authorizers: Vec<Box<dyn Authorizer<()>>> =
            vec![Box::new(NoAuthorization), Box::new(Counting::passing())];

        assert_eq!(And::new(authorizers).authorize(&()), Ok(()));
    }

    #[test]
    fn test_nested_trees() {
        let inner_fail = Counting::failing();
        let inner_pass = Counting::passing();
        let tail = Counting::passing();

        let nested: Or<Counting> = Or::new(vec![inner_fail.clone(), inner_pass.clone()]);
        let strategies: Vec<DynStrategy<()>> = vec![Box::new(nested), Box::new(tail.clone())];
        let tree = And::new(strategies);

        assert_eq!(tree.authenticate(&()), Ok(()));
        assert_eq!(inner_fail.authenticated(), 1);
        assert_eq!(inner_pass.authenticated(), 1);
        assert_eq!(tail.authenticated(), 1);
    }

    #[test]
    fn test_from_iterator() {
        let and: And<Counting> = (0..3).map(|_| Counting::passing()).collect();
        assert_eq!(and.strategies().len(), 3);
    }
}
