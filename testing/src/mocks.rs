//! Test doubles for authentication strategies.

use rest_toolkit_auth::{Authenticator, Authorizer, BasicAuth, Result, Unauthorized, UserValidator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type Calls = Arc<Mutex<Vec<(String, String)>>>;

/// Basic auth validator that records every `(username, password)` it sees.
///
/// Clones share the recorded calls, so keep one clone in the test and hand
/// [`basic_auth`](Self::basic_auth) to the endpoint.
#[derive(Debug, Clone, Default)]
pub struct RecordingValidator {
    accepted: Option<(String, String)>,
    calls: Calls,
}

impl RecordingValidator {
    /// Validator accepting exactly `username` and `password`.
    #[must_use]
    pub fn accepting(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            accepted: Some((username.into(), password.into())),
            calls: Calls::default(),
        }
    }

    /// Validator rejecting everyone.
    #[must_use]
    pub fn rejecting() -> Self {
        Self::default()
    }

    /// The validator function, recording into this instance.
    #[must_use]
    pub fn validator(&self) -> UserValidator {
        let accepted = self.accepted.clone();
        let calls = Arc::clone(&self.calls);
        Arc::new(move |username: &str, password: &str| {
            calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((username.to_string(), password.to_string()));
            accepted
                .as_ref()
                .is_some_and(|(user, pass)| user == username && pass == password)
        })
    }

    /// [`BasicAuth`] using [`validator`](Self::validator).
    #[must_use]
    pub fn basic_auth(&self) -> BasicAuth {
        BasicAuth::from_validator(self.validator())
    }

    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Strategy with fixed answers that counts how often each stage runs.
///
/// Works with any request type. Clones share the counters.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStrategy {
    authenticates: bool,
    authorizes: bool,
    authenticate_calls: Arc<AtomicUsize>,
    authorize_calls: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    /// Strategy answering the two stages as given.
    #[must_use]
    pub fn new(authenticates: bool, authorizes: bool) -> Self {
        Self {
            authenticates,
            authorizes,
            ..Self::default()
        }
    }

    /// Strategy accepting both stages.
    #[must_use]
    pub fn allowing() -> Self {
        Self::new(true, true)
    }

    /// Strategy rejecting both stages.
    #[must_use]
    pub fn denying() -> Self {
        Self::new(false, false)
    }

    /// How often `authenticate` ran.
    #[must_use]
    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    /// How often `authorize` ran.
    #[must_use]
    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }
}

const fn answer(accepted: bool) -> Result {
    if accepted { Ok(()) } else { Err(Unauthorized) }
}

impl<R: ?Sized> Authenticator<R> for ScriptedStrategy {
    fn authenticate(&self, _request: &R) -> Result {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        answer(self.authenticates)
    }
}

impl<R: ?Sized> Authorizer<R> for ScriptedStrategy {
    fn authorize(&self, _request: &R) -> Result {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        answer(self.authorizes)
    }
}
