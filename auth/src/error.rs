//! Error type shared by every strategy.

use thiserror::Error;

/// Result type alias for authentication and authorization checks.
pub type Result<T = ()> = std::result::Result<T, Unauthorized>;

/// The request failed authentication or authorization.
///
/// Carries no payload: a rejection is a rejection, whichever strategy in a
/// combinator tree produced it. It is never retried and the web layer maps it
/// to `401 Unauthorized`.
#[derive(Debug, Error, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[error("Unauthorized")]
pub struct Unauthorized;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Unauthorized.to_string(), "Unauthorized");
    }

    #[test]
    fn test_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<Unauthorized>();
    }
}
