//! Structured credentials and the request view strategies read them from.
//!
//! Strategies never look at raw headers. Whoever builds the request decodes the
//! `Authorization` header once with [`Credentials::from_authorization_header`]
//! and exposes the result through [`CredentialSource`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// Identifier/secret pair decoded from an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials from an identifier and a secret.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The identifier half of the pair.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The secret half of the pair.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Both fields are empty (`Basic base64(":")`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }

    /// Decode an `Authorization` header value of the form
    /// `Basic <base64(username:password)>`.
    ///
    /// The scheme is matched case-insensitively. Returns `None` for any other
    /// scheme, invalid base64, non UTF-8 payloads, or a payload without a `:`
    /// separator. The password may itself contain `:`.
    #[must_use]
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self::new(username, password))
    }

    /// Encode these credentials as an `Authorization` header value.
    #[must_use]
    pub fn to_authorization_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A request that may carry pre-parsed credentials.
pub trait CredentialSource {
    /// Credentials attached to the request, if the client sent any.
    fn credentials(&self) -> Option<&Credentials>;
}

impl CredentialSource for Credentials {
    fn credentials(&self) -> Option<&Credentials> {
        Some(self)
    }
}

impl CredentialSource for Option<Credentials> {
    fn credentials(&self) -> Option<&Credentials> {
        self.as_ref()
    }
}
