//! Api configuration.

use crate::serializer::Format;
use serde::Deserialize;

/// Default version segment.
pub const DEFAULT_VERSION: &str = "v1";

/// Default request body limit (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Configuration for an [`Api`](crate::Api).
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Version segment prepended to every endpoint path (`v1` gives `/v1/...`)
    pub version: String,
    /// Default wire format for endpoints without their own serializer
    pub format: Format,
    /// Largest request body read before answering 413
    pub max_body_bytes: usize,
}

impl ApiConfig {
    /// Configuration for `version` with default format and body limit.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Set the default wire format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the request body limit.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            format: Format::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
