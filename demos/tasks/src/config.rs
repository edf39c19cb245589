//! Configuration management for the task server.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to (`TASKS_HOST`, default `0.0.0.0`)
    pub host: String,
    /// Port to bind to (`TASKS_PORT`, default 3000)
    pub port: u16,
    /// Version segment of the API (`TASKS_API_VERSION`, default `v1`)
    pub api_version: String,
    /// Basic auth username (`TASKS_USERNAME`, default `user`)
    pub username: String,
    /// Basic auth password (`TASKS_PASSWORD`, default `pass`)
    pub password: String,
    /// `User-Agent` allowed to delete tasks (`TASKS_ALLOWED_AGENT`)
    pub allowed_agent: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("TASKS_HOST").unwrap_or(defaults.host),
            port: lookup("TASKS_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            api_version: lookup("TASKS_API_VERSION").unwrap_or(defaults.api_version),
            username: lookup("TASKS_USERNAME").unwrap_or(defaults.username),
            password: lookup("TASKS_PASSWORD").unwrap_or(defaults.password),
            allowed_agent: lookup("TASKS_ALLOWED_AGENT").filter(|agent| !agent.is_empty()),
        }
    }

    /// Address to bind, `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_version: "v1".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            allowed_agent: None,
        }
    }
}
