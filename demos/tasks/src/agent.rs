//! Allow-list on the `User-Agent` header.

use rest_toolkit_auth::{AllowAll, Authenticator, Authorizer, Result, Unauthorized};
use rest_toolkit_web::ApiRequest;

/// Lets through only requests whose `User-Agent` is exactly the configured
/// value. Authentication is left to the strategies it is combined with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedAgent {
    agent: String,
}

impl AllowedAgent {
    /// Allow `agent`.
    #[must_use]
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
        }
    }
}

impl Authenticator<ApiRequest> for AllowedAgent {
    fn authenticate(&self, request: &ApiRequest) -> Result {
        AllowAll.authenticate(request)
    }
}

impl Authorizer<ApiRequest> for AllowedAgent {
    fn authorize(&self, request: &ApiRequest) -> Result {
        match request.header("user-agent") {
            Some(agent) if agent == self.agent => Ok(()),
            agent => {
                tracing::debug!(agent = ?agent, "user agent not allowed");
                Err(Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method, Uri, header};

    fn request(agent: Option<&'static str>) -> ApiRequest {
        let mut headers = HeaderMap::new();
        if let Some(agent) = agent {
            headers.insert(header::USER_AGENT, HeaderValue::from_static(agent));
        }
        ApiRequest::new(Method::DELETE, Uri::from_static("/v1/task/1/")).with_headers(headers)
    }

    #[test]
    fn test_matching_agent_allowed() {
        let strategy = AllowedAgent::new("tasks-cli/1.0");
        assert!(strategy.authorize(&request(Some("tasks-cli/1.0"))).is_ok());
    }

    #[test]
    fn test_other_or_missing_agent_rejected() {
        let strategy = AllowedAgent::new("tasks-cli/1.0");
        assert_eq!(strategy.authorize(&request(Some("curl/8.0"))), Err(Unauthorized));
        assert_eq!(strategy.authorize(&request(None)), Err(Unauthorized));
        assert!(strategy.authenticate(&request(None)).is_ok());
    }
}
