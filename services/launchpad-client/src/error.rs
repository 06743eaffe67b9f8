//! Error types for the Launchpad client
//!
//! Every non-2xx answer from the web service becomes a [`ResourceError`].
//! Everything else is ambient failure (transport, parsing, bad input).

use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::transport::HttpResponse;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, LaunchpadError>;

/// A non-2xx response to a client operation.
///
/// Carries the raw response so callers can branch on the status code,
/// inspect headers or read the error body.
#[derive(Debug, Clone, Error)]
#[error("Launchpad {method} {uri} failed with status {}", .response.status)]
pub struct ResourceError {
    /// The response exactly as the server sent it
    pub response: HttpResponse,
    /// Fully normalized URI the request was addressed to
    pub uri: String,
    /// HTTP method that was attempted
    pub method: Method,
}

impl ResourceError {
    pub fn status(&self) -> StatusCode {
        self.response.status
    }
}

/// Errors returned by the Launchpad client
#[derive(Debug, Error)]
pub enum LaunchpadError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URI {uri}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid header: {name}")]
    InvalidHeader { name: String },

    #[error("Expected {expected} at {uri}")]
    UnexpectedShape { uri: String, expected: &'static str },

    #[error("Resource {uri} has no {name}_link")]
    MissingLink { uri: String, name: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LaunchpadError {
    /// The resource error, if the server answered with a non-2xx status
    pub fn as_resource_error(&self) -> Option<&ResourceError> {
        match self {
            LaunchpadError::Resource(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status of a resource error
    pub fn status(&self) -> Option<StatusCode> {
        self.as_resource_error().map(ResourceError::status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    #[test]
    fn test_resource_error_display() {
        let err = ResourceError {
            response: HttpResponse {
                status: StatusCode::NOT_FOUND,
                headers: HeaderMap::new(),
                body: "Object: <Person>, name: 'nobody'".to_string(),
            },
            uri: "https://api.launchpad.net/api/devel/~nobody".to_string(),
            method: Method::GET,
        };

        let message = err.to_string();
        assert!(message.contains("GET"));
        assert!(message.contains("/api/devel/~nobody"));
        assert!(message.contains("404"));

        let wrapped = LaunchpadError::from(err);
        assert_eq!(wrapped.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_non_resource_error_has_no_status() {
        let err = LaunchpadError::Config("missing base".to_string());
        assert!(err.as_resource_error().is_none());
        assert!(err.status().is_none());
    }
}
