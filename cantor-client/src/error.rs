//! Errors returned by the job store and performance service clients

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Longest response body kept in an error message
const MAX_BODY_LEN: usize = 512;

/// Why a call to the job store or the performance service failed
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service could not be reached, or the connection broke mid-call
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service answered with a non-2xx status
    ///
    /// `message` is the (truncated) response body, which both services use
    /// to explain rejected status transitions and unknown IDs.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A 2xx response whose body was not the expected record
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Builds an [`ClientError::ApiError`] from a rejected response
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            body.chars().take(MAX_BODY_LEN).collect()
        };

        Self::ApiError {
            status: status.as_u16(),
            message,
        }
    }

    /// The record asked for does not exist
    ///
    /// Lookups such as the next pending job or a job's task treat this as
    /// "nothing there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// The service rejected the request itself (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (400..500).contains(status))
    }

    /// The service failed while handling the request (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let not_found = ClientError::from_status(StatusCode::NOT_FOUND, "no such job");
        assert!(not_found.is_not_found());
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());

        let unavailable = ClientError::from_status(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert!(!unavailable.is_not_found());
        assert!(unavailable.is_server_error());

        let parse = ClientError::ParseError("bad".to_string());
        assert!(!parse.is_client_error());
        assert!(!parse.is_server_error());
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = ClientError::from_status(StatusCode::CONFLICT, "  \n");
        assert_eq!(err.to_string(), "API error (status 409): Conflict");
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(2000);
        let ClientError::ApiError { message, .. } =
            ClientError::from_status(StatusCode::BAD_REQUEST, &body)
        else {
            panic!("expected an API error");
        };
        assert_eq!(message.len(), MAX_BODY_LEN);
    }
}
