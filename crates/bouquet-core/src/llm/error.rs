//! LLM error types

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while requesting a completion.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// HTTP status reported by the provider, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403: the credential was rejected.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_for_api_errors() {
        let err = LlmError::ApiError {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert!(LlmError::Timeout(Duration::from_secs(5)).status().is_none());
        assert!(
            LlmError::InvalidResponse("no choices".to_string())
                .status()
                .is_none()
        );
    }

    #[test]
    fn auth_failures() {
        for status in [401, 403] {
            let err = LlmError::ApiError {
                status,
                message: "invalid api key".to_string(),
            };
            assert!(err.is_auth_failure());
        }
        let err = LlmError::ApiError {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn display_includes_details() {
        let err = LlmError::ApiError {
            status: 429,
            message: "slow down".to_string(),
        };
        assert_eq!(err.to_string(), "API error 429: slow down");
        assert_eq!(
            LlmError::Timeout(Duration::from_secs(2)).to_string(),
            "timed out after 2s"
        );
    }
}
