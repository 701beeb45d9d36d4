//! Typed failure taxonomy for the chat-completion provider.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Seconds to wait after a rate limit when the provider sends no usable
/// `retry-after` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Stable, machine-readable error codes.
///
/// These strings are persisted in generation error logs and returned to
/// HTTP callers, so they must never change once released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Invalid or missing client configuration.
    ConfigError,
    /// Provider rejected the API key (401).
    Unauthorized,
    /// API key lacks access to the resource (403).
    Forbidden,
    /// Too many requests (429).
    RateLimited,
    /// Account credits exhausted (402).
    QuotaExceeded,
    /// Provider rejected the request body (400).
    BadRequest,
    /// Requested model does not exist (404).
    ModelNotFound,
    /// Response carried no message content.
    EmptyResponse,
    /// Response content was not valid JSON.
    InvalidJson,
    /// Response JSON did not match the requested schema.
    ValidationFailed,
    /// Provider-side failure (500, 502, 503).
    ServerError,
    /// Transport-level failure.
    NetworkError,
    /// Attempt exceeded its deadline.
    Timeout,
    /// Anything not covered above.
    UnknownError,
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::RateLimited => "RATE_LIMITED",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::BadRequest => "BAD_REQUEST",
            Self::ModelNotFound => "MODEL_NOT_FOUND",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::InvalidJson => "INVALID_JSON",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ServerError => "SERVER_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Returns the category this code belongs to.
    #[must_use]
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::ConfigError => ErrorCategory::Configuration,
            Self::Unauthorized | Self::Forbidden => ErrorCategory::Authentication,
            Self::RateLimited => ErrorCategory::RateLimit,
            Self::QuotaExceeded => ErrorCategory::Quota,
            Self::BadRequest | Self::ModelNotFound => ErrorCategory::Request,
            Self::EmptyResponse | Self::InvalidJson | Self::ValidationFailed => {
                ErrorCategory::Response
            }
            Self::ServerError => ErrorCategory::Server,
            Self::NetworkError | Self::Timeout => ErrorCategory::Network,
            Self::UnknownError => ErrorCategory::Unknown,
        }
    }

    /// Whether re-attempting the same request may succeed.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Server | ErrorCategory::Network
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad failure category used for policy decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Construction-time configuration problems.
    Configuration,
    /// Credentials rejected.
    Authentication,
    /// Provider throttling.
    RateLimit,
    /// Billing limits.
    Quota,
    /// Malformed or unroutable request.
    Request,
    /// Response did not honour the structured-output contract.
    Response,
    /// Provider-side failure.
    Server,
    /// Transport failure or timeout.
    Network,
    /// Unclassified.
    Unknown,
}

/// Errors raised by the chat-completion client.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Client configuration is invalid.
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// API key was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API key is not allowed to perform the request.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Provider is throttling this client.
    #[error("Rate limit exceeded (retry after {retry_after}s): {message}")]
    RateLimited {
        /// Provider message.
        message: String,
        /// Seconds the provider asked us to wait.
        retry_after: u64,
    },

    /// Account has run out of credits.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Request body was rejected.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Model is unknown to the provider.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// No message content in the response.
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Response could not be parsed as JSON.
    #[error("Invalid JSON in response: {message}")]
    InvalidJson {
        /// What failed to parse.
        message: String,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Response JSON does not satisfy the schema.
    #[error("Response failed schema validation: {0}")]
    ValidationFailed(String),

    /// Provider returned a 5xx status.
    #[error("Server error (HTTP {status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// Transport failed before a response arrived.
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Attempt exceeded its deadline.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Unclassified provider failure.
    #[error("Unexpected provider error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Unknown {
        /// HTTP status code, when one was received.
        status: Option<u16>,
        /// Provider message.
        message: String,
    },
}

impl ProviderError {
    /// Returns the stable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::QuotaExceeded(_) => ErrorCode::QuotaExceeded,
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::ModelNotFound(_) => ErrorCode::ModelNotFound,
            Self::EmptyResponse(_) => ErrorCode::EmptyResponse,
            Self::InvalidJson { .. } => ErrorCode::InvalidJson,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::ServerError { .. } => ErrorCode::ServerError,
            Self::Network { .. } => ErrorCode::NetworkError,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::Unknown { .. } => ErrorCode::UnknownError,
        }
    }

    /// Whether the request may be re-attempted.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// Seconds the provider asked us to wait, for rate-limit errors.
    #[must_use]
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Classifies a non-success HTTP status.
    ///
    /// `retry_after` is only consulted for 429 responses.
    #[must_use]
    pub fn from_status(status: u16, message: String, retry_after: Option<u64>) -> Self {
        match status {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            402 => Self::QuotaExceeded(message),
            403 => Self::Forbidden(message),
            404 => Self::ModelNotFound(message),
            429 => Self::RateLimited {
                message,
                retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            500 | 502 | 503 => Self::ServerError { status, message },
            _ => Self::Unknown {
                status: Some(status),
                message,
            },
        }
    }

    /// Classifies a transport error raised by `reqwest`.
    #[must_use]
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network {
                message: err.to_string(),
                source: err,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_documented_codes() {
        let cases = [
            (400, ErrorCode::BadRequest),
            (401, ErrorCode::Unauthorized),
            (402, ErrorCode::QuotaExceeded),
            (403, ErrorCode::Forbidden),
            (404, ErrorCode::ModelNotFound),
            (429, ErrorCode::RateLimited),
            (500, ErrorCode::ServerError),
            (502, ErrorCode::ServerError),
            (503, ErrorCode::ServerError),
            (504, ErrorCode::UnknownError),
            (418, ErrorCode::UnknownError),
        ];
        for (status, expected) in cases {
            let err = ProviderError::from_status(status, "boom".to_string(), None);
            assert_eq!(err.code(), expected, "status {status}");
        }
    }

    #[test]
    fn retryable_codes() {
        let retryable: Vec<_> = [
            ErrorCode::ConfigError,
            ErrorCode::Unauthorized,
            ErrorCode::Forbidden,
            ErrorCode::RateLimited,
            ErrorCode::QuotaExceeded,
            ErrorCode::BadRequest,
            ErrorCode::ModelNotFound,
            ErrorCode::EmptyResponse,
            ErrorCode::InvalidJson,
            ErrorCode::ValidationFailed,
            ErrorCode::ServerError,
            ErrorCode::NetworkError,
            ErrorCode::Timeout,
            ErrorCode::UnknownError,
        ]
        .into_iter()
        .filter(|c| c.is_retryable())
        .collect();

        assert_eq!(
            retryable,
            vec![
                ErrorCode::RateLimited,
                ErrorCode::ServerError,
                ErrorCode::NetworkError,
                ErrorCode::Timeout,
            ]
        );
    }

    #[test]
    fn rate_limit_defaults_retry_after() {
        let err = ProviderError::from_status(429, "slow down".to_string(), None);
        assert_eq!(err.retry_after(), Some(DEFAULT_RETRY_AFTER_SECS));

        let err = ProviderError::from_status(429, "slow down".to_string(), Some(120));
        assert_eq!(err.retry_after(), Some(120));
    }

    #[test]
    fn retry_after_ignored_for_other_statuses() {
        let err = ProviderError::from_status(503, "down".to_string(), Some(5));
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn code_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::ModelNotFound).unwrap();
        assert_eq!(json, "\"MODEL_NOT_FOUND\"");
        assert_eq!(ErrorCode::ModelNotFound.to_string(), "MODEL_NOT_FOUND");
    }

    #[test]
    fn invalid_json_keeps_source() {
        use std::error::Error as _;

        let source = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err = ProviderError::InvalidJson {
            message: "content".to_string(),
            source,
        };
        assert!(err.source().is_some());
        assert_eq!(err.code(), ErrorCode::InvalidJson);
    }

    #[test]
    fn unknown_display_includes_status() {
        let err = ProviderError::from_status(418, "teapot".to_string(), None);
        assert_eq!(err.to_string(), "Unexpected provider error (HTTP 418): teapot");
    }
}
