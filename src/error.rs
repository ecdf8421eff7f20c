//! Error types for the LocalBitcoins client library.

use thiserror::Error;

/// The main error type for all LocalBitcoins client operations.
#[derive(Error, Debug)]
pub enum LbError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    TransportMiddleware(#[from] reqwest_middleware::Error),

    /// Response received with a non-success status code
    #[error("HTTP status {status}: {body}")]
    Status {
        /// The HTTP status code of the response
        status: reqwest::StatusCode,
        /// The raw response body, for caller inspection
        body: String,
    },

    /// Response body could not be parsed as JSON
    #[error("failed to decode response body: {source}; body: {body}")]
    Decode {
        /// The underlying JSON error
        source: serde_json::Error,
        /// The raw response body that failed to parse
        body: String,
    },

    /// LocalBitcoins API returned an error envelope
    #[error("LocalBitcoins API error: {0}")]
    Api(ApiError),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Request parameters could not be form-encoded
    #[error("failed to encode request params: {0}")]
    Params(#[from] serde_urlencoded::ser::Error),

    /// HTTP method other than GET or POST
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// Error payload returned by the LocalBitcoins API in the `error` key of the
/// response envelope.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ApiError {
    /// Numeric error code (e.g. 9 for insufficient permissions)
    pub error_code: Option<u64>,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.error_code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl ApiError {
    /// Create a new API error from code and message.
    pub fn new(error_code: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            error_code,
            message: message.into(),
        }
    }
}
