//! Error types for mpsiem Core

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (DNS, TLS, connection reset, ...)
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Non-2xx HTTP answer
    #[error("Request to {url} returned HTTP {status_code}: {body}")]
    Status {
        url: String,
        status_code: u16,
        body: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration not found")]
    ConfigNotFound,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures of the HTTP call itself: transport errors,
    /// timeouts and non-2xx statuses.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::Request { .. } | Error::Timeout { .. } | Error::Status { .. }
        )
    }

    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Error::MalformedResponse(_))
    }

    /// Build a `MalformedResponse` for a required field that is absent.
    pub fn missing_field(field: &str, context: &str) -> Self {
        Error::MalformedResponse(format!("missing '{}' in {}", field, context))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
