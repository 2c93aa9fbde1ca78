//! Shared HTTP client utilities

use mpsiem_core::{Error, Result};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of retries for transient errors (idempotent requests only)
    pub max_retries: u32,

    /// User agent string
    pub user_agent: String,

    /// Skip TLS certificate validation (lab installations with self-signed certs)
    pub accept_invalid_certs: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            connect_timeout_secs: 10,
            max_retries: 0,
            user_agent: format!("mpsiem/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: false,
        }
    }
}

/// Create a configured HTTP client.
///
/// When `access_token` is given it is sent as a bearer token on every request.
pub fn create_client(config: &HttpClientConfig, access_token: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = access_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::Config(format!("Invalid access token: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Whether a failed attempt is worth repeating
pub(crate) fn is_retryable(error: &Error) -> bool {
    match error {
        Error::Request { .. } | Error::Timeout { .. } => true,
        Error::Status { status_code, .. } => matches!(status_code, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

/// Retry policy for transient errors
pub async fn with_retry<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                attempt += 1;
                let backoff_ms = 2u64.pow(attempt - 1) * 100; // 100ms, 200ms, 400ms
                warn!(
                    "Request failed (attempt {}/{}), retrying in {}ms: {}",
                    attempt,
                    max_retries + 1,
                    backoff_ms,
                    e
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                debug!("Retrying request (retry {}/{})", attempt, max_retries);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.max_retries, 0);
        assert!(!config.accept_invalid_certs);
        assert!(config.user_agent.starts_with("mpsiem/"));
    }

    #[test]
    fn test_create_client() {
        let config = HttpClientConfig::default();
        assert!(create_client(&config, None).is_ok());
        assert!(create_client(&config, Some("token-123")).is_ok());
    }

    #[test]
    fn test_create_client_rejects_bad_token() {
        let config = HttpClientConfig::default();
        let result = create_client(&config, Some("bad\ntoken"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_retryable_classification() {
        let status = |status_code| Error::Status {
            url: "https://siem".to_string(),
            status_code,
            body: String::new(),
        };

        assert!(is_retryable(&status(503)));
        assert!(is_retryable(&status(429)));
        assert!(!is_retryable(&status(404)));
        assert!(!is_retryable(&status(401)));
        assert!(is_retryable(&Error::Timeout {
            url: "https://siem".to_string(),
            timeout_secs: 1,
        }));
        assert!(!is_retryable(&Error::MalformedResponse("x".to_string())));
        assert!(!is_retryable(&Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = with_retry(3, || async { Ok::<i32, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_non_retryable_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<i32, Error>(Error::MalformedResponse("bad body".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(2, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::Status {
                    url: "https://siem".to_string(),
                    status_code: 502,
                    body: String::new(),
                })
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(2, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<i32, Error>(Error::Status {
                url: "https://siem".to_string(),
                status_code: 503,
                body: String::new(),
            })
        })
        .await;

        assert!(matches!(result, Err(Error::Status { status_code: 503, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
