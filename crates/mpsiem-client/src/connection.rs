//! Authenticated session bound to a SIEM core host

use crate::client::{HttpClientConfig, create_client};
use mpsiem_core::{Error, Result};
use reqwest::Client;
use tracing::debug;

/// Connection to the SIEM core API.
///
/// Holds the HTTP session used for every request and the host it targets.
/// Obtaining the session credentials is up to the caller.
#[derive(Debug)]
pub struct Connection {
    hostname: String,
    base_url: String,
    session: Option<Client>,
    config: HttpClientConfig,
}

impl Connection {
    /// Create a connection to `https://{hostname}` with a freshly built client
    pub fn new(
        hostname: impl Into<String>,
        config: HttpClientConfig,
        access_token: Option<&str>,
    ) -> Result<Self> {
        let session = create_client(&config, access_token)?;
        Ok(Self::with_session(hostname, session, config))
    }

    /// Wrap an already authenticated client
    pub fn with_session(hostname: impl Into<String>, session: Client, config: HttpClientConfig) -> Self {
        let hostname = hostname.into();
        let base_url = format!("https://{}", hostname);
        Self {
            hostname,
            base_url,
            session: Some(session),
            config,
        }
    }

    /// Override the base URL (plain-HTTP deployments, mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Absolute URL for an API path such as `/api/v2/events/folders`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// HTTP session, or `ConnectionClosed` once `close` was called
    pub fn session(&self) -> Result<&Client> {
        self.session.as_ref().ok_or(Error::ConnectionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Drop the HTTP session. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            debug!(hostname = %self.hostname, "Closed SIEM core connection");
        }
    }
}
