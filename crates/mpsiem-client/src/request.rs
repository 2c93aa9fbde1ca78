//! JSON request execution against the SIEM core API

use crate::client::with_retry;
use crate::connection::Connection;
use mpsiem_core::{Error, Result};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// Execute one API call and decode the JSON answer.
///
/// `path` is relative to the connection's base URL. The connection timeout
/// bounds each attempt. Only GET requests are retried; writes are sent once.
#[instrument(skip(connection, body), fields(hostname = %connection.hostname()))]
pub async fn exec_request(
    connection: &Connection,
    method: Method,
    path: &str,
    body: Option<&Value>,
) -> Result<Value> {
    let session = connection.session()?;
    let url = connection.url(path);
    let url = url.as_str();
    let timeout_secs = connection.config().timeout_secs;
    let max_retries = if method == Method::GET {
        connection.config().max_retries
    } else {
        0
    };

    with_retry(max_retries, move || {
        send_once(session, method.clone(), url, timeout_secs, body)
    })
    .await
}

async fn send_once(
    session: &Client,
    method: Method,
    url: &str,
    timeout_secs: u64,
    body: Option<&Value>,
) -> Result<Value> {
    debug!("{} {}", method, url);

    let mut request = session
        .request(method, url)
        .timeout(Duration::from_secs(timeout_secs));
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(url, timeout_secs, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        return Err(Error::Status {
            url: url.to_string(),
            status_code: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(url, timeout_secs, e))?;

    decode_json(&bytes)
        .map_err(|e| Error::MalformedResponse(format!("invalid JSON from {}: {}", url, e)))
}

/// Parse a JSON body of any nesting depth; the stack grows on demand.
fn decode_json(bytes: &[u8]) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

fn transport_error(url: &str, timeout_secs: u64, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout {
            url: url.to_string(),
            timeout_secs,
        }
    } else {
        Error::Request {
            url: url.to_string(),
            source: Box::new(error),
        }
    }
}
