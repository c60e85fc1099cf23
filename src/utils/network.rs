//! HTTP client setup for resource manager calls

use crate::error::{AzstoreError, Result};
use reqwest::Client;
use std::time::Duration;

/// Timeouts and identification of the resource manager HTTP client.
///
/// Request timeouts cover a single call; waiting for long-running operations
/// is bounded separately by the poll options.
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            user_agent: format!("azstore/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub fn create_http_client(options: &HttpClientOptions) -> Result<Client> {
    Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .user_agent(&options.user_agent)
        .build()
        .map_err(|e| AzstoreError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a transport failure into an error naming the endpoint that was called
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> AzstoreError {
    let host = host_of(url);

    if error.is_timeout() {
        return AzstoreError::connection_timeout(format!("Request to '{}' timed out", host));
    }

    if error.is_connect() {
        if looks_like_dns_failure(&error.to_string()) {
            return AzstoreError::network(format!(
                "Unable to resolve host '{}'; check the cloud name and custom endpoints",
                host
            ));
        }
        return AzstoreError::network(format!("Failed to connect to '{}': {}", host, error));
    }

    match error.status().map(|s| s.as_u16()) {
        Some(429) => AzstoreError::network(format!("'{}' is throttling requests (HTTP 429)", host)),
        Some(status @ 502..=504) => AzstoreError::network(format!(
            "'{}' is temporarily unavailable (HTTP {})",
            host, status
        )),
        _ => AzstoreError::network(format!("Network error when calling '{}': {}", host, error)),
    }
}

fn looks_like_dns_failure(message: &str) -> bool {
    let message = message.to_lowercase();
    [
        "dns",
        "name resolution",
        "name or service not known",
        "nodename nor servname provided",
        "no such host",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown-host".to_string())
}
