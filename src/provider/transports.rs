//! Concrete transports
//!
//! The one transport the crate ships: a reqwest-backed JSON-RPC client in
//! the middleware shape. Anything else (browser providers, IPC, test
//! doubles) is supplied by the embedder through [`ProviderSource`].
//!
//! [`ProviderSource`]: super::ProviderSource

use crate::provider::{MiddlewareTransport, TransportResult};
use crate::shared::error::ConfigurationError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP JSON-RPC transport.
///
/// Single-shot per request: a transport failure propagates immediately with
/// no retries, per the resolution model. Timeouts are this transport's
/// responsibility, not the core's.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Build a transport for the given endpoint with the default timeout.
    pub fn new(url: &str) -> Result<Self, ConfigurationError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Build a transport with an explicit request timeout.
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, ConfigurationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigurationError::IncorrectProvider {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Endpoint URL this transport posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MiddlewareTransport for HttpTransport {
    async fn send(&self, method: &str, params: Value) -> TransportResult {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        response.json::<Value>().await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_keeps_endpoint_url() {
        let transport = HttpTransport::new("https://mainnet.example/rpc").unwrap();
        assert_eq!(transport.url(), "https://mainnet.example/rpc");
    }
}
