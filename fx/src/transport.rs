//! Outbound HTTP seam used by provider adapters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{TransportError, TransportResult};

/// Minimal GET-with-query client the adapters need.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with `query` parameters and decode the body as JSON.
    ///
    /// Non-2xx answers are errors.
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> TransportResult<Value>;
}

/// Default timeout for provider requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// `reqwest`-backed transport with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

fn classify(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(url.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        }
    } else if err.is_decode() {
        TransportError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> TransportResult<Value> {
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| classify(url, e))?
            .error_for_status()
            .map_err(|e| classify(url, e))?;

        response.json::<Value>().await.map_err(|e| classify(url, e))
    }
}

/// Scripted transport serving canned answers by URL.
#[cfg(any(test, feature = "test-utils"))]
pub struct StaticTransport {
    responses: dashmap::DashMap<String, TransportResult<Value>>,
    calls: dashmap::DashMap<String, usize>,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticTransport {
    pub fn new() -> Self {
        Self {
            responses: dashmap::DashMap::new(),
            calls: dashmap::DashMap::new(),
        }
    }

    /// Answer GETs to `url` with `body`.
    pub fn respond(&self, url: impl Into<String>, body: Value) {
        self.responses.insert(url.into(), Ok(body));
    }

    /// Fail GETs to `url` with `error`.
    pub fn fail(&self, url: impl Into<String>, error: TransportError) {
        self.responses.insert(url.into(), Err(error));
    }

    /// Number of GETs issued to `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.calls.get(url).map(|c| *c).unwrap_or(0)
    }

    /// Number of GETs issued overall.
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for StaticTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Transport for StaticTransport {
    async fn get_json(&self, url: &str, _query: &[(&str, &str)]) -> TransportResult<Value> {
        *self.calls.entry(url.to_string()).or_insert(0) += 1;

        self.responses
            .get(url)
            .map(|r| r.value().clone())
            .unwrap_or_else(|| {
                Err(TransportError::Status {
                    status: 404,
                    url: url.to_string(),
                })
            })
    }
}
