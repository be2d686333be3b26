use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{AdmissionControl, Payload, RateLimiter, Transport};
use crate::error::{Error, Result};

/// Connection settings for one backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransportConfig {
    pub base_url: String,
    /// Maximum concurrent in-flight requests (default: 4).
    pub max_in_flight: usize,
    /// Minimum gap between request starts in milliseconds (default: 0).
    pub min_spacing_ms: u64,
}

impl TransportConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    pub fn min_spacing(&self) -> Duration {
        Duration::from_millis(self.min_spacing_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            max_in_flight: 4,
            min_spacing_ms: 0,
        }
    }
}

/// `reqwest`-backed [`Transport`] routed through an [`AdmissionControl`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    headers: HeaderMap,
    admission: Arc<dyn AdmissionControl>,
}

impl HttpTransport {
    /// Build a transport with a [`RateLimiter`] sized from `config`.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let limiter = RateLimiter::new(config.max_in_flight, config.min_spacing());
        Self::with_admission(&config.base_url, Arc::new(limiter))
    }

    /// Build a transport around a caller-supplied admission controller, so
    /// several transports can share one.
    pub fn with_admission(base_url: &str, admission: Arc<dyn AdmissionControl>) -> Result<Self> {
        Url::parse(base_url).map_err(|e| Error::Config(format!("bad base url {base_url:?}: {e}")))?;
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: HeaderMap::new(),
            admission,
        })
    }

    /// Attach a header sent with every request (e.g. an API key).
    pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Config(format!("header {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Config(format!("header {name}: {e}")))?;
        self.headers.insert(header, value);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, method: Method, path: &str, body: Option<&Json>) -> Result<Payload> {
        let url = self.url(path);
        log::debug!("transport: {method} {url}");

        let _permit = self.admission.admit().await;

        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            log::error!("transport: {method} {path} failed before a response: {e}");
            Error::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string();
            log::error!("transport: {method} {path} -> {message}");
            return Err(Error::Transport {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            log::error!("transport: {method} {path} body read failed: {e}");
            Error::Network(e)
        })?;
        Ok(Payload::from_body(&bytes))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Payload> {
        self.execute(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Option<&Json>) -> Result<Payload> {
        self.execute(Method::POST, path, body).await
    }
}
