//! Signed transaction submission and backend health probe.

use std::sync::Arc;

use serde_json::Value as Json;

use crate::error::{Error, Result};
use crate::transport::{Payload, Transport};

pub struct SubmissionGateway {
    transport: Arc<dyn Transport>,
}

impl SubmissionGateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Submit a signed transaction, hex-encoded by the caller.
    ///
    /// The backend takes the transaction as the `tx_cbor` query parameter and
    /// no request body. Any 2xx answer means accepted.
    pub async fn submit(&self, signed_tx_hex: &str) -> Result<()> {
        let tx = signed_tx_hex.trim();
        if tx.is_empty() {
            return Err(Error::InvalidInput("empty transaction".into()));
        }
        if tx.len() % 2 != 0 || !tx.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidInput(
                "signed transaction is not an even-length hex string".into(),
            ));
        }

        self.transport
            .post(&format!("submit?tx_cbor={tx}"), None)
            .await?;
        log::info!("gateway: submitted transaction ({} bytes)", tx.len() / 2);
        Ok(())
    }

    /// `true` only when the backend answers `{"status": "healthy"}`.
    pub async fn health_check(&self) -> bool {
        match self.transport.get("health").await {
            Ok(Payload::Json(body)) => {
                let healthy = body.get("status").and_then(Json::as_str) == Some("healthy");
                if !healthy {
                    log::warn!("gateway: backend reports unhealthy: {body}");
                }
                healthy
            }
            Ok(other) => {
                log::warn!("gateway: unexpected health payload: {other:?}");
                false
            }
            Err(e) => {
                log::warn!("gateway: health check failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        posts: Mutex<Vec<(String, Option<Json>)>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn get(&self, _path: &str) -> Result<Payload> {
            Ok(Payload::Json(json!({"status": "degraded"})))
        }

        async fn post(&self, path: &str, body: Option<&Json>) -> Result<Payload> {
            self.posts
                .lock()
                .unwrap()
                .push((path.to_string(), body.cloned()));
            Ok(Payload::Empty)
        }
    }

    #[tokio::test]
    async fn submit_sends_hex_as_query_without_body() {
        let transport = Arc::new(Recorder::default());
        let gateway = SubmissionGateway::new(transport.clone());
        gateway.submit("84a400").await.unwrap();
        let posts = transport.posts.lock().unwrap();
        assert_eq!(posts.as_slice(), [("submit?tx_cbor=84a400".to_string(), None)]);
    }

    #[tokio::test]
    async fn submit_rejects_non_hex_before_any_request() {
        let transport = Arc::new(Recorder::default());
        let gateway = SubmissionGateway::new(transport.clone());
        for bad in ["", "abc", "zz", "84a4&x=1"] {
            assert!(matches!(gateway.submit(bad).await, Err(Error::InvalidInput(_))));
        }
        assert!(transport.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_status_is_not_healthy() {
        let gateway = SubmissionGateway::new(Arc::new(Recorder::default()));
        assert!(!gateway.health_check().await);
    }
}
