//! HTTP access to the L2 backend.
//!
//! The transport issues exactly one request per call. Retries and fallbacks
//! belong to the layers above it.

mod admission;
mod http;

use async_trait::async_trait;
use serde_json::Value as Json;

use crate::error::{DecodeError, Result};

pub use admission::{AdmissionControl, AdmissionPermit, RateLimiter, Unlimited};
pub use http::{HttpTransport, TransportConfig};

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Json),
    Raw(Vec<u8>),
    Empty,
}

impl Payload {
    pub(crate) fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Payload::Empty;
        }
        match serde_json::from_slice(body) {
            Ok(json) => Payload::Json(json),
            Err(_) => Payload::Raw(body.to_vec()),
        }
    }

    /// The JSON body, or a decode error naming what arrived instead.
    pub fn into_json(self) -> std::result::Result<Json, DecodeError> {
        match self {
            Payload::Json(json) => Ok(json),
            Payload::Raw(bytes) => Err(DecodeError::UnrecognizedShape(format!(
                "expected JSON, got {} raw bytes",
                bytes.len()
            ))),
            Payload::Empty => Err(DecodeError::UnrecognizedShape(
                "expected JSON, got an empty body".into(),
            )),
        }
    }
}

/// Request capability used by every L2 component.
///
/// `path` is relative to the backend base URL and may carry a query string.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Payload>;

    async fn post(&self, path: &str, body: Option<&Json>) -> Result<Payload>;
}
