//! The "unspent outputs for an address" capability and its L2 implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::codec::{self, WireFormat};
use crate::error::{Error, Result};
use crate::fallback::FailurePolicy;
use crate::transport::Transport;
use crate::types::Utxo;

/// Anything that can list the unspent outputs sitting at an address.
///
/// An `Err` means the source could not answer. An address with no outputs is
/// `Ok(vec![])`.
#[async_trait]
pub trait UtxoSource: Send + Sync {
    async fn utxos_for_address(&self, address: &Address) -> Result<Vec<Utxo>>;
}

/// Settings for the L2 UTXO endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct L2SourceConfig {
    /// Record shape this deployment treats as canonical. Also picks the
    /// request path (default: envelope).
    pub wire_format: WireFormat,
    /// How multi-address lookups aggregate per-address failures.
    pub failure_policy: FailurePolicy,
}

/// [`UtxoSource`] backed by the L2 REST API.
pub struct L2Source {
    transport: Arc<dyn Transport>,
    config: L2SourceConfig,
}

impl L2Source {
    pub fn new(transport: Arc<dyn Transport>, config: L2SourceConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &L2SourceConfig {
        &self.config
    }

    fn path(&self, address: &Address) -> String {
        match self.config.wire_format {
            WireFormat::Envelope => format!("utxos?address={address}"),
            WireFormat::LegacyJson => format!("utxos/{address}"),
        }
    }
}

#[async_trait]
impl UtxoSource for L2Source {
    async fn utxos_for_address(&self, address: &Address) -> Result<Vec<Utxo>> {
        let body = self.transport.get(&self.path(address)).await?.into_json()?;
        let records = codec::utxo_records(body)
            .map_err(|e| Error::InvalidResponse(format!("utxos for {address}: {e}")))?;

        let utxos = codec::decode_batch(&records, self.config.wire_format);
        // A body where nothing decodes is a broken answer, not an empty address.
        if utxos.is_empty() && !records.is_empty() {
            return Err(Error::InvalidResponse(format!(
                "utxos for {address}: none of {} records decoded",
                records.len()
            )));
        }
        if utxos.len() < records.len() {
            log::warn!(
                "source: {address}: dropped {} of {} records",
                records.len() - utxos.len(),
                records.len()
            );
        }
        log::debug!("source: {address}: {} utxos from l2", utxos.len());
        Ok(utxos)
    }
}
