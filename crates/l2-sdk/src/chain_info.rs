//! Epoch, network and block information from the L2 backend.
//!
//! The backend omits several fields; those are filled with fixed defaults.
//! Required fields that are missing, and every transport failure, are errors.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::Transport;

fn zero() -> String {
    "0".to_string()
}

fn slot_leader() -> String {
    "pool1dummy".to_string()
}

fn vrf_key() -> String {
    "vrf_vkdummy".to_string()
}

fn op_cert() -> String {
    "op_certdummy".to_string()
}

fn genesis() -> String {
    "genesis".to_string()
}

// ── Epochs ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    pub epoch: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub first_block_time: u64,
    pub last_block_time: u64,
    pub block_count: String,
    pub tx_count: String,
    pub output: String,
    pub fees: String,
    pub active_stake: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEpoch {
    epoch: u64,
    start_time: u64,
    end_time: u64,
    first_block_time: Option<u64>,
    last_block_time: Option<u64>,
    #[serde(default = "zero")]
    block_count: String,
    #[serde(default = "zero")]
    tx_count: String,
    #[serde(default = "zero")]
    output: String,
    #[serde(default = "zero")]
    fees: String,
    #[serde(default = "zero")]
    active_stake: String,
}

impl From<RawEpoch> for EpochInfo {
    fn from(raw: RawEpoch) -> Self {
        Self {
            epoch: raw.epoch,
            start_time: raw.start_time,
            end_time: raw.end_time,
            first_block_time: raw.first_block_time.unwrap_or(raw.start_time),
            last_block_time: raw.last_block_time.unwrap_or(raw.end_time),
            block_count: raw.block_count,
            tx_count: raw.tx_count,
            output: raw.output,
            fees: raw.fees,
            active_stake: raw.active_stake,
        }
    }
}

// ── Network ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub max: String,
    pub total: String,
    pub circulating: String,
    pub locked: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub live: String,
    pub active: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub supply: Supply,
    pub stake: Stake,
}

// ── Blocks ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTip {
    pub block_no: u64,
    pub slot: u64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub time: u64,
    pub height: u64,
    pub hash: String,
    pub slot: u64,
    pub epoch: u64,
    #[serde(default = "zero")]
    pub epoch_slot: String,
    #[serde(default = "slot_leader")]
    pub slot_leader: String,
    #[serde(default = "zero")]
    pub size: String,
    #[serde(default = "zero")]
    pub tx_count: String,
    #[serde(default = "zero")]
    pub fees: String,
    #[serde(default = "vrf_key")]
    pub vrf_key: String,
    #[serde(default = "op_cert")]
    pub op_cert: String,
    #[serde(default = "zero")]
    pub op_cert_counter: String,
    #[serde(default = "genesis")]
    pub previous_block: String,
    #[serde(default = "genesis")]
    pub next_block: String,
    #[serde(default = "zero")]
    pub confirmations: String,
}

// ── Provider ────────────────────────────────────────────────────────

pub struct ChainInfoProvider {
    transport: Arc<dyn Transport>,
}

impl ChainInfoProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.transport.get(path).await?.into_json()?;
        serde_json::from_value(body).map_err(|e| {
            log::error!("chain_info: {path}: unexpected body: {e}");
            Error::InvalidResponse(format!("{path}: {e}"))
        })
    }

    pub async fn latest_epoch(&self) -> Result<EpochInfo> {
        log::debug!("chain_info: fetching latest epoch");
        self.fetch::<RawEpoch>("epochs/latest").await.map(EpochInfo::from)
    }

    pub async fn network_info(&self) -> Result<NetworkInfo> {
        log::debug!("chain_info: fetching network info");
        self.fetch("network").await
    }

    pub async fn latest_block(&self) -> Result<BlockTip> {
        log::debug!("chain_info: fetching latest block");
        self.fetch("blocks/latest").await
    }

    /// Block by hash or height.
    pub async fn block(&self, hash_or_number: &str) -> Result<BlockInfo> {
        if hash_or_number.is_empty() || !hash_or_number.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::InvalidInput(format!(
                "block id {hash_or_number:?} is neither a hash nor a number"
            )));
        }
        log::debug!("chain_info: fetching block {hash_or_number}");
        self.fetch(&format!("blocks/{hash_or_number}")).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn epoch_fills_optional_fields() {
        let raw: RawEpoch = serde_json::from_value(json!({
            "epoch": 7, "startTime": 100, "endTime": 200, "fees": "12"
        }))
        .unwrap();
        let epoch = EpochInfo::from(raw);
        assert_eq!(epoch.first_block_time, 100);
        assert_eq!(epoch.last_block_time, 200);
        assert_eq!(epoch.fees, "12");
        assert_eq!(epoch.block_count, "0");
        assert_eq!(epoch.active_stake, "0");
    }

    #[test]
    fn epoch_requires_bounds() {
        assert!(serde_json::from_value::<RawEpoch>(json!({"epoch": 7, "startTime": 1})).is_err());
    }

    #[test]
    fn block_fills_optional_fields() {
        let block: BlockInfo = serde_json::from_value(json!({
            "time": 1, "height": 2, "hash": "ab", "slot": 3, "epoch": 4, "size": "900"
        }))
        .unwrap();
        assert_eq!(block.size, "900");
        assert_eq!(block.slot_leader, "pool1dummy");
        assert_eq!(block.vrf_key, "vrf_vkdummy");
        assert_eq!(block.op_cert, "op_certdummy");
        assert_eq!(block.previous_block, "genesis");
        assert_eq!(block.next_block, "genesis");
        assert_eq!(block.epoch_slot, "0");
        assert_eq!(block.confirmations, "0");
    }

    #[test]
    fn block_requires_identity_fields() {
        assert!(serde_json::from_value::<BlockInfo>(json!({"time": 1, "height": 2})).is_err());
    }
}
