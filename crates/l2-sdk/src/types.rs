//! Canonical ledger primitives every wire shape decodes into.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;
use crate::error::DecodeError;

pub const TX_ID_LEN: usize = 32;
pub const POLICY_ID_LEN: usize = 28;
pub const MAX_ASSET_NAME_LEN: usize = 32;

// ── Transaction id ──────────────────────────────────────────────────

/// 32-byte transaction hash, displayed as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId([u8; TX_ID_LEN]);

impl TxId {
    pub const fn new(bytes: [u8; TX_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let arr: [u8; TX_ID_LEN] = bytes.try_into().map_err(|_| {
            DecodeError::invalid(
                "tx_id",
                format!("expected {TX_ID_LEN} bytes, got {}", bytes.len()),
            )
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; TX_ID_LEN] {
        &self.0
    }
}

impl FromStr for TxId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| DecodeError::Hex(format!("tx_id: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({self})")
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Inputs ──────────────────────────────────────────────────────────

/// Reference to an output of a prior transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxIn {
    pub tx_id: TxId,
    pub index: u32,
}

impl TxIn {
    pub fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }

    /// Identity key `"{txId}#{index}"`, used for caching and fingerprints.
    pub fn key(&self) -> String {
        format!("{}#{}", self.tx_id, self.index)
    }
}

impl fmt::Display for TxIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

// ── Assets ──────────────────────────────────────────────────────────

/// Native asset identifier: 28-byte policy id followed by an asset name of
/// at most 32 bytes. Rendered as the hex concatenation of both.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId {
    policy_id: [u8; POLICY_ID_LEN],
    asset_name: Vec<u8>,
}

impl AssetId {
    pub fn new(policy_id: [u8; POLICY_ID_LEN], asset_name: &[u8]) -> Result<Self, DecodeError> {
        if asset_name.len() > MAX_ASSET_NAME_LEN {
            return Err(DecodeError::invalid(
                "asset_name",
                format!("{} bytes exceeds {MAX_ASSET_NAME_LEN}", asset_name.len()),
            ));
        }
        Ok(Self {
            policy_id,
            asset_name: asset_name.to_vec(),
        })
    }

    pub fn from_parts(policy_id: &[u8], asset_name: &[u8]) -> Result<Self, DecodeError> {
        let policy_id: [u8; POLICY_ID_LEN] = policy_id.try_into().map_err(|_| {
            DecodeError::invalid(
                "policy_id",
                format!("expected {POLICY_ID_LEN} bytes, got {}", policy_id.len()),
            )
        })?;
        Self::new(policy_id, asset_name)
    }

    pub fn policy_id(&self) -> &[u8; POLICY_ID_LEN] {
        &self.policy_id
    }

    pub fn asset_name(&self) -> &[u8] {
        &self.asset_name
    }
}

impl FromStr for AssetId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| DecodeError::Hex(format!("asset id: {e}")))?;
        if bytes.len() < POLICY_ID_LEN {
            return Err(DecodeError::invalid(
                "unit",
                format!("asset id shorter than a {POLICY_ID_LEN}-byte policy id"),
            ));
        }
        let (policy, name) = bytes.split_at(POLICY_ID_LEN);
        Self::from_parts(policy, name)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            hex::encode(self.policy_id),
            hex::encode(&self.asset_name)
        )
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({self})")
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Outputs ─────────────────────────────────────────────────────────

/// Coin amount plus native assets. `assets` is never absent, only empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub coins: u64,
    #[serde(default)]
    pub assets: BTreeMap<AssetId, u64>,
}

impl Value {
    pub fn coins(coins: u64) -> Self {
        Self {
            coins,
            assets: BTreeMap::new(),
        }
    }

    pub fn with_asset(mut self, asset: AssetId, quantity: u64) -> Self {
        self.assets.insert(asset, quantity);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub address: Address,
    pub value: Value,
}

/// An unspent output together with the input that references it.
///
/// Only ever built from a fully decoded `TxOut`; a failed decode yields no
/// `Utxo` at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub input: TxIn,
    pub output: TxOut,
}

impl Utxo {
    pub fn new(input: TxIn, output: TxOut) -> Self {
        Self { input, output }
    }
}

// ── Resolution hints ────────────────────────────────────────────────

/// A transaction known to the caller, reduced to what input resolution needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub id: TxId,
    pub outputs: Vec<TxOut>,
}

/// Caller-supplied data that lets an input be resolved without network access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveHints {
    #[serde(default)]
    pub transactions: Vec<Tx>,
    #[serde(default)]
    pub utxos: Vec<Utxo>,
}

impl ResolveHints {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.utxos.is_empty()
    }
}

/// Which backend answered for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    L2,
    L1,
}

impl fmt::Display for ProviderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderBackend::L2 => f.write_str("l2"),
            ProviderBackend::L1 => f.write_str("l1"),
        }
    }
}
