use std::collections::BTreeMap;

use serde_json::Value as Json;

use super::{as_object, parse_quantity, require, require_index, require_str};
use crate::address::Address;
use crate::error::DecodeError;
use crate::types::{AssetId, TxId, TxIn, TxOut, Utxo, Value};

const LOVELACE: &str = "lovelace";

/// Indexer-style record: `{ tx_hash, output_index, address, amount: [{unit, quantity}] }`.
///
/// `amount` holds at most one `lovelace` entry (absent means zero coins) and
/// any number of asset entries keyed by asset id.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRecord {
    pub tx_id: TxId,
    pub output_index: u32,
    pub address: Address,
    pub coins: u64,
    pub assets: BTreeMap<AssetId, u64>,
}

impl LegacyRecord {
    pub fn parse(raw: &Json) -> Result<Self, DecodeError> {
        let obj = as_object(raw, "record")?;

        let tx_id: TxId = require_str(obj, "tx_hash")?.parse()?;
        let output_index = require_index(obj, "output_index")?;
        let address = Address::new(require_str(obj, "address")?)?;

        let amount = require(obj, "amount")?
            .as_array()
            .ok_or_else(|| DecodeError::invalid("amount", "expected a list"))?;

        let mut coins = None;
        let mut assets = BTreeMap::new();
        for entry in amount {
            let entry = as_object(entry, "amount")?;
            let unit = require_str(entry, "unit")?;
            let quantity = parse_quantity(require(entry, "quantity")?, "quantity")?;

            if unit == LOVELACE {
                if coins.replace(quantity).is_some() {
                    return Err(DecodeError::DuplicateEntry(LOVELACE.into()));
                }
                continue;
            }

            let asset: AssetId = unit.parse()?;
            if assets.insert(asset, quantity).is_some() {
                return Err(DecodeError::DuplicateEntry(unit.to_string()));
            }
        }

        Ok(Self {
            tx_id,
            output_index,
            address,
            coins: coins.unwrap_or(0),
            assets,
        })
    }

    pub fn into_utxo(self) -> Utxo {
        Utxo::new(
            TxIn::new(self.tx_id, self.output_index),
            TxOut {
                address: self.address,
                value: Value {
                    coins: self.coins,
                    assets: self.assets,
                },
            },
        )
    }
}
