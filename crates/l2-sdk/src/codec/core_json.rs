use std::collections::BTreeMap;

use serde_json::Value as Json;

use super::{as_object, parse_quantity, require, require_index, require_str};
use crate::address::Address;
use crate::error::DecodeError;
use crate::types::{AssetId, TxId, TxIn, TxOut, Utxo, Value};

/// Pair record: `[ {txId, index}, {address, value: {coins, assets}} ]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorePairRecord {
    pub input: TxIn,
    pub output: TxOut,
}

impl CorePairRecord {
    pub fn parse(raw: &Json) -> Result<Self, DecodeError> {
        let [input, output] = raw
            .as_array()
            .and_then(|a| <&[Json; 2]>::try_from(a.as_slice()).ok())
            .ok_or_else(|| DecodeError::invalid("record", "expected an [input, output] pair"))?;

        let input = as_object(input, "input")?;
        let tx_id: TxId = require_str(input, "txId")?.parse()?;
        let index = require_index(input, "index")?;

        let output = as_object(output, "output")?;
        let address = Address::new(require_str(output, "address")?)?;
        let value = as_object(require(output, "value")?, "value")?;

        let coins = parse_quantity(require(value, "coins")?, "coins")?;
        let mut assets = BTreeMap::new();
        match value.get("assets") {
            None | Some(Json::Null) => {}
            Some(Json::Object(entries)) => {
                for (unit, quantity) in entries {
                    let asset: AssetId = unit.parse()?;
                    assets.insert(asset, parse_quantity(quantity, "assets")?);
                }
            }
            Some(_) => return Err(DecodeError::invalid("assets", "expected an object")),
        }

        Ok(Self {
            input: TxIn::new(tx_id, index),
            output: TxOut {
                address,
                value: Value { coins, assets },
            },
        })
    }

    pub fn into_utxo(self) -> Utxo {
        Utxo::new(self.input, self.output)
    }
}
