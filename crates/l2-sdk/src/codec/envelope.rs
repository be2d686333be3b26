use std::collections::BTreeMap;
use std::io::Cursor;

use ciborium::Value as Cbor;
use ciborium::value::Integer;
use serde_json::Value as Json;

use super::{as_object, describe, require};
use crate::address::Address;
use crate::error::DecodeError;
use crate::types::{AssetId, TxId, TxIn, TxOut, Utxo, Value};

/// Envelope record: `{ outref, value }` holding the CBOR ledger encodings of
/// the input and the output.
///
/// Each byte field may arrive as a hex string, a JSON list of byte values or
/// a serialized buffer `{ "type": "Buffer", "data": [..] }`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeRecord {
    pub outref: Vec<u8>,
    pub value: Vec<u8>,
}

impl EnvelopeRecord {
    pub fn parse(raw: &Json) -> Result<Self, DecodeError> {
        let obj = as_object(raw, "record")?;
        Ok(Self {
            outref: byte_field(require(obj, "outref")?, "outref")?,
            value: byte_field(require(obj, "value")?, "value")?,
        })
    }

    pub fn into_utxo(self) -> Result<Utxo, DecodeError> {
        Ok(Utxo::new(
            decode_tx_in(&self.outref)?,
            decode_tx_out(&self.value)?,
        ))
    }
}

fn byte_field(raw: &Json, field: &'static str) -> Result<Vec<u8>, DecodeError> {
    match raw {
        Json::String(s) => hex::decode(s).map_err(|e| DecodeError::Hex(format!("{field}: {e}"))),
        Json::Array(items) => byte_list(items, field),
        Json::Object(obj) if obj.get("type").and_then(Json::as_str) == Some("Buffer") => {
            match obj.get("data") {
                Some(Json::Array(items)) => byte_list(items, field),
                _ => Err(DecodeError::invalid(field, "buffer without a `data` list")),
            }
        }
        other => Err(DecodeError::invalid(
            field,
            format!("expected bytes, got {}", describe(other)),
        )),
    }
}

fn byte_list(items: &[Json], field: &'static str) -> Result<Vec<u8>, DecodeError> {
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| DecodeError::invalid(field, format!("{item} is not a byte")))
        })
        .collect()
}

// ── CBOR ledger encodings ───────────────────────────────────────────

const OUT_ADDRESS: u64 = 0;
const OUT_VALUE: u64 = 1;

fn read_cbor(bytes: &[u8]) -> Result<Cbor, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let value: Cbor =
        ciborium::from_reader(&mut cursor).map_err(|e| DecodeError::Cbor(e.to_string()))?;
    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(DecodeError::Cbor(format!(
            "{} trailing bytes",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}

fn uint(v: &Cbor, field: &'static str) -> Result<u64, DecodeError> {
    v.as_integer()
        .and_then(|i| u64::try_from(i).ok())
        .ok_or_else(|| DecodeError::invalid(field, "expected an unsigned integer"))
}

fn bytes<'a>(v: &'a Cbor, field: &'static str) -> Result<&'a [u8], DecodeError> {
    v.as_bytes()
        .map(Vec::as_slice)
        .ok_or_else(|| DecodeError::invalid(field, "expected a byte string"))
}

fn map<'a>(v: &'a Cbor, field: &'static str) -> Result<&'a [(Cbor, Cbor)], DecodeError> {
    v.as_map()
        .map(Vec::as_slice)
        .ok_or_else(|| DecodeError::invalid(field, "expected a map"))
}

/// Decode a ledger input: `[tx_id: bytes .size 32, index: uint]`.
pub fn decode_tx_in(raw: &[u8]) -> Result<TxIn, DecodeError> {
    let value = read_cbor(raw)?;
    let [tx_id, index] = value
        .as_array()
        .and_then(|a| <&[Cbor; 2]>::try_from(a.as_slice()).ok())
        .ok_or_else(|| DecodeError::invalid("outref", "expected a two-element array"))?;

    let tx_id = TxId::from_slice(bytes(tx_id, "tx_id")?)?;
    let index = u32::try_from(uint(index, "index")?)
        .map_err(|_| DecodeError::invalid("index", "out of range"))?;
    Ok(TxIn::new(tx_id, index))
}

/// Decode a ledger output in either the legacy array form
/// `[address, value, ?datum_hash]` or the map form `{0: address, 1: value, ..}`.
/// Datum and script fields are accepted and ignored.
pub fn decode_tx_out(raw: &[u8]) -> Result<TxOut, DecodeError> {
    let value = read_cbor(raw)?;

    let (address, amount) = match &value {
        Cbor::Array(items) if (2..=3).contains(&items.len()) => (&items[0], &items[1]),
        Cbor::Array(items) => {
            return Err(DecodeError::invalid(
                "output",
                format!("array of {} elements", items.len()),
            ));
        }
        Cbor::Map(entries) => {
            let mut address = None;
            let mut amount = None;
            for (key, v) in entries {
                let slot = match uint(key, "output key")? {
                    OUT_ADDRESS => &mut address,
                    OUT_VALUE => &mut amount,
                    _ => continue,
                };
                if slot.replace(v).is_some() {
                    return Err(DecodeError::DuplicateEntry(format!("output key {key:?}")));
                }
            }
            (
                address.ok_or(DecodeError::MissingField("address"))?,
                amount.ok_or(DecodeError::MissingField("value"))?,
            )
        }
        _ => return Err(DecodeError::invalid("output", "expected an array or a map")),
    };

    Ok(TxOut {
        address: Address::from_ledger_bytes(bytes(address, "address")?)?,
        value: decode_value(amount)?,
    })
}

/// `coin` or `[coin, { policy_id => { asset_name => quantity } }]`.
fn decode_value(v: &Cbor) -> Result<Value, DecodeError> {
    if v.is_integer() {
        return Ok(Value::coins(uint(v, "coins")?));
    }

    let [coins, multiasset] = v
        .as_array()
        .and_then(|a| <&[Cbor; 2]>::try_from(a.as_slice()).ok())
        .ok_or_else(|| DecodeError::invalid("value", "expected a coin or [coin, assets]"))?;

    let mut assets = BTreeMap::new();
    for (policy, names) in map(multiasset, "assets")? {
        let policy = bytes(policy, "policy_id")?;
        for (name, quantity) in map(names, "assets")? {
            let asset = AssetId::from_parts(policy, bytes(name, "asset_name")?)?;
            let quantity = uint(quantity, "quantity")?;
            if assets.insert(asset.clone(), quantity).is_some() {
                return Err(DecodeError::DuplicateEntry(asset.to_string()));
            }
        }
    }

    Ok(Value {
        coins: uint(coins, "coins")?,
        assets,
    })
}

fn write_cbor(value: &Cbor) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    ciborium::into_writer(value, &mut out).map_err(|e| DecodeError::Cbor(e.to_string()))?;
    Ok(out)
}

pub fn encode_tx_in(input: &TxIn) -> Vec<u8> {
    let value = Cbor::Array(vec![
        Cbor::Bytes(input.tx_id.as_bytes().to_vec()),
        Cbor::Integer(Integer::from(input.index)),
    ]);
    // Writing into a Vec cannot fail.
    write_cbor(&value).unwrap_or_default()
}

/// Encode an output in the array form. Fails only if the address string has
/// no ledger byte form.
pub fn encode_tx_out(output: &TxOut) -> Result<Vec<u8>, DecodeError> {
    let address = Cbor::Bytes(output.address.to_ledger_bytes()?);

    let coins = Cbor::Integer(Integer::from(output.value.coins));
    let amount = if output.value.assets.is_empty() {
        coins
    } else {
        let mut by_policy: BTreeMap<&[u8], Vec<(Cbor, Cbor)>> = BTreeMap::new();
        for (asset, quantity) in &output.value.assets {
            by_policy.entry(asset.policy_id()).or_default().push((
                Cbor::Bytes(asset.asset_name().to_vec()),
                Cbor::Integer(Integer::from(*quantity)),
            ));
        }
        let multiasset = by_policy
            .into_iter()
            .map(|(policy, names)| (Cbor::Bytes(policy.to_vec()), Cbor::Map(names)))
            .collect();
        Cbor::Array(vec![coins, Cbor::Map(multiasset)])
    };

    write_cbor(&Cbor::Array(vec![address, amount]))
}
