//! Wire-format decoding for UTXO records.
//!
//! A record is first recognized as one of the known shapes, in a fixed
//! priority order, and turned into a typed [`WireRecord`]. Only then is it
//! decoded into ledger primitives. A record no shape recognizes is a
//! [`DecodeError::UnrecognizedShape`], never a pass-through.
//!
//! Shapes:
//! - envelope: `{ outref, value }` carrying CBOR-encoded ledger input/output
//! - legacy JSON: `{ tx_hash, output_index, address, amount: [{unit, quantity}] }`
//! - core pair: `[ {txId, index}, {address, value: {coins, assets}} ]`

mod core_json;
mod envelope;
mod legacy;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::DecodeError;
use crate::types::{TxOut, Utxo};

pub use core_json::CorePairRecord;
pub use envelope::{EnvelopeRecord, decode_tx_in, decode_tx_out, encode_tx_in, encode_tx_out};
pub use legacy::LegacyRecord;

/// Record shape a deployment treats as canonical. The other shapes are still
/// accepted, after the preferred one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireFormat {
    #[default]
    Envelope,
    LegacyJson,
}

/// Typed intermediate form of one UTXO record.
#[derive(Debug, Clone, PartialEq)]
pub enum WireRecord {
    Envelope(EnvelopeRecord),
    Legacy(LegacyRecord),
    CorePair(CorePairRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Envelope,
    Legacy,
    CorePair,
}

impl Shape {
    fn priority(preferred: WireFormat) -> [Shape; 3] {
        match preferred {
            WireFormat::Envelope => [Shape::Envelope, Shape::Legacy, Shape::CorePair],
            WireFormat::LegacyJson => [Shape::Legacy, Shape::Envelope, Shape::CorePair],
        }
    }

    fn matches(self, raw: &Json) -> bool {
        match self {
            Shape::Envelope => raw
                .as_object()
                .is_some_and(|o| o.contains_key("outref") && o.contains_key("value")),
            Shape::Legacy => raw.as_object().is_some_and(|o| {
                ["tx_hash", "output_index", "amount"]
                    .iter()
                    .any(|key| o.contains_key(*key))
            }),
            Shape::CorePair => raw
                .as_array()
                .is_some_and(|a| a.len() == 2 && a.iter().all(Json::is_object)),
        }
    }
}

impl WireRecord {
    /// Recognize the shape of `raw` and extract its typed fields.
    pub fn parse(raw: &Json, preferred: WireFormat) -> Result<Self, DecodeError> {
        let shape = Shape::priority(preferred)
            .into_iter()
            .find(|shape| shape.matches(raw))
            .ok_or_else(|| DecodeError::UnrecognizedShape(describe(raw)))?;

        match shape {
            Shape::Envelope => EnvelopeRecord::parse(raw).map(WireRecord::Envelope),
            Shape::Legacy => LegacyRecord::parse(raw).map(WireRecord::Legacy),
            Shape::CorePair => CorePairRecord::parse(raw).map(WireRecord::CorePair),
        }
    }

    pub fn into_utxo(self) -> Result<Utxo, DecodeError> {
        match self {
            WireRecord::Envelope(r) => r.into_utxo(),
            WireRecord::Legacy(r) => Ok(r.into_utxo()),
            WireRecord::CorePair(r) => Ok(r.into_utxo()),
        }
    }
}

/// Decode one raw record into a full `Utxo`.
pub fn decode_record(raw: &Json, preferred: WireFormat) -> Result<Utxo, DecodeError> {
    WireRecord::parse(raw, preferred)?.into_utxo()
}

/// Decode one raw record, keeping only its output.
pub fn decode(raw: &Json, preferred: WireFormat) -> Result<TxOut, DecodeError> {
    decode_record(raw, preferred).map(|utxo| utxo.output)
}

/// Split a UTXO endpoint body into its raw records.
///
/// Accepts a bare list or an object carrying a `utxos` list. Anything else
/// is malformed, not an empty result.
pub fn utxo_records(body: Json) -> Result<Vec<Json>, DecodeError> {
    match body {
        Json::Array(records) => Ok(records),
        Json::Object(mut obj) => match obj.remove("utxos") {
            Some(Json::Array(records)) => Ok(records),
            Some(other) => Err(DecodeError::UnrecognizedShape(format!(
                "`utxos` is {}, expected a list",
                describe(&other)
            ))),
            None => Err(DecodeError::UnrecognizedShape(
                "object without a `utxos` list".into(),
            )),
        },
        other => Err(DecodeError::UnrecognizedShape(describe(&other))),
    }
}

/// Decode every record, dropping (and logging) the ones that fail.
pub fn decode_batch(records: &[Json], preferred: WireFormat) -> Vec<Utxo> {
    records
        .iter()
        .filter_map(|raw| match decode_record(raw, preferred) {
            Ok(utxo) => Some(utxo),
            Err(e) => {
                log::warn!("codec: dropping record {raw}: {e}");
                None
            }
        })
        .collect()
}

// ── Field helpers shared by the JSON shapes ─────────────────────────

fn describe(raw: &Json) -> String {
    match raw {
        Json::Null => "null".into(),
        Json::Bool(_) => "a boolean".into(),
        Json::Number(_) => "a number".into(),
        Json::String(_) => "a string".into(),
        Json::Array(a) => format!("a list of {}", a.len()),
        Json::Object(o) => {
            let keys: Vec<&str> = o.keys().map(String::as_str).collect();
            format!("an object with keys [{}]", keys.join(", "))
        }
    }
}

fn as_object<'a>(
    raw: &'a Json,
    field: &'static str,
) -> Result<&'a Map<String, Json>, DecodeError> {
    raw.as_object().ok_or_else(|| {
        DecodeError::invalid(field, format!("expected an object, got {}", describe(raw)))
    })
}

fn require<'a>(obj: &'a Map<String, Json>, field: &'static str) -> Result<&'a Json, DecodeError> {
    match obj.get(field) {
        None | Some(Json::Null) => Err(DecodeError::MissingField(field)),
        Some(v) => Ok(v),
    }
}

fn require_str<'a>(
    obj: &'a Map<String, Json>,
    field: &'static str,
) -> Result<&'a str, DecodeError> {
    let v = require(obj, field)?;
    v.as_str().ok_or_else(|| {
        DecodeError::invalid(field, format!("expected a string, got {}", describe(v)))
    })
}

fn require_index(obj: &Map<String, Json>, field: &'static str) -> Result<u32, DecodeError> {
    let v = require(obj, field)?;
    let n = v.as_u64().ok_or_else(|| {
        DecodeError::invalid(field, format!("expected a non-negative integer, got {v}"))
    })?;
    u32::try_from(n).map_err(|_| DecodeError::invalid(field, format!("{n} out of range")))
}

/// Quantity as a decimal string (or, leniently, a non-negative JSON integer).
fn parse_quantity(v: &Json, field: &'static str) -> Result<u64, DecodeError> {
    match v {
        Json::String(s) => {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DecodeError::invalid(field, format!("{s:?} is not a decimal integer")));
            }
            s.parse::<u64>()
                .map_err(|e| DecodeError::invalid(field, format!("{s:?}: {e}")))
        }
        Json::Number(n) => n.as_u64().ok_or_else(|| {
            DecodeError::invalid(field, format!("{n} is not a non-negative integer"))
        }),
        other => Err(DecodeError::invalid(
            field,
            format!("expected a decimal string, got {}", describe(other)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{FIXTURE_OUTREF_HEX, FIXTURE_VALUE_HEX, sample_tx_hash};

    fn legacy_record(address: &str) -> Json {
        json!({
            "tx_hash": sample_tx_hash(0xaa),
            "output_index": 0,
            "amount": [{"unit": "lovelace", "quantity": "1000000"}],
            "address": address,
        })
    }

    #[test]
    fn legacy_scenario_decodes_coins_and_empty_assets() {
        let utxo = decode_record(&legacy_record("addrX"), WireFormat::LegacyJson).unwrap();
        assert_eq!(utxo.input.index, 0);
        assert_eq!(utxo.input.tx_id.to_string(), sample_tx_hash(0xaa));
        assert_eq!(utxo.output.address.as_str(), "addrX");
        assert_eq!(utxo.output.value.coins, 1_000_000);
        assert!(utxo.output.value.assets.is_empty());
    }

    #[test]
    fn preferred_format_does_not_exclude_other_shapes() {
        let a = decode_record(&legacy_record("addrX"), WireFormat::Envelope).unwrap();
        let b = decode_record(&legacy_record("addrX"), WireFormat::LegacyJson).unwrap();
        assert_eq!(a, b);

        let envelope = json!({"outref": FIXTURE_OUTREF_HEX, "value": FIXTURE_VALUE_HEX});
        assert!(decode_record(&envelope, WireFormat::LegacyJson).is_ok());
    }

    #[test]
    fn decode_keeps_only_the_output() {
        let envelope = json!({"outref": FIXTURE_OUTREF_HEX, "value": FIXTURE_VALUE_HEX});
        let output = decode(&envelope, WireFormat::Envelope).unwrap();
        assert_eq!(output, decode_record(&envelope, WireFormat::Envelope).unwrap().output);
        assert_eq!(output.value.coins, 300);

        let legacy = decode(&legacy_record("addrX"), WireFormat::LegacyJson).unwrap();
        assert_eq!(legacy.address.as_str(), "addrX");
        assert!(matches!(
            decode(&json!({"invalid": "format"}), WireFormat::Envelope),
            Err(DecodeError::UnrecognizedShape(_))
        ));
    }

    #[test]
    fn unrecognized_shapes_are_errors() {
        for raw in [json!({"invalid": "format"}), json!(42), json!("x"), json!([1, 2])] {
            assert!(matches!(
                WireRecord::parse(&raw, WireFormat::Envelope),
                Err(DecodeError::UnrecognizedShape(_))
            ));
        }
    }

    #[test]
    fn utxo_records_accepts_list_and_wrapped_list() {
        assert_eq!(utxo_records(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(utxo_records(json!({"utxos": [1]})).unwrap().len(), 1);
        assert!(utxo_records(json!({"utxos": []})).unwrap().is_empty());
    }

    #[test]
    fn utxo_records_rejects_other_shapes() {
        assert!(utxo_records(json!({"invalid": "format"})).is_err());
        assert!(utxo_records(json!({"utxos": "nope"})).is_err());
        assert!(utxo_records(json!(null)).is_err());
        assert!(utxo_records(json!("[]")).is_err());
    }

    #[test]
    fn decode_batch_drops_only_bad_records() {
        let mut missing_hash = legacy_record("addrX");
        missing_hash.as_object_mut().unwrap().remove("tx_hash");
        let records = vec![legacy_record("addrX"), missing_hash, json!({"junk": true})];
        let utxos = decode_batch(&records, WireFormat::LegacyJson);
        assert_eq!(utxos.len(), 1);
    }

    #[test]
    fn quantity_parsing_is_strict() {
        assert_eq!(parse_quantity(&json!("42"), "q").unwrap(), 42);
        assert_eq!(parse_quantity(&json!(42), "q").unwrap(), 42);
        let bad_quantities = [
            json!("+4"),
            json!("-1"),
            json!("1.5"),
            json!(""),
            json!(-3),
            json!(1.5),
            json!(null),
        ];
        for bad in bad_quantities {
            assert!(parse_quantity(&bad, "q").is_err(), "{bad} should be rejected");
        }
        assert!(parse_quantity(&json!("18446744073709551616"), "q").is_err());
    }
}
