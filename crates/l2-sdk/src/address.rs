//! Payment address strings and their ledger byte encoding.

use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DecodeError;
use crate::network::Network;

const BYRON_HEADER: u8 = 0b1000;

/// An address as shown to the user: bech32 for Shelley-era addresses, base58
/// for Byron bootstrap addresses.
///
/// Construction only checks the character set, which keeps the value safe to
/// splice into request paths. Byte-level validation happens in
/// [`Address::to_ledger_bytes`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(String);

impl Address {
    pub fn new(s: impl Into<String>) -> Result<Self, DecodeError> {
        let s = s.into();
        if s.is_empty() {
            return Err(DecodeError::MissingField("address"));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DecodeError::invalid(
                "address",
                format!("unexpected characters in {s:?}"),
            ));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render raw ledger address bytes, picking the encoding from the header byte.
    pub fn from_ledger_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = *bytes
            .first()
            .ok_or_else(|| DecodeError::invalid("address", "empty address bytes"))?;
        let kind = header >> 4;
        // Every test network shares id 0, so its prefixes stand in for all of them.
        let network = if header & 0x0f == Network::Mainnet.network_id() {
            Network::Mainnet
        } else {
            Network::Preprod
        };

        let hrp = match kind {
            0..=7 => network.address_prefix(),
            14 | 15 => network.stake_prefix(),
            BYRON_HEADER => return Ok(Self(bs58::encode(bytes).into_string())),
            other => {
                return Err(DecodeError::invalid(
                    "address",
                    format!("unknown address type {other}"),
                ));
            }
        };

        let hrp = Hrp::parse(hrp).map_err(|e| DecodeError::invalid("address", e.to_string()))?;
        let encoded = bech32::encode::<Bech32>(hrp, bytes)
            .map_err(|e| DecodeError::invalid("address", e.to_string()))?;
        Ok(Self(encoded))
    }

    /// Recover the raw ledger bytes behind this address.
    pub fn to_ledger_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        if self.0.starts_with("addr") || self.0.starts_with("stake") {
            let (_hrp, data) = bech32::decode(&self.0)
                .map_err(|e| DecodeError::invalid("address", e.to_string()))?;
            return Ok(data);
        }
        bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| DecodeError::invalid("address", e.to_string()))
    }
}

impl FromStr for Address {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
