//! Fixtures and in-memory doubles for tests.
//!
//! Compiled for this crate's own tests and, through the `testing` feature, for
//! integration tests and downstream crates.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value as Json, json};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::resolver::TxOutCache;
use crate::source::UtxoSource;
use crate::types::{TxId, TxIn, TxOut, Utxo, Value};

// ---------------------------------------------------------------------------
// Ledger fixtures
// ---------------------------------------------------------------------------

/// CBOR transaction input `[h'8e32..3e3d', 0]`.
pub const FIXTURE_OUTREF_HEX: &str =
    "8258208e32d18c07cba2b65577bc829a9875e2fc3cdb554d5b0abbb3d4e3a71a3e3e3d00";

/// CBOR transaction output (array form) paying 300 lovelace plus 15 `LaceCoin3`
/// to [`FIXTURE_ADDRESS`].
pub const FIXTURE_VALUE_HEX: &str = "825839015b21e6031d945adc859b560f90b4a7dbfb93473d1fe85ec9305cb4262560ac5e3827f58ba159b4277e78dca6782f9cf1ff18025ffdac80258219012ca1581c25561d09e55d60b64525b9cdb3cfbec23c94c0634320fec2eaddde58a1494c616365436f696e330f";

/// CBOR transaction output (map form) paying 2 ADA to [`FIXTURE_ADDRESS`].
pub const FIXTURE_MAP_OUTPUT_HEX: &str = "a2005839015b21e6031d945adc859b560f90b4a7dbfb93473d1fe85ec9305cb4262560ac5e3827f58ba159b4277e78dca6782f9cf1ff18025ffdac8025011a001e8480";

pub const FIXTURE_ADDRESS: &str = "addr1q9djresrrk294hy9ndtqly955ldlhy688507shkfxpwtgf39vzk9uwp87k96zkd5yal83h9x0qheeu0lrqp9lldvsqjshxggyj";

/// 64 hex characters of `byte`, i.e. a transaction hash.
pub fn sample_tx_hash(byte: u8) -> String {
    hex::encode([byte; 32])
}

pub fn sample_tx_in(byte: u8, index: u32) -> TxIn {
    TxIn::new(TxId::new([byte; 32]), index)
}

pub fn sample_tx_out(address: &str, coins: u64) -> TxOut {
    TxOut {
        address: Address::new(address).expect("valid fixture address"),
        value: Value::coins(coins),
    }
}

pub fn sample_utxo(byte: u8, index: u32, address: &str, coins: u64) -> Utxo {
    Utxo::new(sample_tx_in(byte, index), sample_tx_out(address, coins))
}

/// A legacy JSON record paying `coins` lovelace to `address`.
pub fn legacy_json(tx_byte: u8, index: u32, address: &str, coins: u64) -> Json {
    json!({
        "tx_hash": sample_tx_hash(tx_byte),
        "output_index": index,
        "amount": [{"unit": "lovelace", "quantity": coins.to_string()}],
        "address": address,
    })
}

// ---------------------------------------------------------------------------
// TestCache
// ---------------------------------------------------------------------------

/// `HashMap`-backed cache that counts reads and writes.
#[derive(Default)]
pub struct TestCache {
    entries: Mutex<HashMap<String, TxOut>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl TestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, input: &TxIn, output: TxOut) -> Self {
        self.entries
            .lock()
            .expect("cache lock")
            .insert(input.key(), output);
        self
    }

    pub fn peek(&self, key: &str) -> Option<TxOut> {
        self.entries.lock().expect("cache lock").get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

impl TxOutCache for TestCache {
    fn get(&self, key: &str) -> Option<TxOut> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.peek(key)
    }

    fn set(&self, key: &str, output: TxOut) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), output);
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// Scripted answer for one call.
#[derive(Debug, Clone)]
pub enum Scripted {
    Utxos(Vec<Utxo>),
    /// Fails with a `Transport` error carrying this status.
    Status(u16),
    /// Fails with an `InvalidResponse` error.
    Malformed,
}

impl Scripted {
    fn into_result(self) -> Result<Vec<Utxo>> {
        match self {
            Scripted::Utxos(utxos) => Ok(utxos),
            Scripted::Status(status) => Err(Error::Transport {
                status,
                message: format!("HTTP {status}: scripted"),
            }),
            Scripted::Malformed => Err(Error::InvalidResponse("scripted malformed body".into())),
        }
    }
}

/// [`UtxoSource`] answering from per-address scripts.
///
/// Each address has a queue of answers; the last one repeats once the queue
/// is drained. Unscripted addresses get an empty list.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for `address`.
    pub fn push(&self, address: &str, answer: Scripted) -> &Self {
        self.scripts
            .lock()
            .expect("script lock")
            .entry(address.to_string())
            .or_default()
            .push_back(answer);
        self
    }

    pub fn with(self, address: &str, answer: Scripted) -> Self {
        self.push(address, answer);
        self
    }

    /// Addresses queried so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self, address: &str) -> usize {
        self.calls().iter().filter(|a| *a == address).count()
    }
}

#[async_trait]
impl UtxoSource for ScriptedSource {
    async fn utxos_for_address(&self, address: &Address) -> Result<Vec<Utxo>> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(address.to_string());

        let answer = {
            let mut scripts = self.scripts.lock().expect("script lock");
            match scripts.get_mut(address.as_str()) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        answer.unwrap_or(Scripted::Utxos(Vec::new())).into_result()
    }
}
