//! Resolve a spent input to the output it references.
//!
//! Order, first match wins: injected cache, caller hints, remote lookup.
//! Callers only ever see `Some(output)` or `None`. Internally a miss and a
//! backend failure stay distinct so the failure can be logged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::{self, WireFormat};
use crate::transport::Transport;
use crate::types::{ResolveHints, TxIn, TxOut};

/// Storage for resolved outputs, keyed by `"{txId}#{index}"`.
///
/// Shared across concurrent resolutions. Writing the same key twice with the
/// same value must be harmless.
pub trait TxOutCache: Send + Sync {
    fn get(&self, key: &str) -> Option<TxOut>;

    fn set(&self, key: &str, output: TxOut);
}

/// Cache that never holds anything.
pub struct NoopCache;

impl TxOutCache for NoopCache {
    fn get(&self, _key: &str) -> Option<TxOut> {
        None
    }

    fn set(&self, _key: &str, _output: TxOut) {}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Query the backend when cache and hints miss (default: false).
    pub remote_lookup: bool,
    /// Remote path; `{txId}` and `{index}` are substituted.
    pub lookup_path: String,
    /// Preferred record shape for remote answers.
    pub wire_format: WireFormat,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            remote_lookup: false,
            lookup_path: "utxos/{txId}/{index}".to_string(),
            wire_format: WireFormat::default(),
        }
    }
}

#[derive(Debug)]
enum Lookup {
    Found(TxOut),
    NotFound,
    BackendError(String),
}

pub struct InputResolver {
    cache: Arc<dyn TxOutCache>,
    transport: Option<Arc<dyn Transport>>,
    config: ResolverConfig,
}

impl InputResolver {
    /// Resolver over cache and hints only.
    pub fn new(cache: Arc<dyn TxOutCache>) -> Self {
        Self {
            cache,
            transport: None,
            config: ResolverConfig::default(),
        }
    }

    /// Resolver that may also ask the backend, if `config.remote_lookup` is set.
    pub fn with_transport(
        cache: Arc<dyn TxOutCache>,
        transport: Arc<dyn Transport>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache,
            transport: Some(transport),
            config,
        }
    }

    pub async fn resolve_input(&self, input: &TxIn, hints: Option<&ResolveHints>) -> Option<TxOut> {
        let key = input.key();

        if let Some(output) = self.cache.get(&key) {
            log::debug!("resolver: {key} from cache");
            return Some(output);
        }

        if let Some(output) = hints.and_then(|h| from_hints(input, h)) {
            log::debug!("resolver: {key} from hints");
            self.cache.set(&key, output.clone());
            return Some(output);
        }

        match self.remote(input).await {
            Lookup::Found(output) => {
                log::debug!("resolver: {key} from backend");
                self.cache.set(&key, output.clone());
                Some(output)
            }
            Lookup::NotFound => {
                log::debug!("resolver: {key} unresolved");
                None
            }
            Lookup::BackendError(cause) => {
                log::warn!("resolver: {key} unresolved, backend error: {cause}");
                None
            }
        }
    }

    async fn remote(&self, input: &TxIn) -> Lookup {
        let transport = match &self.transport {
            Some(t) if self.config.remote_lookup => t,
            _ => return Lookup::NotFound,
        };

        let path = self
            .config
            .lookup_path
            .replace("{txId}", &input.tx_id.to_string())
            .replace("{index}", &input.index.to_string());

        let payload = match transport.get(&path).await {
            Ok(payload) => payload,
            Err(e) if e.is_not_found() => return Lookup::NotFound,
            Err(e) => return Lookup::BackendError(e.to_string()),
        };
        let body = match payload.into_json() {
            Ok(body) => body,
            Err(e) => return Lookup::BackendError(e.to_string()),
        };

        // A bare record, a list, or a `{ utxos: [..] }` wrapper.
        if body.is_null() {
            return Lookup::NotFound;
        }
        let mut records = if body.is_object() && body.get("utxos").is_none() {
            vec![body]
        } else {
            match codec::utxo_records(body) {
                Ok(records) => records,
                Err(e) => return Lookup::BackendError(e.to_string()),
            }
        };
        let record = match records.len() {
            0 => return Lookup::NotFound,
            1 => records.remove(0),
            n => return Lookup::BackendError(format!("expected one record, got {n}")),
        };

        match codec::decode_record(&record, self.config.wire_format) {
            Ok(utxo) if utxo.input == *input => Lookup::Found(utxo.output),
            Ok(utxo) => {
                log::warn!("resolver: asked for {input}, backend answered {}", utxo.input);
                Lookup::NotFound
            }
            Err(e) => Lookup::BackendError(format!("undecodable record {record}: {e}")),
        }
    }
}

fn from_hints(input: &TxIn, hints: &ResolveHints) -> Option<TxOut> {
    let from_tx = hints
        .transactions
        .iter()
        .find(|tx| tx.id == input.tx_id)
        .and_then(|tx| tx.outputs.get(input.index as usize));
    if let Some(output) = from_tx {
        return Some(output.clone());
    }

    hints
        .utxos
        .iter()
        .find(|utxo| utxo.input == *input)
        .map(|utxo| utxo.output.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestCache, sample_tx_in, sample_tx_out, sample_utxo};
    use crate::types::Tx;

    #[tokio::test]
    async fn cache_wins_over_hints() {
        let input = sample_tx_in(1, 0);
        let cached = sample_tx_out("cached", 1);
        let cache = Arc::new(TestCache::new().with_entry(&input, cached.clone()));
        let hints = ResolveHints {
            utxos: vec![sample_utxo(1, 0, "hinted", 2)],
            ..Default::default()
        };

        let resolver = InputResolver::new(cache.clone());
        assert_eq!(resolver.resolve_input(&input, Some(&hints)).await, Some(cached));
        assert_eq!(cache.sets(), 0);
    }

    #[tokio::test]
    async fn hint_from_transaction_outputs_fills_cache() {
        let input = sample_tx_in(2, 1);
        let output = sample_tx_out("addrB", 7);
        let hints = ResolveHints {
            transactions: vec![Tx {
                id: input.tx_id,
                outputs: vec![sample_tx_out("addrA", 1), output.clone()],
            }],
            ..Default::default()
        };
        let cache = Arc::new(TestCache::new());
        let resolver = InputResolver::new(cache.clone());

        assert_eq!(resolver.resolve_input(&input, Some(&hints)).await, Some(output.clone()));
        assert_eq!(cache.peek(&input.key()), Some(output.clone()));
        assert_eq!(resolver.resolve_input(&input, None).await, Some(output));
    }

    #[tokio::test]
    async fn transaction_without_that_index_falls_through_to_utxo_hints() {
        let input = sample_tx_in(3, 5);
        let hints = ResolveHints {
            transactions: vec![Tx {
                id: input.tx_id,
                outputs: vec![sample_tx_out("addrA", 1)],
            }],
            utxos: vec![sample_utxo(3, 4, "wrongIndex", 1), sample_utxo(3, 5, "addrC", 3)],
        };
        let resolver = InputResolver::new(Arc::new(TestCache::new()));
        let found = resolver.resolve_input(&input, Some(&hints)).await.unwrap();
        assert_eq!(found.address.as_str(), "addrC");
    }

    #[tokio::test]
    async fn miss_is_none() {
        let resolver = InputResolver::new(Arc::new(NoopCache));
        assert_eq!(resolver.resolve_input(&sample_tx_in(9, 0), None).await, None);
        let empty = ResolveHints::default();
        assert_eq!(resolver.resolve_input(&sample_tx_in(9, 0), Some(&empty)).await, None);
    }

    #[test]
    fn default_config_keeps_remote_lookup_off() {
        let cfg = ResolverConfig::default();
        assert!(!cfg.remote_lookup);
        assert_eq!(cfg.lookup_path, "utxos/{txId}/{index}");
    }
}
