use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use l2_sdk::{TxOut, TxOutCache};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::{CacheError, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Maximum number of outputs kept (default: 1024).
    pub capacity: usize,
    /// Entry lifetime in seconds; `None` keeps entries until evicted.
    pub ttl_secs: Option<u64>,
}

impl CacheConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ttl_secs: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = Some(ttl.as_secs().max(1));
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(1024)
    }
}

struct Entry {
    output: TxOut,
    stored_at: Instant,
}

/// Bounded in-memory [`TxOutCache`] with least-recently-used eviction.
pub struct LruTxOutCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Option<Duration>,
}

impl LruTxOutCache {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.capacity)
            .ok_or_else(|| CacheError::InvalidConfig("capacity must be at least 1".into()))?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl(),
        })
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    fn expired(&self, entry: &Entry) -> bool {
        self.ttl.is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}

impl TxOutCache for LruTxOutCache {
    fn get(&self, key: &str) -> Option<TxOut> {
        let mut entries = self.entries();
        let expired = self.expired(entries.get(key)?);
        if expired {
            log::debug!("cache: {key} expired");
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|e| e.output.clone())
    }

    fn set(&self, key: &str, output: TxOut) {
        let evicted = self.entries().push(
            key.to_string(),
            Entry {
                output,
                stored_at: Instant::now(),
            },
        );
        if let Some((old_key, _)) = evicted.filter(|(k, _)| k != key) {
            log::debug!("cache: evicted {old_key}");
        }
    }
}
