//! `ChangeMonitor`: polling change detection for registered addresses.
//!
//! The L2 backend has no history or push API, so the monitor polls a
//! [`UtxoSource`] on a fixed interval, fingerprints each address's UTXO set
//! and pushes a [`ChangeEvent`] whenever a fingerprint moves. Events carry a
//! synthetic [`ActivityMarker`], not a transaction: they only say "refresh".
//!
//! All state belongs to one monitor instance. Each instance runs at most one
//! polling task; [`ChangeMonitor::destroy`] stops it and may be called any
//! number of times.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::source::UtxoSource;
use crate::types::Utxo;

// ── Public types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Poll period in milliseconds (default: 1000).
    pub poll_interval_ms: u64,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
        }
    }
}

/// Stand-in for the transaction that caused a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMarker {
    /// Random 64-character hex id, unique per event.
    pub id: String,
    pub detected_at: DateTime<Utc>,
}

impl ActivityMarker {
    fn new() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self {
            id: hex::encode(bytes),
            detected_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub address: Address,
    pub marker: ActivityMarker,
    /// Size of the UTXO set after the change.
    pub utxo_count: usize,
}

/// Digest over the sorted input identities of a UTXO set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(utxos: &[Utxo]) -> Self {
        let mut keys: Vec<String> = utxos.iter().map(|u| u.input.key()).collect();
        keys.sort_unstable();
        keys.dedup();

        let mut hasher = Sha256::new();
        for key in &keys {
            hasher.update(key.as_bytes());
            hasher.update(b"\n");
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ── Monitor ─────────────────────────────────────────────────────────

struct Watch {
    /// Bumped on every fresh registration, so a fetch started before an
    /// unregister/register pair cannot become the new baseline.
    generation: u64,
    /// `None` until the first successful poll.
    fingerprint: Option<Fingerprint>,
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    watches: HashMap<Address, Watch>,
}

struct Inner {
    source: Arc<dyn UtxoSource>,
    registry: Mutex<Registry>,
    events: UnboundedSender<ChangeEvent>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    async fn poll(&self) -> usize {
        let targets: Vec<(Address, u64)> = lock(&self.registry)
            .watches
            .iter()
            .map(|(address, watch)| (address.clone(), watch.generation))
            .collect();

        let fetches = targets.iter().map(|(address, generation)| async move {
            (address, *generation, self.source.utxos_for_address(address).await)
        });
        let results = join_all(fetches).await;

        let mut emitted = 0;
        let mut registry = lock(&self.registry);
        for (address, generation, result) in results {
            let utxos = match result {
                Ok(utxos) => utxos,
                Err(e) => {
                    log::warn!("monitor: poll for {address} failed, keeping last state: {e}");
                    continue;
                }
            };
            // Unregistered, or registered afresh, while the fetch was in flight.
            let Some(watch) = registry
                .watches
                .get_mut(address)
                .filter(|w| w.generation == generation)
            else {
                continue;
            };

            let current = Fingerprint::of(&utxos);
            match watch.fingerprint.replace(current.clone()) {
                None => log::debug!("monitor: baseline for {address}: {}", current.as_str()),
                Some(previous) if previous == current => {}
                Some(_) => {
                    let event = ChangeEvent {
                        address: address.clone(),
                        marker: ActivityMarker::new(),
                        utxo_count: utxos.len(),
                    };
                    log::info!("monitor: change at {address} ({} utxos)", utxos.len());
                    if self.events.send(event).is_err() {
                        log::debug!("monitor: event receiver dropped");
                    }
                    emitted += 1;
                }
            }
        }
        emitted
    }
}

/// Owns the per-address fingerprints and the polling task.
pub struct ChangeMonitor {
    inner: Arc<Inner>,
    config: MonitorConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeMonitor {
    /// Create a stopped monitor and the receiver its events go to.
    pub fn new(
        source: Arc<dyn UtxoSource>,
        config: MonitorConfig,
    ) -> (Self, UnboundedReceiver<ChangeEvent>) {
        let (events, event_rx) = unbounded_channel();
        let monitor = Self {
            inner: Arc::new(Inner {
                source,
                registry: Mutex::new(Registry::default()),
                events,
            }),
            config,
            task: Mutex::new(None),
        };
        (monitor, event_rx)
    }

    /// Watch `address`. Re-registering an address keeps its baseline.
    pub fn register(&self, address: Address) {
        log::debug!("monitor: register {address}");
        let mut registry = lock(&self.inner.registry);
        let generation = registry.next_generation;
        registry.next_generation += 1;
        registry.watches.entry(address).or_insert(Watch {
            generation,
            fingerprint: None,
        });
    }

    pub fn unregister(&self, address: &Address) {
        log::debug!("monitor: unregister {address}");
        lock(&self.inner.registry).watches.remove(address);
    }

    pub fn addresses(&self) -> Vec<Address> {
        lock(&self.inner.registry).watches.keys().cloned().collect()
    }

    /// Last recorded fingerprint for `address`, if it has a baseline.
    pub fn fingerprint(&self, address: &Address) -> Option<Fingerprint> {
        lock(&self.inner.registry)
            .watches
            .get(address)
            .and_then(|w| w.fingerprint.clone())
    }

    /// Run one poll cycle now. Returns the number of events emitted.
    pub async fn poll_once(&self) -> usize {
        self.inner.poll().await
    }

    pub fn is_running(&self) -> bool {
        lock(&self.task).as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start the polling task on the current tokio runtime. The first poll
    /// runs one interval from now. Does nothing if already running.
    pub fn start(&self) -> Result<()> {
        let mut task = lock(&self.task);
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Config(format!("change monitor needs a tokio runtime: {e}")))?;

        let period = self.config.poll_interval();
        let inner = self.inner.clone();
        *task = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                inner.poll().await;
            }
        }));
        log::info!("monitor: polling every {period:?}");
        Ok(())
    }

    /// Stop polling and forget every address. Idempotent.
    pub fn destroy(&self) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
            log::info!("monitor: stopped");
        }
        lock(&self.inner.registry).watches.clear();
    }
}

impl Drop for ChangeMonitor {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
