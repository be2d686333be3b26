//! Admission control shared by every call a transport makes.
//!
//! A controller decides *when* a call may start, never *whether*: `admit`
//! always resolves eventually, and the returned permit is held for the
//! lifetime of the request. Admission is serialized; execution is not.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Held by a request while it is in flight. Dropping it frees the slot.
#[derive(Debug, Default)]
pub struct AdmissionPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

#[async_trait]
pub trait AdmissionControl: Send + Sync + 'static {
    /// Wait until one more call may run.
    async fn admit(&self) -> AdmissionPermit;
}

/// Admits every call immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl AdmissionControl for Unlimited {
    async fn admit(&self) -> AdmissionPermit {
        AdmissionPermit::default()
    }
}

/// Bounds the number of in-flight calls and optionally spaces call starts.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    min_spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_in_flight: usize, min_spacing: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
            min_spacing,
            next_slot: Mutex::new(None),
        }
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Reserve the next start slot. Reservation happens under the lock; the
    /// wait does not.
    fn reserve_slot(&self) -> Option<Instant> {
        if self.min_spacing.is_zero() {
            return None;
        }
        let now = Instant::now();
        let mut next = match self.next_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slot = next.map_or(now, |n| n.max(now));
        *next = Some(slot + self.min_spacing);
        (slot > now).then_some(slot)
    }
}

#[async_trait]
impl AdmissionControl for RateLimiter {
    async fn admit(&self) -> AdmissionPermit {
        let permit = match self.semaphore.clone().acquire_owned().await {
            Ok(p) => Some(p),
            Err(e) => {
                // Only reachable if the semaphore is closed, which never happens here.
                log::warn!("admission: semaphore unavailable ({e}), admitting without permit");
                None
            }
        };
        if let Some(slot) = self.reserve_slot() {
            tokio::time::sleep_until(slot).await;
        }
        AdmissionPermit { _permit: permit }
    }
}
