//! L2-first UTXO lookup with a per-address Layer-1 fallback.
//!
//! Every address is looked up on its own: L2 first, then L1 if L2 failed.
//! One address failing never aborts the others. When both backends fail for
//! an address, the L2 error is the one reported; the L1 error is only logged.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::Result;
use crate::source::UtxoSource;
use crate::types::{ProviderBackend, Utxo};

/// How [`FallbackUtxoProvider::utxo_by_addresses`] treats failed addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Return what succeeded; fail only when every address failed.
    #[default]
    Isolated,
    /// Any failed address fails the whole call.
    AllOrNothing,
}

/// Result of looking up one address.
#[derive(Debug)]
pub struct AddressOutcome {
    pub address: Address,
    /// The backend that answered and its UTXOs, or the L2 error.
    pub result: Result<(ProviderBackend, Vec<Utxo>)>,
}

pub struct FallbackUtxoProvider {
    l2: Arc<dyn UtxoSource>,
    l1: Arc<dyn UtxoSource>,
    policy: FailurePolicy,
}

impl FallbackUtxoProvider {
    pub fn new(l2: Arc<dyn UtxoSource>, l1: Arc<dyn UtxoSource>) -> Self {
        Self {
            l2,
            l1,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Look up one address: L2, then L1 on failure.
    pub async fn utxos_for(&self, address: &Address) -> Result<(ProviderBackend, Vec<Utxo>)> {
        let l2_err = match self.l2.utxos_for_address(address).await {
            Ok(utxos) => return Ok((ProviderBackend::L2, utxos)),
            Err(e) => e,
        };
        log::warn!("fallback: l2 lookup for {address} failed: {l2_err}; trying l1");

        match self.l1.utxos_for_address(address).await {
            Ok(utxos) => {
                log::info!("fallback: {address} served by l1 ({} utxos)", utxos.len());
                Ok((ProviderBackend::L1, utxos))
            }
            Err(l1_err) => {
                log::warn!("fallback: l1 lookup for {address} also failed: {l1_err}");
                Err(l2_err)
            }
        }
    }

    /// One outcome per distinct address, in order of first appearance.
    /// Lookups run concurrently.
    pub async fn utxo_by_addresses_detailed(&self, addresses: &[Address]) -> Vec<AddressOutcome> {
        let mut seen = HashSet::new();
        let unique: Vec<&Address> = addresses.iter().filter(|a| seen.insert(*a)).collect();
        if unique.len() < addresses.len() {
            log::debug!(
                "fallback: ignoring {} repeated addresses",
                addresses.len() - unique.len()
            );
        }

        let lookups = unique.into_iter().map(|address| async move {
            AddressOutcome {
                address: address.clone(),
                result: self.utxos_for(address).await,
            }
        });
        join_all(lookups).await
    }

    /// UTXOs for every address, aggregated according to the failure policy.
    pub async fn utxo_by_addresses(&self, addresses: &[Address]) -> Result<Vec<Utxo>> {
        let outcomes = self.utxo_by_addresses_detailed(addresses).await;
        let requested = outcomes.len();

        let mut utxos = Vec::new();
        let mut first_err = None;
        let mut failed = 0;
        for outcome in outcomes {
            match outcome.result {
                Ok((_, found)) => utxos.extend(found),
                Err(e) => {
                    failed += 1;
                    log::error!("fallback: no utxos for {}: {e}", outcome.address);
                    if self.policy == FailurePolicy::AllOrNothing {
                        return Err(e);
                    }
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) if failed == requested => Err(e),
            _ => Ok(utxos),
        }
    }
}

#[async_trait]
impl UtxoSource for FallbackUtxoProvider {
    async fn utxos_for_address(&self, address: &Address) -> Result<Vec<Utxo>> {
        self.utxos_for(address).await.map(|(_, utxos)| utxos)
    }
}
