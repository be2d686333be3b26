use std::sync::Arc;

use l2_cache::LruTxOutCache;
use l2_sdk::{
    Address, ChainInfoProvider, ChangeEvent, ChangeMonitor, FallbackUtxoProvider, HttpTransport,
    InputResolver, L2Source, Network, ResolveHints, SubmissionGateway, Transport, TxIn, TxOut,
    TxOutCache, Utxo, UtxoSource,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::WalletConfig;
use crate::error::Result;
use crate::l1_adapter::BlockfrostSource;

/// Every wallet-facing component, wired from one [`WalletConfig`].
///
/// L2Source, the resolver, the gateway and chain info share one transport,
/// and therefore one admission controller. The L1 adapter has its own.
pub struct WalletBackend {
    config: WalletConfig,
    provider: Arc<FallbackUtxoProvider>,
    resolver: InputResolver,
    gateway: SubmissionGateway,
    chain_info: ChainInfoProvider,
}

impl WalletBackend {
    pub fn connect(config: WalletConfig, cache: Arc<dyn TxOutCache>) -> Result<Self> {
        let l1 = BlockfrostSource::new(&config.l1, config.network)?;
        Self::with_l1(config, cache, Arc::new(l1))
    }

    /// Like [`connect`](Self::connect), with an [`LruTxOutCache`] sized from
    /// `config.cache`.
    pub fn connect_with_lru(config: WalletConfig) -> Result<Self> {
        let cache = LruTxOutCache::new(&config.cache)?;
        Self::connect(config, Arc::new(cache))
    }

    /// Wire the L2 components around a caller-supplied L1 source.
    pub fn with_l1(
        config: WalletConfig,
        cache: Arc<dyn TxOutCache>,
        l1: Arc<dyn UtxoSource>,
    ) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.l2)?);

        let l2 = Arc::new(L2Source::new(transport.clone(), config.source.clone()));
        let provider = Arc::new(
            FallbackUtxoProvider::new(l2, l1).with_policy(config.source.failure_policy),
        );
        let resolver =
            InputResolver::with_transport(cache, transport.clone(), config.resolver.clone());
        let gateway = SubmissionGateway::new(transport.clone());
        let chain_info = ChainInfoProvider::new(transport);

        log::info!(
            "backend: {} via {} ({:?} records, {:?} policy)",
            config.network.as_str(),
            config.l2.base_url,
            config.source.wire_format,
            config.source.failure_policy,
        );
        Ok(Self {
            config,
            provider,
            resolver,
            gateway,
            chain_info,
        })
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn provider(&self) -> &FallbackUtxoProvider {
        &self.provider
    }

    pub fn resolver(&self) -> &InputResolver {
        &self.resolver
    }

    pub fn gateway(&self) -> &SubmissionGateway {
        &self.gateway
    }

    pub fn chain_info(&self) -> &ChainInfoProvider {
        &self.chain_info
    }

    /// A new, stopped monitor polling through the fallback provider. Each
    /// call returns an independent instance.
    pub fn change_monitor(&self) -> (ChangeMonitor, UnboundedReceiver<ChangeEvent>) {
        let source: Arc<dyn UtxoSource> = self.provider.clone();
        ChangeMonitor::new(source, self.config.monitor.clone())
    }

    pub async fn utxo_by_addresses(&self, addresses: &[Address]) -> Result<Vec<Utxo>> {
        Ok(self.provider.utxo_by_addresses(addresses).await?)
    }

    pub async fn resolve_input(&self, input: &TxIn, hints: Option<&ResolveHints>) -> Option<TxOut> {
        self.resolver.resolve_input(input, hints).await
    }

    pub async fn submit(&self, signed_tx_hex: &str) -> Result<()> {
        Ok(self.gateway.submit(signed_tx_hex).await?)
    }

    pub async fn health_check(&self) -> bool {
        self.gateway.health_check().await
    }
}
