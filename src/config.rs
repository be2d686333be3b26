use std::fs;
use std::path::Path;

use l2_cache::CacheConfig;
use l2_sdk::{L2SourceConfig, MonitorConfig, Network, ResolverConfig, TransportConfig};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_FILE: &str = "l2_wallet_config.json";

// ============================================================================
// Layer-1 settings
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct L1Config {
    /// Overrides the network's default Blockfrost URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub project_id: String,
    pub max_in_flight: usize,
    pub min_spacing_ms: u64,
}

impl Default for L1Config {
    fn default() -> Self {
        Self {
            base_url: None,
            project_id: String::new(),
            max_in_flight: 4,
            // Blockfrost's free tier allows 10 requests per second.
            min_spacing_ms: 100,
        }
    }
}

impl L1Config {
    pub fn transport_config(&self, network: Network) -> TransportConfig {
        TransportConfig {
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| network.default_l1_url().to_string()),
            max_in_flight: self.max_in_flight,
            min_spacing_ms: self.min_spacing_ms,
        }
    }
}

// ============================================================================
// Wallet config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalletConfig {
    pub network: Network,
    /// Connection to the L2 backend.
    pub l2: TransportConfig,
    pub source: L2SourceConfig,
    pub resolver: ResolverConfig,
    pub monitor: MonitorConfig,
    pub cache: CacheConfig,
    pub l1: L1Config,
}

impl WalletConfig {
    /// Read the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        log::debug!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Read `CONFIG_FILE` from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(CONFIG_FILE))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
