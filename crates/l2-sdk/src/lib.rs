pub mod address;
pub mod chain_info;
pub mod codec;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod monitor;
pub mod network;
pub mod resolver;
pub mod source;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;
pub mod types;

// Core types
pub use address::Address;
pub use error::{DecodeError, Error, Result};
pub use network::Network;
pub use types::{
    AssetId, ProviderBackend, ResolveHints, Tx, TxId, TxIn, TxOut, Utxo, Value,
};

// Transport
pub use transport::{
    AdmissionControl, AdmissionPermit, HttpTransport, Payload, RateLimiter, Transport,
    TransportConfig, Unlimited,
};

// Codec
pub use codec::{WireFormat, WireRecord, decode, decode_record};

// Providers
pub use chain_info::{BlockInfo, BlockTip, ChainInfoProvider, EpochInfo, NetworkInfo};
pub use fallback::{AddressOutcome, FailurePolicy, FallbackUtxoProvider};
pub use gateway::SubmissionGateway;
pub use monitor::{ActivityMarker, ChangeEvent, ChangeMonitor, Fingerprint, MonitorConfig};
pub use resolver::{InputResolver, NoopCache, ResolverConfig, TxOutCache};
pub use source::{L2Source, L2SourceConfig, UtxoSource};
