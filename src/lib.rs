//! Wallet data-access layer for an experimental Layer-2 settlement backend.
//!
//! The core components live in `l2-sdk`. This crate loads a [`WalletConfig`],
//! supplies the Layer-1 REST adapter and wires everything into a
//! [`WalletBackend`].

mod backend;
pub mod config;
mod error;
pub mod l1_adapter;

pub use backend::WalletBackend;
pub use config::{CONFIG_FILE, L1Config, WalletConfig};
pub use error::{Error, Result};
pub use l1_adapter::BlockfrostSource;

pub use l2_cache::{CacheConfig, LruTxOutCache};
pub use l2_sdk;
