mod cache;
mod error;

pub use cache::{CacheConfig, LruTxOutCache};
pub use error::CacheError;

pub type Result<T> = std::result::Result<T, CacheError>;
