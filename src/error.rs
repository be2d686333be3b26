use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sdk(#[from] l2_sdk::Error),

    #[error("cache error: {0}")]
    Cache(#[from] l2_cache::CacheError),

    #[error("config file error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
