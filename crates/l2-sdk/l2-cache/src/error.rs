use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache config: {0}")]
    InvalidConfig(String),
}
