use thiserror::Error;

/// Why a single wire record could not be turned into ledger primitives.
///
/// Decode errors are recovered locally: the record is logged and dropped,
/// the rest of the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed CBOR: {0}")]
    Cbor(String),

    #[error("bad hex: {0}")]
    Hex(String),

    #[error("unrecognized record shape: {0}")]
    UnrecognizedShape(String),

    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),
}

impl DecodeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced an HTTP response (DNS, connect, reset, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Transport { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Well-formed body with the wrong shape for the endpoint.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of a [`Error::Transport`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
