//! Error types for adapter operations.

use common::ClientError;

/// Error type for adapter operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Get on a key with no row.
    NotFound,

    /// A conditional write found no matching row.
    ConditionNotMet,

    /// The raw key cannot be encoded as a primary key.
    InvalidKey(String),

    /// The iterator was asked for a capability the backing cursor cannot
    /// provide.
    UnsupportedOption(String),

    /// Keyspace or table bootstrap failed, or a statement was rejected by
    /// the cluster.
    Schema(String),

    /// Opaque passthrough from the backing session: connection loss,
    /// timeout, coordinator failure.
    Transport(String),

    /// The iterator was ended, or already surfaced a terminal error.
    IteratorClosed,

    /// Invalid input or parameter errors.
    InvalidInput(String),

    /// Internal errors indicating bugs or invariant violations.
    Internal(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotFound => write!(f, "Key not found"),
            Error::ConditionNotMet => write!(f, "Conditional write found no matching row"),
            Error::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
            Error::UnsupportedOption(msg) => write!(f, "Unsupported option: {}", msg),
            Error::Schema(msg) => write!(f, "Schema error: {}", msg),
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
            Error::IteratorClosed => write!(f, "Iterator is closed"),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(msg) => Error::Transport(msg),
            ClientError::InvalidQuery(msg) => Error::Schema(msg),
            ClientError::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;
