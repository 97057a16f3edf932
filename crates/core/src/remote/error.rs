use thiserror::Error;

/// Errors returned by the remote spreadsheet API and its sinks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{entity_kind} not found: {id}")]
    NotFound { entity_kind: String, id: String },
    #[error("{entity_kind} already exists: {id}")]
    AlreadyExists { entity_kind: String, id: String },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RemoteError {
    /// Returns true for failures worth retrying by the user.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
