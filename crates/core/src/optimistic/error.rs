use thiserror::Error;

/// Errors that can occur when applying an optimistic change.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Record already has an unresolved change: {0}")]
    AlreadyPending(String),
}

/// Result type for optimistic list operations.
pub type Result<T> = std::result::Result<T, ListError>;
