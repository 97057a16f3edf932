use thiserror::Error;

/// Errors that can occur when loading a role policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Invalid role policy document: {0}")]
    InvalidDocument(String),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
