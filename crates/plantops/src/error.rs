use thiserror::Error;

use plantops_core::mutation::MutationAction;
use plantops_core::remote::RemoteError;

/// Errors returned by the read-through fetcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Remote read failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Remote read aborted: {0}")]
    Aborted(String),
}

/// Errors returned by the mutation gateway.
///
/// Routing a write to approval is not an error; see
/// [`MutationOutcome::PendingApproval`](crate::gateway::MutationOutcome).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Role '{role}' may not {action} records")]
    Forbidden {
        role: String,
        action: MutationAction,
    },
    #[error("Remote write failed: {0}")]
    Write(RemoteError),
    #[error("Approval submission failed: {0}")]
    ApprovalSubmission(RemoteError),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid role policy in {path}: {source}")]
    Policy {
        path: String,
        #[source]
        source: plantops_core::approval::PolicyError,
    },
}
