//! Secondary error channel.
//!
//! Failures that must not fail the user's action (a committed write whose
//! activity log entry could not be appended) are published here so the UI can
//! surface them without blocking the page.

use serde::Serialize;
use tokio::sync::broadcast;

use plantops_core::mutation::MutationAction;
use plantops_core::remote::RemoteError;

/// Default channel capacity for error reports.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// A failure reported out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorReport {
    /// A write committed but its activity log entry was lost.
    ActivityLogFailed {
        entity_kind: String,
        record_id: String,
        action: MutationAction,
        error: String,
    },
}

impl ErrorReport {
    pub fn activity_log_failed(
        entity_kind: &str,
        record_id: &str,
        action: MutationAction,
        error: &RemoteError,
    ) -> Self {
        Self::ActivityLogFailed {
            entity_kind: entity_kind.to_string(),
            record_id: record_id.to_string(),
            action,
            error: error.to_string(),
        }
    }
}

/// Broadcast sender for [`ErrorReport`]s.
///
/// Cloning shares the channel. Reports sent while nobody is subscribed are
/// only logged.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    sender: broadcast::Sender<ErrorReport>,
}

impl ErrorReporter {
    /// Creates a reporter buffering up to `capacity` reports per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Logs the report and publishes it to current subscribers.
    pub fn report(&self, report: ErrorReport) {
        match &report {
            ErrorReport::ActivityLogFailed {
                entity_kind,
                record_id,
                action,
                error,
            } => tracing::warn!(
                %entity_kind,
                %record_id,
                %action,
                %error,
                "Activity log append failed"
            ),
        }

        // No receivers is fine; the warning above is the record.
        let _ = self.sender.send(report);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ErrorReport> {
        self.sender.subscribe()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
