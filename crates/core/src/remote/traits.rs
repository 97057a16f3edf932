use async_trait::async_trait;

use crate::activity::ActivityLogEntry;
use crate::approval::ApprovalRecord;
use crate::mutation::Record;

use super::Result;

/// Write side of one remote collection.
///
/// No retry is performed on top of these calls; implementations must not
/// assume idempotency.
#[async_trait]
pub trait RemoteWriter<T: Record>: Send + Sync {
    /// Creates a record and returns it as stored, with its server-assigned id.
    async fn create(&self, record: &T) -> Result<T>;

    /// Updates an existing record and returns it as stored.
    async fn update(&self, record: &T) -> Result<T>;

    /// Deletes a record by its ID.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Remote collection receiving approval records. Append only.
#[async_trait]
pub trait ApprovalSink: Send + Sync {
    /// Appends a pending approval record.
    async fn submit(&self, record: &ApprovalRecord) -> Result<()>;
}

/// Remote collection receiving activity log entries.
#[async_trait]
pub trait ActivityLogSink: Send + Sync {
    /// Appends an entry.
    async fn append(&self, entry: &ActivityLogEntry) -> Result<()>;

    /// Gets all entries recorded for one record, in any order.
    async fn entries_for(&self, entity_kind: &str, record_id: &str)
        -> Result<Vec<ActivityLogEntry>>;
}
