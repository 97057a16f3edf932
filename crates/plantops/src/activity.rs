//! Activity log writer and reader over a remote sink.

use std::sync::Arc;

use plantops_core::activity::ActivityLogEntry;
use plantops_core::remote::{ActivityLogSink, Result};

/// Records and queries activity log entries.
#[derive(Clone)]
pub struct ActivityLogger {
    sink: Arc<dyn ActivityLogSink>,
}

impl ActivityLogger {
    pub fn new(sink: Arc<dyn ActivityLogSink>) -> Self {
        Self { sink }
    }

    /// Appends one entry.
    pub async fn record(&self, entry: &ActivityLogEntry) -> Result<()> {
        self.sink.append(entry).await?;
        tracing::debug!(
            entity_kind = %entry.entity_kind,
            record_id = %entry.record_id,
            action = %entry.action,
            "Recorded activity"
        );
        Ok(())
    }

    /// Returns the history of one record, newest first.
    ///
    /// Entries sharing a timestamp keep the most recently appended first.
    pub async fn query(
        &self,
        entity_kind: &str,
        record_id: &str,
    ) -> Result<Vec<ActivityLogEntry>> {
        let mut entries = self.sink.entries_for(entity_kind, record_id).await?;
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

impl std::fmt::Debug for ActivityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLogger").finish_non_exhaustive()
    }
}
