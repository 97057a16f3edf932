//! In-memory remote collections.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use plantops_core::activity::ActivityLogEntry;
use plantops_core::approval::ApprovalRecord;
use plantops_core::mutation::Record;
use plantops_core::remote::{ActivityLogSink, ApprovalSink, RemoteError, RemoteWriter, Result};

/// Ordered rows of one remote collection.
///
/// The server assigns ids on create, ignoring whatever id the client sent.
#[derive(Debug, Clone)]
pub struct InMemoryCollection<T> {
    name: String,
    rows: Arc<RwLock<Vec<T>>>,
    next_id: Arc<AtomicU64>,
}

impl<T: Record> InMemoryCollection<T> {
    /// Creates an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Creates a collection holding `rows`, with ids assigned after them.
    pub fn with_rows(name: impl Into<String>, rows: Vec<T>) -> Self {
        let next = rows
            .iter()
            .filter_map(|row| row.id().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        Self {
            name: name.into(),
            rows: Arc::new(RwLock::new(rows)),
            next_id: Arc::new(AtomicU64::new(next)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads every row, as a remote list read would.
    pub async fn list(&self) -> Result<Vec<T>> {
        Ok(self.rows.read().await.clone())
    }

    /// Reads a single row.
    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id() == id).cloned())
    }

    fn not_found(&self, id: &str) -> RemoteError {
        RemoteError::NotFound {
            entity_kind: self.name.clone(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl<T: Record> RemoteWriter<T> for InMemoryCollection<T> {
    async fn create(&self, record: &T) -> Result<T> {
        let mut stored = record.clone();
        stored.set_id(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());

        let mut rows = self.rows.write().await;
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: &T) -> Result<T> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id() == record.id())
            .ok_or_else(|| self.not_found(record.id()))?;
        *row = record.clone();
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| self.not_found(id))?;
        rows.remove(index);
        Ok(())
    }
}

/// Approval collection that keeps submitted records in order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryApprovalSink {
    records: Arc<RwLock<Vec<ApprovalRecord>>>,
}

impl InMemoryApprovalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every submitted record.
    pub async fn records(&self) -> Vec<ApprovalRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ApprovalSink for InMemoryApprovalSink {
    async fn submit(&self, record: &ApprovalRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}

/// Activity log collection, append only.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityLog {
    entries: Arc<RwLock<Vec<ActivityLogEntry>>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every entry in append order.
    pub async fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl ActivityLogSink for InMemoryActivityLog {
    async fn append(&self, entry: &ActivityLogEntry) -> Result<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn entries_for(
        &self,
        entity_kind: &str,
        record_id: &str,
    ) -> Result<Vec<ActivityLogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.entity_kind == entity_kind && e.record_id == record_id)
            .cloned()
            .collect())
    }
}
