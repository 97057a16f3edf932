use std::collections::{HashMap, HashSet};

use crate::mutation::Record;

use super::error::{ListError, Result};

/// One rendered row.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem<T> {
    pub record: T,
    /// True while the row reflects a change the server has not confirmed.
    pub pending: bool,
    /// Render order. Rows are kept sorted by rank, so a reverted delete
    /// finds its slot no matter what changed around it meanwhile.
    rank: i64,
}

impl<T> ListItem<T> {
    fn settled(record: T, rank: i64) -> Self {
        Self {
            record,
            pending: false,
            rank,
        }
    }

    fn pending(record: T, rank: i64) -> Self {
        Self {
            record,
            pending: true,
            rank,
        }
    }
}

/// Result of a confirm or rollback call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Confirmed,
    RolledBack,
    /// The change was already resolved; the list was left untouched.
    Stale,
}

/// Handle to undo one optimistic change.
///
/// Holds a ticket so that a late rollback cannot undo a newer change made to
/// the same record after this one was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "keep the rollback handle to revert the change if the write fails"]
pub struct Rollback {
    id: String,
    ticket: u64,
}

impl Rollback {
    /// Id of the record the change applies to (the temporary id for adds).
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Snapshot<T> {
    Added,
    Updated { previous: T },
    Deleted { previous: T, rank: i64 },
}

#[derive(Debug, Clone, PartialEq)]
struct PendingChange<T> {
    ticket: u64,
    snapshot: Snapshot<T>,
}

/// Ordered, page-owned list with optimistic changes.
///
/// Invariants, holding after every call:
/// - ids are unique across rows;
/// - rows are sorted by rank;
/// - a row is `pending` iff an add or update snapshot exists for its id;
/// - a deleted record is either in the rows or in a delete snapshot, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticList<T> {
    items: Vec<ListItem<T>>,
    pending: HashMap<String, PendingChange<T>>,
    next_ticket: u64,
    /// Lowest rank handed out so far; adds go below it.
    head_rank: i64,
}

impl<T: Record> Default for OptimisticList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending: HashMap::new(),
            next_ticket: 0,
            head_rank: 0,
        }
    }
}

impl<T: Record> OptimisticList<T> {
    /// Builds a list from records as returned by the server.
    pub fn from_records(records: Vec<T>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id().to_string()) {
                return Err(ListError::DuplicateId(record.id().to_string()));
            }
        }

        Ok(Self {
            items: records
                .into_iter()
                .zip(0..)
                .map(|(record, rank)| ListItem::settled(record, rank))
                .collect(),
            ..Self::default()
        })
    }

    /// Rows in render order.
    pub fn items(&self) -> &[ListItem<T>] {
        &self.items
    }

    /// Records in render order, without pending tags.
    pub fn records(&self) -> Vec<T> {
        self.items.iter().map(|item| item.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ListItem<T>> {
        self.position(id).map(|index| &self.items[index])
    }

    /// Returns true if the record has an unresolved change, deletes included.
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of unresolved changes.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Prepends a record under a temporary id.
    pub fn optimistic_add(&mut self, mut record: T, temp_id: impl Into<String>) -> Result<Rollback> {
        let temp_id = temp_id.into();
        if self.position(&temp_id).is_some() || self.pending.contains_key(&temp_id) {
            return Err(ListError::DuplicateId(temp_id));
        }

        record.set_id(temp_id.clone());
        self.head_rank -= 1;
        self.items.insert(0, ListItem::pending(record, self.head_rank));
        Ok(self.track(temp_id, Snapshot::Added))
    }

    /// Replaces the record sharing the same id.
    pub fn optimistic_update(&mut self, record: T) -> Result<Rollback> {
        let id = record.id().to_string();
        self.ensure_not_pending(&id)?;
        let index = self
            .position(&id)
            .ok_or_else(|| ListError::NotFound(id.clone()))?;

        let rank = self.items[index].rank;
        let previous =
            std::mem::replace(&mut self.items[index], ListItem::pending(record, rank));
        Ok(self.track(
            id,
            Snapshot::Updated {
                previous: previous.record,
            },
        ))
    }

    /// Removes a record, remembering its place in the render order.
    pub fn optimistic_delete(&mut self, id: &str) -> Result<Rollback> {
        self.ensure_not_pending(id)?;
        let index = self
            .position(id)
            .ok_or_else(|| ListError::NotFound(id.to_string()))?;

        let removed = self.items.remove(index);
        Ok(self.track(
            id.to_string(),
            Snapshot::Deleted {
                previous: removed.record,
                rank: removed.rank,
            },
        ))
    }

    /// Reverts a change. No-op once the change was confirmed or rolled back.
    pub fn rollback(&mut self, handle: &Rollback) -> Resolution {
        let current = self
            .pending
            .get(&handle.id)
            .is_some_and(|change| change.ticket == handle.ticket);
        if !current {
            return Resolution::Stale;
        }
        let Some(change) = self.pending.remove(&handle.id) else {
            return Resolution::Stale;
        };

        match change.snapshot {
            Snapshot::Added => {
                if let Some(index) = self.position(&handle.id) {
                    self.items.remove(index);
                }
            }
            Snapshot::Updated { previous } => {
                if let Some(index) = self.position(&handle.id) {
                    let rank = self.items[index].rank;
                    self.items[index] = ListItem::settled(previous, rank);
                }
            }
            Snapshot::Deleted { previous, rank } => {
                if self.position(&handle.id).is_none() {
                    let at = self.items.partition_point(|item| item.rank < rank);
                    self.items.insert(at, ListItem::settled(previous, rank));
                }
            }
        }

        Resolution::RolledBack
    }

    /// Swaps the temporary id of an added record for the server id.
    pub fn confirm_add(&mut self, temp_id: &str, server_id: &str) -> Resolution {
        let assigned = server_id.to_string();
        self.settle_add(temp_id, server_id, move |record| record.set_id(assigned))
    }

    /// Replaces an added record with the record the server stored.
    pub fn confirm_add_with(&mut self, temp_id: &str, stored: T) -> Resolution {
        let server_id = stored.id().to_string();
        self.settle_add(temp_id, &server_id, move |record| *record = stored)
    }

    /// Clears the pending tag of an updated record.
    pub fn confirm_update(&mut self, id: &str) -> Resolution {
        if !matches!(
            self.pending.get(id).map(|change| &change.snapshot),
            Some(Snapshot::Updated { .. })
        ) {
            return Resolution::Stale;
        }

        self.pending.remove(id);
        if let Some(index) = self.position(id) {
            self.items[index].pending = false;
        }
        Resolution::Confirmed
    }

    /// Drops the snapshot kept for a deleted record.
    pub fn confirm_delete(&mut self, id: &str) -> Resolution {
        if !matches!(
            self.pending.get(id).map(|change| &change.snapshot),
            Some(Snapshot::Deleted { .. })
        ) {
            return Resolution::Stale;
        }

        self.pending.remove(id);
        Resolution::Confirmed
    }

    fn settle_add(
        &mut self,
        temp_id: &str,
        server_id: &str,
        apply: impl FnOnce(&mut T),
    ) -> Resolution {
        if !matches!(
            self.pending.get(temp_id).map(|change| &change.snapshot),
            Some(Snapshot::Added)
        ) {
            return Resolution::Stale;
        }
        self.pending.remove(temp_id);

        // A refresh may already have brought in the stored row, or the
        // server id may belong to a row still awaiting a delete.
        if server_id != temp_id {
            if let Some(duplicate) = self.position(server_id) {
                self.items.remove(duplicate);
            }
            self.pending.remove(server_id);
        }

        if let Some(index) = self.position(temp_id) {
            let item = &mut self.items[index];
            apply(&mut item.record);
            item.pending = false;
        }
        Resolution::Confirmed
    }

    fn ensure_not_pending(&self, id: &str) -> Result<()> {
        if self.pending.contains_key(id) {
            return Err(ListError::AlreadyPending(id.to_string()));
        }
        Ok(())
    }

    fn track(&mut self, id: String, snapshot: Snapshot<T>) -> Rollback {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending
            .insert(id.clone(), PendingChange { ticket, snapshot });
        Rollback { id, ticket }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.record.id() == id)
    }
}
