use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::diff::{build_preview, diff_fields};
use crate::mutation::{Actor, MutationAction};

/// Old and new value of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

impl FieldChange {
    pub fn new(old: Value, new: Value) -> Self {
        Self { old, new }
    }
}

/// Append-only audit record of one committed mutation.
///
/// Updates carry a field diff. Deletes keep the full `before` snapshot since
/// the record no longer exists to inspect. Creates store `after` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub entity_kind: String,
    pub record_id: String,
    pub action: MutationAction,
    pub actor_id: String,
    pub actor_role: String,
    pub actor_plant: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changes: BTreeMap<String, FieldChange>,
    pub preview: String,
}

impl ActivityLogEntry {
    fn build(
        entity_kind: &str,
        record_id: &str,
        action: MutationAction,
        actor: &Actor,
        before: Option<Value>,
        after: Option<Value>,
        changes: BTreeMap<String, FieldChange>,
    ) -> Self {
        let preview = build_preview(action, entity_kind, record_id, &changes);
        Self {
            id: Uuid::new_v4(),
            entity_kind: entity_kind.to_string(),
            record_id: record_id.to_string(),
            action,
            actor_id: actor.id.clone(),
            actor_role: actor.role.clone(),
            actor_plant: actor.plant.clone(),
            timestamp: Utc::now(),
            before,
            after,
            changes,
            preview,
        }
    }

    /// Entry for a created record. No diff is computed.
    pub fn created(entity_kind: &str, record_id: &str, actor: &Actor, after: Value) -> Self {
        Self::build(
            entity_kind,
            record_id,
            MutationAction::Create,
            actor,
            None,
            Some(after),
            BTreeMap::new(),
        )
    }

    /// Entry for an updated record, with the field diff between snapshots.
    pub fn updated(
        entity_kind: &str,
        record_id: &str,
        actor: &Actor,
        before: Value,
        after: Value,
    ) -> Self {
        let changes = diff_fields(&before, &after);
        Self::build(
            entity_kind,
            record_id,
            MutationAction::Update,
            actor,
            Some(before),
            Some(after),
            changes,
        )
    }

    /// Entry for a deleted record, keeping the full prior snapshot.
    pub fn deleted(entity_kind: &str, record_id: &str, actor: &Actor, before: Value) -> Self {
        Self::build(
            entity_kind,
            record_id,
            MutationAction::Delete,
            actor,
            Some(before),
            None,
            BTreeMap::new(),
        )
    }

    /// Sets the timestamp (useful for testing).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets a specific ID for this entry (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}
