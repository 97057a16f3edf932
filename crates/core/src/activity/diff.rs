//! Pure diff and preview functions for activity log entries.

use std::collections::BTreeMap;

use serde_json::Value;

use super::types::FieldChange;
use crate::mutation::MutationAction;

/// Key used when a snapshot is not a JSON object.
const WHOLE_VALUE_KEY: &str = "value";

/// Maximum number of field names listed in a preview.
const PREVIEW_FIELD_LIMIT: usize = 5;

/// Computes field-level changes between two snapshots.
///
/// Every key present in either object whose values differ is reported; a key
/// missing on one side reads as `null` there. Non-object snapshots compare as
/// a single value.
///
/// ```
/// use plantops_core::activity::diff_fields;
/// use serde_json::json;
///
/// let changes = diff_fields(
///     &json!({"status": "open", "notes": "leak"}),
///     &json!({"status": "closed", "notes": "leak"}),
/// );
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes["status"].new, json!("closed"));
/// ```
pub fn diff_fields(before: &Value, after: &Value) -> BTreeMap<String, FieldChange> {
    let (Value::Object(old), Value::Object(new)) = (before, after) else {
        if before == after {
            return BTreeMap::new();
        }
        return BTreeMap::from([(
            WHOLE_VALUE_KEY.to_string(),
            FieldChange::new(before.clone(), after.clone()),
        )]);
    };

    old.keys()
        .chain(new.keys().filter(|key| !old.contains_key(*key)))
        .filter_map(|key| {
            let previous = old.get(key).unwrap_or(&Value::Null);
            let current = new.get(key).unwrap_or(&Value::Null);
            (previous != current).then(|| {
                (
                    key.clone(),
                    FieldChange::new(previous.clone(), current.clone()),
                )
            })
        })
        .collect()
}

/// Builds the one-line summary shown next to an activity entry.
pub fn build_preview(
    action: MutationAction,
    entity_kind: &str,
    record_id: &str,
    changes: &BTreeMap<String, FieldChange>,
) -> String {
    let head = format!("{} {} {}", action.past_tense(), entity_kind, record_id);

    if action != MutationAction::Update {
        return head;
    }
    if changes.is_empty() {
        return format!("{head} (no field changes)");
    }

    let listed: Vec<&str> = changes
        .keys()
        .take(PREVIEW_FIELD_LIMIT)
        .map(String::as_str)
        .collect();
    let hidden = changes.len().saturating_sub(PREVIEW_FIELD_LIMIT);

    if hidden == 0 {
        format!("{head}: {}", listed.join(", "))
    } else {
        format!("{head}: {} (+{hidden} more)", listed.join(", "))
    }
}
