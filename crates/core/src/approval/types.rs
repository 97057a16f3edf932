use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much a role may do with a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessLevel {
    NoAccess,
    ViewOnly,
    DirectWrite,
    ApprovalRequired,
}

impl AccessLevel {
    /// Returns true if the role may issue writes, directly or through approval.
    pub fn can_write(self) -> bool {
        matches!(self, Self::DirectWrite | Self::ApprovalRequired)
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAccess => write!(f, "no-access"),
            Self::ViewOnly => write!(f, "view-only"),
            Self::DirectWrite => write!(f, "direct-write"),
            Self::ApprovalRequired => write!(f, "approval-required"),
        }
    }
}

/// Actions subject to the approval gate. Creates are never gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatedAction {
    Edit,
    Delete,
}

impl std::fmt::Display for GatedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edit => write!(f, "edit"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl std::str::FromStr for GatedAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "edit" | "update" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// Outcome of the approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Direct,
    RequiresApproval,
}

/// Review state of an approval record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// A mutation held back for review by a privileged role.
///
/// Only ever produced with [`ApprovalStatus::Pending`]; reviewers resolve it
/// outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub id: Uuid,
    pub entity_kind: String,
    pub action: GatedAction,
    /// Record the mutation targets.
    pub target_id: Option<String>,
    /// Proposed record for edits, current record for deletes.
    pub snapshot: serde_json::Value,
    pub reason: String,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub status: ApprovalStatus,
}

impl ApprovalRecord {
    /// Creates a pending approval record submitted now.
    pub fn pending(
        entity_kind: impl Into<String>,
        action: GatedAction,
        target_id: Option<String>,
        snapshot: serde_json::Value,
        submitted_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_kind: entity_kind.into(),
            action,
            target_id,
            snapshot,
            reason: String::new(),
            submitted_by: submitted_by.into(),
            submitted_at: Utc::now(),
            status: ApprovalStatus::Pending,
        }
    }

    /// Sets the reason shown to reviewers.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets a specific ID for this record (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Sets the submission timestamp (useful for testing).
    pub fn with_submitted_at(mut self, submitted_at: DateTime<Utc>) -> Self {
        self.submitted_at = submitted_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_access_level_capabilities() {
        assert!(!AccessLevel::NoAccess.can_write());
        assert!(!AccessLevel::ViewOnly.can_write());
        assert!(AccessLevel::DirectWrite.can_write());
        assert!(AccessLevel::ApprovalRequired.can_write());
    }

    #[test]
    fn test_access_level_serde_names() {
        let level: AccessLevel = serde_json::from_str("\"approval-required\"").unwrap();
        assert_eq!(level, AccessLevel::ApprovalRequired);
        assert_eq!(AccessLevel::ViewOnly.to_string(), "view-only");
    }

    #[test]
    fn test_gated_action_from_str() {
        assert_eq!("edit".parse::<GatedAction>(), Ok(GatedAction::Edit));
        assert_eq!("DELETE".parse::<GatedAction>(), Ok(GatedAction::Delete));
        assert!("create".parse::<GatedAction>().is_err());
    }

    #[test]
    fn test_pending_record() {
        let record = ApprovalRecord::pending(
            "trouble_record",
            GatedAction::Delete,
            Some("42".to_string()),
            json!({"id": "42"}),
            "u-7",
        )
        .with_reason("entered twice");

        assert_eq!(record.status, ApprovalStatus::Pending);
        assert_eq!(record.target_id.as_deref(), Some("42"));
        assert_eq!(record.reason, "entered twice");
        assert_eq!(record.submitted_by, "u-7");
    }

    #[test]
    fn test_record_serializes_status_lowercase() {
        let record = ApprovalRecord::pending("pump", GatedAction::Edit, None, json!({}), "u-1");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["action"], "edit");
    }
}
