//! Role policy and the approval gate.
//!
//! The policy is a pure lookup table: role name to access level per gated
//! action. The gate never creates records; it only classifies.

use std::collections::HashMap;

use serde::Deserialize;

use super::error::{PolicyError, Result};
use super::types::{AccessLevel, GateDecision, GatedAction};

/// Access levels of one role for each gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePermissions {
    pub edit: AccessLevel,
    pub delete: AccessLevel,
}

impl RolePermissions {
    /// Same access level for every action.
    pub fn uniform(level: AccessLevel) -> Self {
        Self {
            edit: level,
            delete: level,
        }
    }

    /// Returns the access level for a gated action.
    pub fn level_for(&self, action: GatedAction) -> AccessLevel {
        match action {
            GatedAction::Edit => self.edit,
            GatedAction::Delete => self.delete,
        }
    }

    /// Creates follow the edit classification, but are never gated.
    pub fn can_create(&self) -> bool {
        self.edit.can_write()
    }
}

/// Maps roles to their permissions. Unknown roles get the default level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    default: AccessLevel,
    roles: HashMap<String, RolePermissions>,
}

impl RolePolicy {
    /// Creates an empty policy where every role gets `default`.
    pub fn new(default: AccessLevel) -> Self {
        Self {
            default,
            roles: HashMap::new(),
        }
    }

    /// Policy used when no policy document is configured.
    ///
    /// - `admin`, `supervisor`: direct writes
    /// - `operator`: edits and deletes need approval
    /// - `viewer`: read only
    /// - anything else: no access
    pub fn standard() -> Self {
        Self::new(AccessLevel::NoAccess)
            .with_role("admin", RolePermissions::uniform(AccessLevel::DirectWrite))
            .with_role(
                "supervisor",
                RolePermissions::uniform(AccessLevel::DirectWrite),
            )
            .with_role(
                "operator",
                RolePermissions::uniform(AccessLevel::ApprovalRequired),
            )
            .with_role("viewer", RolePermissions::uniform(AccessLevel::ViewOnly))
    }

    /// Adds or replaces the permissions of a role.
    pub fn with_role(mut self, role: impl Into<String>, permissions: RolePermissions) -> Self {
        self.roles.insert(role.into(), permissions);
        self
    }

    /// Parses a policy document.
    ///
    /// ```
    /// use plantops_core::approval::{AccessLevel, GatedAction, RolePolicy};
    ///
    /// let policy = RolePolicy::from_json(r#"{
    ///     "default": "view-only",
    ///     "roles": {
    ///         "lead": "direct-write",
    ///         "tech": { "edit": "direct-write", "delete": "approval-required" }
    ///     }
    /// }"#).unwrap();
    ///
    /// assert_eq!(policy.level("tech", GatedAction::Delete), AccessLevel::ApprovalRequired);
    /// assert_eq!(policy.level("guest", GatedAction::Edit), AccessLevel::ViewOnly);
    /// ```
    pub fn from_json(document: &str) -> Result<Self> {
        let raw: PolicyDocument = serde_json::from_str(document)
            .map_err(|e| PolicyError::InvalidDocument(e.to_string()))?;

        let roles = raw
            .roles
            .into_iter()
            .map(|(role, entry)| (role, entry.into_permissions()))
            .collect();

        Ok(Self {
            default: raw.default.unwrap_or(AccessLevel::NoAccess),
            roles,
        })
    }

    /// Returns the permissions of a role, falling back to the default level.
    pub fn permissions(&self, role: &str) -> RolePermissions {
        self.roles
            .get(role)
            .copied()
            .unwrap_or_else(|| RolePermissions::uniform(self.default))
    }

    /// Returns the access level of a role for a gated action.
    pub fn level(&self, role: &str, action: GatedAction) -> AccessLevel {
        self.permissions(role).level_for(action)
    }

    /// Classifies a gated action as direct or approval-bound.
    ///
    /// Only `direct-write` goes straight through. Roles without write access
    /// are classified as approval-bound here; callers reject them before the
    /// gate is consulted.
    pub fn decide(&self, role: &str, action: GatedAction) -> GateDecision {
        match self.level(role, action) {
            AccessLevel::DirectWrite => GateDecision::Direct,
            AccessLevel::ApprovalRequired | AccessLevel::ViewOnly | AccessLevel::NoAccess => {
                GateDecision::RequiresApproval
            }
        }
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyDocument {
    #[serde(default)]
    default: Option<AccessLevel>,
    #[serde(default)]
    roles: HashMap<String, RoleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoleEntry {
    Uniform(AccessLevel),
    PerAction {
        edit: AccessLevel,
        delete: AccessLevel,
    },
}

impl RoleEntry {
    fn into_permissions(self) -> RolePermissions {
        match self {
            Self::Uniform(level) => RolePermissions::uniform(level),
            Self::PerAction { edit, delete } => RolePermissions { edit, delete },
        }
    }
}
