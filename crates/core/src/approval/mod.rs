mod error;
mod policy;
mod types;

pub use error::{PolicyError, Result};
pub use policy::{RolePermissions, RolePolicy};
pub use types::{AccessLevel, ApprovalRecord, ApprovalStatus, GateDecision, GatedAction};
