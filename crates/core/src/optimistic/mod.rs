//! Optimistic list reconciliation.
//!
//! A page renders an [`OptimisticList`]; writes are applied to it before the
//! remote call returns and later confirmed or rolled back. Each pending change
//! is a small state machine: `Optimistic -> Confirmed | RolledBack`, with the
//! rollback snapshot captured when the change is applied.

mod error;
mod list;

pub use error::{ListError, Result};
pub use list::{ListItem, OptimisticList, Resolution, Rollback};
