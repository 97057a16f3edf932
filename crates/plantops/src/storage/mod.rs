//! Remote store implementations.
//!
//! The spreadsheet API transport lives outside this crate; the in-memory
//! backend stands in for it in the CLI simulation and in tests.

mod inmemory;

pub use inmemory::{InMemoryActivityLog, InMemoryApprovalSink, InMemoryCollection};
