//! Pure core of the plantops data layer.
//!
//! Everything in this crate is free of I/O: cache key and pattern helpers,
//! the cache and remote-store traits, the role policy behind the approval
//! gate, activity diffs and the optimistic list reconciler. The `plantops`
//! crate wires these to concrete stores.

pub mod activity;
pub mod approval;
pub mod cache;
pub mod mutation;
pub mod optimistic;
pub mod remote;
