//! Cache backend implementations.
//!
//! The in-memory backend is the only one: all cache state lives for the
//! lifetime of the running client.

mod memory;

pub use memory::MemoryCache;
