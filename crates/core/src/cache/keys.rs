//! Cache key builders.
//!
//! Every key derived from a remote collection embeds the collection name, so
//! that `Cache::invalidate_by_prefix(collection)` reaches all of them after a
//! write.

/// Operation segment for list reads of a collection.
const OP_READ: &str = "read";

/// Operation segment for single-record reads.
const OP_RECORD: &str = "record";

/// Returns the cache key for a full read of a collection.
pub fn read_key(collection: &str) -> String {
    format!("{}:{}", OP_READ, collection)
}

/// Returns the cache key for a read of a collection limited to one plant.
pub fn scoped_read_key(collection: &str, plant: &str) -> String {
    format!("{}:{}:{}", OP_READ, collection, plant)
}

/// Returns the cache key for a single record of a collection.
pub fn record_key(collection: &str, record_id: &str) -> String {
    format!("{}:{}:{}", OP_RECORD, collection, record_id)
}
