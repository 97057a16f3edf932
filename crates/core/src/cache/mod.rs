mod error;
mod keys;
mod patterns;
mod serialization;
mod traits;
mod ttl;

pub use error::{CacheError, Result};
pub use keys::{read_key, record_key, scoped_read_key};
pub use patterns::{contains_pattern, pattern_matches};
pub use serialization::{deserialize_value, serialize_value, SerializationError};
pub use traits::Cache;
pub use ttl::{TtlTier, TtlTiers, DEFAULT_TTL, LONG_TTL, SHORT_TTL};
