mod diff;
mod types;

pub use diff::{build_preview, diff_fields};
pub use types::{ActivityLogEntry, FieldChange};
