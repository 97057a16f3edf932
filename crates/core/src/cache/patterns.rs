//! Glob matching for cache keys.
//!
//! Patterns support `*` as a wildcard matching any run of characters,
//! including the empty one. Everything else matches literally.

/// Checks if a cache key matches a glob pattern.
///
/// # Examples
///
/// ```
/// use plantops_core::cache::pattern_matches;
///
/// assert!(pattern_matches("read:orders", "read:orders"));
/// assert!(pattern_matches("read:*", "read:vibration:north"));
/// assert!(pattern_matches("*orders*", "read:orders:plant-1"));
/// assert!(!pattern_matches("read:orders:*", "read:vibration:plant-1"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == key;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return key.is_empty(),
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return pattern == key,
    };

    // Anchored head and tail must not overlap.
    if key.len() < first.len() + last.len() {
        return false;
    }
    let Some(after_head) = key.strip_prefix(first) else {
        return false;
    };
    if !after_head.ends_with(last) {
        return false;
    }
    let mut remaining = &after_head[..after_head.len() - last.len()];

    for segment in middle.iter().filter(|s| !s.is_empty()) {
        match remaining.find(segment) {
            Some(pos) => remaining = &remaining[pos + segment.len()..],
            None => return false,
        }
    }

    true
}

/// Builds the glob pattern matching keys that contain `fragment` anywhere.
///
/// An empty fragment yields `*`, which matches every key.
pub fn contains_pattern(fragment: &str) -> String {
    if fragment.is_empty() {
        return "*".to_string();
    }
    format!("*{}*", fragment)
}
