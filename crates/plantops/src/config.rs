use std::{env, fs, str::FromStr, time::Duration};

use plantops_core::approval::RolePolicy;
use plantops_core::cache::{TtlTiers, DEFAULT_TTL, LONG_TTL, SHORT_TTL};

use crate::error::ConfigError;
use crate::reports::DEFAULT_CHANNEL_CAPACITY;

/// Data layer configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Short TTL tier in milliseconds (default: 30,000)
    pub cache_ttl_short_ms: u64,
    /// Default TTL tier in milliseconds (default: 60,000)
    pub cache_ttl_default_ms: u64,
    /// Long TTL tier in milliseconds (default: 300,000)
    pub cache_ttl_long_ms: u64,
    /// Path to a JSON role policy; the built-in policy is used when unset.
    pub role_policy_path: Option<String>,
    /// Buffered error reports per subscriber (default: 100)
    pub error_channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `CACHE_TTL_SHORT_MS` - Short TTL tier (default: 30,000)
    /// - `CACHE_TTL_DEFAULT_MS` - Default TTL tier (default: 60,000)
    /// - `CACHE_TTL_LONG_MS` - Long TTL tier (default: 300,000)
    /// - `ROLE_POLICY_PATH` - Role policy JSON file (default: built-in policy)
    /// - `ERROR_CHANNEL_CAPACITY` - Error report buffer (default: 100)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |d: Duration| d.as_millis() as u64;

        Self {
            cache_max_entries: parse_var(&lookup, "CACHE_MAX_ENTRIES")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(10_000),
            cache_ttl_short_ms: parse_var(&lookup, "CACHE_TTL_SHORT_MS")
                .unwrap_or(millis(SHORT_TTL)),
            cache_ttl_default_ms: parse_var(&lookup, "CACHE_TTL_DEFAULT_MS")
                .unwrap_or(millis(DEFAULT_TTL)),
            cache_ttl_long_ms: parse_var(&lookup, "CACHE_TTL_LONG_MS")
                .unwrap_or(millis(LONG_TTL)),
            role_policy_path: lookup("ROLE_POLICY_PATH").filter(|p| !p.is_empty()),
            error_channel_capacity: parse_var(&lookup, "ERROR_CHANNEL_CAPACITY")
                .unwrap_or(DEFAULT_CHANNEL_CAPACITY),
        }
    }

    /// Get the TTL tiers as durations.
    pub fn ttl_tiers(&self) -> TtlTiers {
        TtlTiers {
            short: Duration::from_millis(self.cache_ttl_short_ms),
            default: Duration::from_millis(self.cache_ttl_default_ms),
            long: Duration::from_millis(self.cache_ttl_long_ms),
        }
    }

    /// Loads the configured role policy, or the built-in one.
    pub fn load_role_policy(&self) -> Result<RolePolicy, ConfigError> {
        match &self.role_policy_path {
            Some(path) => load_role_policy(path),
            None => Ok(RolePolicy::standard()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.parse().ok())
}

/// Reads a role policy document from disk.
pub fn load_role_policy(path: &str) -> Result<RolePolicy, ConfigError> {
    let document = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;

    let policy = RolePolicy::from_json(&document).map_err(|source| ConfigError::Policy {
        path: path.to_string(),
        source,
    })?;

    tracing::debug!(path, "Loaded role policy");
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use plantops_core::approval::{AccessLevel, GatedAction};

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config_from(&[]);

        assert_eq!(config.cache_max_entries, 10_000);
        assert_eq!(config.cache_ttl_short_ms, 30_000);
        assert_eq!(config.cache_ttl_default_ms, 60_000);
        assert_eq!(config.cache_ttl_long_ms, 300_000);
        assert_eq!(config.role_policy_path, None);
        assert_eq!(config.error_channel_capacity, 100);
        assert_eq!(config.ttl_tiers(), TtlTiers::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CACHE_MAX_ENTRIES", "500"),
            ("CACHE_TTL_SHORT_MS", "1000"),
            ("ROLE_POLICY_PATH", "/etc/plantops/roles.json"),
        ]);

        assert_eq!(config.cache_max_entries, 500);
        assert_eq!(config.ttl_tiers().short, Duration::from_secs(1));
        assert_eq!(config.ttl_tiers().default, DEFAULT_TTL);
        assert_eq!(
            config.role_policy_path.as_deref(),
            Some("/etc/plantops/roles.json")
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("CACHE_MAX_ENTRIES", "0"),
            ("CACHE_TTL_LONG_MS", "forever"),
            ("ROLE_POLICY_PATH", ""),
        ]);

        assert_eq!(config.cache_max_entries, 10_000);
        assert_eq!(config.cache_ttl_long_ms, 300_000);
        assert_eq!(config.role_policy_path, None);
    }

    #[test]
    fn test_builtin_policy_when_unset() {
        let policy = config_from(&[]).load_role_policy().unwrap();
        assert_eq!(policy, RolePolicy::standard());
    }

    #[test]
    fn test_load_policy_file() {
        let path = env::temp_dir().join(format!("plantops-roles-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{ "roles": { "tech": { "edit": "direct-write", "delete": "approval-required" } } }"#,
        )
        .unwrap();

        let config = config_from(&[("ROLE_POLICY_PATH", path.to_str().unwrap())]);
        let policy = config.load_role_policy().unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(policy.level("tech", GatedAction::Edit), AccessLevel::DirectWrite);
        assert_eq!(
            policy.level("tech", GatedAction::Delete),
            AccessLevel::ApprovalRequired
        );
    }

    #[test]
    fn test_missing_policy_file() {
        let err = load_role_policy("/nonexistent/plantops/roles.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
