use std::time::Duration;

use serde::{Deserialize, Serialize};

/// TTL for frequently-changing collections.
pub const SHORT_TTL: Duration = Duration::from_millis(30_000);

/// TTL used when a caller has no better idea.
pub const DEFAULT_TTL: Duration = Duration::from_millis(60_000);

/// TTL for rarely-changing reference data.
pub const LONG_TTL: Duration = Duration::from_millis(300_000);

/// Standard TTL tiers. Picking one is the caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtlTier {
    Short,
    Default,
    Long,
}

/// Concrete durations for each tier, overridable through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlTiers {
    pub short: Duration,
    pub default: Duration,
    pub long: Duration,
}

impl TtlTiers {
    /// Returns the duration configured for a tier.
    pub fn duration(&self, tier: TtlTier) -> Duration {
        match tier {
            TtlTier::Short => self.short,
            TtlTier::Default => self.default,
            TtlTier::Long => self.long,
        }
    }
}

impl Default for TtlTiers {
    fn default() -> Self {
        Self {
            short: SHORT_TTL,
            default: DEFAULT_TTL,
            long: LONG_TTL,
        }
    }
}
