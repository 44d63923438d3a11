//! Cache configuration.
//!
//! Expiration policies are per entity kind; anything not overridden falls back to
//! the default policy.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::keys::EntityKind;

pub(crate) const DEFAULT_SLIDING_MINUTES: u64 = 10;
pub(crate) const DEFAULT_ABSOLUTE_MINUTES: u64 = 20;
pub(crate) const CATALOG_ABSOLUTE_MINUTES: u64 = 30;
pub(crate) const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Two expiration bounds applied to every entry at insertion.
///
/// An entry stays readable while it keeps being accessed within `sliding`, but never
/// past `absolute` after it was put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    sliding: Duration,
    absolute: Duration,
}

impl ExpirationPolicy {
    pub const fn new(sliding: Duration, absolute: Duration) -> Self {
        Self { sliding, absolute }
    }

    pub const fn from_minutes(sliding_minutes: u64, absolute_minutes: u64) -> Self {
        Self::new(
            Duration::from_secs(sliding_minutes.saturating_mul(60)),
            Duration::from_secs(absolute_minutes.saturating_mul(60)),
        )
    }

    pub fn sliding(&self) -> Duration {
        self.sliding
    }

    pub fn absolute(&self) -> Duration {
        self.absolute
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_SLIDING_MINUTES, DEFAULT_ABSOLUTE_MINUTES)
    }
}

/// How writes treat entries that were populated before the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteConsistency {
    /// Updates leave cached copies in place until they expire; creates do not touch
    /// collection snapshots. Deletes still purge every key of the deleted record.
    #[default]
    BoundedStaleness,
    /// Updates purge every key of the record; creates, updates and deletes also drop
    /// the entity's collection snapshots and child listings.
    InvalidateOnWrite,
}

impl WriteConsistency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BoundedStaleness => "bounded_staleness",
            Self::InvalidateOnWrite => "invalidate_on_write",
        }
    }
}

impl fmt::Display for WriteConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteConsistency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "bounded_staleness" => Ok(Self::BoundedStaleness),
            "invalidate_on_write" => Ok(Self::InvalidateOnWrite),
            other => Err(format!(
                "unknown consistency `{other}` (expected bounded_staleness or invalidate_on_write)"
            )),
        }
    }
}

/// Runtime cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every lookup goes straight to the backing store.
    pub enabled: bool,
    pub consistency: WriteConsistency,
    /// Period of the background expiry sweep; `None` leaves expiry to lookups.
    pub sweep_interval: Option<Duration>,
    pub default_policy: ExpirationPolicy,
    pub policies: HashMap<EntityKind, ExpirationPolicy>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let catalog =
            ExpirationPolicy::from_minutes(DEFAULT_SLIDING_MINUTES, CATALOG_ABSOLUTE_MINUTES);
        let policies = HashMap::from([
            (EntityKind::Product, catalog),
            (EntityKind::Category, catalog),
        ]);

        Self {
            enabled: true,
            consistency: WriteConsistency::default(),
            sweep_interval: Some(Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)),
            default_policy: ExpirationPolicy::default(),
            policies,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            consistency: settings.consistency,
            sweep_interval: settings.sweep_interval,
            default_policy: settings.default_policy,
            policies: settings.policies.clone(),
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Effective policy for `kind`.
    pub fn policy(&self, kind: EntityKind) -> ExpirationPolicy {
        self.policies
            .get(&kind)
            .copied()
            .unwrap_or(self.default_policy)
    }

    pub fn with_policy(mut self, kind: EntityKind, policy: ExpirationPolicy) -> Self {
        self.policies.insert(kind, policy);
        self
    }

    pub fn with_consistency(mut self, consistency: WriteConsistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.consistency, WriteConsistency::BoundedStaleness);
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(60)));

        let customer = config.policy(EntityKind::Customer);
        assert_eq!(customer.sliding(), Duration::from_secs(10 * 60));
        assert_eq!(customer.absolute(), Duration::from_secs(20 * 60));

        let product = config.policy(EntityKind::Product);
        assert_eq!(product.sliding(), Duration::from_secs(10 * 60));
        assert_eq!(product.absolute(), Duration::from_secs(30 * 60));
        assert_eq!(config.policy(EntityKind::Category), product);
    }

    #[test]
    fn override_replaces_default_for_one_kind() {
        let config = CacheConfig::default().with_policy(
            EntityKind::Order,
            ExpirationPolicy::new(Duration::from_secs(5), Duration::from_secs(15)),
        );

        assert_eq!(
            config.policy(EntityKind::Order).absolute(),
            Duration::from_secs(15)
        );
        assert_eq!(
            config.policy(EntityKind::OrderItem),
            ExpirationPolicy::default()
        );
    }

    #[test]
    fn disabled_keeps_policies() {
        let config = CacheConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(
            config.policy(EntityKind::Product).absolute(),
            Duration::from_secs(30 * 60)
        );
    }

    #[test]
    fn huge_minutes_saturate() {
        let policy = ExpirationPolicy::from_minutes(u64::MAX, u64::MAX);
        assert_eq!(policy.sliding(), Duration::from_secs(u64::MAX));
        assert_eq!(policy.absolute(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn consistency_parses_both_spellings() {
        assert_eq!(
            "invalidate-on-write".parse::<WriteConsistency>(),
            Ok(WriteConsistency::InvalidateOnWrite)
        );
        assert_eq!(
            " Bounded_Staleness ".parse::<WriteConsistency>(),
            Ok(WriteConsistency::BoundedStaleness)
        );
        assert!("eventual".parse::<WriteConsistency>().is_err());
    }
}
