//! Per-entity cache counters.
//!
//! Every event is counted twice: in process, for [`CacheStatsSnapshot`], and through
//! the `metrics` facade labelled by entity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use serde::Serialize;

use super::keys::EntityKind;

pub(crate) const METRIC_CACHE_HIT_TOTAL: &str = "storefront_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS_TOTAL: &str = "storefront_cache_miss_total";
pub(crate) const METRIC_CACHE_EXPIRED_TOTAL: &str = "storefront_cache_expired_total";
pub(crate) const METRIC_CACHE_INVALIDATED_TOTAL: &str = "storefront_cache_invalidated_total";
pub(crate) const METRIC_CACHE_ENTRIES: &str = "storefront_cache_entries";
pub(crate) const METRIC_CACHE_LOAD_MS: &str = "storefront_cache_load_ms";

#[derive(Debug)]
pub struct CacheStats {
    kind: EntityKind,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    invalidations: AtomicU64,
    loads: AtomicU64,
}

impl CacheStats {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_CACHE_HIT_TOTAL, "entity" => self.kind.label()).increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_CACHE_MISS_TOTAL, "entity" => self.kind.label()).increment(1);
    }

    /// An entry found past its policy. Also counts as a miss for the caller.
    pub fn record_expiration(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.expirations.fetch_add(count, Ordering::Relaxed);
        counter!(METRIC_CACHE_EXPIRED_TOTAL, "entity" => self.kind.label()).increment(count);
    }

    pub fn record_invalidation(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.invalidations.fetch_add(count, Ordering::Relaxed);
        counter!(METRIC_CACHE_INVALIDATED_TOTAL, "entity" => self.kind.label()).increment(count);
    }

    /// A backing-store read performed on a miss.
    pub fn record_load(&self, elapsed: Duration) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        histogram!(METRIC_CACHE_LOAD_MS, "entity" => self.kind.label())
            .record(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn record_entries(&self, entries: usize) {
        gauge!(METRIC_CACHE_ENTRIES, "entity" => self.kind.label()).set(entries as f64);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Fraction of lookups served from the cache, 0.0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn snapshot(&self, entries: usize) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            entity: self.kind,
            entries,
            hits: self.hits(),
            misses: self.misses(),
            expirations: self.expirations.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            loads: self.loads(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Point-in-time copy of one entity cache's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatsSnapshot {
    pub entity: EntityKind,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub invalidations: u64,
    pub loads: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_without_traffic() {
        let stats = CacheStats::new(EntityKind::Order);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn snapshot_reflects_recorded_events() {
        let stats = CacheStats::new(EntityKind::Product);
        stats.record_miss();
        stats.record_load(Duration::from_millis(3));
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_invalidation(2);
        stats.record_expiration(0);

        let snapshot = stats.snapshot(4);
        assert_eq!(snapshot.entity, EntityKind::Product);
        assert_eq!(snapshot.entries, 4);
        assert_eq!(snapshot.hits, 3);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.loads, 1);
        assert_eq!(snapshot.invalidations, 2);
        assert_eq!(snapshot.expirations, 0);
        assert!((snapshot.hit_rate - 0.75).abs() < f64::EPSILON);
    }
}
