//! Read-through cache for one entity type.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::domain::entities::{
    CategoryRecord, CustomerRecord, InventoryRecord, OrderItemRecord, OrderRecord, ProductRecord,
};

use super::clock::Clock;
use super::config::ExpirationPolicy;
use super::keys::{CacheKey, Discriminator, EntityKey, EntityKind};
use super::registry::CacheRegistry;
use super::stats::{CacheStats, CacheStatsSnapshot};
use super::table::{EntryTable, Lookup};

/// A record type that can be held by an [`EntityCache`].
pub trait Cacheable: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Identity assigned by the backing store.
    fn cache_id(&self) -> i64;
}

/// Cache-aside table for records of type `T`.
///
/// Single records (by id or by secondary attribute) and listings (the collection
/// snapshot and child listings) are kept apart; every populated key is registered
/// against the stored data it came from so writes can find it again.
pub struct EntityCache<T: Cacheable> {
    records: EntryTable<T>,
    listings: EntryTable<Vec<T>>,
    policy: ExpirationPolicy,
    enabled: bool,
    registry: Arc<CacheRegistry>,
    stats: CacheStats,
}

impl<T: Cacheable> EntityCache<T> {
    pub fn new(
        policy: ExpirationPolicy,
        enabled: bool,
        clock: Arc<dyn Clock>,
        registry: Arc<CacheRegistry>,
    ) -> Self {
        Self {
            records: EntryTable::new(clock.clone()),
            listings: EntryTable::new(clock),
            policy,
            enabled,
            registry,
            stats: CacheStats::new(T::KIND),
        }
    }

    pub fn policy(&self) -> ExpirationPolicy {
        self.policy
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached record under `key`, refreshing its sliding window on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<T> {
        if !self.enabled {
            return None;
        }
        let lookup = self
            .records
            .lookup_with(key, |expired| self.registry.unregister(expired));
        self.observe(key, &lookup);
        lookup.into_option()
    }

    pub fn put(&self, key: CacheKey, value: T) {
        if !self.enabled {
            return;
        }
        debug_assert_eq!(key.kind(), T::KIND);
        let deps = HashSet::from([EntityKey::Record(T::KIND, value.cache_id())]);
        self.records.put_with(key, value, self.policy, |key| {
            self.registry.register(key.clone(), deps)
        });
        self.stats.record_entries(self.len());
    }

    pub fn get_list(&self, key: &CacheKey) -> Option<Vec<T>> {
        if !self.enabled {
            return None;
        }
        let lookup = self
            .listings
            .lookup_with(key, |expired| self.registry.unregister(expired));
        self.observe(key, &lookup);
        lookup.into_option()
    }

    /// Cache a listing. It depends on the kind's collection, on every record it
    /// holds and, for a child listing, on its parent record.
    pub fn put_list(&self, key: CacheKey, values: Vec<T>) {
        if !self.enabled {
            return;
        }
        debug_assert!(key.is_listing());
        let mut deps: HashSet<EntityKey> = values
            .iter()
            .map(|value| EntityKey::Record(T::KIND, value.cache_id()))
            .collect();
        deps.insert(EntityKey::Collection(T::KIND));
        if let Discriminator::Children { parent, parent_id } = key.discriminator() {
            deps.insert(EntityKey::Record(*parent, *parent_id));
        }
        self.listings.put_with(key, values, self.policy, |key| {
            self.registry.register(key.clone(), deps)
        });
        self.stats.record_entries(self.len());
    }

    /// Read through the cache: on a miss `fetch` runs exactly once and a found
    /// record is cached. Absence is never cached, and a failed fetch leaves the
    /// cache untouched.
    pub async fn load<F, Fut, E>(&self, key: CacheKey, fetch: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(Some(hit));
        }

        let started = Instant::now();
        let loaded = fetch().await?;
        self.stats.record_load(started.elapsed());

        if let Some(record) = &loaded {
            self.put(key, record.clone());
        }
        Ok(loaded)
    }

    /// Listing counterpart of [`EntityCache::load`]. Empty listings are not cached.
    pub async fn load_list<F, Fut, E>(&self, key: CacheKey, fetch: F) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(hit) = self.get_list(&key) {
            return Ok(hit);
        }

        let started = Instant::now();
        let loaded = fetch().await?;
        self.stats.record_load(started.elapsed());

        if !loaded.is_empty() {
            self.put_list(key, loaded.clone());
        }
        Ok(loaded)
    }

    /// Remove `key` and its registry mappings. Returns whether an entry existed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let unregister = |key: &CacheKey| self.registry.unregister(key);
        let removed = if key.is_listing() {
            self.listings.invalidate_with(key, unregister)
        } else {
            self.records.invalidate_with(key, unregister)
        };
        self.after_removal(key, removed);
        removed
    }

    /// Drop the full-collection snapshot of this kind.
    pub fn invalidate_collection(&self) -> bool {
        self.invalidate(&CacheKey::collection(T::KIND))
    }

    /// Remove `key` from the tables only; callers that use this have already
    /// taken the key out of the registry.
    pub(crate) fn evict(&self, key: &CacheKey) -> bool {
        let removed = if key.is_listing() {
            self.listings.invalidate(key)
        } else {
            self.records.invalidate(key)
        };
        self.after_removal(key, removed);
        removed
    }

    fn after_removal(&self, key: &CacheKey, removed: bool) {
        if removed {
            debug!(entity = T::KIND.label(), key = %key, "Invalidated cache entry");
            self.stats.record_invalidation(1);
            self.stats.record_entries(self.len());
        }
    }

    /// Drop expired entries and their registry mappings; returns how many went.
    pub fn purge_expired(&self) -> usize {
        let unregister = |key: &CacheKey| self.registry.unregister(key);
        let mut expired = self.records.purge_expired_with(unregister);
        expired.extend(self.listings.purge_expired_with(unregister));
        self.stats.record_expiration(expired.len() as u64);
        if !expired.is_empty() {
            self.stats.record_entries(self.len());
        }
        expired.len()
    }

    /// Drop every entry of this kind.
    pub fn clear(&self) {
        let unregister = |key: &CacheKey| self.registry.unregister(key);
        self.records.clear_with(unregister);
        self.listings.clear_with(unregister);
        self.stats.record_entries(0);
    }

    pub fn len(&self) -> usize {
        self.records.len() + self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.len())
    }

    fn observe<V>(&self, key: &CacheKey, lookup: &Lookup<V>) {
        let entity = T::KIND.label();
        match lookup {
            Lookup::Hit(_) => {
                self.stats.record_hit();
                debug!(entity, key = %key, outcome = "hit", "Cache lookup");
            }
            Lookup::Miss => {
                self.stats.record_miss();
                debug!(entity, key = %key, outcome = "miss", "Cache lookup");
            }
            Lookup::Expired(state) => {
                self.stats.record_expiration(1);
                self.stats.record_miss();
                debug!(entity, key = %key, outcome = "expired", ?state, "Cache lookup");
            }
        }
    }
}

impl Cacheable for CustomerRecord {
    const KIND: EntityKind = EntityKind::Customer;

    fn cache_id(&self) -> i64 {
        self.id
    }
}

impl Cacheable for CategoryRecord {
    const KIND: EntityKind = EntityKind::Category;

    fn cache_id(&self) -> i64 {
        self.id
    }
}

impl Cacheable for ProductRecord {
    const KIND: EntityKind = EntityKind::Product;

    fn cache_id(&self) -> i64 {
        self.id
    }
}

impl Cacheable for OrderRecord {
    const KIND: EntityKind = EntityKind::Order;

    fn cache_id(&self) -> i64 {
        self.id
    }
}

impl Cacheable for OrderItemRecord {
    const KIND: EntityKind = EntityKind::OrderItem;

    fn cache_id(&self) -> i64 {
        self.id
    }
}

impl Cacheable for InventoryRecord {
    const KIND: EntityKind = EntityKind::Inventory;

    fn cache_id(&self) -> i64 {
        self.id
    }
}
