//! The shared cache in front of every service.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::entities::{
    CategoryRecord, CustomerRecord, InventoryRecord, OrderItemRecord, OrderRecord, ProductRecord,
};

use super::clock::{Clock, SystemClock};
use super::config::{CacheConfig, ExpirationPolicy, WriteConsistency};
use super::entity::{Cacheable, EntityCache};
use super::keys::{CacheKey, EntityKey, EntityKind};
use super::registry::CacheRegistry;
use super::stats::CacheStatsSnapshot;

/// One [`EntityCache`] per entity type plus the registry they share.
///
/// Built once at startup and handed to services as `Arc<CacheStore>`.
pub struct CacheStore {
    pub customers: EntityCache<CustomerRecord>,
    pub categories: EntityCache<CategoryRecord>,
    pub products: EntityCache<ProductRecord>,
    pub orders: EntityCache<OrderRecord>,
    pub order_items: EntityCache<OrderItemRecord>,
    pub inventory: EntityCache<InventoryRecord>,
    registry: Arc<CacheRegistry>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(CacheRegistry::new());

        Self {
            customers: entity_cache(&config, &clock, &registry),
            categories: entity_cache(&config, &clock, &registry),
            products: entity_cache(&config, &clock, &registry),
            orders: entity_cache(&config, &clock, &registry),
            order_items: entity_cache(&config, &clock, &registry),
            inventory: entity_cache(&config, &clock, &registry),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn consistency(&self) -> WriteConsistency {
        self.config.consistency
    }

    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    /// Remove one key, whichever entity type it belongs to.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        match key.kind() {
            EntityKind::Customer => self.customers.invalidate(key),
            EntityKind::Category => self.categories.invalidate(key),
            EntityKind::Product => self.products.invalidate(key),
            EntityKind::Order => self.orders.invalidate(key),
            EntityKind::OrderItem => self.order_items.invalidate(key),
            EntityKind::Inventory => self.inventory.invalidate(key),
        }
    }

    /// Remove the full-collection snapshot of `kind`.
    pub fn invalidate_collection(&self, kind: EntityKind) -> bool {
        self.invalidate(&CacheKey::collection(kind))
    }

    /// Purge every cache key populated from `entity`. Returns how many keys were
    /// removed from the tables.
    pub fn invalidate_entity(&self, entity: EntityKey) -> usize {
        let keys = self.registry.unregister_entity(&entity);
        let removed = keys.iter().filter(|key| self.evict(key)).count();
        debug!(?entity, removed, "Invalidated keys for entity");
        removed
    }

    /// A record of `kind` was inserted into the backing store.
    pub fn record_created(&self, kind: EntityKind) {
        if self.config.consistency == WriteConsistency::InvalidateOnWrite {
            self.invalidate_entity(EntityKey::Collection(kind));
        }
    }

    /// A record was updated in the backing store.
    ///
    /// Under bounded staleness cached copies stay until they expire.
    pub fn record_updated(&self, kind: EntityKind, id: i64) {
        if self.config.consistency == WriteConsistency::InvalidateOnWrite {
            self.invalidate_entity(EntityKey::Record(kind, id));
            self.invalidate_entity(EntityKey::Collection(kind));
        }
    }

    /// A record was deleted from the backing store. Every alias of it goes, and
    /// every listing that contained it.
    pub fn record_deleted(&self, kind: EntityKind, id: i64) {
        self.invalidate_entity(EntityKey::Record(kind, id));
        if self.config.consistency == WriteConsistency::InvalidateOnWrite {
            self.invalidate_entity(EntityKey::Collection(kind));
        }
    }

    /// Drop expired entries in every entity cache.
    pub fn purge_expired(&self) -> usize {
        self.customers.purge_expired()
            + self.categories.purge_expired()
            + self.products.purge_expired()
            + self.orders.purge_expired()
            + self.order_items.purge_expired()
            + self.inventory.purge_expired()
    }

    pub fn clear(&self) {
        self.customers.clear();
        self.categories.clear();
        self.products.clear();
        self.orders.clear();
        self.order_items.clear();
        self.inventory.clear();
        self.registry.clear();
    }

    pub fn len(&self) -> usize {
        EntityKind::ALL
            .into_iter()
            .map(|kind| self.snapshot(kind).entries)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters for every entity type, in [`EntityKind::ALL`] order.
    pub fn stats(&self) -> Vec<CacheStatsSnapshot> {
        EntityKind::ALL
            .into_iter()
            .map(|kind| self.snapshot(kind))
            .collect()
    }

    pub fn policies(&self) -> Vec<(EntityKind, ExpirationPolicy)> {
        EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, self.config.policy(kind)))
            .collect()
    }

    /// Start the periodic expiry sweep when one is configured.
    ///
    /// The task holds only a weak reference and ends once the store is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let period = self.config.sweep_interval.filter(|period| !period.is_zero())?;
        if !self.config.enabled {
            return None;
        }
        let store = Arc::downgrade(self);
        info!(
            period_secs = period.as_secs(),
            "Starting cache expiry sweeper"
        );
        Some(tokio::spawn(sweep(store, period)))
    }

    fn snapshot(&self, kind: EntityKind) -> CacheStatsSnapshot {
        match kind {
            EntityKind::Customer => self.customers.snapshot(),
            EntityKind::Category => self.categories.snapshot(),
            EntityKind::Product => self.products.snapshot(),
            EntityKind::Order => self.orders.snapshot(),
            EntityKind::OrderItem => self.order_items.snapshot(),
            EntityKind::Inventory => self.inventory.snapshot(),
        }
    }

    fn evict(&self, key: &CacheKey) -> bool {
        match key.kind() {
            EntityKind::Customer => self.customers.evict(key),
            EntityKind::Category => self.categories.evict(key),
            EntityKind::Product => self.products.evict(key),
            EntityKind::Order => self.orders.evict(key),
            EntityKind::OrderItem => self.order_items.evict(key),
            EntityKind::Inventory => self.inventory.evict(key),
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn entity_cache<T: Cacheable>(
    config: &CacheConfig,
    clock: &Arc<dyn Clock>,
    registry: &Arc<CacheRegistry>,
) -> EntityCache<T> {
    EntityCache::new(
        config.policy(T::KIND),
        config.enabled,
        Arc::clone(clock),
        Arc::clone(registry),
    )
}

async fn sweep(store: Weak<CacheStore>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(store) = store.upgrade() else {
            debug!("Cache store dropped, stopping sweeper");
            return;
        };
        let purged = store.purge_expired();
        if purged > 0 {
            debug!(purged, "Swept expired cache entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::keys::LookupAttribute;

    fn customer(id: i64) -> CustomerRecord {
        let now = OffsetDateTime::now_utc();
        CustomerRecord {
            id,
            name: "Name".into(),
            email: "email@gmail.com".into(),
            phone: "843806784".into(),
            address: "1b22".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn order(id: i64, customer_id: i64) -> OrderRecord {
        OrderRecord {
            id,
            customer_id,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn populate(store: &CacheStore) {
        let c = customer(1);
        store
            .customers
            .put(CacheKey::id(EntityKind::Customer, 1), c.clone());
        store.customers.put(
            CacheKey::attribute(EntityKind::Customer, LookupAttribute::Email, &c.email),
            c.clone(),
        );
        store
            .customers
            .put_list(CacheKey::collection(EntityKind::Customer), vec![c]);
        store.orders.put_list(
            CacheKey::children(EntityKind::Order, EntityKind::Customer, 1),
            vec![order(10, 1)],
        );
    }

    #[test]
    fn delete_purges_aliases_listings_and_children() {
        let store = CacheStore::default();
        populate(&store);
        assert_eq!(store.len(), 4);

        store.record_deleted(EntityKind::Customer, 1);

        assert!(store.is_empty());
        assert_eq!(store.registry().key_count(), 0);
    }

    #[test]
    fn bounded_staleness_keeps_entries_on_update_and_create() {
        let store = CacheStore::default();
        populate(&store);

        store.record_updated(EntityKind::Customer, 1);
        store.record_created(EntityKind::Customer);

        assert_eq!(store.len(), 4);
    }

    #[test]
    fn invalidate_on_write_purges_on_update() {
        let config = CacheConfig::default().with_consistency(WriteConsistency::InvalidateOnWrite);
        let store = CacheStore::new(config);
        populate(&store);

        store.record_updated(EntityKind::Customer, 1);

        assert_eq!(store.customers.len(), 0);
        // The customer's order listing depends on the customer record.
        assert_eq!(store.orders.len(), 0);
    }

    #[test]
    fn invalidate_on_write_purges_collection_on_create() {
        let config = CacheConfig::default().with_consistency(WriteConsistency::InvalidateOnWrite);
        let store = CacheStore::new(config);
        populate(&store);

        store.record_created(EntityKind::Order);

        assert_eq!(store.orders.len(), 0);
        assert_eq!(store.customers.len(), 3);
    }

    #[test]
    fn invalidate_dispatches_by_key_kind() {
        let store = CacheStore::default();
        populate(&store);

        assert!(store.invalidate(&CacheKey::children(
            EntityKind::Order,
            EntityKind::Customer,
            1
        )));
        assert!(store.invalidate_collection(EntityKind::Customer));
        assert!(!store.invalidate_collection(EntityKind::Product));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn purge_and_stats_cover_every_kind() {
        let clock = Arc::new(ManualClock::new());
        let store = CacheStore::with_clock(CacheConfig::default(), clock.clone());
        populate(&store);

        clock.advance(Duration::from_secs(10 * 60));
        assert_eq!(store.purge_expired(), 4);

        let stats = store.stats();
        assert_eq!(stats.len(), EntityKind::ALL.len());
        assert_eq!(stats[0].entity, EntityKind::Customer);
        assert_eq!(stats[0].expirations, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_in_background_and_stops_with_store() {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig::default().with_sweep_interval(Some(Duration::from_secs(60)));
        let store = Arc::new(CacheStore::with_clock(config, clock.clone()));
        populate(&store);

        let handle = store.spawn_sweeper().expect("sweeper should start");
        clock.advance(Duration::from_secs(11 * 60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.is_empty());

        drop(store);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(handle.is_finished());
    }

    #[test]
    fn no_sweeper_without_interval() {
        let config = CacheConfig::default().with_sweep_interval(None);
        let store = Arc::new(CacheStore::new(config));
        assert!(store.spawn_sweeper().is_none());
    }
}
