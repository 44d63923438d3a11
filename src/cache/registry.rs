//! Reverse index from stored data to the cache keys populated from it.
//!
//! A record reached through its id, its email and a collection snapshot ends up
//! with three keys registered against it, so one delete can purge them all.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::{CacheKey, EntityKey};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

/// Tracks entity → cache_keys and cache_key → entities mappings.
pub struct CacheRegistry {
    entity_to_keys: RwLock<HashMap<EntityKey, HashSet<CacheKey>>>,
    key_to_entities: RwLock<HashMap<CacheKey, HashSet<EntityKey>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self {
            entity_to_keys: RwLock::new(HashMap::new()),
            key_to_entities: RwLock::new(HashMap::new()),
        }
    }

    /// Record that `cache_key` was populated from `entities`.
    ///
    /// Re-registering a key replaces its previous dependencies, so an overwritten
    /// listing no longer points at records it has dropped.
    pub fn register(&self, cache_key: CacheKey, entities: HashSet<EntityKey>) {
        let mut e2k = rw_write(&self.entity_to_keys, SOURCE, "register.e2k");
        let mut k2e = rw_write(&self.key_to_entities, SOURCE, "register.k2e");

        if let Some(previous) = k2e.remove(&cache_key) {
            detach(&mut e2k, &cache_key, previous);
        }
        for entity in &entities {
            e2k.entry(*entity).or_default().insert(cache_key.clone());
        }
        k2e.insert(cache_key, entities);
    }

    pub fn keys_for_entity(&self, entity: &EntityKey) -> HashSet<CacheKey> {
        rw_read(&self.entity_to_keys, SOURCE, "keys_for_entity")
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    pub fn entities_for_key(&self, cache_key: &CacheKey) -> HashSet<EntityKey> {
        rw_read(&self.key_to_entities, SOURCE, "entities_for_key")
            .get(cache_key)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget a cache key that has been evicted or expired.
    pub fn unregister(&self, cache_key: &CacheKey) {
        let mut e2k = rw_write(&self.entity_to_keys, SOURCE, "unregister.e2k");
        let mut k2e = rw_write(&self.key_to_entities, SOURCE, "unregister.k2e");

        if let Some(entities) = k2e.remove(cache_key) {
            detach(&mut e2k, cache_key, entities);
        }
    }

    /// Remove every key registered against `entity`, including their other
    /// dependencies, and return the removed keys.
    pub fn unregister_entity(&self, entity: &EntityKey) -> HashSet<CacheKey> {
        let mut e2k = rw_write(&self.entity_to_keys, SOURCE, "unregister_entity.e2k");
        let mut k2e = rw_write(&self.key_to_entities, SOURCE, "unregister_entity.k2e");

        let affected = e2k.remove(entity).unwrap_or_default();
        for cache_key in &affected {
            if let Some(entities) = k2e.remove(cache_key) {
                detach(&mut e2k, cache_key, entities);
            }
        }
        affected
    }

    pub fn clear(&self) {
        rw_write(&self.entity_to_keys, SOURCE, "clear.e2k").clear();
        rw_write(&self.key_to_entities, SOURCE, "clear.k2e").clear();
    }

    pub fn entity_count(&self) -> usize {
        rw_read(&self.entity_to_keys, SOURCE, "entity_count").len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.key_to_entities, SOURCE, "key_count").len()
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn detach(
    e2k: &mut HashMap<EntityKey, HashSet<CacheKey>>,
    cache_key: &CacheKey,
    entities: HashSet<EntityKey>,
) {
    for entity in entities {
        if let Some(keys) = e2k.get_mut(&entity) {
            keys.remove(cache_key);
            if keys.is_empty() {
                e2k.remove(&entity);
            }
        }
    }
}
