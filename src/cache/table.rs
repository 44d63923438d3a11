//! Time-bounded key/value table shared between tasks.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::clock::Clock;
use super::config::ExpirationPolicy;
use super::entry::{CacheEntry, EntryState};
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::table";

/// Result of probing the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    Hit(V),
    Miss,
    /// An entry existed but had outlived its policy; it has been removed.
    Expired(EntryState),
}

impl<V> Lookup<V> {
    pub fn into_option(self) -> Option<V> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Expired(_) => None,
        }
    }
}

/// Entries keyed by [`CacheKey`], each carrying its own expiration policy.
///
/// Unbounded in size; entries leave only through invalidation or expiry. Every
/// operation holds the lock for memory access only. The `*_with` variants run a
/// callback before the lock is released; callers that touch another lock from it
/// must always take the table lock first.
pub struct EntryTable<V> {
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> EntryTable<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Return the value under `key` if it is still valid, restarting its sliding
    /// window. An expired entry is removed on the spot.
    pub fn lookup(&self, key: &CacheKey) -> Lookup<V> {
        self.lookup_with(key, |_| {})
    }

    /// [`EntryTable::lookup`], running `on_expired` before the table lock is
    /// released when an expired entry is dropped.
    pub fn lookup_with(&self, key: &CacheKey, on_expired: impl FnOnce(&CacheKey)) -> Lookup<V> {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, SOURCE, "lookup");

        let Some(entry) = entries.get_mut(key) else {
            return Lookup::Miss;
        };

        match entry.state_at(now) {
            EntryState::Fresh => {
                entry.touch(now);
                Lookup::Hit(entry.value().clone())
            }
            stale => {
                entries.remove(key);
                on_expired(key);
                Lookup::Expired(stale)
            }
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.lookup(key).into_option()
    }

    /// Insert or overwrite. The latest put wins.
    pub fn put(&self, key: CacheKey, value: V, policy: ExpirationPolicy) {
        self.put_with(key, value, policy, |_| {});
    }

    /// [`EntryTable::put`], running `on_insert` under the table lock.
    pub fn put_with(
        &self,
        key: CacheKey,
        value: V,
        policy: ExpirationPolicy,
        on_insert: impl FnOnce(&CacheKey),
    ) {
        let entry = CacheEntry::new(value, policy, self.clock.now());
        let mut entries = rw_write(&self.entries, SOURCE, "put");
        on_insert(&key);
        entries.insert(key, entry);
    }

    /// Remove `key` whatever its state. Returns whether an entry was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.invalidate_with(key, |_| {})
    }

    /// [`EntryTable::invalidate`], running `on_remove` under the table lock
    /// whether or not an entry was present.
    pub fn invalidate_with(&self, key: &CacheKey, on_remove: impl FnOnce(&CacheKey)) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate");
        on_remove(key);
        entries.remove(key).is_some()
    }

    /// Drop every entry that is no longer valid and return their keys.
    pub fn purge_expired(&self) -> Vec<CacheKey> {
        self.purge_expired_with(|_| {})
    }

    /// [`EntryTable::purge_expired`], running `on_expired` for each dropped key
    /// before the table lock is released.
    pub fn purge_expired_with(&self, mut on_expired: impl FnMut(&CacheKey)) -> Vec<CacheKey> {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, SOURCE, "purge_expired");
        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_valid_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.remove(key);
            on_expired(key);
        }
        expired
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        rw_read(&self.entries, SOURCE, "contains").contains_key(key)
    }

    /// Drop every entry and return the keys that were held.
    pub fn clear(&self) -> Vec<CacheKey> {
        self.clear_with(|_| {})
    }

    pub fn clear_with(&self, mut on_remove: impl FnMut(&CacheKey)) -> Vec<CacheKey> {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        entries
            .drain()
            .map(|(key, _)| {
                on_remove(&key);
                key
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
