//! Storefront entity cache.
//!
//! A read-through, write-invalidate cache sitting between the services and the
//! backing store. Each entity type gets an [`EntityCache`] keyed by id, by a
//! secondary lookup attribute, by its collection tag or by a parent listing:
//!
//! ```text
//! customer:1
//! customer:email:email@gmail.com
//! products
//! order:7:items
//! ```
//!
//! Entries carry a sliding and an absolute expiration. A [`CacheRegistry`] maps
//! stored records back to the keys populated from them so that a delete purges
//! every alias at once.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! consistency = "bounded_staleness"
//! sliding_minutes = 10
//! absolute_minutes = 20
//!
//! [cache.policies.order]
//! sliding_minutes = 5
//! absolute_minutes = 15
//! ```

mod clock;
mod config;
mod entity;
mod entry;
mod keys;
pub(crate) mod lock;
mod registry;
mod stats;
mod store;
mod table;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, ExpirationPolicy, WriteConsistency};
pub use entity::{Cacheable, EntityCache};
pub use entry::{CacheEntry, EntryState};
pub use keys::{CacheKey, Discriminator, EntityKey, EntityKind, LookupAttribute};
pub use registry::CacheRegistry;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::CacheStore;
pub use table::{EntryTable, Lookup};

pub(crate) use config::{
    CATALOG_ABSOLUTE_MINUTES, DEFAULT_ABSOLUTE_MINUTES, DEFAULT_SLIDING_MINUTES,
    DEFAULT_SWEEP_INTERVAL_SECS,
};
pub(crate) use stats::{
    METRIC_CACHE_ENTRIES, METRIC_CACHE_EXPIRED_TOTAL, METRIC_CACHE_HIT_TOTAL,
    METRIC_CACHE_INVALIDATED_TOTAL, METRIC_CACHE_LOAD_MS, METRIC_CACHE_MISS_TOTAL,
};
