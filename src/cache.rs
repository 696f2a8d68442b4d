//! Single-slot, time-boxed catalog cache.

use crate::normalize::NormalizedProduct;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// One published catalog snapshot. Never mutated after `set`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub products: Arc<[NormalizedProduct]>,
    pub fetched_at: Instant,
    pub fetched_at_utc: DateTime<Utc>,
    pub source_label: String,
    pub last_error_detail: Option<String>,
}

impl CacheEntry {
    pub fn new(
        products: Vec<NormalizedProduct>,
        source_label: impl Into<String>,
        last_error_detail: Option<String>,
    ) -> Self {
        Self {
            products: products.into(),
            fetched_at: Instant::now(),
            fetched_at_utc: Utc::now(),
            source_label: source_label.into(),
            last_error_detail,
        }
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

/// Storage for the current snapshot. Implementations only swap pointers; the
/// fetch pipeline runs outside of them.
pub trait CatalogCache: Send + Sync {
    fn get(&self) -> Option<Arc<CacheEntry>>;
    fn set(&self, entry: CacheEntry) -> Arc<CacheEntry>;
    /// True when there is no entry or the entry has outlived its TTL.
    fn is_expired(&self) -> bool;
    fn invalidate(&self);
}

#[derive(Debug)]
pub struct InMemoryCache {
    slot: RwLock<Option<Arc<CacheEntry>>>,
    ttl: Duration,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl InMemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }
}

impl CatalogCache for InMemoryCache {
    fn get(&self) -> Option<Arc<CacheEntry>> {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone()
    }

    fn set(&self, entry: CacheEntry) -> Arc<CacheEntry> {
        let entry = Arc::new(entry);
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(Arc::clone(&entry));
        entry
    }

    fn is_expired(&self) -> bool {
        self.get().map_or(true, |entry| entry.is_stale(self.ttl))
    }

    fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str) -> CacheEntry {
        CacheEntry::new(Vec::new(), label, None)
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryCache::new(Duration::from_secs(300));
        assert!(cache.is_expired());

        cache.set(entry("a"));
        assert!(!cache.is_expired());

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(!cache.is_expired());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.is_expired());
        // expiry is lazy: the stale entry is still readable
        assert_eq!(cache.get().unwrap().source_label, "a");
    }

    #[test]
    fn set_replaces_and_invalidate_clears() {
        let cache = InMemoryCache::default();
        let first = cache.set(entry("a"));
        let second = cache.set(entry("b"));
        assert_eq!(first.source_label, "a");
        assert!(Arc::ptr_eq(&second, &cache.get().unwrap()));

        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
