// =============================================================================
// Freshness Cache — TTL cache around external fetches
// =============================================================================
//
// `get_or_fetch` hands back a cached value while it is younger than the TTL
// and otherwise awaits the supplied fetch.  Only successful fetches are
// stored, so a failing source is retried on the next call.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Keyed cache with per-lookup freshness.
pub struct FreshnessCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> FreshnessCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached value for `key` if it is younger than `ttl`.
    pub fn get_fresh(&self, key: &str, ttl: Duration) -> Option<V> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        (entry.stored_at.elapsed() < ttl).then(|| entry.value.clone())
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.write().insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return a fresh cached value or run `fetch` and cache its success.
    ///
    /// No lock is held across the await.
    pub async fn get_or_fetch<E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get_fresh(key, ttl) {
            debug!(key, "cache hit");
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

}

impl<V: Clone> Default for FreshnessCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn fresh_value_skips_fetch() {
        let cache: FreshnessCache<u32> = FreshnessCache::new();
        let calls = AtomicU32::new(0);
        for _ in 0..3 {
            let v: Result<u32, ()> = cache
                .get_or_fetch("k", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(v, Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_value_is_refetched() {
        let cache: FreshnessCache<u32> = FreshnessCache::new();
        cache.insert("k", 1);
        let v: Result<u32, ()> = cache
            .get_or_fetch("k", Duration::ZERO, || async { Ok(2) })
            .await;
        assert_eq!(v, Ok(2));
        assert_eq!(cache.get_fresh("k", Duration::from_secs(60)), Some(2));
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: FreshnessCache<u32> = FreshnessCache::new();
        let v: Result<u32, &str> = cache
            .get_or_fetch("k", Duration::from_secs(60), || async { Err("down") })
            .await;
        assert_eq!(v, Err("down"));
        assert!(cache.get_fresh("k", Duration::from_secs(60)).is_none());
    }
}
