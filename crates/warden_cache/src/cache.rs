//! Expiring key-value cache implementation.

use derive_getters::Getters;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with value and expiration.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Check if this entry is expired as of `now`.
    ///
    /// An entry stays valid for exactly `ttl`; it expires once strictly more
    /// than `ttl` has elapsed since it was stored.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }

    /// Check if this entry is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.stored_at.elapsed())
    }
}

/// Configuration for a TTL cache.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct TtlCacheConfig {
    /// TTL applied by `set` (seconds)
    #[serde(default = "default_ttl_secs")]
    default_ttl_secs: u64,

    /// How often the background sweep purges expired entries (seconds)
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl TtlCacheConfig {
    /// Default TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Point-in-time view of a cache's contents.
///
/// Counts every stored entry, including expired entries that have not yet
/// been read or swept.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct CacheStats<K> {
    count: usize,
    keys: Vec<K>,
}

pub(crate) struct CacheInner<K, V> {
    pub(crate) name: &'static str,
    pub(crate) config: TtlCacheConfig,
    pub(crate) entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> CacheInner<K, V>
where
    K: Eq + Hash,
{
    pub(crate) fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}

/// Expiring key-value cache.
///
/// Entries expire after their TTL. Expiry is detected lazily on `get` and
/// eagerly by a periodic sweep (see [`TtlCache::spawn_sweeper`]). There is no
/// size bound; TTL is the only eviction trigger.
///
/// Every operation takes one short-lived lock on the entry map, so callers
/// never observe a partially written entry. Clones share the same map.
///
/// # Example
///
/// ```
/// use warden_cache::{TtlCache, TtlCacheConfig};
/// use std::time::Duration;
///
/// let cache: TtlCache<i64, String> = TtlCache::new("quarantine", TtlCacheConfig::default());
///
/// cache.set(42, "home-group".to_string());
/// assert_eq!(cache.get(&42), Some("home-group".to_string()));
///
/// cache.set_with_ttl(7, "short".to_string(), Duration::from_secs(1));
/// cache.delete(&7);
/// assert_eq!(cache.get(&7), None);
/// ```
pub struct TtlCache<K, V> {
    pub(crate) inner: Arc<CacheInner<K, V>>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Create a new cache. `name` labels the cache in log events.
    pub fn new(name: &'static str, config: TtlCacheConfig) -> Self {
        tracing::debug!(
            cache = name,
            default_ttl_secs = config.default_ttl_secs,
            sweep_interval_secs = config.sweep_interval_secs,
            "Creating new TtlCache"
        );
        Self {
            inner: Arc::new(CacheInner {
                name,
                config,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Cache configuration.
    pub fn config(&self) -> &TtlCacheConfig {
        &self.inner.config
    }

    /// Insert a value with the configured default TTL.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.inner.config.default_ttl());
    }

    /// Insert a value with an explicit TTL, replacing any previous entry.
    #[tracing::instrument(skip(self, value), fields(cache = self.inner.name))]
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        let replaced = self.inner.entries.lock().insert(key, entry).is_some();
        tracing::debug!(replaced, "Inserted entry into cache");
    }

    /// Look up a value.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let mut entries = self.inner.entries.lock();
        let entry = entries.get(key)?;
        if entry.is_expired() {
            entries.remove(key);
            tracing::debug!(cache = self.inner.name, ?key, "Cache entry expired, removing");
            return None;
        }
        tracing::trace!(cache = self.inner.name, ?key, "Cache hit");
        Some(entry.value.clone())
    }

    /// Remove a key. Returns whether an entry was present.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let removed = self.inner.entries.lock().remove(key).is_some();
        if removed {
            tracing::debug!(cache = self.inner.name, ?key, "Invalidated cache entry");
        }
        removed
    }

    /// Clear all cache entries.
    pub fn clear(&self) {
        let mut entries = self.inner.entries.lock();
        let count = entries.len();
        entries.clear();
        tracing::info!(cache = self.inner.name, cleared = count, "Cleared cache");
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let removed = self.inner.purge_expired();
        if removed > 0 {
            tracing::info!(
                cache = self.inner.name,
                removed,
                remaining = self.len(),
                "Purged expired cache entries"
            );
        }
        removed
    }

    /// Snapshot of the stored keys.
    pub fn stats(&self) -> CacheStats<K> {
        let entries = self.inner.entries.lock();
        CacheStats {
            count: entries.len(),
            keys: entries.keys().cloned().collect(),
        }
    }

    /// Get number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> TtlCache<&'static str, u32> {
        TtlCache::new("test", TtlCacheConfig::default().with_default_ttl_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_lives_for_its_ttl() {
        let cache = cache();
        cache.set("a", 1);

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("a"), Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty(), "expired entry should be evicted on read");
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_ttl_overrides_default() {
        let cache = cache();
        cache.set_with_ttl("short", 1, Duration::from_secs(1));
        cache.set("long", 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_resets_stored_at() {
        let cache = cache();
        cache.set("a", 1);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("a", 2);
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = cache();
        cache.set("a", 1);
        cache.set("b", 2);

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_counts_unswept_entries() {
        let cache = cache();
        cache.set("a", 1);
        cache.set_with_ttl("b", 2, Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(5)).await;

        let stats = cache.stats();
        assert_eq!(*stats.count(), 2);

        assert_eq!(cache.purge_expired(), 1);
        let stats = cache.stats();
        assert_eq!(*stats.count(), 1);
        assert_eq!(stats.keys(), &vec!["a"]);
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = TtlCacheConfigBuilder::default()
            .default_ttl_secs(30)
            .build()
            .unwrap();
        assert_eq!(config.default_ttl(), Duration::from_secs(30));
        assert_eq!(*config.sweep_interval_secs(), 60);
    }
}
