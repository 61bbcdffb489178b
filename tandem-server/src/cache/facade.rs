use super::distributed::DistributedCache;
use super::local::LocalCache;
use crate::core::types::{CachePolicy, CacheSnapshot};
use crate::metrics;
use tracing::debug;

/// Unified entry point over the local and distributed tiers, used by the
/// response-cache middleware and by handlers caching computed data.
///
/// The two tiers are independent: a write may land in one and not the
/// other, and nothing is rolled back. The one cross-tier guarantee is
/// that `invalidate` is always applied to both, because stale reads are
/// the failure mode being prevented.
#[derive(Clone)]
pub struct CacheFacade {
    local: LocalCache,
    distributed: DistributedCache,
    policy: CachePolicy,
}

impl CacheFacade {
    pub fn new(local: LocalCache, distributed: DistributedCache, policy: CachePolicy) -> Self {
        Self {
            local,
            distributed,
            policy,
        }
    }

    /// Look up a key: local tier first, then (when `use_distributed`)
    /// the shared tier. A distributed hit backfills the local tier with
    /// the short fixed backfill TTL, independent of the entry's original
    /// expiry.
    pub async fn read(&self, key: &str, use_distributed: bool) -> Option<Vec<u8>> {
        if let Some(value) = self.local.get(key) {
            metrics::record_cache_op("local", "get", "hit");
            return Some(value);
        }
        metrics::record_cache_op("local", "get", "miss");

        if !use_distributed {
            return None;
        }

        match self.distributed.get(key).await {
            Some(value) => {
                metrics::record_cache_op("distributed", "get", "hit");
                self.local
                    .set(key, value.clone(), self.policy.backfill_ttl_secs);
                debug!("Backfilled local cache key={} ttl={}s", key, self.policy.backfill_ttl_secs);
                Some(value)
            }
            None => {
                metrics::record_cache_op("distributed", "get", "miss");
                None
            }
        }
    }

    /// Store a value in both tiers. The local copy is capped at the
    /// configured ceiling so no single entry dominates local memory; the
    /// distributed copy keeps the caller's full TTL. Partial success
    /// stands.
    pub async fn write(&self, key: &str, value: Vec<u8>, ttl_secs: u64, use_distributed: bool) {
        let local_ttl = ttl_secs.min(self.policy.local_write_ceiling_secs);

        if use_distributed {
            let stored = self.distributed.set(key, &value, ttl_secs).await;
            metrics::record_cache_op("distributed", "set", if stored { "ok" } else { "skipped" });
        }

        self.local.set(key, value, local_ttl);
        metrics::record_cache_op("local", "set", "ok");
    }

    /// Remove every key containing `pattern` from **both** tiers,
    /// returning the combined count.
    ///
    /// Matching is plain substring containment; call sites rely on the
    /// broad match (invalidating `products` also sweeps derived keys
    /// such as `app:popular_products`).
    pub async fn invalidate(&self, pattern: &str) -> u64 {
        let local_removed = self.local.delete_matching(pattern);
        let distributed_removed = self.distributed.delete_matching(pattern).await;

        metrics::record_invalidated("local", local_removed as u64);
        metrics::record_invalidated("distributed", distributed_removed as u64);

        debug!(
            "Invalidated '{}': {} local, {} distributed",
            pattern, local_removed, distributed_removed
        );
        (local_removed + distributed_removed) as u64
    }

    /// Empty both tiers unconditionally. Administrative only.
    pub async fn flush_all(&self) -> u64 {
        let local_flushed = self.local.flush_all() as u64;
        self.distributed.flush_all().await;
        local_flushed
    }

    /// Snapshot of both tiers. Pure read, no side effects.
    pub fn stats(&self) -> CacheSnapshot {
        let local = self.local.stats();
        let hit_rate = local.hit_rate();
        CacheSnapshot {
            local,
            hit_rate,
            distributed_enabled: self.distributed.is_enabled(),
            distributed_connected: self.distributed.is_connected(),
        }
    }

    /// The local tier, for lifecycle work (sweeper startup, shutdown
    /// flush) and tests.
    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    /// The distributed tier, for lifecycle work (`connect`) and health
    /// reporting.
    pub fn distributed(&self) -> &DistributedCache {
        &self.distributed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::distributed::DistributedCacheConfig;
    use crate::core::types::LocalCacheConfig;

    fn local_only_facade() -> CacheFacade {
        CacheFacade::new(
            LocalCache::new(LocalCacheConfig::default()),
            DistributedCache::new(DistributedCacheConfig::default()),
            CachePolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let facade = local_only_facade();

        facade.write("key1", b"value1".to_vec(), 60, true).await;

        let value = facade.read("key1", true).await;
        assert_eq!(value, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_repeated_reads_identical() {
        let facade = local_only_facade();

        facade.write("key1", b"payload".to_vec(), 60, true).await;

        let first = facade.read("key1", true).await.unwrap();
        let second = facade.read("key1", true).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_local_ttl_ceiling() {
        let facade = local_only_facade();

        // Full TTL far above the 300s local ceiling
        facade.write("key1", b"value".to_vec(), 86_400, true).await;

        let remaining = facade.local().ttl_secs("key1").unwrap();
        assert!(remaining <= 300, "local TTL {} exceeds ceiling", remaining);
    }

    #[tokio::test]
    async fn test_short_ttl_not_raised_to_ceiling() {
        let facade = local_only_facade();

        facade.write("key1", b"value".to_vec(), 30, true).await;

        let remaining = facade.local().ttl_secs("key1").unwrap();
        assert!(remaining <= 30);
    }

    #[tokio::test]
    async fn test_invalidate_matching_keys_only() {
        let facade = local_only_facade();

        facade.write("products:a", b"1".to_vec(), 60, false).await;
        facade.write("products:b", b"2".to_vec(), 60, false).await;
        facade.write("other:c", b"3".to_vec(), 60, false).await;

        let removed = facade.invalidate("products").await;
        assert_eq!(removed, 2);

        assert!(facade.read("products:a", false).await.is_none());
        assert!(facade.read("products:b", false).await.is_none());
        assert_eq!(facade.read("other:c", false).await, Some(b"3".to_vec()));
    }

    #[tokio::test]
    async fn test_degrades_without_distributed_tier() {
        // No Redis configured: every operation completes, local tier
        // behaves normally, stats report the tier disconnected
        let facade = local_only_facade();

        facade.write("key1", b"value".to_vec(), 60, true).await;
        assert_eq!(facade.read("key1", true).await, Some(b"value".to_vec()));
        assert_eq!(facade.invalidate("key1").await, 1);
        assert!(facade.read("key1", true).await.is_none());

        let snapshot = facade.stats();
        assert!(!snapshot.distributed_enabled);
        assert!(!snapshot.distributed_connected);
    }

    #[tokio::test]
    async fn test_flush_all() {
        let facade = local_only_facade();

        facade.write("a", b"1".to_vec(), 60, false).await;
        facade.write("b", b"2".to_vec(), 60, false).await;

        facade.flush_all().await;

        assert!(facade.read("a", false).await.is_none());
        assert!(facade.read("b", false).await.is_none());
        assert_eq!(facade.stats().local.entries, 0);
    }

    #[tokio::test]
    async fn test_stats_counts_hits_and_misses() {
        let facade = local_only_facade();

        facade.write("key1", b"v".to_vec(), 60, false).await;
        facade.read("key1", false).await;
        facade.read("absent", false).await;

        let snapshot = facade.stats();
        assert_eq!(snapshot.local.hits, 1);
        assert_eq!(snapshot.local.misses, 1);
        assert_eq!(snapshot.hit_rate, 0.5);
    }
}
