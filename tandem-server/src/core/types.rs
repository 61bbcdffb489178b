use serde::{Deserialize, Serialize};

/// Configuration for the in-process cache tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalCacheConfig {
    /// Maximum number of entries held at once
    pub max_entries: usize,
    /// Interval between background sweeps for expired entries
    pub sweep_interval_secs: u64,
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 5000,
            sweep_interval_secs: 60,
        }
    }
}

/// TTL policy applied by the facade across the two tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Ceiling applied to local-tier TTLs on write; the distributed tier
    /// keeps the caller's full TTL
    pub local_write_ceiling_secs: u64,
    /// Short TTL used when backfilling the local tier after a
    /// distributed hit, independent of the entry's original TTL
    pub backfill_ttl_secs: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            local_write_ceiling_secs: 300,
            backfill_ttl_secs: 60,
        }
    }
}

/// Statistics for the local cache tier
#[derive(Debug, Default, Clone, Serialize)]
pub struct LocalCacheStats {
    /// Current number of live entries
    pub entries: usize,
    /// Configured entry ceiling
    pub max_entries: usize,
    /// Estimated memory held by cached values in bytes
    pub total_bytes: usize,
    /// Number of GET operations that found a live entry
    pub hits: u64,
    /// Number of GET operations that found nothing
    pub misses: u64,
    /// Number of SET operations
    pub sets: u64,
    /// Number of entries removed by explicit delete/invalidation
    pub dels: u64,
    /// Number of entries evicted by capacity pressure
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expired: u64,
}

impl LocalCacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Combined snapshot of both cache tiers, served by the operator surface
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub local: LocalCacheStats,
    pub hit_rate: f64,
    /// Whether a distributed tier is configured at all
    pub distributed_enabled: bool,
    /// Whether the distributed tier is currently reachable
    pub distributed_connected: bool,
}
