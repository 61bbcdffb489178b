use crate::core::types::{LocalCacheConfig, LocalCacheStats};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// In-process cache tier: capacity-bounded, TTL-aware key-value store.
///
/// Fastest lookup path, node-local, lost on process restart. Entries are
/// evicted least-recently-used when the configured entry ceiling is hit,
/// lazily on expired reads, and by a periodic background sweep.
#[derive(Clone)]
pub struct LocalCache {
    inner: Arc<RwLock<LruStore>>,
    stats: Arc<RwLock<LocalCacheStats>>,
    config: LocalCacheConfig,
}

struct LruStore {
    data: HashMap<String, LocalEntry>,

    /// LRU ordering (most recent at back)
    lru_order: VecDeque<String>,
}

struct LocalEntry {
    value: Vec<u8>,
    expires_at: Instant,
    size: usize,
}

impl LocalEntry {
    fn new(value: Vec<u8>, ttl_secs: u64) -> Self {
        let size = value.len();
        Self {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            size,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn remaining_ttl_secs(&self) -> u64 {
        self.expires_at.saturating_duration_since(Instant::now()).as_secs()
    }
}

impl LocalCache {
    pub fn new(config: LocalCacheConfig) -> Self {
        info!(
            "Initializing local cache (max_entries={}, sweep_interval={}s)",
            config.max_entries, config.sweep_interval_secs
        );

        Self {
            inner: Arc::new(RwLock::new(LruStore {
                data: HashMap::new(),
                lru_order: VecDeque::new(),
            })),
            stats: Arc::new(RwLock::new(LocalCacheStats {
                max_entries: config.max_entries,
                ..Default::default()
            })),
            config,
        }
    }

    /// Start the background sweep that removes TTL-expired entries,
    /// bounding memory held by stale data even without read traffic.
    pub fn start_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let interval_secs = self.config.sweep_interval_secs;
        info!("Starting local cache sweeper (interval={}s)", interval_secs);

        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            // First tick fires immediately; skip it
            interval.tick().await;

            loop {
                interval.tick().await;
                let swept = cache.sweep_expired();
                if swept > 0 {
                    debug!("Local cache sweep removed {} expired entries", swept);
                }
            }
        })
    }

    /// Look up a key. Expired entries are removed on the way and count
    /// as misses.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut inner = self.inner.write();
        let mut stats = self.stats.write();

        let is_expired = match inner.data.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                stats.misses += 1;
                debug!("Local cache MISS key={}", key);
                return None;
            }
        };

        if is_expired {
            if let Some(old) = inner.data.remove(key) {
                stats.total_bytes = stats.total_bytes.saturating_sub(old.size);
            }
            inner.lru_order.retain(|k| k != key);
            stats.entries = inner.data.len();
            stats.expired += 1;
            stats.misses += 1;
            debug!("Local cache EXPIRED key={}", key);
            return None;
        }

        let value = inner.data.get(key).map(|entry| entry.value.clone())?;

        // Move to back of LRU (most recent)
        inner.lru_order.retain(|k| k != key);
        inner.lru_order.push_back(key.to_string());

        stats.hits += 1;
        debug!("Local cache HIT key={}", key);
        Some(value)
    }

    /// Store a value. Overwrites any existing entry; when the store is at
    /// capacity and the key is new, the least-recently-used entry is
    /// evicted first.
    pub fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) {
        let mut inner = self.inner.write();
        let mut stats = self.stats.write();

        // Replacing an existing key never evicts a neighbor
        if let Some(old) = inner.data.remove(key) {
            inner.lru_order.retain(|k| k != key);
            stats.total_bytes = stats.total_bytes.saturating_sub(old.size);
        }

        while inner.data.len() >= self.config.max_entries && !inner.lru_order.is_empty() {
            if let Some(evict_key) = inner.lru_order.pop_front() {
                if let Some(evicted) = inner.data.remove(&evict_key) {
                    stats.evictions += 1;
                    stats.total_bytes = stats.total_bytes.saturating_sub(evicted.size);
                    debug!("Local cache EVICT key={}", evict_key);
                }
            }
        }

        let entry = LocalEntry::new(value, ttl_secs);
        stats.total_bytes += entry.size;
        debug!("Local cache SET key={} ({} bytes, ttl={}s)", key, entry.size, ttl_secs);

        inner.data.insert(key.to_string(), entry);
        inner.lru_order.push_back(key.to_string());

        stats.sets += 1;
        stats.entries = inner.data.len();
    }

    /// Remove every key containing the given substring; returns the
    /// number removed.
    pub fn delete_matching(&self, pattern: &str) -> usize {
        let mut inner = self.inner.write();
        let mut stats = self.stats.write();

        let matched: Vec<String> = inner
            .data
            .keys()
            .filter(|k| k.contains(pattern))
            .cloned()
            .collect();

        for key in &matched {
            if let Some(removed) = inner.data.remove(key) {
                stats.total_bytes = stats.total_bytes.saturating_sub(removed.size);
                stats.dels += 1;
            }
        }
        if !matched.is_empty() {
            inner.lru_order.retain(|k| !k.contains(pattern));
            stats.entries = inner.data.len();
            debug!("Local cache invalidated {} keys matching '{}'", matched.len(), pattern);
        }

        matched.len()
    }

    /// Empty the store unconditionally; returns the number of entries
    /// dropped. Used at shutdown and by the administrative clear.
    pub fn flush_all(&self) -> usize {
        let mut inner = self.inner.write();
        let mut stats = self.stats.write();

        let count = inner.data.len();
        inner.data.clear();
        inner.lru_order.clear();

        stats.entries = 0;
        stats.total_bytes = 0;

        info!("Local cache flushed ({} entries)", count);
        count
    }

    /// Remaining TTL for a live key, if present.
    pub fn ttl_secs(&self, key: &str) -> Option<u64> {
        let inner = self.inner.read();
        inner
            .data
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(LocalEntry::remaining_ttl_secs)
    }

    /// Remove all expired entries; returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let mut inner = self.inner.write();
        let mut stats = self.stats.write();

        let expired: Vec<String> = inner
            .data
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired {
            if let Some(removed) = inner.data.remove(key) {
                stats.total_bytes = stats.total_bytes.saturating_sub(removed.size);
                stats.expired += 1;
            }
        }
        if !expired.is_empty() {
            let gone: std::collections::HashSet<&String> = expired.iter().collect();
            inner.lru_order.retain(|k| !gone.contains(k));
            stats.entries = inner.data.len();
        }

        expired.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> LocalCacheStats {
        self.stats.read().clone()
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new(LocalCacheConfig::default())
    }
}
