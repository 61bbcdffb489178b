use parking_lot::RwLock;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

/// Keys scanned per SCAN round during pattern invalidation
const SCAN_COUNT: usize = 200;

/// Keys deleted per DEL command
const DEL_CHUNK: usize = 500;

/// Configuration for the shared Redis tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedCacheConfig {
    /// Connection URL; `None` disables the tier entirely (local-only
    /// deployment)
    pub url: Option<String>,
    /// Startup connection timeout
    pub connect_timeout_secs: u64,
    /// Per-command response timeout
    pub response_timeout_ms: u64,
    /// Consecutive retries before a command is given up and the tier is
    /// reported unavailable
    pub max_retries: usize,
    /// Ceiling on the reconnect backoff delay
    pub max_backoff_ms: u64,
}

impl Default for DistributedCacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout_secs: 15,
            response_timeout_ms: 2000,
            max_retries: 6,
            max_backoff_ms: 5000,
        }
    }
}

/// Shared cache tier backed by Redis, visible to every server instance.
///
/// Every operation is defensive: network errors, timeouts, and an
/// unconfigured or unreachable server all degrade to "miss" / "write
/// skipped". Nothing here ever propagates an error to the request path.
#[derive(Clone)]
pub struct DistributedCache {
    config: DistributedCacheConfig,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
    connected: Arc<AtomicBool>,
}

impl DistributedCache {
    pub fn new(config: DistributedCacheConfig) -> Self {
        Self {
            config,
            manager: Arc::new(RwLock::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Establish the connection. Must be awaited once at startup; may be
    /// invoked again later to resume after the retry allowance runs
    /// out. Connection failure leaves the tier unavailable and never
    /// crashes the process.
    pub async fn connect(&self) {
        let Some(url) = self.config.url.clone() else {
            info!("Distributed cache not configured; caching is local-only");
            return;
        };

        let client = match redis::Client::open(url.as_str()) {
            Ok(client) => client,
            Err(e) => {
                error!("Invalid distributed cache URL: {}", e);
                return;
            }
        };

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .set_response_timeout(Duration::from_millis(self.config.response_timeout_ms))
            .set_number_of_retries(self.config.max_retries)
            .set_max_delay(self.config.max_backoff_ms);

        match ConnectionManager::new_with_config(client, manager_config).await {
            Ok(manager) => {
                *self.manager.write() = Some(manager);
                self.connected.store(true, Ordering::SeqCst);
                info!("Distributed cache connected");
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                error!("Distributed cache connection failed: {} (degrading to local-only)", e);
            }
        }
    }

    /// Whether a distributed tier is configured at all.
    pub fn is_enabled(&self) -> bool {
        self.config.url.is_some()
    }

    /// Whether the tier is currently reachable.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn handle(&self) -> Option<ConnectionManager> {
        self.manager.read().clone()
    }

    /// Log loss of connectivity once per transition, not per request.
    fn note_failure(&self, op: &str, err: &redis::RedisError) {
        if self.connected.swap(false, Ordering::SeqCst) {
            error!("Distributed cache unavailable ({} failed): {}", op, err);
        } else {
            debug!("Distributed cache still unavailable ({}): {}", op, err);
        }
    }

    fn note_success(&self) {
        if !self.connected.swap(true, Ordering::SeqCst) {
            info!("Distributed cache connection restored");
        }
    }

    /// Look up a key; nil and every error are a miss.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = self.handle()?;

        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(value) => {
                self.note_success();
                debug!(
                    "Distributed cache {} key={}",
                    if value.is_some() { "HIT" } else { "MISS" },
                    key
                );
                value
            }
            Err(e) => {
                self.note_failure("GET", &e);
                None
            }
        }
    }

    /// Store a value with a mandatory expiry; returns whether the write
    /// landed.
    pub async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> bool {
        let Some(mut conn) = self.handle() else {
            return false;
        };

        // Redis rejects SETEX with a zero expiry
        let ttl_secs = ttl_secs.max(1);

        match conn.set_ex::<_, _, ()>(key, value, ttl_secs).await {
            Ok(()) => {
                self.note_success();
                debug!("Distributed cache SET key={} ttl={}s", key, ttl_secs);
                true
            }
            Err(e) => {
                self.note_failure("SETEX", &e);
                false
            }
        }
    }

    /// Delete every key containing the given substring; returns the
    /// number removed.
    ///
    /// Scan-then-delete: keys created by another writer between the scan
    /// and the delete may survive the round. Accepted — every entry
    /// carries a TTL as a backstop.
    pub async fn delete_matching(&self, pattern: &str) -> usize {
        let Some(mut conn) = self.handle() else {
            return 0;
        };

        let glob = format!("*{}*", glob_escape(pattern));
        let mut removed = 0usize;
        let mut cursor: u64 = 0;

        loop {
            let reply: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&glob)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await;

            let (next, batch) = match reply {
                Ok(reply) => reply,
                Err(e) => {
                    self.note_failure("SCAN", &e);
                    return removed;
                }
            };

            for chunk in batch.chunks(DEL_CHUNK) {
                let deleted: i64 = match redis::cmd("DEL").arg(chunk).query_async(&mut conn).await {
                    Ok(n) => n,
                    Err(e) => {
                        self.note_failure("DEL", &e);
                        return removed;
                    }
                };
                removed += deleted as usize;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        self.note_success();
        if removed > 0 {
            debug!("Distributed cache invalidated {} keys matching '{}'", removed, pattern);
        }
        removed
    }

    /// Clear the entire logical database used by this service.
    /// Administrative only.
    pub async fn flush_all(&self) -> bool {
        let Some(mut conn) = self.handle() else {
            return false;
        };

        let reply: Result<(), _> = redis::cmd("FLUSHDB").query_async(&mut conn).await;
        match reply {
            Ok(()) => {
                self.note_success();
                info!("Distributed cache flushed");
                true
            }
            Err(e) => {
                self.note_failure("FLUSHDB", &e);
                false
            }
        }
    }
}

/// Escape glob metacharacters so that `*escaped*` matches exactly the
/// keys containing the raw substring. Response-cache keys embed query
/// strings, so `?` in particular must not act as a wildcard.
fn glob_escape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
