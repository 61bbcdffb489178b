use super::facade::CacheFacade;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// Result of one dispatched invalidation, delivered to the completion
/// hook when one is registered.
#[derive(Debug, Clone)]
pub struct InvalidationOutcome {
    pub patterns: Vec<String>,
    pub removed: u64,
}

/// Fires cache invalidation for domain writes.
///
/// Dispatch is an explicit background task, decoupled from the
/// request-response lifecycle: the write's HTTP response is returned
/// without waiting, and a failed eviction is logged, never surfaced.
/// `watch` exposes a completion channel so tests can await the eviction
/// deterministically.
#[derive(Clone)]
pub struct Invalidator {
    facade: Arc<CacheFacade>,
    hook: Arc<RwLock<Option<UnboundedSender<InvalidationOutcome>>>>,
}

impl Invalidator {
    pub fn new(facade: Arc<CacheFacade>) -> Self {
        Self {
            facade,
            hook: Arc::new(RwLock::new(None)),
        }
    }

    /// Dispatch invalidation of the given patterns and return without
    /// waiting for it.
    pub fn trigger(&self, patterns: Vec<String>) -> tokio::task::JoinHandle<()> {
        let facade = self.facade.clone();
        let hook = self.hook.clone();

        tokio::spawn(async move {
            let mut removed = 0u64;
            for pattern in &patterns {
                removed += facade.invalidate(pattern).await;
            }
            debug!("Invalidation of {:?} removed {} keys", patterns, removed);

            let sender = hook.read().clone();
            if let Some(sender) = sender {
                if sender.send(InvalidationOutcome { patterns, removed }).is_err() {
                    warn!("Invalidation completion hook receiver dropped");
                }
            }
        })
    }

    /// Register a completion hook; each `trigger` reports its outcome on
    /// the returned channel. Replaces any previously registered hook.
    pub fn watch(&self) -> UnboundedReceiver<InvalidationOutcome> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.hook.write() = Some(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::distributed::{DistributedCache, DistributedCacheConfig};
    use crate::cache::local::LocalCache;
    use crate::core::types::{CachePolicy, LocalCacheConfig};

    fn facade() -> Arc<CacheFacade> {
        Arc::new(CacheFacade::new(
            LocalCache::new(LocalCacheConfig::default()),
            DistributedCache::new(DistributedCacheConfig::default()),
            CachePolicy::default(),
        ))
    }

    #[tokio::test]
    async fn test_trigger_removes_keys_and_reports() {
        let facade = facade();
        facade.write("products:1", b"a".to_vec(), 60, false).await;
        facade.write("products:2", b"b".to_vec(), 60, false).await;
        facade.write("brands:1", b"c".to_vec(), 60, false).await;

        let invalidator = Invalidator::new(facade.clone());
        let mut completions = invalidator.watch();

        invalidator.trigger(vec!["products".to_string()]);

        let outcome = completions.recv().await.unwrap();
        assert_eq!(outcome.patterns, vec!["products".to_string()]);
        assert_eq!(outcome.removed, 2);

        assert!(facade.read("products:1", false).await.is_none());
        assert_eq!(facade.read("brands:1", false).await, Some(b"c".to_vec()));
    }

    #[tokio::test]
    async fn test_trigger_multiple_patterns_sums_counts() {
        let facade = facade();
        facade.write("resp:/api/v1/products", b"a".to_vec(), 60, false).await;
        facade.write("app:catalog_dropdowns", b"b".to_vec(), 60, false).await;

        let invalidator = Invalidator::new(facade.clone());
        let mut completions = invalidator.watch();

        invalidator.trigger(vec!["products".to_string(), "catalog_dropdowns".to_string()]);

        let outcome = completions.recv().await.unwrap();
        assert_eq!(outcome.removed, 2);
    }

    #[tokio::test]
    async fn test_trigger_without_hook_completes() {
        let facade = facade();
        facade.write("products:1", b"a".to_vec(), 60, false).await;

        let invalidator = Invalidator::new(facade.clone());
        invalidator.trigger(vec!["products".to_string()]).await.unwrap();

        assert!(facade.read("products:1", false).await.is_none());
    }
}
