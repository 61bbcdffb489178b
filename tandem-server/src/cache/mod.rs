//! Two-tier response cache: in-process local tier, shared Redis tier,
//! and the facade/invalidation machinery layered over both.

pub mod distributed;
pub mod facade;
pub mod invalidation;
pub mod local;

pub use distributed::{DistributedCache, DistributedCacheConfig};
pub use facade::CacheFacade;
pub use invalidation::{InvalidationOutcome, Invalidator};
pub use local::LocalCache;

/// Namespace prefix for cached HTTP response payloads.
pub const RESPONSE_PREFIX: &str = "resp:";

/// Namespace prefix for application-level cached aggregates.
pub const APP_PREFIX: &str = "app:";

/// Cache key for a response payload, derived from the full request path
/// plus query string so each filter/sort/page combination is its own
/// entry.
pub fn response_key(path_and_query: &str) -> String {
    format!("{RESPONSE_PREFIX}{path_and_query}")
}

/// Cache key for application-level data: a fixed logical name plus
/// discriminating parameters.
pub fn app_key(name: &str, params: &[&str]) -> String {
    if params.is_empty() {
        format!("{APP_PREFIX}{name}")
    } else {
        format!("{APP_PREFIX}{name}:{}", params.join(":"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_key_includes_query() {
        assert_eq!(
            response_key("/api/v1/products?category=x&page=2"),
            "resp:/api/v1/products?category=x&page=2"
        );
    }

    #[test]
    fn test_response_keys_distinct_per_query() {
        assert_ne!(
            response_key("/api/v1/products?page=1"),
            response_key("/api/v1/products?page=2")
        );
    }

    #[test]
    fn test_app_key_without_params() {
        assert_eq!(app_key("catalog_dropdowns", &[]), "app:catalog_dropdowns");
    }

    #[test]
    fn test_app_key_with_params() {
        assert_eq!(app_key("search", &["laptop", "1", "20"]), "app:search:laptop:1:20");
    }

    #[test]
    fn test_prefixes_do_not_collide() {
        // Pattern eviction on one kind must not sweep the other
        assert!(!response_key("/x").starts_with(APP_PREFIX));
        assert!(!app_key("x", &[]).starts_with(RESPONSE_PREFIX));
    }
}
