pub mod cache;
pub mod catalog;
pub mod config;
pub mod core;
pub mod metrics;
pub mod server;

// Re-export commonly used types
pub use cache::{
    CacheFacade, DistributedCache, DistributedCacheConfig, InvalidationOutcome, Invalidator,
    LocalCache, app_key, response_key,
};
pub use catalog::{CatalogStore, NewProduct, Product, ProductUpdate};
pub use config::ServerConfig;
pub use core::{CachePolicy, CacheSnapshot, LocalCacheConfig, LocalCacheStats, TandemError};
pub use server::{AppState, ResponseCache, create_router};
