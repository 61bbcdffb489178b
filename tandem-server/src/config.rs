use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::cache::DistributedCacheConfig;
use crate::core::types::{CachePolicy, LocalCacheConfig};

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: Server,
    pub cache: CacheConfig,
    pub routes: RouteTtlConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 15800,
        }
    }
}

/// Both cache tiers plus the facade TTL policy
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    pub local: LocalCacheConfig,
    pub policy: CachePolicy,
    pub redis: DistributedCacheConfig,
}

/// Response-cache TTLs, supplied per route class at configuration time:
/// volatile listings get minutes, near-static reference data an hour,
/// one-off status seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTtlConfig {
    pub products_ttl_secs: u64,
    pub reference_ttl_secs: u64,
    pub status_ttl_secs: u64,
    pub dropdowns_ttl_secs: u64,
}

impl Default for RouteTtlConfig {
    fn default() -> Self {
        Self {
            products_ttl_secs: 300,
            reference_ttl_secs: 3600,
            status_ttl_secs: 30,
            dropdowns_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from an explicit path, from `./config.yml` when present, or
    /// fall back to defaults. Environment overrides apply in every case.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let default_path = Path::new("config.yml");
        if default_path.exists() {
            return Self::from_file(default_path);
        }

        info!("No config file found; using defaults");
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Environment-driven overrides: `REDIS_URL` selects the distributed
    /// store; its absence (with no configured URL) means distributed
    /// caching is not attempted at all.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("REDIS_URL") {
            if !url.is_empty() {
                self.cache.redis.url = Some(url);
            }
        }
    }

    /// Get server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 15800);
        assert_eq!(config.cache.local.max_entries, 5000);
        assert_eq!(config.cache.policy.local_write_ceiling_secs, 300);
        assert_eq!(config.routes.products_ttl_secs, 300);
        assert!(config.cache.redis.url.is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
cache:
  local:
    max_entries: 1000
    sweep_interval_secs: 30
  policy:
    local_write_ceiling_secs: 120
    backfill_ttl_secs: 45
  redis:
    url: "redis://127.0.0.1:6379"
    connect_timeout_secs: 10
    response_timeout_ms: 1500
    max_retries: 4
    max_backoff_ms: 3000
routes:
  products_ttl_secs: 300
  reference_ttl_secs: 3600
  status_ttl_secs: 30
  dropdowns_ttl_secs: 3600
logging:
  level: "debug"
  format: "pretty"
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.local.max_entries, 1000);
        assert_eq!(config.cache.policy.backfill_ttl_secs, 45);
        assert_eq!(config.cache.redis.url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(config.routes.status_ttl_secs, 30);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_parse_partial_yaml_uses_defaults() {
        let yaml = r#"
server:
  host: "0.0.0.0"
  port: 9000
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.cache.local.max_entries, 5000);
        assert_eq!(config.routes.reference_ttl_secs, 3600);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:15800");
    }
}
