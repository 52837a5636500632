//! Best-effort read-through cache for query results.
//!
//! Values are stored as JSON under a digest of the request. Backend failures
//! and timeouts are logged and treated as a miss (reads) or dropped (writes);
//! they never fail a query.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config;

const KEY_PREFIX: &str = "content-query";

/// Raw string storage with expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Redis backend over an auto-reconnecting connection manager.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("invalid redis url")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("connecting to redis")?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .context("redis GET")?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .context("redis SET")?;
        Ok(())
    }
}

/// Typed, fail-open front of a [`CacheBackend`]. A disabled cache never
/// touches a backend.
#[derive(Clone)]
pub struct QueryCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
    timeout: Duration,
}

impl QueryCache {
    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: Duration::ZERO,
            timeout: Duration::ZERO,
        }
    }

    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            ttl,
            timeout,
        }
    }

    /// Build the cache described by `cfg`. An unreachable Redis disables the
    /// cache instead of failing startup.
    pub async fn from_config(cfg: &config::Cache) -> Self {
        if !cfg.enabled {
            return Self::disabled();
        }
        match RedisCache::connect(&cfg.url).await {
            Ok(redis) => {
                info!(ttl_secs = cfg.ttl_secs, "query cache enabled");
                Self::new(Arc::new(redis), cfg.ttl(), cfg.timeout())
            }
            Err(err) => {
                warn!(?err, "redis unavailable, query cache disabled");
                Self::disabled()
            }
        }
    }

    pub fn enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;
        let raw = match tokio::time::timeout(self.timeout, backend.get(key)).await {
            Ok(Ok(raw)) => raw?,
            Ok(Err(err)) => {
                warn!(?err, key, "cache read failed");
                return None;
            }
            Err(_) => {
                warn!(key, "cache read timed out");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(?err, key, "discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(?err, key, "cache value not serializable");
                return;
            }
        };
        match tokio::time::timeout(self.timeout, backend.set(key, &raw, self.ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(?err, key, "cache write failed"),
            Err(_) => warn!(key, "cache write timed out"),
        }
    }
}

/// `content-query:<operation>:<sha256 hex>` of the canonical JSON of
/// `params`. Object keys serialize sorted and absent fields are skipped, so
/// equivalent requests share a key.
pub fn cache_key<P: Serialize>(operation: &str, params: &P) -> Option<String> {
    let canonical = serde_json::to_value(params).ok()?;
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    Some(format!("{KEY_PREFIX}:{operation}:{}", hex::encode(digest)))
}
