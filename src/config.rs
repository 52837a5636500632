//! Configuration loader and validator for the content query engine.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Invalid value {value:?} for {var}")]
    Override { var: &'static str, value: String },
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub database: Database,
    pub statics: Statics,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub deadlines: Deadlines,
}

/// Postgres connection pool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Database {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Static-asset host used for image variant URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statics {
    pub host: String,
}

/// Redis read-through cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cache {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

/// Per-stage deadlines of a query operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deadlines {
    #[serde(default = "default_count_ms")]
    pub count_ms: u64,
    #[serde(default = "default_fetch_ms")]
    pub fetch_ms: u64,
    #[serde(default = "default_hydrate_ms")]
    pub hydrate_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}
fn default_idle_timeout_secs() -> u64 {
    300
}
fn default_acquire_timeout_secs() -> u64 {
    5
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_cache_timeout_ms() -> u64 {
    500
}
fn default_count_ms() -> u64 {
    5_000
}
fn default_fetch_ms() -> u64 {
    10_000
}
fn default_hydrate_ms() -> u64 {
    15_000
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            ttl_secs: default_ttl_secs(),
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            count_ms: default_count_ms(),
            fetch_ms: default_fetch_ms(),
            hydrate_ms: default_hydrate_ms(),
        }
    }
}

impl Deadlines {
    pub fn count(&self) -> Duration {
        Duration::from_millis(self.count_ms)
    }

    pub fn fetch(&self) -> Duration {
        Duration::from_millis(self.fetch_ms)
    }

    pub fn hydrate(&self) -> Duration {
        Duration::from_millis(self.hydrate_ms)
    }
}

impl Cache {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Load configuration from a YAML file, apply environment overrides and
/// validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    apply_overrides(&mut cfg, |name| std::env::var(name).ok())?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Apply `DATABASE_URL`, `STATICS_HOST`, `REDIS_ENABLED`, `REDIS_URL` and
/// `REDIS_TTL` from `lookup`. Empty values are ignored.
pub fn apply_overrides<F>(cfg: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("DATABASE_URL") {
        cfg.database.url = url;
    }
    if let Some(host) = get("STATICS_HOST") {
        cfg.statics.host = host;
    }
    if let Some(raw) = get("REDIS_ENABLED") {
        cfg.cache.enabled = parse_bool(&raw).ok_or(ConfigError::Override {
            var: "REDIS_ENABLED",
            value: raw.clone(),
        })?;
    }
    if let Some(url) = get("REDIS_URL") {
        cfg.cache.url = url;
    }
    if let Some(raw) = get("REDIS_TTL") {
        cfg.cache.ttl_secs = raw.trim().parse().map_err(|_| ConfigError::Override {
            var: "REDIS_TTL",
            value: raw.clone(),
        })?;
    }
    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.database.url.trim().is_empty() {
        return Err(ConfigError::Invalid("database.url must be non-empty"));
    }
    if cfg.database.max_connections == 0 {
        return Err(ConfigError::Invalid("database.max_connections must be > 0"));
    }
    if cfg.statics.host.trim().is_empty() {
        return Err(ConfigError::Invalid("statics.host must be non-empty"));
    }

    if cfg.cache.enabled {
        if cfg.cache.url.trim().is_empty() {
            return Err(ConfigError::Invalid("cache.url must be non-empty when the cache is enabled"));
        }
        if cfg.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be > 0"));
        }
    }

    let d = &cfg.deadlines;
    if d.count_ms == 0 || d.fetch_ms == 0 || d.hydrate_ms == 0 {
        return Err(ConfigError::Invalid("deadlines must all be > 0"));
    }

    Ok(())
}

/// Example YAML configuration.
pub fn example() -> &'static str {
    r#"database:
  url: "postgres://localhost/content"
  max_connections: 10
  idle_timeout_secs: 300
  acquire_timeout_secs: 5

statics:
  host: "https://statics.example.com/images"

cache:
  enabled: false
  url: "redis://localhost:6379/0"
  ttl_secs: 3600
  timeout_ms: 500

deadlines:
  count_ms: 5000
  fetch_ms: 10000
  hydrate_ms: 15000
"#
}
