//! Runtime configuration read from `SENTINEL_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    CacheBackend, CachePolicy, CacheStore, DuckDbBackend, JsonFileBackend, MemoryBackend,
    DEFAULT_MAX_ENTRIES_PER_OFFERING, DEFAULT_TTL,
};
use crate::dex::{DEFAULT_PREFERRED_CHAIN, DEFAULT_TOKEN_PAIRS_URL};
use crate::error::ValidationError;
use crate::marketplace::MarketplaceEndpoints;
use crate::retry::RetryConfig;

pub const DEFAULT_CACHE_PATH: &str = ".learning-cache.json";
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_MS: u64 = 2_000;

/// Medium behind the cache store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheBackendKind {
    #[default]
    Json,
    DuckDb,
    Memory,
}

impl CacheBackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::DuckDb => "duckdb",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for CacheBackendKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "duckdb" => Ok(Self::DuckDb),
            "memory" => Ok(Self::Memory),
            _ => Err(ValidationError::InvalidConfig {
                key: "SENTINEL_CACHE_BACKEND",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelConfig {
    pub marketplace: MarketplaceEndpoints,
    /// Token-pairs endpoint; the token address is appended as a path segment.
    pub token_pairs_url: String,
    /// Chain whose pair wins the health check when the token trades on several.
    pub preferred_chain: String,
    pub cache_backend: CacheBackendKind,
    /// File used by the json and duckdb backends.
    pub cache_path: PathBuf,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    /// Total attempts for reliable-tier and token-pairs calls.
    pub retry_max_attempts: u32,
    /// Linear backoff base: the n-th retry waits `n * retry_base`.
    pub retry_base: Duration,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            marketplace: MarketplaceEndpoints::default(),
            token_pairs_url: DEFAULT_TOKEN_PAIRS_URL.to_string(),
            preferred_chain: DEFAULT_PREFERRED_CHAIN.to_string(),
            cache_backend: CacheBackendKind::default(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            cache_ttl: DEFAULT_TTL,
            cache_max_entries: DEFAULT_MAX_ENTRIES_PER_OFFERING,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_base: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
        }
    }
}

impl SentinelConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source; unset or blank
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = read("SENTINEL_SEARCH_URL").or_else(|| read("SEARCH_URL")) {
            config.marketplace.search_url = url;
        }
        if let Some(url) = read("SENTINEL_AGENTS_URL") {
            config.marketplace.agents_url = url;
        }
        if let Some(url) = read("SENTINEL_METRICS_URL") {
            config.marketplace.metrics_url = url;
        }
        if let Some(origin) = read("SENTINEL_ORIGIN") {
            config.marketplace.origin = origin;
        }
        if let Some(url) = read("SENTINEL_TOKEN_PAIRS_URL") {
            config.token_pairs_url = url;
        }
        if let Some(chain) = read("SENTINEL_PREFERRED_CHAIN") {
            config.preferred_chain = chain;
        }
        if let Some(kind) = read("SENTINEL_CACHE_BACKEND") {
            config.cache_backend = kind.parse()?;
        }
        if let Some(path) = read("SENTINEL_CACHE_PATH") {
            config.cache_path = PathBuf::from(path);
        }
        if let Some(secs) = read("SENTINEL_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(positive("SENTINEL_CACHE_TTL_SECS", &secs)?);
        }
        if let Some(max) = read("SENTINEL_CACHE_MAX_ENTRIES") {
            config.cache_max_entries = positive("SENTINEL_CACHE_MAX_ENTRIES", &max)?;
        }
        if let Some(attempts) = read("SENTINEL_RETRY_MAX_ATTEMPTS") {
            config.retry_max_attempts = positive("SENTINEL_RETRY_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(base) = read("SENTINEL_RETRY_BASE_MS") {
            let millis: u64 = parse("SENTINEL_RETRY_BASE_MS", &base)?;
            config.retry_base = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_cache_backend(mut self, kind: CacheBackendKind) -> Self {
        self.cache_backend = kind;
        self
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::linear(self.retry_base, self.retry_max_attempts)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: self.cache_ttl,
            max_entries_per_offering: self.cache_max_entries,
        }
    }

    pub fn cache_backend(&self) -> Arc<dyn CacheBackend> {
        match self.cache_backend {
            CacheBackendKind::Json => Arc::new(JsonFileBackend::new(&self.cache_path)),
            CacheBackendKind::DuckDb => Arc::new(DuckDbBackend::new(&self.cache_path)),
            CacheBackendKind::Memory => Arc::new(MemoryBackend::new()),
        }
    }

    pub fn cache_store(&self) -> CacheStore {
        CacheStore::new(self.cache_backend(), self.cache_policy())
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidConfig {
            key,
            value: value.to_string(),
        })
}

fn positive<T>(key: &'static str, value: &str) -> Result<T, ValidationError>
where
    T: FromStr + Default + PartialOrd,
{
    let parsed: T = parse(key, value)?;
    if parsed <= T::default() {
        return Err(ValidationError::InvalidConfig {
            key,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = SentinelConfig::from_lookup(lookup(&[])).expect("defaults");

        assert_eq!(config, SentinelConfig::default());
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.retry().max_attempts, 3);
    }

    #[test]
    fn prefixed_search_url_wins_over_legacy_name() {
        let config = SentinelConfig::from_lookup(lookup(&[
            ("SEARCH_URL", "http://legacy/search"),
            ("SENTINEL_SEARCH_URL", "http://new/search"),
        ]))
        .expect("config");
        assert_eq!(config.marketplace.search_url, "http://new/search");

        let legacy = SentinelConfig::from_lookup(lookup(&[("SEARCH_URL", "http://legacy/search")]))
            .expect("config");
        assert_eq!(legacy.marketplace.search_url, "http://legacy/search");
    }

    #[test]
    fn numeric_and_backend_overrides_are_parsed() {
        let config = SentinelConfig::from_lookup(lookup(&[
            ("SENTINEL_CACHE_BACKEND", "DuckDB"),
            ("SENTINEL_CACHE_TTL_SECS", "60"),
            ("SENTINEL_CACHE_MAX_ENTRIES", "5"),
            ("SENTINEL_RETRY_BASE_MS", "0"),
        ]))
        .expect("config");

        assert_eq!(config.cache_backend, CacheBackendKind::DuckDb);
        assert_eq!(config.cache_policy().ttl, Duration::from_secs(60));
        assert_eq!(config.cache_policy().max_entries_per_offering, 5);
        assert_eq!(config.retry_base, Duration::ZERO);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let error = SentinelConfig::from_lookup(lookup(&[("SENTINEL_CACHE_MAX_ENTRIES", "0")]))
            .expect_err("zero capacity");
        assert_eq!(
            error,
            ValidationError::InvalidConfig {
                key: "SENTINEL_CACHE_MAX_ENTRIES",
                value: String::from("0"),
            }
        );

        assert!(SentinelConfig::from_lookup(lookup(&[("SENTINEL_CACHE_BACKEND", "redis")])).is_err());
        assert!(SentinelConfig::from_lookup(lookup(&[("SENTINEL_RETRY_MAX_ATTEMPTS", "many")])).is_err());
    }
}
