//! Persisted TTL cache for offering deliverables.
//!
//! Entries are keyed by offering name plus a normalized request. Every
//! operation loads the whole [`CacheDocument`] from its [`CacheBackend`],
//! mutates it, and writes it back; there is no long-lived in-memory copy.

mod backend;
mod duckdb;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::Timestamp;

pub use self::backend::{CacheBackend, CacheBackendError, JsonFileBackend, MemoryBackend};
pub use self::duckdb::DuckDbBackend;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_ENTRIES_PER_OFFERING: usize = 100;

/// Request fields an offering chose to key its cache on.
pub type CacheRequest = BTreeMap<String, Value>;

/// On-disk layout of the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    #[serde(default)]
    pub entries: Vec<CacheEntry>,
    #[serde(default)]
    pub stats: CacheStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub offering: String,
    pub request: CacheRequest,
    /// Serialized deliverable, opaque to the store.
    pub result: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub hit_count: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now: Timestamp, ttl: Duration) -> bool {
        now.duration_since(self.timestamp) < ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_hits: u64,
    pub total_misses: u64,
    pub total_saves: u64,
}

/// Expiry and capacity limits applied by [`CacheStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Entries at least this old read as misses; the next write purges them.
    pub ttl: Duration,
    /// Upper bound per offering; the oldest entries are evicted past it.
    pub max_entries_per_offering: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries_per_offering: DEFAULT_MAX_ENTRIES_PER_OFFERING,
        }
    }
}

/// Lower-cases and trims string values; other values pass through.
pub fn normalize_request(request: &CacheRequest) -> CacheRequest {
    request
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => Value::String(text.trim().to_lowercase()),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// `"{offering}:{canonical json}"`; keys are ordered by the map itself.
pub fn cache_key(offering: &str, request: &CacheRequest) -> String {
    let canonical = serde_json::to_string(&normalize_request(request))
        .unwrap_or_else(|_| String::from("{}"));
    format!("{offering}:{canonical}")
}

/// Thread-safe handle over one backing medium.
///
/// Clones share the same lock, so one store per backing file keeps
/// read-modify-write cycles from interleaving.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    policy: CachePolicy,
    lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, policy: CachePolicy) -> Self {
        Self {
            backend,
            policy,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Ephemeral store with default limits.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), CachePolicy::default())
    }

    /// Fresh payload for the request, if any.
    pub async fn get(&self, offering: &str, request: &CacheRequest) -> Option<String> {
        self.get_at(offering, request, Timestamp::now()).await
    }

    /// [`CacheStore::get`] evaluated at an explicit instant.
    pub async fn get_at(
        &self,
        offering: &str,
        request: &CacheRequest,
        now: Timestamp,
    ) -> Option<String> {
        let _guard = self.lock.lock().await;
        let key = cache_key(offering, request);
        let mut document = self.load();

        let hit = document
            .entries
            .iter_mut()
            .find(|entry| entry.key == key && entry.is_fresh(now, self.policy.ttl));

        let payload = match hit {
            Some(entry) => {
                entry.hit_count += 1;
                document.stats.total_hits += 1;
                Some(entry.result.clone())
            }
            None => {
                document.stats.total_misses += 1;
                None
            }
        };

        tracing::debug!(offering, hit = payload.is_some(), "cache lookup");
        self.persist(&document);
        payload
    }

    /// Stores a payload, replacing any entry with the same key.
    pub async fn put(&self, offering: &str, request: &CacheRequest, payload: String) {
        self.put_at(offering, request, payload, Timestamp::now()).await;
    }

    /// [`CacheStore::put`] evaluated at an explicit instant.
    pub async fn put_at(
        &self,
        offering: &str,
        request: &CacheRequest,
        payload: String,
        now: Timestamp,
    ) {
        let _guard = self.lock.lock().await;
        let key = cache_key(offering, request);
        let mut document = self.load();
        let ttl = self.policy.ttl;

        document
            .entries
            .retain(|entry| entry.key != key && entry.is_fresh(now, ttl));
        document.entries.push(CacheEntry {
            key,
            offering: offering.to_string(),
            request: request.clone(),
            result: payload,
            timestamp: now,
            hit_count: 0,
        });
        evict_oldest(
            &mut document.entries,
            offering,
            self.policy.max_entries_per_offering,
        );
        document.stats.total_saves += 1;

        self.persist(&document);
    }

    pub async fn stats(&self) -> CacheStats {
        let _guard = self.lock.lock().await;
        self.load().stats
    }

    /// Stored entry count, expired entries included.
    pub async fn len(&self) -> usize {
        let _guard = self.lock.lock().await;
        self.load().entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Entry counts grouped by offering.
    pub async fn entries_by_offering(&self) -> BTreeMap<String, usize> {
        let _guard = self.lock.lock().await;
        let mut counts = BTreeMap::new();
        for entry in self.load().entries {
            *counts.entry(entry.offering).or_insert(0) += 1;
        }
        counts
    }

    /// Drops every entry and resets counters.
    pub async fn clear(&self) -> Result<(), CacheBackendError> {
        let _guard = self.lock.lock().await;
        self.backend.save(&CacheDocument::default())
    }

    fn load(&self) -> CacheDocument {
        match self.backend.load() {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(%error, "cache load failed; starting from an empty cache");
                CacheDocument::default()
            }
        }
    }

    fn persist(&self, document: &CacheDocument) {
        if let Err(error) = self.backend.save(document) {
            tracing::warn!(%error, "cache save failed");
        }
    }
}

/// Removes the offering's oldest entries beyond `capacity`.
fn evict_oldest(entries: &mut Vec<CacheEntry>, offering: &str, capacity: usize) {
    let mut owned: Vec<(usize, Timestamp)> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.offering == offering)
        .map(|(index, entry)| (index, entry.timestamp))
        .collect();
    if owned.len() <= capacity {
        return;
    }

    // stable: equal timestamps keep insertion order
    owned.sort_by_key(|(_, timestamp)| *timestamp);
    let surplus: HashSet<usize> = owned[..owned.len() - capacity]
        .iter()
        .map(|(index, _)| *index)
        .collect();

    let mut index = 0;
    entries.retain(|_| {
        let keep = !surplus.contains(&index);
        index += 1;
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(pairs: &[(&str, Value)]) -> CacheRequest {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn store_with(backend: Arc<MemoryBackend>, policy: CachePolicy) -> CacheStore {
        CacheStore::new(backend, policy)
    }

    #[test]
    fn key_ignores_string_case_whitespace_and_field_order() {
        let a = request(&[("query", json!("  Trading Bots ")), ("maxResults", json!(5))]);
        let b = request(&[("maxResults", json!(5)), ("query", json!("trading bots"))]);

        assert_eq!(cache_key("offerings_digest", &a), cache_key("offerings_digest", &b));
        assert_eq!(
            cache_key("offerings_digest", &a),
            "offerings_digest:{\"maxResults\":5,\"query\":\"trading bots\"}"
        );
    }

    #[test]
    fn key_is_scoped_by_offering() {
        let req = request(&[("agentName", json!("alpha"))]);

        assert_ne!(cache_key("agent_brief", &req), cache_key("other", &req));
    }

    #[tokio::test]
    async fn hit_increments_counters_and_returns_payload() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone(), CachePolicy::default());
        let req = request(&[("agentName", json!("Alpha"))]);
        let now = Timestamp::from_unix_millis(1_000_000);

        store.put_at("agent_brief", &req, String::from("payload"), now).await;
        let hit = store.get_at("agent_brief", &req, now).await;

        assert_eq!(hit.as_deref(), Some("payload"));
        let document = backend.snapshot();
        assert_eq!(document.entries[0].hit_count, 1);
        assert_eq!(
            document.stats,
            CacheStats {
                total_hits: 1,
                total_misses: 0,
                total_saves: 1
            }
        );
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss_and_is_not_deleted_by_get() {
        let backend = Arc::new(MemoryBackend::new());
        let policy = CachePolicy {
            ttl: Duration::from_secs(60),
            ..CachePolicy::default()
        };
        let store = store_with(backend.clone(), policy);
        let req = request(&[("agentName", json!("alpha"))]);
        let written = Timestamp::from_unix_millis(0);

        store.put_at("agent_brief", &req, String::from("old"), written).await;
        let at_boundary = Timestamp::from_unix_millis(60_000);

        assert_eq!(store.get_at("agent_brief", &req, at_boundary).await, None);
        let document = backend.snapshot();
        assert_eq!(document.entries.len(), 1);
        assert_eq!(document.stats.total_misses, 1);
    }

    #[tokio::test]
    async fn put_replaces_existing_key_even_when_fresh() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone(), CachePolicy::default());
        let req = request(&[("agentName", json!("alpha"))]);

        store
            .put_at("agent_brief", &req, String::from("first"), Timestamp::from_unix_millis(1))
            .await;
        store
            .put_at("agent_brief", &req, String::from("second"), Timestamp::from_unix_millis(2))
            .await;

        let document = backend.snapshot();
        assert_eq!(document.entries.len(), 1);
        assert_eq!(document.entries[0].result, "second");
        assert_eq!(document.stats.total_saves, 2);
    }

    #[tokio::test]
    async fn capacity_evicts_only_the_writing_offerings_oldest_entries() {
        let backend = Arc::new(MemoryBackend::new());
        let policy = CachePolicy {
            ttl: Duration::from_secs(3600),
            max_entries_per_offering: 2,
        };
        let store = store_with(backend.clone(), policy);

        store
            .put_at(
                "other",
                &request(&[("q", json!("x"))]),
                String::from("other"),
                Timestamp::from_unix_millis(0),
            )
            .await;
        for (index, name) in ["a", "b", "c"].iter().enumerate() {
            store
                .put_at(
                    "agent_brief",
                    &request(&[("agentName", json!(name))]),
                    name.to_string(),
                    Timestamp::from_unix_millis(10 + index as i64),
                )
                .await;
        }

        let document = backend.snapshot();
        let results: Vec<&str> = document
            .entries
            .iter()
            .map(|entry| entry.result.as_str())
            .collect();
        assert_eq!(results, vec!["other", "b", "c"]);
    }

    #[test]
    fn eviction_breaks_timestamp_ties_by_insertion_order() {
        let entry = |result: &str| CacheEntry {
            key: result.to_string(),
            offering: String::from("o"),
            request: CacheRequest::new(),
            result: result.to_string(),
            timestamp: Timestamp::from_unix_millis(5),
            hit_count: 0,
        };
        let mut entries = vec![entry("first"), entry("second"), entry("third")];

        evict_oldest(&mut entries, "o", 1);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result, "third");
    }

    #[tokio::test]
    async fn clear_resets_document() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone(), CachePolicy::default());
        store
            .put("agent_brief", &request(&[("agentName", json!("a"))]), String::from("x"))
            .await;

        store.clear().await.expect("memory clear");

        assert!(store.is_empty().await);
        assert_eq!(store.stats().await, CacheStats::default());
    }
}
