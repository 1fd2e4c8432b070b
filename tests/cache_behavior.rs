//! Behavior-driven tests for the deliverable cache
//!
//! These tests verify HOW the cache behaves across its durable backends:
//! expiry, replace-on-write, capacity eviction and failure tolerance.

use sentinel_core::{
    cache_key, CacheBackend, CachePolicy, CacheRequest, CacheStore, DuckDbBackend,
    JsonFileBackend, Timestamp,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const HOUR_MS: i64 = 60 * 60 * 1000;

fn request(name: &str) -> CacheRequest {
    CacheRequest::from([(String::from("agentName"), json!(name))])
}

fn json_store(path: &std::path::Path, policy: CachePolicy) -> (CacheStore, Arc<JsonFileBackend>) {
    let backend = Arc::new(JsonFileBackend::new(path));
    (CacheStore::new(backend.clone(), policy), backend)
}

// =============================================================================
// Cache: Hits, Misses and Expiry
// =============================================================================

#[tokio::test]
async fn when_equivalent_request_is_repeated_system_serves_it_from_the_file() {
    // Given: A JSON-file cache holding one deliverable
    let dir = tempdir().expect("temp dir");
    let (store, backend) = json_store(&dir.path().join("cache.json"), CachePolicy::default());
    let written = Timestamp::from_unix_millis(10 * HOUR_MS);
    store
        .put_at("agent_brief", &request("Alpha"), String::from("{\"name\":\"Alpha\"}"), written)
        .await;

    // When: The same request arrives with different casing and padding
    let hit = store
        .get_at("agent_brief", &request("  ALPHA "), written)
        .await;

    // Then: The stored payload is returned and the hit is persisted
    assert_eq!(hit.as_deref(), Some("{\"name\":\"Alpha\"}"));
    let document = backend.load().expect("file is readable");
    assert_eq!(document.entries[0].hit_count, 1);
    assert_eq!(document.stats.total_hits, 1);
    assert_eq!(document.stats.total_saves, 1);
}

#[tokio::test]
async fn when_entry_reaches_ttl_system_reports_a_miss_but_keeps_the_entry() {
    // Given: An entry written exactly one TTL ago
    let dir = tempdir().expect("temp dir");
    let (store, backend) = json_store(&dir.path().join("cache.json"), CachePolicy::default());
    let written = Timestamp::from_unix_millis(0);
    store
        .put_at("agent_brief", &request("alpha"), String::from("stale"), written)
        .await;

    // When: It is read one millisecond before and exactly at the TTL boundary
    let before = store
        .get_at("agent_brief", &request("alpha"), Timestamp::from_unix_millis(HOUR_MS - 1))
        .await;
    let at = store
        .get_at("agent_brief", &request("alpha"), Timestamp::from_unix_millis(HOUR_MS))
        .await;

    // Then: Only the earlier read hits, and the expired entry is still on disk
    assert_eq!(before.as_deref(), Some("stale"));
    assert_eq!(at, None);
    let document = backend.load().expect("file is readable");
    assert_eq!(document.entries.len(), 1);
    assert_eq!(document.stats.total_hits, 1);
    assert_eq!(document.stats.total_misses, 1);
}

// =============================================================================
// Cache: Replace-on-write, Purge and Eviction
// =============================================================================

#[tokio::test]
async fn when_fresh_key_is_written_again_system_keeps_only_the_newest_payload() {
    // Given: A fresh entry for a key
    let store = CacheStore::in_memory();
    store
        .put_at("agent_brief", &request("alpha"), String::from("v1"), Timestamp::from_unix_millis(1_000))
        .await;

    // When: The same key is written again while the first entry is still fresh
    store
        .put_at("agent_brief", &request("Alpha"), String::from("v2"), Timestamp::from_unix_millis(2_000))
        .await;

    // Then: Exactly one entry remains and it carries the newest payload
    assert_eq!(store.len().await, 1);
    let hit = store
        .get_at("agent_brief", &request("alpha"), Timestamp::from_unix_millis(3_000))
        .await;
    assert_eq!(hit.as_deref(), Some("v2"));
}

#[tokio::test]
async fn when_any_offering_writes_system_purges_expired_entries_of_all_offerings() {
    // Given: An expired entry for one offering and a fresh one for another
    let store = CacheStore::in_memory();
    store
        .put_at("offerings_digest", &request("old"), String::from("old"), Timestamp::from_unix_millis(0))
        .await;
    store
        .put_at("agent_brief", &request("recent"), String::from("recent"), Timestamp::from_unix_millis(HOUR_MS))
        .await;

    // When: A third write happens after the first entry expired
    store
        .put_at("agent_brief", &request("new"), String::from("new"), Timestamp::from_unix_millis(HOUR_MS + 1))
        .await;

    // Then: The expired digest entry is gone, both brief entries remain
    let by_offering = store.entries_by_offering().await;
    assert_eq!(by_offering.get("offerings_digest"), None);
    assert_eq!(by_offering.get("agent_brief"), Some(&2));
}

#[tokio::test]
async fn when_offering_exceeds_capacity_system_evicts_its_oldest_entries() {
    // Given: A store capped at three entries per offering
    let policy = CachePolicy {
        ttl: Duration::from_secs(3_600),
        max_entries_per_offering: 3,
    };
    let store = CacheStore::new(Arc::new(sentinel_core::MemoryBackend::new()), policy);

    // When: Five distinct requests are written in order
    for index in 0..5 {
        store
            .put_at(
                "agent_brief",
                &request(&format!("agent-{index}")),
                format!("payload-{index}"),
                Timestamp::from_unix_millis(1_000 + index),
            )
            .await;
    }

    // Then: Only the three newest survive
    let now = Timestamp::from_unix_millis(2_000);
    assert_eq!(store.len().await, 3);
    assert_eq!(store.get_at("agent_brief", &request("agent-0"), now).await, None);
    assert_eq!(store.get_at("agent_brief", &request("agent-1"), now).await, None);
    assert_eq!(
        store.get_at("agent_brief", &request("agent-4"), now).await.as_deref(),
        Some("payload-4")
    );
}

// =============================================================================
// Cache: Failure Tolerance and Concurrency
// =============================================================================

#[tokio::test]
async fn when_cache_file_is_corrupt_system_misses_and_next_write_repairs_it() {
    // Given: A cache file containing garbage
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{{{ definitely not json").expect("write garbage");
    let (store, backend) = json_store(&path, CachePolicy::default());
    let now = Timestamp::from_unix_millis(5_000);

    // When: The store is read and then written
    let miss = store.get_at("agent_brief", &request("alpha"), now).await;
    store
        .put_at("agent_brief", &request("alpha"), String::from("fresh"), now)
        .await;

    // Then: The read is a miss and the file is valid again
    assert_eq!(miss, None);
    let document = backend.load().expect("file was rewritten");
    assert_eq!(document.entries.len(), 1);
    assert_eq!(document.entries[0].result, "fresh");
}

#[tokio::test]
async fn when_cache_directory_is_unwritable_system_still_answers() {
    // Given: A cache path whose parent is a regular file
    let dir = tempdir().expect("temp dir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file").expect("write blocker");
    let (store, _) = json_store(&blocker.join("cache.json"), CachePolicy::default());

    // When: The store is written and read
    store
        .put("agent_brief", &request("alpha"), String::from("lost"))
        .await;
    let result = store.get("agent_brief", &request("alpha")).await;

    // Then: Save failures are swallowed and the read is simply a miss
    assert_eq!(result, None);
}

#[tokio::test]
async fn when_jobs_share_a_store_concurrently_system_loses_no_counter_updates() {
    // Given: One stored entry behind a shared store
    let dir = tempdir().expect("temp dir");
    let (store, backend) = json_store(&dir.path().join("cache.json"), CachePolicy::default());
    store
        .put("agent_brief", &request("alpha"), String::from("payload"))
        .await;

    // When: Twenty reads race each other
    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.get("agent_brief", &request("alpha")).await
        }));
    }
    for handle in handles {
        assert!(handle.await.expect("task").is_some());
    }

    // Then: Every hit is counted
    let document = backend.load().expect("file is readable");
    assert_eq!(document.stats.total_hits, 20);
    assert_eq!(document.entries[0].hit_count, 20);
}

#[tokio::test]
async fn when_duckdb_backend_is_selected_system_persists_across_store_instances() {
    // Given: A DuckDB-backed store with one entry
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("cache.duckdb");
    let first = CacheStore::new(Arc::new(DuckDbBackend::new(&path)), CachePolicy::default());
    let now = Timestamp::now();
    first
        .put_at("ecosystem_health_check", &request("0xabc"), String::from("scored"), now)
        .await;

    // When: A new store opens the same database
    let second = CacheStore::new(Arc::new(DuckDbBackend::new(&path)), CachePolicy::default());
    let hit = second
        .get_at("ecosystem_health_check", &request("0xABC"), now)
        .await;

    // Then: The entry and counters survived
    assert_eq!(hit.as_deref(), Some("scored"));
    let stats = second.stats().await;
    assert_eq!(stats.total_saves, 1);
    assert_eq!(stats.total_hits, 1);
}

#[test]
fn when_keys_are_derived_system_normalizes_only_string_values() {
    // Given: Two digest requests differing in string case and a numeric field
    let a = CacheRequest::from([
        (String::from("query"), json!("Trading")),
        (String::from("maxResults"), json!(5)),
    ]);
    let b = CacheRequest::from([
        (String::from("query"), json!("trading")),
        (String::from("maxResults"), json!(6)),
    ]);

    let c = CacheRequest::from([
        (String::from("query"), json!(" TRADING ")),
        (String::from("maxResults"), json!(5)),
    ]);

    // Then: Only the non-string difference separates them
    assert_eq!(cache_key("offerings_digest", &a), cache_key("offerings_digest", &c));
    assert_ne!(cache_key("offerings_digest", &a), cache_key("offerings_digest", &b));
    assert!(cache_key("offerings_digest", &a).starts_with("offerings_digest:{"));
}
