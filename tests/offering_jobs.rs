//! Behavior-driven tests for the seller offerings
//!
//! Each offering is wired against a scripted transport and an in-memory
//! cache, then exercised through the `JobOffering` surface only.

use sentinel_core::{
    AgentBrief, CacheStore, DexClient, EcosystemHealthCheck, JobOffering, MarketplaceClient,
    MarketplaceEndpoints, OfferingRegistry, OfferingsDigest, Resolver, RetryConfig,
    ScriptedHttpClient,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const SEARCH: &str = "http://search.test/search";
const LISTING: &str = "http://listing.test/agents";
const METRICS: &str = "http://metrics.test/agent";
const PAIRS: &str = "http://pairs.test/tokens/v1/base";
const TOKEN: &str = "0xAbCdEf0123456789abcdef0123456789ABCDEF01";

fn resolver(http: &Arc<ScriptedHttpClient>) -> Resolver {
    let endpoints = MarketplaceEndpoints {
        search_url: SEARCH.to_string(),
        agents_url: LISTING.to_string(),
        metrics_url: METRICS.to_string(),
        origin: String::from("https://agdp.io"),
    };
    Resolver::new(
        MarketplaceClient::new(http.clone(), endpoints),
        RetryConfig::fixed(Duration::ZERO, 3),
    )
}

fn brief(http: &Arc<ScriptedHttpClient>) -> AgentBrief {
    AgentBrief::new(CacheStore::in_memory(), resolver(http))
}

fn digest(http: &Arc<ScriptedHttpClient>) -> OfferingsDigest {
    OfferingsDigest::new(CacheStore::in_memory(), resolver(http))
}

fn health(http: &Arc<ScriptedHttpClient>) -> EcosystemHealthCheck {
    let dex = DexClient::new(http.clone(), PAIRS, RetryConfig::fixed(Duration::ZERO, 3));
    EcosystemHealthCheck::new(CacheStore::in_memory(), dex, "base")
}

async fn run(offering: &dyn JobOffering, request: Value) -> Value {
    offering
        .execute_job(&request)
        .await
        .to_value()
        .expect("deliverable is JSON")
}

const AGENT: &str = r#"{"data":[{
    "id": 9,
    "name": "Alpha",
    "description": "Market making agent",
    "walletAddress": "0xalpha",
    "tokenAddress": "0xtoken",
    "symbol": "ALP",
    "category": "trading",
    "metrics": {"successfulJobCount": 120, "successRate": 98.5, "uniqueBuyerCount": 30, "isOnline": true},
    "jobs": [
        {"name": "quote", "description": "Quote a pair", "price": 1.5, "priceV2": {"type": "fixed"}, "requiredFunds": false},
        {"name": "swap", "description": "Execute a swap", "price": 0.01, "priceV2": {"type": "percentage"}, "requiredFunds": true}
    ]
}]}"#;

const DIGEST_AGENTS: &str = r#"{"data":[
    {"name": "Online Seller", "walletAddress": "0x1", "metrics": {"isOnline": true, "successRate": 90.0, "successfulJobCount": 10},
     "jobs": [{"name": "audit", "description": "Audit a contract", "price": 5.0}]},
    {"name": "Offline Seller", "walletAddress": "0x2", "metrics": {"isOnline": false},
     "jobs": [{"name": "report", "description": "Write a report", "price": 0.5}, {"name": "chart", "description": "Draw a chart", "price": 2.0}]},
    {"name": "Idle Agent", "walletAddress": "0x3", "metrics": {"isOnline": true}, "jobs": []}
]}"#;

fn pairs_body() -> String {
    let created = sentinel_core::Timestamp::now().unix_millis() - 90 * 24 * 60 * 60 * 1000;
    json!({
        "pairs": [
            {
                "chainId": "ethereum",
                "dexId": "uniswap",
                "pairAddress": "0xeth",
                "baseToken": {"address": TOKEN, "name": "Pulse", "symbol": "PLS"},
                "liquidity": {"usd": 9_000_000.0}
            },
            {
                "chainId": "base",
                "dexId": "aerodrome",
                "pairAddress": "0xbase",
                "baseToken": {"address": TOKEN, "name": "Pulse", "symbol": "PLS"},
                "priceUsd": "0.42",
                "liquidity": {"usd": 250_000.0},
                "volume": {"h24": 500_000.0},
                "txns": {"h24": {"buys": 900, "sells": 200}},
                "priceChange": {"h24": 2.0},
                "pairCreatedAt": created
            }
        ]
    })
    .to_string()
}

// =============================================================================
// Offerings: Agent Brief
// =============================================================================

#[tokio::test]
async fn when_agent_is_found_system_builds_a_brief_and_caches_it() {
    // Given: A search endpoint that knows the agent
    let http = Arc::new(ScriptedHttpClient::new().on_json(SEARCH, AGENT));
    let offering = brief(&http);

    // When: The brief is requested twice with different spelling
    let first = run(&offering, json!({"agentName": "alpha"})).await;
    let second = run(&offering, json!({"agentName": "  ALPHA "})).await;

    // Then: The report is complete and the second run made no upstream call
    assert_eq!(first["agentId"], 9);
    assert_eq!(first["name"], "Alpha");
    assert_eq!(first["walletAddress"], "0xalpha");
    assert_eq!(first["token"]["symbol"], "ALP");
    assert_eq!(first["metrics"]["isOnline"], true);
    assert_eq!(first["metrics"]["successfulJobs"], 120);
    assert_eq!(first["offerings"].as_array().map(Vec::len), Some(2));
    assert_eq!(first["offerings"][1]["priceType"], "percentage");
    assert!(first["human_summary"]
        .as_str()
        .is_some_and(|summary| summary.contains("Alpha")));
    assert_eq!(first, second);
    assert_eq!(http.recorded_requests().len(), 1);
}

#[tokio::test]
async fn when_brief_lists_offerings_system_keeps_the_reported_price_precision() {
    // Given: One fixed-price and one commission offering
    let http = Arc::new(ScriptedHttpClient::new().on_json(SEARCH, AGENT));

    // When: The brief is built
    let report = run(&brief(&http), json!({"agentName": "Alpha"})).await;

    // Then: The fixed price is shown as reported, the commission as a percentage
    let summary = report["human_summary"].as_str().expect("summary");
    assert!(summary.contains("  - quote: $1.5 USDC\n"), "{summary}");
    assert!(
        summary.contains("  - swap: 1.0% commission [requires funds]"),
        "{summary}"
    );
}

#[tokio::test]
async fn when_agent_is_unknown_system_returns_agent_not_found_and_caches_nothing() {
    // Given: Both tiers come back empty
    let http = Arc::new(
        ScriptedHttpClient::new()
            .on_json(SEARCH, r#"{"data":[]}"#)
            .on_json(LISTING, r#"{"data":[]}"#),
    );
    let offering = brief(&http);

    // When: The brief is requested twice
    let first = run(&offering, json!({"agentName": "ghost"})).await;
    let _ = run(&offering, json!({"agentName": "ghost"})).await;

    // Then: The error names the query and both runs reached the upstream
    assert_eq!(first["error"], "agent_not_found");
    assert_eq!(first["query"], "ghost");
    assert_eq!(http.request_count(SEARCH), 2);
}

#[tokio::test]
async fn when_marketplace_is_down_system_returns_search_failed() {
    // Given: Search and listing both failing
    let http = Arc::new(
        ScriptedHttpClient::new()
            .on_status(SEARCH, 500)
            .on_status(LISTING, 503),
    );

    // When: A brief is requested
    let result = run(&brief(&http), json!({"agentName": "alpha"})).await;

    // Then: The failure is a deliverable, not a panic or error
    assert_eq!(result["error"], "search_failed");
    assert!(result["message"].as_str().is_some_and(|m| m.contains("503")));
}

#[tokio::test]
async fn when_agent_name_is_missing_system_rejects_and_errors_without_upstream_calls() {
    // Given: A request without agentName
    let http = Arc::new(ScriptedHttpClient::new());
    let offering = brief(&http);
    let request = json!({"agentName": "   "});

    // When: It is validated and executed
    let validation = offering.validate_requirements(&request);
    let result = run(&offering, request).await;

    // Then: Validation fails and execution reports the missing field
    assert!(!validation.valid);
    assert_eq!(result["error"], "agentName is required");
    assert!(http.recorded_requests().is_empty());
}

// =============================================================================
// Offerings: Ecosystem Health Check
// =============================================================================

#[tokio::test]
async fn when_token_trades_on_the_preferred_chain_system_scores_that_pair() {
    // Given: A deep pair on another chain and a healthy pair on base
    let http = Arc::new(ScriptedHttpClient::new().on_json(PAIRS, pairs_body()));
    let offering = health(&http);

    // When: The health check runs twice
    let first = run(&offering, json!({"tokenAddress": TOKEN})).await;
    let second = run(&offering, json!({"tokenAddress": TOKEN.to_lowercase()})).await;

    // Then: The base pair is scored and the repeat is served from the cache
    assert_eq!(first["chain"], "base");
    assert_eq!(first["pairAddress"], "0xbase");
    assert_eq!(first["healthScore"], 90);
    assert_eq!(first["grade"], "HEALTHY");
    assert_eq!(first["flags"], json!([]));
    assert_eq!(first["metrics"]["txns24h"]["buys"], 900);
    assert_eq!(first, second);
    assert_eq!(http.request_count(PAIRS), 1);
}

#[tokio::test]
async fn when_token_has_no_pairs_system_returns_token_not_found() {
    // Given: The pairs endpoint answers 404
    let http = Arc::new(ScriptedHttpClient::new().on_status(PAIRS, 404));

    // When: The health check runs
    let result = run(&health(&http), json!({"tokenAddress": TOKEN})).await;

    // Then: The error carries the requested address
    assert_eq!(result["error"], "token_not_found");
    assert_eq!(result["tokenAddress"], TOKEN);
}

#[tokio::test]
async fn when_pairs_endpoint_keeps_failing_system_returns_health_check_failed() {
    // Given: A pairs endpoint that is always unavailable
    let http = Arc::new(ScriptedHttpClient::new().on_status(PAIRS, 503));

    // When: The health check runs
    let result = run(&health(&http), json!({"tokenAddress": TOKEN})).await;

    // Then: All attempts were spent before the error deliverable
    assert_eq!(result["error"], "health_check_failed");
    assert_eq!(http.request_count(PAIRS), 3);
}

#[test]
fn when_address_is_malformed_system_rejects_the_request() {
    // Given: A health check offering
    let http = Arc::new(ScriptedHttpClient::new());
    let offering = health(&http);

    // When: Requests with various addresses are validated
    let valid = offering.validate_requirements(&json!({"tokenAddress": TOKEN}));
    let short = offering.validate_requirements(&json!({"tokenAddress": "0x1234"}));
    let missing = offering.validate_requirements(&json!({}));

    // Then: Only the well-formed address passes
    assert!(valid.valid);
    assert!(!short.valid);
    assert!(short
        .reason
        .as_deref()
        .is_some_and(|reason| reason.contains("EVM address")));
    assert!(!missing.valid);
}

// =============================================================================
// Offerings: Offerings Digest
// =============================================================================

#[tokio::test]
async fn when_digest_is_requested_system_keeps_only_agents_with_offerings() {
    // Given: Three agents, one without offerings
    let http = Arc::new(ScriptedHttpClient::new().on_json(SEARCH, DIGEST_AGENTS));

    // When: A digest is requested with an oversized maxResults
    let result = run(&digest(&http), json!({"query": "audit", "maxResults": 50})).await;

    // Then: The limit is clamped and only sellers appear
    assert_eq!(http.recorded_requests()[0].query_value("topK"), Some("20"));
    assert_eq!(result["totalAgentsSearched"], 3);
    assert_eq!(result["agentsWithOfferings"], 2);
    assert_eq!(result["totalOfferings"], 3);
    assert_eq!(result["digest"][1]["offerings"][0]["price"], "$0.50 USDC");
}

#[tokio::test]
async fn when_digest_is_online_only_system_drops_offline_sellers() {
    // Given: One online and one offline seller
    let http = Arc::new(ScriptedHttpClient::new().on_json(SEARCH, DIGEST_AGENTS));

    // When: An online-only digest is requested
    let result = run(&digest(&http), json!({"query": "audit", "onlineOnly": true})).await;

    // Then: Only the online seller remains and the default limit applies
    assert_eq!(http.recorded_requests()[0].query_value("topK"), Some("10"));
    assert_eq!(result["onlineOnly"], true);
    assert_eq!(result["agentsWithOfferings"], 1);
    assert_eq!(result["digest"][0]["agentName"], "Online Seller");
}

#[tokio::test]
async fn when_digest_flags_differ_system_caches_them_separately() {
    // Given: A digest offering
    let http = Arc::new(ScriptedHttpClient::new().on_json(SEARCH, DIGEST_AGENTS));
    let offering = digest(&http);

    // When: The same query runs with and without onlineOnly, then repeats
    run(&offering, json!({"query": "Audit"})).await;
    run(&offering, json!({"query": "Audit", "onlineOnly": true})).await;
    run(&offering, json!({"query": "audit"})).await;

    // Then: Two distinct upstream calls were made
    assert_eq!(http.request_count(SEARCH), 2);
}

#[test]
fn when_max_results_is_not_positive_system_rejects_the_request() {
    let http = Arc::new(ScriptedHttpClient::new());
    let offering = digest(&http);

    assert!(offering
        .validate_requirements(&json!({"query": "audit", "maxResults": 3}))
        .valid);
    assert!(!offering
        .validate_requirements(&json!({"query": "audit", "maxResults": 0}))
        .valid);
    assert!(!offering
        .validate_requirements(&json!({"query": "audit", "maxResults": "many"}))
        .valid);
    assert!(!offering.validate_requirements(&json!({})).valid);
}

// =============================================================================
// Offerings: Payment Prompts and Registry
// =============================================================================

#[test]
fn when_payment_is_requested_system_names_the_subject() {
    let http = Arc::new(ScriptedHttpClient::new());

    assert_eq!(
        brief(&http).request_payment(&json!({"agentName": "Alpha"})),
        "Preparing intelligence brief for agent \"Alpha\". Please proceed with payment."
    );
    assert_eq!(
        health(&http).request_payment(&json!({"tokenAddress": TOKEN})),
        format!("Running health check for token {TOKEN}. Please proceed with payment.")
    );
    assert_eq!(
        digest(&http).request_payment(&json!({"query": "audit"})),
        "Preparing offerings digest for \"audit\". Please proceed with payment."
    );
}

#[test]
fn when_registry_is_built_system_exposes_three_offerings_sharing_one_cache() {
    // Given: A registry wired with scripted offerings
    let http = Arc::new(ScriptedHttpClient::new());
    let cache = CacheStore::in_memory();
    let offerings: Vec<Arc<dyn JobOffering>> = vec![
        Arc::new(AgentBrief::new(cache.clone(), resolver(&http))),
        Arc::new(health(&http)),
        Arc::new(OfferingsDigest::new(cache.clone(), resolver(&http))),
    ];
    let registry = OfferingRegistry::new(offerings, cache);

    // Then: Lookup works by name and unknown names are rejected
    assert_eq!(
        registry.names(),
        vec!["agent_brief", "ecosystem_health_check", "offerings_digest"]
    );
    assert!(registry.get("offerings_digest").is_some());
    assert!(registry.require("market_maker").is_err());
}
