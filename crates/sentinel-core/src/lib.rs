//! # Sentinel Core
//!
//! Resilient retrieval, caching and health scoring behind the Sentinel seller
//! offerings.
//!
//! ## Overview
//!
//! - **Retry executor** with bounded attempts and linear backoff
//! - **TTL cache store** persisted through a swappable backend
//! - **Dual-tier resolution** of marketplace agents (fast search, reliable listing)
//! - **Token pair lookup** and a deterministic **health score**
//! - **Offering handlers** that tie the above into serialized deliverables
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL cache store and its JSON / DuckDB / memory backends |
//! | [`config`] | `SENTINEL_*` environment configuration |
//! | [`dex`] | Token pairs lookup and primary pair selection |
//! | [`domain`] | Normalized marketplace entities and trading pairs |
//! | [`error`] | Input and configuration validation errors |
//! | [`health`] | Health scoring engine |
//! | [`http_client`] | HTTP client abstraction |
//! | [`marketplace`] | Marketplace client and tiered resolver |
//! | [`offerings`] | Job offerings and their registry |
//! | [`retry`] | Retry executor |
//! | [`upstream`] | Endpoint identities and upstream errors |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sentinel_core::{OfferingRegistry, ReqwestHttpClient, SentinelConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SentinelConfig::from_env()?;
//!     let registry = OfferingRegistry::from_config(&config, Arc::new(ReqwestHttpClient::new()));
//!
//!     let brief = registry.require("agent_brief")?;
//!     let result = brief
//!         .execute_job(&serde_json::json!({ "agentName": "Alpha" }))
//!         .await;
//!     println!("{}", result.deliverable);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Job lifecycle   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Offering        │────▶│ Cache Store      │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Resolver / Dex  │────▶│ Retry Executor   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HTTP Client     │     │ Health Scoring   │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Upstream failures carry the endpoint that produced them and a stable code:
//!
//! ```rust
//! use sentinel_core::{Endpoint, UpstreamError};
//!
//! fn describe(error: &UpstreamError) -> String {
//!     match error.endpoint() {
//!         Endpoint::Listing => format!("listing unavailable ({})", error.code()),
//!         other => format!("{other} failed"),
//!     }
//! }
//! ```

pub mod cache;
pub mod config;
pub mod dex;
pub mod domain;
pub mod error;
pub mod health;
pub mod http_client;
pub mod marketplace;
pub mod offerings;
pub mod retry;
pub mod upstream;

// Caching
pub use cache::{
    cache_key, CacheBackend, CacheBackendError, CacheDocument, CacheEntry, CachePolicy,
    CacheRequest, CacheStats, CacheStore, DuckDbBackend, JsonFileBackend, MemoryBackend,
};

// Configuration
pub use config::{CacheBackendKind, SentinelConfig};

// Token pairs
pub use dex::{select_primary_pair, DexClient};

// Domain models
pub use domain::{
    EntityMetrics, Liquidity, MarketplaceEntity, Offering, PairToken, PriceType, Resource,
    Timestamp, TokenRef, TradingPair, TxnCount, Windowed,
};

// Error types
pub use error::ValidationError;

// Health scoring
pub use health::{HealthAssessment, HealthFlag, HealthGrade};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};

// Marketplace resolution
pub use marketplace::{MarketplaceClient, MarketplaceEndpoints, Resolver, Tier, TierStep};

// Offerings
pub use offerings::{
    AgentBrief, EcosystemHealthCheck, JobOffering, JobRequest, JobResult, OfferingRegistry,
    OfferingsDigest, Validation,
};

// Retry logic
pub use retry::{Backoff, RetryConfig, RetrySignal};

// Upstream
pub use upstream::{Endpoint, UpstreamError};
