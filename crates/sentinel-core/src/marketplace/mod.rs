//! # Marketplace Resolution
//!
//! Resolves a free-text agent query through two upstream tiers:
//!
//! | Tier | Endpoint | Retry | On failure |
//! |------|----------|-------|------------|
//! | [`Tier::Fast`] | hybrid search | none | fall through |
//! | [`Tier::Reliable`] | filtered listing (+ metrics enrichment) | [`RetryConfig`](crate::retry::RetryConfig) | surfaced |
//!
//! Both tiers normalize into [`MarketplaceEntity`](crate::domain::MarketplaceEntity),
//! so callers cannot tell which tier answered.

mod client;
mod payload;
mod resolver;

pub use client::{
    MarketplaceClient, MarketplaceEndpoints, DEFAULT_AGENTS_URL, DEFAULT_METRICS_URL,
    DEFAULT_ORIGIN, DEFAULT_SEARCH_URL,
};
pub use resolver::{
    advance, select_candidate, Resolver, Tier, TierOutcome, TierStep, SINGLE_LISTING_PAGE_SIZE,
    SINGLE_LOOKUP_SIZE,
};
