//! # Domain Models
//!
//! Normalized shapes the core hands to offerings.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MarketplaceEntity`] | Marketplace agent with metrics, offerings and resources |
//! | [`TradingPair`] | One DEX pair snapshot for a token |
//! | [`Timestamp`] | Unix-millisecond instant used by the cache and pair ages |
//!
//! Both entity types are transient: they are rebuilt per request and only
//! outlive it inside a cached, serialized deliverable.

mod entity;
mod pair;
mod timestamp;

pub use entity::{EntityMetrics, MarketplaceEntity, Offering, PriceType, Resource, TokenRef};
pub use pair::{Liquidity, PairToken, TradingPair, TxnCount, Windowed};
pub use timestamp::Timestamp;
