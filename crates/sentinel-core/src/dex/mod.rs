//! Token pair lookup against the DEX aggregator.

mod payload;

use std::sync::Arc;

use crate::domain::TradingPair;
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::RetryConfig;
use crate::upstream::{fetch_json, Endpoint, UpstreamError};

use self::payload::{RawPair, TokenPairsResponse};

pub const DEFAULT_TOKEN_PAIRS_URL: &str = "https://api.dexscreener.com/latest/dex/tokens";
pub const DEFAULT_PREFERRED_CHAIN: &str = "base";

/// Retrying client for the token-pairs-by-address endpoint.
#[derive(Clone)]
pub struct DexClient {
    http: Arc<dyn HttpClient>,
    token_pairs_url: String,
    retry: RetryConfig,
}

impl DexClient {
    pub fn new(http: Arc<dyn HttpClient>, token_pairs_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            http,
            token_pairs_url: token_pairs_url.into(),
            retry,
        }
    }

    /// Every pair listed for `address`; empty when the token is unknown.
    pub async fn token_pairs(&self, address: &str) -> Result<Vec<TradingPair>, UpstreamError> {
        let url = format!("{}/{address}", self.token_pairs_url.trim_end_matches('/'));
        let label = format!("token pairs {address}");

        let response = self
            .retry
            .run(&label, || {
                fetch_json::<TokenPairsResponse>(
                    self.http.as_ref(),
                    Endpoint::TokenPairs,
                    HttpRequest::get(url.as_str()),
                )
            })
            .await;

        match response {
            Ok(body) => Ok(body
                .pairs
                .unwrap_or_default()
                .into_iter()
                .map(RawPair::into_pair)
                .collect()),
            Err(error) if error.is_not_found() => Ok(Vec::new()),
            Err(error) => Err(error),
        }
    }

    /// Primary pair for `address` on `preferred_chain`, if any pair exists.
    pub async fn primary_pair(
        &self,
        address: &str,
        preferred_chain: &str,
    ) -> Result<Option<TradingPair>, UpstreamError> {
        let pairs = self.token_pairs(address).await?;
        Ok(select_primary_pair(pairs, preferred_chain))
    }
}

/// Deepest-liquidity pair on `preferred_chain`; the first pair when none are on it.
pub fn select_primary_pair(pairs: Vec<TradingPair>, preferred_chain: &str) -> Option<TradingPair> {
    let mut fallback = None;
    let mut best: Option<TradingPair> = None;

    for pair in pairs {
        if pair.chain_id == preferred_chain {
            let deeper = best
                .as_ref()
                .map_or(true, |current| pair.liquidity_usd() > current.liquidity_usd());
            if deeper {
                best = Some(pair);
            }
        } else if fallback.is_none() {
            fallback = Some(pair);
        }
    }

    best.or(fallback)
}
