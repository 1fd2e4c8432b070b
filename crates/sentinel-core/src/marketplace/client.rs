use std::sync::Arc;

use crate::domain::MarketplaceEntity;
use crate::http_client::{HttpClient, HttpRequest};
use crate::upstream::{fetch_json, Endpoint, UpstreamError};

use super::payload::{Envelope, RawAgent, RawMetrics};

pub const DEFAULT_SEARCH_URL: &str = "http://acpx.virtuals.io/api/agents/v5/search";
pub const DEFAULT_AGENTS_URL: &str = "https://acpx.virtuals.io/api/agents";
pub const DEFAULT_METRICS_URL: &str = "https://acpx.virtuals.io/api/metrics/agent";
pub const DEFAULT_ORIGIN: &str = "https://agdp.io";

/// Base URLs of the three marketplace endpoints plus the attribution origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceEndpoints {
    /// Hybrid semantic search, queried with `query`, `topK` and `searchMode`.
    pub search_url: String,
    /// Paginated listing with a case-insensitive name filter.
    pub agents_url: String,
    /// Per-agent metrics; the agent id is appended as a path segment.
    pub metrics_url: String,
    /// Sent as `Origin` and `Referer` on every marketplace request.
    pub origin: String,
}

impl Default for MarketplaceEndpoints {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            agents_url: DEFAULT_AGENTS_URL.to_string(),
            metrics_url: DEFAULT_METRICS_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

/// Single-call access to the marketplace endpoints; no retry, no fallback.
#[derive(Clone)]
pub struct MarketplaceClient {
    http: Arc<dyn HttpClient>,
    endpoints: MarketplaceEndpoints,
}

impl MarketplaceClient {
    pub fn new(http: Arc<dyn HttpClient>, endpoints: MarketplaceEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Hybrid semantic search.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<MarketplaceEntity>, UpstreamError> {
        let request = HttpRequest::get(&self.endpoints.search_url)
            .with_query("query", query)
            .with_query("claw", "true")
            .with_query("topK", top_k.to_string())
            .with_query("searchMode", "hybrid");

        let envelope: Envelope<Vec<RawAgent>> =
            fetch_json(self.http.as_ref(), Endpoint::Search, request).await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(RawAgent::into_search_entity)
            .collect())
    }

    /// Case-insensitive substring filter over the paginated agent listing.
    pub async fn listing(
        &self,
        query: &str,
        page_size: usize,
    ) -> Result<Vec<MarketplaceEntity>, UpstreamError> {
        let request = self
            .attributed(HttpRequest::get(&self.endpoints.agents_url))
            .with_query("filters[name][$containsi]", query)
            .with_query("pagination[pageSize]", page_size.to_string());

        let envelope: Envelope<Vec<RawAgent>> =
            fetch_json(self.http.as_ref(), Endpoint::Listing, request).await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(RawAgent::into_listing_entity)
            .collect())
    }

    /// Performance metrics for one agent id; `None` when the payload has no data.
    pub(crate) async fn agent_metrics(&self, id: u64) -> Result<Option<RawMetrics>, UpstreamError> {
        let url = format!("{}/{id}", self.endpoints.metrics_url.trim_end_matches('/'));
        let request = self.attributed(HttpRequest::get(url));

        let envelope: Envelope<RawMetrics> =
            fetch_json(self.http.as_ref(), Endpoint::AgentMetrics, request).await?;
        Ok(envelope.data)
    }

    fn attributed(&self, request: HttpRequest) -> HttpRequest {
        let origin = self.endpoints.origin.trim_end_matches('/');
        request
            .with_header("Accept", "application/json")
            .with_header("Origin", origin)
            .with_header("Referer", format!("{origin}/"))
    }
}
