use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::SentinelConfig;
use crate::dex::DexClient;
use crate::error::ValidationError;
use crate::http_client::HttpClient;
use crate::marketplace::{MarketplaceClient, Resolver};

use super::{AgentBrief, EcosystemHealthCheck, JobOffering, OfferingsDigest};

/// The seller's offerings, looked up by name.
#[derive(Clone)]
pub struct OfferingRegistry {
    offerings: Vec<Arc<dyn JobOffering>>,
    cache: CacheStore,
}

impl OfferingRegistry {
    pub fn new(offerings: Vec<Arc<dyn JobOffering>>, cache: CacheStore) -> Self {
        Self { offerings, cache }
    }

    /// Wires all three offerings over one cache store and one transport.
    pub fn from_config(config: &SentinelConfig, http: Arc<dyn HttpClient>) -> Self {
        let cache = config.cache_store();
        let retry = config.retry();
        let resolver = Resolver::new(
            MarketplaceClient::new(http.clone(), config.marketplace.clone()),
            retry.clone(),
        );
        let dex = DexClient::new(http, config.token_pairs_url.clone(), retry);

        let offerings: Vec<Arc<dyn JobOffering>> = vec![
            Arc::new(AgentBrief::new(cache.clone(), resolver.clone())),
            Arc::new(EcosystemHealthCheck::new(
                cache.clone(),
                dex,
                config.preferred_chain.clone(),
            )),
            Arc::new(OfferingsDigest::new(cache.clone(), resolver)),
        ];
        Self::new(offerings, cache)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.offerings.iter().map(|offering| offering.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn JobOffering>> {
        self.offerings
            .iter()
            .find(|offering| offering.name() == name)
            .cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<dyn JobOffering>, ValidationError> {
        self.get(name).ok_or_else(|| ValidationError::UnknownOffering {
            value: name.to_string(),
        })
    }

    /// Store shared by every registered offering.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }
}
