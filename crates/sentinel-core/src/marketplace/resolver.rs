use std::fmt::{Display, Formatter};
use std::future::Future;

use crate::domain::MarketplaceEntity;
use crate::retry::RetryConfig;
use crate::upstream::UpstreamError;

use super::client::MarketplaceClient;
use super::payload::enrich;

/// Candidates requested from either tier for a single-entity lookup.
pub const SINGLE_LOOKUP_SIZE: usize = 3;
/// Listing page size for a single-entity lookup.
pub const SINGLE_LISTING_PAGE_SIZE: usize = 5;

/// One lookup strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Hybrid search, one attempt.
    Fast,
    /// Filtered listing under the retry executor.
    Reliable,
}

impl Tier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Reliable => "reliable",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a resolution in the tier progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierStep {
    Try(Tier),
    Found(Tier),
    NotFound,
    Failed,
}

impl TierStep {
    pub const START: Self = Self::Try(Tier::Fast);

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Try(_))
    }
}

/// Result of running one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierOutcome {
    Hit,
    Miss,
    Failed,
}

/// Pure transition function of the resolution state machine.
///
/// The fast tier falls through on both a miss and a failure. The reliable
/// tier is last, so its miss is `NotFound` and its failure is `Failed`.
/// Terminal steps absorb every outcome.
pub const fn advance(step: TierStep, outcome: TierOutcome) -> TierStep {
    match (step, outcome) {
        (TierStep::Try(tier), TierOutcome::Hit) => TierStep::Found(tier),
        (TierStep::Try(Tier::Fast), _) => TierStep::Try(Tier::Reliable),
        (TierStep::Try(Tier::Reliable), TierOutcome::Miss) => TierStep::NotFound,
        (TierStep::Try(Tier::Reliable), TierOutcome::Failed) => TierStep::Failed,
        (terminal, _) => terminal,
    }
}

/// Exact case-insensitive name match first, otherwise the first candidate.
pub fn select_candidate(
    mut candidates: Vec<MarketplaceEntity>,
    query: &str,
) -> Option<MarketplaceEntity> {
    let position = candidates
        .iter()
        .position(|candidate| candidate.name_matches(query))
        .unwrap_or(0);
    if candidates.is_empty() {
        None
    } else {
        Some(candidates.swap_remove(position))
    }
}

/// Dual-tier marketplace lookup.
#[derive(Clone)]
pub struct Resolver {
    client: MarketplaceClient,
    retry: RetryConfig,
}

impl Resolver {
    pub fn new(client: MarketplaceClient, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Best single entity for `query`.
    ///
    /// `Ok(None)` when both tiers come back empty; `Err` only when the
    /// reliable tier fails after its retries.
    pub async fn resolve(&self, query: &str) -> Result<Option<MarketplaceEntity>, UpstreamError> {
        self.run_tiers(query, |tier| self.resolve_with(tier, query))
            .await
    }

    /// Up to `limit` entities for `query`, without enrichment.
    pub async fn resolve_many(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MarketplaceEntity>, UpstreamError> {
        let found = self
            .run_tiers(query, |tier| self.resolve_many_with(tier, query, limit))
            .await?;
        Ok(found.unwrap_or_default())
    }

    async fn run_tiers<T, F, Fut>(
        &self,
        query: &str,
        mut lookup: F,
    ) -> Result<Option<T>, UpstreamError>
    where
        F: FnMut(Tier) -> Fut,
        Fut: Future<Output = Result<Option<T>, UpstreamError>>,
    {
        let mut step = TierStep::START;
        let mut found = None;
        let mut failure = None;

        while let TierStep::Try(tier) = step {
            let outcome = match lookup(tier).await {
                Ok(Some(value)) => {
                    found = Some(value);
                    TierOutcome::Hit
                }
                Ok(None) => {
                    tracing::debug!(%tier, query, "tier returned no candidates");
                    TierOutcome::Miss
                }
                Err(error) => {
                    tracing::warn!(%tier, query, %error, "tier failed");
                    failure = Some(error);
                    TierOutcome::Failed
                }
            };
            step = advance(step, outcome);
        }

        match step {
            TierStep::Found(tier) => {
                tracing::info!(%tier, query, "marketplace lookup resolved");
                Ok(found)
            }
            TierStep::Failed => match failure {
                Some(error) => Err(error),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    async fn resolve_with(
        &self,
        tier: Tier,
        query: &str,
    ) -> Result<Option<MarketplaceEntity>, UpstreamError> {
        match tier {
            Tier::Fast => {
                let candidates = self.client.search(query, SINGLE_LOOKUP_SIZE).await?;
                Ok(select_candidate(candidates, query))
            }
            Tier::Reliable => {
                let candidates = self
                    .retry
                    .run("marketplace listing", || {
                        self.client.listing(query, SINGLE_LISTING_PAGE_SIZE)
                    })
                    .await?;
                match select_candidate(candidates, query) {
                    Some(entity) => Ok(Some(self.enrich(entity).await)),
                    None => Ok(None),
                }
            }
        }
    }

    async fn resolve_many_with(
        &self,
        tier: Tier,
        query: &str,
        limit: usize,
    ) -> Result<Option<Vec<MarketplaceEntity>>, UpstreamError> {
        let candidates = match tier {
            Tier::Fast => self.client.search(query, limit).await?,
            Tier::Reliable => {
                self.retry
                    .run("marketplace listing", || self.client.listing(query, limit))
                    .await?
            }
        };
        Ok(Some(candidates).filter(|candidates| !candidates.is_empty()))
    }

    /// Best-effort metrics overlay; any failure keeps the listing fields.
    async fn enrich(&self, entity: MarketplaceEntity) -> MarketplaceEntity {
        let Some(id) = entity.id else {
            return entity;
        };

        match self.client.agent_metrics(id).await {
            Ok(Some(metrics)) => enrich(entity, metrics),
            Ok(None) => entity,
            Err(error) => {
                tracing::debug!(agent_id = id, %error, "metrics enrichment skipped");
                entity
            }
        }
    }
}
