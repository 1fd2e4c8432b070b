use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheRequest, CacheStore};
use crate::domain::MarketplaceEntity;
use crate::error::ValidationError;
use crate::marketplace::Resolver;

use super::{
    display_field, require_text, summary_rule, text_field, to_deliverable, ErrorDeliverable,
    JobOffering, JobRequest, JobResult, Validation, SUMMARY_FOOTER,
};

const NAME: &str = "offerings_digest";

pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const MAX_RESULTS_LIMIT: usize = 20;

const DESCRIPTION_LIMIT: usize = 120;

/// Marketplace-wide digest of the offerings matching a query.
#[derive(Clone)]
pub struct OfferingsDigest {
    cache: CacheStore,
    resolver: Resolver,
}

impl OfferingsDigest {
    pub fn new(cache: CacheStore, resolver: Resolver) -> Self {
        Self { cache, resolver }
    }

    fn check(request: &JobRequest) -> Result<(), ValidationError> {
        require_text(request, "query")?;
        match request.get("maxResults") {
            None | Some(Value::Null) => Ok(()),
            Some(value) if value.as_f64().is_some_and(|max| max >= 1.0) => Ok(()),
            Some(_) => Err(ValidationError::NotPositive {
                field: "maxResults",
            }),
        }
    }

    async fn execute(&self, request: &JobRequest) -> JobResult {
        let Some(query) = text_field(request, "query") else {
            return ErrorDeliverable::missing_field("query", "Error: No search query provided.")
                .into_result();
        };
        let max_results = max_results(request);
        let online_only = request
            .get("onlineOnly")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let key = CacheRequest::from([
            (String::from("query"), Value::String(query.to_lowercase())),
            (String::from("maxResults"), Value::from(max_results)),
            (String::from("onlineOnly"), Value::Bool(online_only)),
        ]);
        if let Some(cached) = self.cache.get(NAME, &key).await {
            return JobResult::new(cached);
        }

        match self.resolver.resolve_many(&query, max_results).await {
            Ok(agents) => {
                let report = DigestReport::new(&query, &agents, online_only);
                let deliverable = to_deliverable(&report);
                self.cache.put(NAME, &key, deliverable.clone()).await;
                JobResult::new(deliverable)
            }
            Err(error) => ErrorDeliverable::new(
                "digest_failed",
                format!("Failed to generate offerings digest: {error}"),
            )
            .with_message(error.to_string())
            .into_result(),
        }
    }
}

/// `maxResults` clamped to `1..=20`, defaulting to 10.
pub(crate) fn max_results(request: &JobRequest) -> usize {
    request
        .get("maxResults")
        .and_then(Value::as_f64)
        .map_or(DEFAULT_MAX_RESULTS, |max| {
            max.clamp(1.0, MAX_RESULTS_LIMIT as f64) as usize
        })
}

impl JobOffering for OfferingsDigest {
    fn name(&self) -> &'static str {
        NAME
    }

    fn validate_requirements(&self, request: &JobRequest) -> Validation {
        Self::check(request).into()
    }

    fn request_payment(&self, request: &JobRequest) -> String {
        format!(
            "Preparing offerings digest for \"{}\". Please proceed with payment.",
            display_field(request, "query")
        )
    }

    fn execute_job<'a>(
        &'a self,
        request: &'a JobRequest,
    ) -> Pin<Box<dyn Future<Output = JobResult> + Send + 'a>> {
        Box::pin(self.execute(request))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DigestReport<'a> {
    query: &'a str,
    total_agents_searched: usize,
    agents_with_offerings: usize,
    total_offerings: usize,
    online_only: bool,
    digest: Vec<DigestEntry<'a>>,
    #[serde(rename = "human_summary")]
    human_summary: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DigestEntry<'a> {
    agent_name: &'a str,
    agent_wallet: &'a str,
    is_online: bool,
    success_rate: Option<f64>,
    completed_jobs: Option<u64>,
    offerings: Vec<DigestOffering<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DigestOffering<'a> {
    name: &'a str,
    description: &'a str,
    price: String,
    required_funds: bool,
}

impl<'a> DigestReport<'a> {
    fn new(query: &'a str, agents: &'a [MarketplaceEntity], online_only: bool) -> Self {
        let digest: Vec<DigestEntry<'a>> = agents
            .iter()
            .filter(|agent| agent.has_offerings())
            .filter(|agent| !online_only || agent.metrics.is_online)
            .map(DigestEntry::from_entity)
            .collect();
        let total_offerings = digest.iter().map(|entry| entry.offerings.len()).sum();
        let human_summary = human_summary(query, &digest, total_offerings);

        Self {
            query,
            total_agents_searched: agents.len(),
            agents_with_offerings: digest.len(),
            total_offerings,
            online_only,
            digest,
            human_summary,
        }
    }
}

impl<'a> DigestEntry<'a> {
    fn from_entity(entity: &'a MarketplaceEntity) -> Self {
        Self {
            agent_name: &entity.name,
            agent_wallet: &entity.wallet_address,
            is_online: entity.metrics.is_online,
            success_rate: entity.metrics.success_rate,
            completed_jobs: entity.metrics.successful_job_count,
            offerings: entity
                .offerings
                .iter()
                .map(|offering| DigestOffering {
                    name: &offering.name,
                    description: &offering.description,
                    price: offering.price_label(),
                    required_funds: offering.required_funds,
                })
                .collect(),
        }
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_LIMIT {
        let head: String = text.chars().take(DESCRIPTION_LIMIT - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn human_summary(query: &str, digest: &[DigestEntry<'_>], total_offerings: usize) -> String {
    let mut lines = vec![
        format!("OFFERINGS DIGEST: \"{query}\""),
        summary_rule(),
        format!(
            "Found {} agents with {total_offerings} total offerings",
            digest.len()
        ),
    ];

    if digest.is_empty() {
        lines.push(String::from("\nNo agents with offerings found for this query."));
        lines.push(String::from(
            "Try a broader search term or check agdp.io for the full marketplace.",
        ));
        lines.push(SUMMARY_FOOTER.to_string());
        return lines.join("\n");
    }

    for (index, entry) in digest.iter().enumerate() {
        let status = if entry.is_online { "ONLINE" } else { "offline" };
        let rate = entry
            .success_rate
            .map_or_else(|| String::from("no data"), |rate| format!("{rate:.0}% success"));
        let jobs = entry
            .completed_jobs
            .map(|jobs| format!(", {jobs} jobs done"))
            .unwrap_or_default();
        lines.push(format!(
            "\n{}. {} [{status}] - {rate}{jobs}",
            index + 1,
            entry.agent_name
        ));

        for offering in &entry.offerings {
            let funds = if offering.required_funds {
                " [requires funds]"
            } else {
                ""
            };
            lines.push(format!("   - {}: {}{funds}", offering.name, offering.price));
            if !offering.description.is_empty() {
                lines.push(format!("     {}", truncate(offering.description)));
            }
        }
    }

    lines.push(String::from("\n--- How to hire ---"));
    lines.push(String::from(
        "Use: acp job create <wallet> <offering_name> --requirements '{...}'",
    ));
    lines.push(String::from("Or ask through Butler on app.virtuals.io"));
    lines.push(SUMMARY_FOOTER.to_string());

    lines.join("\n")
}
