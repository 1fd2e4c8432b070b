use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheRequest, CacheStore};
use crate::domain::{EntityMetrics, MarketplaceEntity, PriceType, Resource, TokenRef};
use crate::error::ValidationError;
use crate::marketplace::Resolver;

use super::{
    display_field, require_text, summary_rule, text_field, to_deliverable, ErrorDeliverable,
    JobOffering, JobRequest, JobResult, Validation, SUMMARY_FOOTER,
};

const NAME: &str = "agent_brief";
const FIELD: &str = "agentName";

/// Intelligence brief on one marketplace agent.
#[derive(Clone)]
pub struct AgentBrief {
    cache: CacheStore,
    resolver: Resolver,
}

impl AgentBrief {
    pub fn new(cache: CacheStore, resolver: Resolver) -> Self {
        Self { cache, resolver }
    }

    fn check(request: &JobRequest) -> Result<(), ValidationError> {
        require_text(request, FIELD).map(|_| ())
    }

    async fn execute(&self, request: &JobRequest) -> JobResult {
        let Some(agent_name) = text_field(request, FIELD) else {
            return ErrorDeliverable::missing_field(FIELD, "Error: No agent name provided.")
                .into_result();
        };

        let key = CacheRequest::from([(FIELD.to_string(), Value::String(agent_name.clone()))]);
        if let Some(cached) = self.cache.get(NAME, &key).await {
            return JobResult::new(cached);
        }

        match self.resolver.resolve(&agent_name).await {
            Ok(Some(entity)) => {
                let deliverable = to_deliverable(&BriefReport::from_entity(&entity));
                self.cache.put(NAME, &key, deliverable.clone()).await;
                JobResult::new(deliverable)
            }
            Ok(None) => ErrorDeliverable::new(
                "agent_not_found",
                format!("No agent found matching \"{agent_name}\". Try a different name or keyword."),
            )
            .with_query(agent_name)
            .into_result(),
            Err(error) => ErrorDeliverable::new(
                "search_failed",
                format!("Failed to retrieve agent brief: {error}"),
            )
            .with_message(error.to_string())
            .into_result(),
        }
    }
}

impl JobOffering for AgentBrief {
    fn name(&self) -> &'static str {
        NAME
    }

    fn validate_requirements(&self, request: &JobRequest) -> Validation {
        Self::check(request).into()
    }

    fn request_payment(&self, request: &JobRequest) -> String {
        format!(
            "Preparing intelligence brief for agent \"{}\". Please proceed with payment.",
            display_field(request, FIELD)
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
struct BriefReport<'a> {
    agent_id: Option<u64>,
    name: &'a str,
    description: &'a str,
    category: Option<&'a str>,
    wallet_address: &'a str,
    token: Option<&'a TokenRef>,
    metrics: BriefMetrics,
    offerings: Vec<BriefOffering<'a>>,
    resources: &'a [Resource],
    #[serde(rename = "human_summary")]
    human_summary: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BriefMetrics {
    is_online: bool,
    successful_jobs: Option<u64>,
    success_rate: Option<f64>,
    unique_buyers: Option<u64>,
    last_seen_minutes_ago: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BriefOffering<'a> {
    name: &'a str,
    description: &'a str,
    price: f64,
    price_type: Option<PriceType>,
    required_funds: bool,
}

impl<'a> BriefReport<'a> {
    fn from_entity(entity: &'a MarketplaceEntity) -> Self {
        let metrics = &entity.metrics;
        Self {
            agent_id: entity.id,
            name: &entity.name,
            description: &entity.description,
            category: entity.category.as_deref(),
            wallet_address: &entity.wallet_address,
            token: entity.token.as_ref(),
            metrics: BriefMetrics {
                is_online: metrics.is_online,
                successful_jobs: metrics.successful_job_count,
                success_rate: metrics.success_rate,
                unique_buyers: metrics.unique_buyer_count,
                last_seen_minutes_ago: metrics.mins_from_last_online,
            },
            offerings: entity
                .offerings
                .iter()
                .map(|offering| BriefOffering {
                    name: &offering.name,
                    description: &offering.description,
                    price: offering.price,
                    price_type: offering.price_type,
                    required_funds: offering.required_funds,
                })
                .collect(),
            resources: &entity.resources,
            human_summary: human_summary(entity),
        }
    }
}

fn online_status(metrics: &EntityMetrics) -> String {
    if metrics.is_online {
        return String::from("Online now");
    }
    match metrics.mins_from_last_online {
        None => String::from("Unknown"),
        Some(mins) if mins < 60 => format!("Last seen {mins}m ago"),
        Some(mins) if mins < 1_440 => format!("Last seen {}h ago", (mins as f64 / 60.0).round()),
        Some(mins) => format!("Last seen {}d ago", (mins as f64 / 1_440.0).round()),
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| String::from("N/A"), |value| value.to_string())
}

fn human_summary(entity: &MarketplaceEntity) -> String {
    let mut lines = vec![format!("AGENT BRIEF: {}", entity.name), summary_rule()];

    if !entity.description.is_empty() {
        lines.push(format!("\n{}", entity.description));
    }

    lines.push(format!("\nStatus: {}", online_status(&entity.metrics)));
    lines.push(format!(
        "Category: {}",
        entity.category.as_deref().unwrap_or("N/A")
    ));
    lines.push(format!("Wallet: {}", entity.wallet_address));
    match &entity.token {
        Some(TokenRef {
            address,
            symbol: Some(symbol),
        }) => lines.push(format!("Token: {symbol} ({address})")),
        _ => lines.push(String::from("Token: None")),
    }

    let metrics = &entity.metrics;
    lines.push(String::from("\n--- Performance ---"));
    lines.push(format!("Jobs completed: {}", or_na(metrics.successful_job_count)));
    lines.push(format!(
        "Success rate: {}",
        or_na(metrics.success_rate.map(|rate| format!("{rate:.1}%")))
    ));
    lines.push(format!("Unique buyers: {}", or_na(metrics.unique_buyer_count)));

    if entity.has_offerings() {
        lines.push(format!("\n--- Offerings ({}) ---", entity.offerings.len()));
        for offering in &entity.offerings {
            let funds = if offering.required_funds {
                " [requires funds]"
            } else {
                ""
            };
            lines.push(format!("  - {}: {}{funds}", offering.name, offering.fee_label()));
            if !offering.description.is_empty() {
                lines.push(format!("    {}", offering.description));
            }
        }
    } else {
        lines.push(String::from("\nNo offerings registered."));
    }

    if !entity.resources.is_empty() {
        lines.push(format!("\n--- Resources ({}) ---", entity.resources.len()));
        for resource in &entity.resources {
            match &resource.description {
                Some(description) => lines.push(format!("  - {}: {description}", resource.name)),
                None => lines.push(format!("  - {}", resource.name)),
            }
        }
    }

    lines.push(SUMMARY_FOOTER.to_string());
    lines.join("\n")
}
