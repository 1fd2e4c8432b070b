use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheRequest, CacheStore};
use crate::dex::DexClient;
use crate::domain::{Timestamp, TradingPair, TxnCount};
use crate::error::ValidationError;
use crate::health::{self, HealthAssessment, HealthFlag, HealthGrade};

use super::{
    display_field, summary_rule, text_field, to_deliverable, ErrorDeliverable, JobOffering,
    JobRequest, JobResult, Validation, SUMMARY_FOOTER,
};

const NAME: &str = "ecosystem_health_check";
const FIELD: &str = "tokenAddress";

/// `0x` followed by 40 hex digits.
pub fn is_evm_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Liquidity and trading-health report for one token.
#[derive(Clone)]
pub struct EcosystemHealthCheck {
    cache: CacheStore,
    dex: DexClient,
    preferred_chain: String,
}

impl EcosystemHealthCheck {
    pub fn new(cache: CacheStore, dex: DexClient, preferred_chain: impl Into<String>) -> Self {
        Self {
            cache,
            dex,
            preferred_chain: preferred_chain.into(),
        }
    }

    fn check(request: &JobRequest) -> Result<(), ValidationError> {
        let address = request
            .get(FIELD)
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingField { field: FIELD })?;
        if !is_evm_address(address.trim()) {
            return Err(ValidationError::InvalidAddress { field: FIELD });
        }
        Ok(())
    }

    async fn execute(&self, request: &JobRequest) -> JobResult {
        let Some(token_address) = text_field(request, FIELD) else {
            return ErrorDeliverable::missing_field(FIELD, "Error: No token address provided.")
                .into_result();
        };

        let key = CacheRequest::from([(FIELD.to_string(), Value::String(token_address.clone()))]);
        if let Some(cached) = self.cache.get(NAME, &key).await {
            return JobResult::new(cached);
        }

        let pair = match self.dex.primary_pair(&token_address, &self.preferred_chain).await {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                return ErrorDeliverable::new(
                    "token_not_found",
                    format!(
                        "No trading data found for token {token_address}. It may not be listed on any DEX yet."
                    ),
                )
                .with_token_address(token_address)
                .into_result();
            }
            Err(error) => {
                return ErrorDeliverable::new(
                    "health_check_failed",
                    format!("Failed to perform health check: {error}"),
                )
                .with_message(error.to_string())
                .into_result();
            }
        };

        let now = Timestamp::now();
        let assessment = health::score(&pair, now);
        tracing::info!(
            token = %token_address,
            score = assessment.score,
            flags = assessment.flags.len(),
            "health check scored"
        );

        let report = HealthReport::new(&token_address, &pair, &assessment, now);
        let deliverable = to_deliverable(&report);
        self.cache.put(NAME, &key, deliverable.clone()).await;
        JobResult::new(deliverable)
    }
}

impl JobOffering for EcosystemHealthCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn validate_requirements(&self, request: &JobRequest) -> Validation {
        Self::check(request).into()
    }

    fn request_payment(&self, request: &JobRequest) -> String {
        format!(
            "Running health check for token {}. Please proceed with payment.",
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
struct HealthReport<'a> {
    token_address: &'a str,
    token: ReportToken<'a>,
    chain: &'a str,
    dex: &'a str,
    pair_address: &'a str,
    price_usd: Option<&'a str>,
    health_score: u8,
    grade: HealthGrade,
    flags: &'a [HealthFlag],
    recommendation: &'static str,
    metrics: ReportMetrics,
    #[serde(rename = "human_summary")]
    human_summary: String,
}

#[derive(Debug, Serialize)]
struct ReportToken<'a> {
    name: &'a str,
    symbol: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportMetrics {
    liquidity_usd: f64,
    #[serde(rename = "volume24h")]
    volume_24h: f64,
    fdv: f64,
    #[serde(rename = "txns24h")]
    txns_24h: TxnCount,
    #[serde(rename = "priceChange24h")]
    price_change_24h: f64,
    pair_age_days: u64,
}

impl<'a> HealthReport<'a> {
    fn new(
        token_address: &'a str,
        pair: &'a TradingPair,
        assessment: &'a HealthAssessment,
        now: Timestamp,
    ) -> Self {
        let grade = assessment.grade();
        Self {
            token_address,
            token: ReportToken {
                name: &pair.base_token.name,
                symbol: &pair.base_token.symbol,
            },
            chain: &pair.chain_id,
            dex: &pair.dex_id,
            pair_address: &pair.pair_address,
            price_usd: pair.price_usd.as_deref(),
            health_score: assessment.score,
            grade,
            flags: &assessment.flags,
            recommendation: grade.recommendation(),
            metrics: ReportMetrics {
                liquidity_usd: pair.liquidity_usd(),
                volume_24h: pair.volume.h24,
                fdv: pair.fdv.unwrap_or(0.0),
                txns_24h: pair.txns.h24,
                price_change_24h: pair.price_change.h24,
                pair_age_days: health::pair_age_days(pair, now).floor() as u64,
            },
            human_summary: human_summary(pair, assessment, now),
        }
    }
}

/// `$1.23M`, `$4.5K` or `$12.00`.
fn format_usd(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.1}K", value / 1_000.0)
    } else {
        format!("${value:.2}")
    }
}

fn human_summary(pair: &TradingPair, assessment: &HealthAssessment, now: Timestamp) -> String {
    let token = &pair.base_token;
    let grade = assessment.grade();
    let txns = pair.txns.h24;

    let mut lines = vec![
        format!("ECOSYSTEM HEALTH CHECK: {}", token.symbol),
        summary_rule(),
        format!("Token: {} ({})", token.name, token.symbol),
        format!("Price: ${}", pair.price_usd.as_deref().unwrap_or("N/A")),
        format!("Chain: {} | DEX: {}", pair.chain_id, pair.dex_id),
        format!(
            "Age: {} days",
            health::pair_age_days(pair, now).floor() as u64
        ),
        String::from("\n--- Health Score ---"),
        format!("Score: {}/100 ({grade})", assessment.score),
    ];

    if !assessment.flags.is_empty() {
        let flags: Vec<&str> = assessment.flags.iter().map(|flag| flag.as_str()).collect();
        lines.push(format!("Flags: {}", flags.join(", ")));
    }

    lines.push(String::from("\n--- Metrics ---"));
    lines.push(format!("Liquidity: {}", format_usd(pair.liquidity_usd())));
    lines.push(format!("24h Volume: {}", format_usd(pair.volume.h24)));
    lines.push(format!("FDV: {}", format_usd(pair.fdv.unwrap_or(0.0))));
    lines.push(format!(
        "24h Transactions: {} ({} buys / {} sells)",
        txns.total(),
        txns.buys,
        txns.sells
    ));
    lines.push(format!("24h Price Change: {:.2}%", pair.price_change.h24));
    lines.push(format!("\nRecommendation: {}", grade.recommendation()));
    lines.push(SUMMARY_FOOTER.to_string());

    lines.join("\n")
}
