//! Raw marketplace payloads.
//!
//! The search, listing and metrics endpoints disagree on where metrics live
//! and which fields may be null, so every field is optional here and
//! normalization into [`MarketplaceEntity`] fills the gaps. Numeric fields
//! also accept numeric strings; anything unparseable reads as absent rather
//! than failing the whole row.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::{EntityMetrics, MarketplaceEntity, Offering, PriceType, Resource, TokenRef};

/// `{ "data": ... }` wrapper shared by all marketplace endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawAgent {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub wallet_address: Option<String>,
    pub token_address: Option<String>,
    pub symbol: Option<String>,
    pub category: Option<String>,
    pub metrics: Option<RawMetrics>,
    // listing rows flatten metrics onto the agent
    #[serde(deserialize_with = "lenient_u64")]
    pub successful_job_count: Option<u64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub success_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub unique_buyer_count: Option<u64>,
    pub is_online: Option<bool>,
    pub jobs: Option<Vec<RawJob>>,
    pub resources: Option<Vec<RawResource>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawMetrics {
    pub name: Option<String>,
    pub description: Option<String>,
    pub wallet_address: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub successful_job_count: Option<u64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub success_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub unique_buyer_count: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub mins_from_last_online_time: Option<u64>,
    pub is_online: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawJob {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    pub price_v2: Option<RawPrice>,
    pub required_funds: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawPrice {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawResource {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl RawAgent {
    /// Search-tier rows carry a nested `metrics` object.
    pub fn into_search_entity(self) -> MarketplaceEntity {
        let metrics = self.metrics.clone().unwrap_or_default();
        let metrics = EntityMetrics {
            successful_job_count: metrics.successful_job_count,
            success_rate: metrics.success_rate,
            unique_buyer_count: metrics.unique_buyer_count,
            is_online: metrics.is_online.unwrap_or(false),
            mins_from_last_online: metrics.mins_from_last_online_time,
        };
        self.into_entity(metrics)
    }

    /// Listing-tier rows: flat metrics first, nested object as fallback.
    pub fn into_listing_entity(self) -> MarketplaceEntity {
        let nested = self.metrics.clone().unwrap_or_default();
        let metrics = EntityMetrics {
            successful_job_count: self.successful_job_count.or(nested.successful_job_count),
            success_rate: self.success_rate.or(nested.success_rate),
            unique_buyer_count: self.unique_buyer_count.or(nested.unique_buyer_count),
            is_online: self.is_online.unwrap_or(false),
            mins_from_last_online: None,
        };
        self.into_entity(metrics)
    }

    fn into_entity(self, metrics: EntityMetrics) -> MarketplaceEntity {
        let token = non_empty(self.token_address).map(|address| TokenRef {
            address,
            symbol: self.symbol,
        });

        MarketplaceEntity {
            id: self.id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            wallet_address: self.wallet_address.unwrap_or_default(),
            token,
            category: self.category,
            metrics,
            offerings: self
                .jobs
                .unwrap_or_default()
                .into_iter()
                .map(RawJob::into_offering)
                .collect(),
            resources: self
                .resources
                .unwrap_or_default()
                .into_iter()
                .map(|resource| Resource {
                    name: resource.name.unwrap_or_default(),
                    description: resource.description,
                    url: resource.url,
                })
                .collect(),
        }
    }
}

impl RawJob {
    fn into_offering(self) -> Offering {
        Offering {
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            price: self.price.unwrap_or(0.0),
            price_type: self
                .price_v2
                .and_then(|price| price.kind)
                .map(|kind| parse_price_type(&kind)),
            required_funds: self.required_funds.unwrap_or(false),
        }
    }
}

/// Number, numeric string or null. Other values read as `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite()))
}

/// Non-negative whole number, possibly written as a string or as `12.0`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let whole = |number: f64| {
        (number >= 0.0 && number.fract() == 0.0 && number <= u64::MAX as f64)
            .then_some(number as u64)
    };
    Ok(match value {
        Some(Value::Number(number)) => number.as_u64().or_else(|| number.as_f64().and_then(whole)),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    })
}

fn parse_price_type(kind: &str) -> PriceType {
    match kind {
        "fixed" => PriceType::Fixed,
        "percentage" => PriceType::Percentage,
        _ => PriceType::Unknown,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

/// Overlays metrics-endpoint data onto a listing entity.
///
/// Listing text fields win when non-empty; performance fields come from the
/// metrics payload, and the last-online age is unknown on this path.
pub(crate) fn enrich(mut entity: MarketplaceEntity, metrics: RawMetrics) -> MarketplaceEntity {
    if let Some(name) = non_empty(metrics.name) {
        entity.name = name;
    }
    if entity.description.is_empty() {
        entity.description = metrics.description.unwrap_or_default();
    }
    if entity.wallet_address.is_empty() {
        entity.wallet_address = metrics.wallet_address.unwrap_or_default();
    }
    entity.metrics = EntityMetrics {
        successful_job_count: metrics.successful_job_count,
        success_rate: metrics.success_rate,
        unique_buyer_count: metrics.unique_buyer_count,
        is_online: metrics.is_online.unwrap_or(false),
        mins_from_last_online: None,
    };
    entity
}
