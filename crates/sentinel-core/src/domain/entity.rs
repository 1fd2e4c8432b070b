use serde::{Deserialize, Serialize};

/// Normalized marketplace agent, identical regardless of which tier resolved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceEntity {
    pub id: Option<u64>,
    pub name: String,
    pub description: String,
    pub wallet_address: String,
    pub token: Option<TokenRef>,
    pub category: Option<String>,
    pub metrics: EntityMetrics,
    pub offerings: Vec<Offering>,
    pub resources: Vec<Resource>,
}

impl MarketplaceEntity {
    pub fn has_offerings(&self) -> bool {
        !self.offerings.is_empty()
    }

    /// Case-insensitive name equality used by the exact-match tie-break.
    pub fn name_matches(&self, query: &str) -> bool {
        self.name.to_lowercase() == query.to_lowercase()
    }
}

/// Agent token; present only when the upstream reports an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub address: String,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetrics {
    pub successful_job_count: Option<u64>,
    pub success_rate: Option<f64>,
    pub unique_buyer_count: Option<u64>,
    pub is_online: bool,
    pub mins_from_last_online: Option<u64>,
}

/// How an offering's price is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    Fixed,
    Percentage,
    #[serde(other)]
    Unknown,
}

/// A priced service advertised by a marketplace agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub price_type: Option<PriceType>,
    pub required_funds: bool,
}

impl Offering {
    /// Catalog form of the price: `2.5% commission` or `$1.50 USDC`.
    pub fn price_label(&self) -> String {
        match self.price_type {
            Some(PriceType::Percentage) => self.commission_label(),
            _ => format!("${:.2} USDC", self.price),
        }
    }

    /// Brief form of the price. Fixed prices keep the precision the
    /// marketplace reported: `$1.5 USDC`, `$0.125 USDC`.
    pub fn fee_label(&self) -> String {
        match self.price_type {
            Some(PriceType::Percentage) => self.commission_label(),
            _ => format!("${} USDC", self.price),
        }
    }

    fn commission_label(&self) -> String {
        format!("{:.1}% commission", self.price * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
}
