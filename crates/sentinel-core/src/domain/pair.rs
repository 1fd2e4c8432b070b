use serde::{Deserialize, Serialize};

use super::Timestamp;

/// Normalized snapshot of one market pair for a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPair {
    pub chain_id: String,
    pub dex_id: String,
    pub pair_address: String,
    pub base_token: PairToken,
    pub quote_token: PairToken,
    /// Upstream reports prices as decimal strings; kept verbatim.
    pub price_usd: Option<String>,
    pub price_native: Option<String>,
    pub liquidity: Liquidity,
    pub txns: Windowed<TxnCount>,
    pub volume: Windowed<f64>,
    pub price_change: Windowed<f64>,
    pub fdv: Option<f64>,
    pub created_at: Option<Timestamp>,
}

impl TradingPair {
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity.usd
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairToken {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Liquidity {
    pub usd: f64,
    pub base: f64,
    pub quote: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnCount {
    pub buys: u64,
    pub sells: u64,
}

impl TxnCount {
    pub const fn total(self) -> u64 {
        self.buys.saturating_add(self.sells)
    }
}

/// A metric sampled over the 24h/6h/1h/5m windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Windowed<T> {
    pub h24: T,
    pub h6: T,
    pub h1: T,
    pub m5: T,
}
