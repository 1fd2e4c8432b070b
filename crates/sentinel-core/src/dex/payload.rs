//! Raw token-pairs payload. Numeric fields are optional upstream and default to zero.

use serde::Deserialize;

use crate::domain::{Liquidity, PairToken, Timestamp, TradingPair, TxnCount, Windowed};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TokenPairsResponse {
    pub pairs: Option<Vec<RawPair>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawPair {
    pub chain_id: String,
    pub dex_id: String,
    pub pair_address: String,
    pub base_token: RawToken,
    pub quote_token: RawToken,
    pub price_usd: Option<String>,
    pub price_native: Option<String>,
    pub txns: Option<RawWindows<RawTxnPeriod>>,
    pub volume: Option<RawWindows<f64>>,
    pub price_change: Option<RawWindows<f64>>,
    pub liquidity: Option<RawLiquidity>,
    pub fdv: Option<f64>,
    pub pair_created_at: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawToken {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawWindows<T> {
    #[serde(default)]
    pub h24: Option<T>,
    #[serde(default)]
    pub h6: Option<T>,
    #[serde(default)]
    pub h1: Option<T>,
    #[serde(default)]
    pub m5: Option<T>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(default)]
pub(crate) struct RawTxnPeriod {
    pub buys: Option<u64>,
    pub sells: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawLiquidity {
    pub usd: Option<f64>,
    pub base: Option<f64>,
    pub quote: Option<f64>,
}

impl<T: Default> RawWindows<T> {
    fn into_windowed(self) -> Windowed<T> {
        Windowed {
            h24: self.h24.unwrap_or_default(),
            h6: self.h6.unwrap_or_default(),
            h1: self.h1.unwrap_or_default(),
            m5: self.m5.unwrap_or_default(),
        }
    }
}

impl From<RawTxnPeriod> for TxnCount {
    fn from(raw: RawTxnPeriod) -> Self {
        Self {
            buys: raw.buys.unwrap_or(0),
            sells: raw.sells.unwrap_or(0),
        }
    }
}

impl From<RawToken> for PairToken {
    fn from(raw: RawToken) -> Self {
        Self {
            address: raw.address,
            name: raw.name,
            symbol: raw.symbol,
        }
    }
}

impl RawPair {
    pub fn into_pair(self) -> TradingPair {
        let txns = self
            .txns
            .map(|windows| {
                let raw = windows.into_windowed();
                Windowed {
                    h24: TxnCount::from(raw.h24),
                    h6: TxnCount::from(raw.h6),
                    h1: TxnCount::from(raw.h1),
                    m5: TxnCount::from(raw.m5),
                }
            })
            .unwrap_or_default();
        let liquidity = self
            .liquidity
            .map(|raw| Liquidity {
                usd: raw.usd.unwrap_or(0.0),
                base: raw.base.unwrap_or(0.0),
                quote: raw.quote.unwrap_or(0.0),
            })
            .unwrap_or_default();

        TradingPair {
            chain_id: self.chain_id,
            dex_id: self.dex_id,
            pair_address: self.pair_address,
            base_token: self.base_token.into(),
            quote_token: self.quote_token.into(),
            price_usd: self.price_usd,
            price_native: self.price_native,
            liquidity,
            txns,
            volume: self.volume.map(RawWindows::into_windowed).unwrap_or_default(),
            price_change: self
                .price_change
                .map(RawWindows::into_windowed)
                .unwrap_or_default(),
            fdv: self.fdv,
            created_at: self.pair_created_at.map(Timestamp::from_unix_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_pair_normalizes_missing_metrics_to_zero() {
        let raw: RawPair = serde_json::from_str(
            r#"{
                "chainId": "base",
                "dexId": "uniswap",
                "pairAddress": "0xpair",
                "baseToken": {"address": "0xbase", "name": "Base Token", "symbol": "BT"},
                "txns": {"h24": {"buys": 10}},
                "volume": {"h1": 5.5}
            }"#,
        )
        .expect("sparse pair");

        let pair = raw.into_pair();

        assert_eq!(pair.txns.h24, TxnCount { buys: 10, sells: 0 });
        assert_eq!(pair.volume.h24, 0.0);
        assert_eq!(pair.volume.h1, 5.5);
        assert_eq!(pair.liquidity_usd(), 0.0);
        assert!(pair.created_at.is_none());
        assert_eq!(pair.quote_token, PairToken::default());
    }
}
