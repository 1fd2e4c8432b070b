//! # Health Scoring
//!
//! Deterministic 0..=100 heuristic over one [`TradingPair`]. The score starts
//! at [`BASELINE`] and each signal contributes one independent adjustment:
//!
//! | Signal | Adjustment (flag) |
//! |--------|-------------------|
//! | liquidity (USD) | `>=100k` +15, `>=50k` +10, `>=10k` +5, `<5k` -15 (`VERY_LOW_LIQUIDITY`), else -5 (`LOW_LIQUIDITY`) |
//! | 24h volume | `>=100k` +10, `>=10k` +5, `<1k` -10 (`LOW_VOLUME`) |
//! | 24h transactions | `>=500` +5, `<50` -5 (`LOW_ACTIVITY`) |
//! | buy/sell ratio | `<0.3` -10 (`HEAVY_SELLING`), `>3` +5; only when both sides traded |
//! | 24h price change | `<-30%` -10 (`SHARP_DECLINE`), `<-10%` -5, `>50%` flag only (`HIGH_VOLATILITY`) |
//! | pair age | `>=30d` +5, `<1d` -10 (`VERY_NEW_TOKEN`), `<7d` -5 (`NEW_TOKEN`) |
//!
//! The result is clamped after all adjustments are summed.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::{Timestamp, TradingPair};

pub const BASELINE: i32 = 50;

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Qualitative risk marker raised by a scoring rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthFlag {
    VeryLowLiquidity,
    LowLiquidity,
    LowVolume,
    LowActivity,
    HeavySelling,
    SharpDecline,
    HighVolatility,
    VeryNewToken,
    NewToken,
}

impl HealthFlag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLowLiquidity => "VERY_LOW_LIQUIDITY",
            Self::LowLiquidity => "LOW_LIQUIDITY",
            Self::LowVolume => "LOW_VOLUME",
            Self::LowActivity => "LOW_ACTIVITY",
            Self::HeavySelling => "HEAVY_SELLING",
            Self::SharpDecline => "SHARP_DECLINE",
            Self::HighVolatility => "HIGH_VOLATILITY",
            Self::VeryNewToken => "VERY_NEW_TOKEN",
            Self::NewToken => "NEW_TOKEN",
        }
    }
}

impl Display for HealthFlag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse band of a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthGrade {
    #[serde(rename = "HIGH RISK")]
    HighRisk,
    #[serde(rename = "CAUTION")]
    Caution,
    #[serde(rename = "MODERATE")]
    Moderate,
    #[serde(rename = "HEALTHY")]
    Healthy,
}

impl HealthGrade {
    pub const fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Healthy,
            60..=79 => Self::Moderate,
            40..=59 => Self::Caution,
            _ => Self::HighRisk,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Moderate => "MODERATE",
            Self::Caution => "CAUTION",
            Self::HighRisk => "HIGH RISK",
        }
    }

    pub const fn recommendation(self) -> &'static str {
        match self {
            Self::Healthy => "Token appears healthy. Standard monitoring recommended.",
            Self::Moderate => "Some concerns noted. Monitor closely.",
            Self::Caution => "Multiple risk factors detected. Exercise caution.",
            Self::HighRisk => "Significant risks identified. Thorough due diligence required.",
        }
    }
}

impl Display for HealthGrade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score plus the flags raised, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub score: u8,
    pub flags: Vec<HealthFlag>,
}

impl HealthAssessment {
    pub const fn grade(&self) -> HealthGrade {
        HealthGrade::from_score(self.score)
    }

    pub fn has_flag(&self, flag: HealthFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Age of the pair at `now` in fractional days; zero when the creation time is unknown.
pub fn pair_age_days(pair: &TradingPair, now: Timestamp) -> f64 {
    pair.created_at
        .map(|created| now.duration_since(created).as_millis() as f64 / DAY_MS)
        .unwrap_or(0.0)
}

/// Scores `pair` as of `now`.
pub fn score(pair: &TradingPair, now: Timestamp) -> HealthAssessment {
    let mut total = BASELINE;
    let mut flags = Vec::new();
    let mut apply = |delta: i32, flag: Option<HealthFlag>| {
        total += delta;
        flags.extend(flag);
    };

    let liquidity = pair.liquidity_usd();
    if liquidity >= 100_000.0 {
        apply(15, None);
    } else if liquidity >= 50_000.0 {
        apply(10, None);
    } else if liquidity >= 10_000.0 {
        apply(5, None);
    } else if liquidity < 5_000.0 {
        apply(-15, Some(HealthFlag::VeryLowLiquidity));
    } else {
        apply(-5, Some(HealthFlag::LowLiquidity));
    }

    let volume = pair.volume.h24;
    if volume >= 100_000.0 {
        apply(10, None);
    } else if volume >= 10_000.0 {
        apply(5, None);
    } else if volume < 1_000.0 {
        apply(-10, Some(HealthFlag::LowVolume));
    }

    let txns = pair.txns.h24;
    let total_txns = txns.total();
    if total_txns >= 500 {
        apply(5, None);
    } else if total_txns < 50 {
        apply(-5, Some(HealthFlag::LowActivity));
    }

    if txns.buys > 0 && txns.sells > 0 {
        let ratio = txns.buys as f64 / txns.sells as f64;
        if ratio < 0.3 {
            apply(-10, Some(HealthFlag::HeavySelling));
        } else if ratio > 3.0 {
            apply(5, None);
        }
    }

    let change = pair.price_change.h24;
    if change < -30.0 {
        apply(-10, Some(HealthFlag::SharpDecline));
    } else if change < -10.0 {
        apply(-5, None);
    } else if change > 50.0 {
        apply(0, Some(HealthFlag::HighVolatility));
    }

    let age_days = pair_age_days(pair, now);
    if age_days >= 30.0 {
        apply(5, None);
    } else if age_days < 1.0 {
        apply(-10, Some(HealthFlag::VeryNewToken));
    } else if age_days < 7.0 {
        apply(-5, Some(HealthFlag::NewToken));
    }

    HealthAssessment {
        score: total.clamp(0, 100) as u8,
        flags,
    }
}
