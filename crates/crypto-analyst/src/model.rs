//! Shared domain types and helpers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Investment risk classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Blue chip, established projects
    Low,
    /// Growth stage, some risks
    Medium,
    /// Early stage, significant risks
    High,
    /// High failure probability
    Extreme,
}

impl RiskLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Volatility regime derived from a 0.0 - 1.0 volatility index
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityRegime {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl VolatilityRegime {
    /// Four-bucket scale used for signal fusion (never `Extreme`)
    pub fn for_fusion(index: f64) -> Self {
        if index > 0.6 {
            Self::VeryHigh
        } else if index > 0.4 {
            Self::High
        } else if index > 0.2 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Five-bucket scale used for risk sizing
    pub fn for_risk(index: f64) -> Self {
        if index > 0.7 {
            Self::Extreme
        } else if index > 0.5 {
            Self::VeryHigh
        } else if index > 0.35 {
            Self::High
        } else if index > 0.2 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::High | Self::VeryHigh | Self::Extreme)
    }
}

/// Map a ticker to the slug sentiment feeds expect (BTC -> bitcoin)
pub fn asset_slug(asset: &str) -> String {
    match asset {
        "BTC" => "bitcoin".into(),
        "ETH" => "ethereum".into(),
        other => other.to_lowercase(),
    }
}

/// `BTC` -> `BTC/USDT`; pairs pass through unchanged
pub fn trading_pair(symbol: &str) -> String {
    if symbol.contains('/') {
        symbol.to_string()
    } else {
        format!("{}/USDT", symbol.to_uppercase())
    }
}

/// Round half away from zero to `dp` decimal places
#[allow(clippy::cast_possible_wrap)]
pub fn round_dp(value: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_slug() {
        assert_eq!(asset_slug("BTC"), "bitcoin");
        assert_eq!(asset_slug("ETH"), "ethereum");
        assert_eq!(asset_slug("SOL"), "sol");
    }

    #[test]
    fn test_trading_pair() {
        assert_eq!(trading_pair("btc"), "BTC/USDT");
        assert_eq!(trading_pair("ETH/BTC"), "ETH/BTC");
    }

    #[test]
    fn test_volatility_scales() {
        assert_eq!(VolatilityRegime::for_fusion(0.3), VolatilityRegime::Moderate);
        assert_eq!(VolatilityRegime::for_fusion(0.9), VolatilityRegime::VeryHigh);
        assert_eq!(VolatilityRegime::for_risk(0.38), VolatilityRegime::High);
        assert_eq!(VolatilityRegime::for_risk(0.75), VolatilityRegime::Extreme);
    }

    #[test]
    fn test_round_dp() {
        assert!((round_dp(71.428_571, 1) - 71.4).abs() < 1e-9);
        assert!((round_dp(0.8249, 2) - 0.82).abs() < 1e-9);
    }
}
