//! Risk Calculator
//!
//! Volatility-based risk metrics and position sizing. Stops sit 1.5x ATR
//! below the current price; position size risks a fixed share of the account
//! on that stop distance.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use agent_core::McpClient;

use super::indicators;
use super::response::SkillReport;
use crate::error::Result;
use crate::model::{VolatilityRegime, round_dp, trading_pair};

const DEFAULT_VOLATILITY: f64 = 0.30;
const STOP_ATR_MULTIPLE: f64 = 1.5;
const Z_95: f64 = 1.645;
const Z_99: f64 = 2.326;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskCategory {
    pub fn classify(volatility_index: f64, atr_percent: f64, max_drawdown: f64) -> Self {
        let score = max_drawdown.mul_add(
            0.30,
            volatility_index.mul_add(0.40, (atr_percent / 10.0) * 0.30),
        );

        if score > 0.60 {
            Self::Extreme
        } else if score > 0.45 {
            Self::High
        } else if score > 0.30 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// Optional sizing inputs
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    /// Current holding in asset units
    pub position_size: Option<f64>,
    pub account_balance: Option<f64>,

    /// Maximum share of the account risked per trade
    pub risk_tolerance: f64,
}

impl Default for RiskInputs {
    fn default() -> Self {
        Self {
            position_size: None,
            account_balance: None,
            risk_tolerance: 0.02,
        }
    }
}

/// Price and volatility readings shared by risk and volatility skills
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolatilityReading {
    pub price: f64,
    pub atr: f64,
    pub atr_percent: f64,
    pub bollinger_width: Option<f64>,
    pub index: f64,
    pub regime: VolatilityRegime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskData {
    pub volatility: f64,
    pub volatility_regime: VolatilityRegime,
    pub atr: f64,
    pub atr_percent: f64,
    pub var_95: f64,
    pub var_99: f64,
    pub max_drawdown: f64,
    pub risk_category: RiskCategory,
    pub current_price: f64,
    pub stop_loss_price: f64,
    pub stop_loss_percent: f64,
    pub position_risk: f64,
    pub recommended_position_size: Option<f64>,
    pub position_risk_usd: Option<f64>,
    pub risk_reward_ratio: f64,
    pub trading_signal: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position_risk_usd: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskMetadata {
    pub timeframe: String,
    pub risk_tolerance: f64,
    pub confidence: f64,
}

pub type RiskReport = SkillReport<RiskData, RiskMetadata>;

/// Volatility index from the ATR percentile, falling back to Bollinger width
pub fn volatility_index(atr: &[f64], bollinger_width: Option<f64>) -> f64 {
    indicators::latest_percentile(atr)
        .or_else(|| bollinger_width.map(|w| (w / 0.5).min(1.0)))
        .unwrap_or(DEFAULT_VOLATILITY)
}

/// Loss not exceeded at the given z-score, assuming 0-5% daily volatility
pub fn value_at_risk(price: f64, volatility_index: f64, z: f64) -> f64 {
    price * z * (volatility_index * 0.05)
}

pub fn max_drawdown(volatility_index: f64) -> f64 {
    (volatility_index * 0.60).min(0.50)
}

/// Units to buy so that hitting the stop loses `balance * tolerance`
pub fn position_size(balance: f64, entry: f64, stop: f64, tolerance: f64) -> f64 {
    if entry <= stop {
        return 0.0;
    }
    balance * tolerance / (entry - stop)
}

pub const fn risk_reward_ratio(regime: VolatilityRegime) -> f64 {
    match regime {
        VolatilityRegime::Extreme => 3.5,
        VolatilityRegime::VeryHigh => 3.0,
        VolatilityRegime::High => 2.5,
        VolatilityRegime::Moderate => 2.0,
        VolatilityRegime::Low => 1.5,
    }
}

fn trading_signal(
    regime: VolatilityRegime,
    category: RiskCategory,
    position_risk: f64,
) -> &'static str {
    match category {
        RiskCategory::Extreme => {
            "Extreme risk conditions - reduce position size by 75% or avoid trade"
        }
        RiskCategory::High => {
            if matches!(regime, VolatilityRegime::Extreme | VolatilityRegime::VeryHigh) {
                "High volatility and risk - position size at 25% of max, wider stops required"
            } else {
                "High risk environment - position size at 50% of max, monitor closely"
            }
        }
        RiskCategory::Moderate => {
            if position_risk > 0.05 {
                "Moderate risk - current stop-loss distance high (>5%), consider tighter stop"
            } else {
                "Moderate volatility - position size at 50-75% of max, stop at 1.5x ATR"
            }
        }
        RiskCategory::Low => {
            if matches!(regime, VolatilityRegime::Low | VolatilityRegime::Moderate) {
                "Low risk environment - can use full position size, tight stops effective"
            } else {
                "Low risk but elevated volatility - position size at 75% of max"
            }
        }
    }
}

/// Risk metrics from ticker, ATR and Bollinger data
pub struct RiskCalculator {
    mcp: Arc<dyn McpClient>,
    exchange_id: String,
}

impl RiskCalculator {
    pub fn new(mcp: Arc<dyn McpClient>) -> Self {
        Self {
            mcp,
            exchange_id: "binance".into(),
        }
    }

    #[must_use]
    pub fn with_exchange(mut self, exchange_id: impl Into<String>) -> Self {
        self.exchange_id = exchange_id.into();
        self
    }

    /// Price plus volatility readings for `asset`
    ///
    /// Missing ATR or Bollinger data degrade the index; a missing price is an error.
    pub async fn volatility(&self, asset: &str, timeframe: &str) -> Result<VolatilityReading> {
        let pair = trading_pair(asset);
        let mcp = self.mcp.as_ref();

        let price = indicators::fetch_price(mcp, &self.exchange_id, &pair).await?;
        let (atr, bands) = futures::join!(
            indicators::fetch_atr(mcp, &pair, timeframe),
            indicators::fetch_bollinger(mcp, &pair, timeframe),
        );

        let atr = atr.unwrap_or_else(|e| {
            tracing::warn!(asset = %asset, error = %e, "ATR unavailable");
            Vec::new()
        });
        let bollinger_width = bands.ok().as_ref().and_then(indicators::bollinger_width);

        let current_atr = atr.last().copied().unwrap_or_default();
        let index = volatility_index(&atr, bollinger_width);

        Ok(VolatilityReading {
            price,
            atr: current_atr,
            atr_percent: current_atr / price * 100.0,
            bollinger_width,
            index,
            regime: VolatilityRegime::for_risk(index),
        })
    }

    pub async fn calculate(
        &self,
        asset: &str,
        timeframe: &str,
        inputs: RiskInputs,
    ) -> Result<RiskReport> {
        let reading = self.volatility(asset, timeframe).await?;
        let price = reading.price;

        let drawdown = max_drawdown(reading.index);
        let category = RiskCategory::classify(reading.index, reading.atr_percent, drawdown);

        let stop_loss = reading.atr.mul_add(-STOP_ATR_MULTIPLE, price);
        let stop_loss_percent = (price - stop_loss) / price * 100.0;
        let position_risk = stop_loss_percent / 100.0;

        let balance = inputs.account_balance.filter(|b| *b > 0.0);
        let recommended = balance
            .map(|b| round_dp(position_size(b, price, stop_loss, inputs.risk_tolerance), 6));
        let risk_usd = balance.map(|b| round_dp(b * inputs.risk_tolerance, 2));

        let held = inputs.position_size.filter(|p| *p > 0.0);

        let mut confidence: f64 = 0.75;
        if matches!(reading.regime, VolatilityRegime::Moderate | VolatilityRegime::High) {
            confidence += 0.05;
        }
        if matches!(category, RiskCategory::Low | RiskCategory::Moderate) {
            confidence += 0.05;
        }
        if reading.atr_percent < 5.0 {
            confidence += 0.05;
        }

        let data = RiskData {
            volatility: round_dp(reading.index, 2),
            volatility_regime: reading.regime,
            atr: round_dp(reading.atr, 2),
            atr_percent: round_dp(reading.atr_percent, 2),
            var_95: round_dp(value_at_risk(price, reading.index, Z_95), 2),
            var_99: round_dp(value_at_risk(price, reading.index, Z_99), 2),
            max_drawdown: round_dp(drawdown, 2),
            risk_category: category,
            current_price: round_dp(price, 2),
            stop_loss_price: round_dp(stop_loss, 2),
            stop_loss_percent: round_dp(stop_loss_percent, 2),
            position_risk: round_dp(position_risk, 4),
            recommended_position_size: recommended,
            position_risk_usd: risk_usd,
            risk_reward_ratio: risk_reward_ratio(reading.regime),
            trading_signal: trading_signal(reading.regime, category, position_risk).to_string(),
            current_position_value: held.map(|p| round_dp(p * price, 2)),
            current_position_risk_usd: held.map(|p| round_dp(p * (price - stop_loss), 2)),
        };

        tracing::debug!(asset = %asset, category = ?category, "Risk calculation complete");

        Ok(SkillReport::for_asset(
            "data-extraction-skill",
            "risk_calculation",
            asset,
            data,
            RiskMetadata {
                timeframe: timeframe.to_string(),
                risk_tolerance: inputs.risk_tolerance,
                confidence: round_dp(confidence.min(0.95), 2),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalystError;
    use crate::source::MockMarketData;
    use agent_core::StaticMcpClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_calculate_btc_with_balance() {
        let calc = RiskCalculator::new(Arc::new(MockMarketData::new()));
        let inputs = RiskInputs {
            account_balance: Some(10_000.0),
            position_size: Some(0.5),
            ..RiskInputs::default()
        };

        let report = calc.calculate("BTC", "4h", inputs).await.unwrap();
        let data = &report.data;

        assert!((data.atr - 1150.5).abs() < 1e-9);
        assert!((data.atr_percent - 1.18).abs() < 1e-9);
        assert_eq!(data.volatility_regime, VolatilityRegime::Moderate);
        assert_eq!(data.risk_category, RiskCategory::Low);
        assert!((data.stop_loss_price - 95774.25).abs() < 1e-6);
        assert!((data.position_risk - 0.0177).abs() < 1e-9);
        assert!((data.risk_reward_ratio - 2.0).abs() < 1e-9);
        assert_eq!(data.position_risk_usd, Some(200.0));
        assert!(data.recommended_position_size.unwrap() > 0.0);
        assert_eq!(data.current_position_value, Some(48750.0));
        assert_eq!(
            data.trading_signal,
            "Low risk environment - can use full position size, tight stops effective"
        );
        assert!((report.metadata.confidence - 0.90).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_price_is_an_error() {
        let mcp = StaticMcpClient::new()
            .with_response(indicators::FETCH_TICKER, json!({"content": [{"last": 0}]}));
        let calc = RiskCalculator::new(Arc::new(mcp));

        let err = calc.calculate("BTC", "4h", RiskInputs::default()).await.unwrap_err();
        assert!(matches!(err, AnalystError::InsufficientData(_)));
    }

    #[tokio::test]
    async fn test_bollinger_fallback() {
        let mcp = StaticMcpClient::new()
            .with_response(indicators::FETCH_TICKER, json!({"last": 100.0}))
            .with_response(
                indicators::BOLLINGER_BANDS,
                json!({"upper": [120.0], "middle": [100.0], "lower": [80.0]}),
            );
        let calc = RiskCalculator::new(Arc::new(mcp));

        let reading = calc.volatility("SOL", "1d").await.unwrap();
        assert!((reading.index - 0.8).abs() < 1e-9);
        assert_eq!(reading.regime, VolatilityRegime::Extreme);
        assert!(reading.atr.abs() < f64::EPSILON);
    }

    #[test]
    fn test_position_size_guards_inverted_stop() {
        assert!(position_size(10_000.0, 100.0, 100.0, 0.02).abs() < f64::EPSILON);
        assert!((position_size(10_000.0, 100.0, 90.0, 0.02) - 20.0).abs() < 1e-9);
    }
}
