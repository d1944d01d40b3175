//! Volatility Analysis

use serde::{Deserialize, Serialize};

use super::response::SkillReport;
use super::risk_calculator::RiskCalculator;
use crate::error::Result;
use crate::model::{VolatilityRegime, round_dp};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VolatilityData {
    pub current_price: f64,
    pub atr: f64,
    pub atr_percent: f64,
    pub bollinger_width: Option<f64>,
    pub volatility_index: f64,
    pub volatility_regime: VolatilityRegime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VolatilityMetadata {
    pub timeframe: String,
    pub confidence: f64,
}

pub type VolatilityReport = SkillReport<VolatilityData, VolatilityMetadata>;

/// ATR and Bollinger readings on the risk calculator's volatility scale
pub struct VolatilityAnalyzer {
    calculator: RiskCalculator,
}

impl VolatilityAnalyzer {
    pub const fn new(calculator: RiskCalculator) -> Self {
        Self { calculator }
    }

    pub async fn analyze(&self, symbol: &str, timeframe: &str) -> Result<VolatilityReport> {
        let reading = self.calculator.volatility(symbol, timeframe).await?;

        let confidence = if reading.atr > 0.0 {
            0.80
        } else if reading.bollinger_width.is_some() {
            0.70
        } else {
            0.60
        };

        Ok(SkillReport::for_symbol(
            "technical-analysis-skill",
            "volatility",
            symbol,
            VolatilityData {
                current_price: round_dp(reading.price, 2),
                atr: round_dp(reading.atr, 2),
                atr_percent: round_dp(reading.atr_percent, 2),
                bollinger_width: reading.bollinger_width.map(|w| round_dp(w, 4)),
                volatility_index: round_dp(reading.index, 2),
                volatility_regime: reading.regime,
            },
            VolatilityMetadata {
                timeframe: timeframe.to_string(),
                confidence,
            },
        ))
    }
}
