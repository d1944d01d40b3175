//! Analyst Configuration

use serde::{Deserialize, Serialize};

use crate::error::{AnalystError, Result};

/// Domain weights used by the thesis synthesizer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthesisWeights {
    #[serde(rename = "macro")]
    pub macro_weight: f64,
    pub fundamental: f64,
    pub sentiment: f64,
}

impl Default for SynthesisWeights {
    fn default() -> Self {
        Self {
            macro_weight: 0.35,
            fundamental: 0.40,
            sentiment: 0.25,
        }
    }
}

impl SynthesisWeights {
    /// Each weight must lie in [0, 1] and the three must sum to 1
    pub fn new(macro_weight: f64, fundamental: f64, sentiment: f64) -> Result<Self> {
        let weights = Self {
            macro_weight,
            fundamental,
            sentiment,
        };

        for (name, w) in [
            ("macro", macro_weight),
            ("fundamental", fundamental),
            ("sentiment", sentiment),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(AnalystError::Config(format!(
                    "{name} weight {w} is outside [0, 1]"
                )));
            }
        }

        if (weights.total() - 1.0).abs() > 1e-6 {
            return Err(AnalystError::Config(format!(
                "weights must sum to 1.0, got {}",
                weights.total()
            )));
        }

        Ok(weights)
    }

    pub fn total(&self) -> f64 {
        self.macro_weight + self.fundamental + self.sentiment
    }
}

/// Runtime configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalystConfig {
    pub weights: SynthesisWeights,

    /// Exchange passed to ccxt tools
    pub exchange_id: String,

    /// Default candle timeframe for skills
    pub default_timeframe: String,

    /// Max risk per trade as a fraction of the account
    pub risk_tolerance: f64,

    /// Default thesis horizon
    pub horizon_days: u32,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            weights: SynthesisWeights::default(),
            exchange_id: "binance".into(),
            default_timeframe: "4h".into(),
            risk_tolerance: 0.02,
            horizon_days: 30,
        }
    }
}

impl AnalystConfig {
    /// Load from `ANALYST_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let weights = SynthesisWeights::new(
            env_parse("ANALYST_MACRO_WEIGHT").unwrap_or(defaults.weights.macro_weight),
            env_parse("ANALYST_FUNDAMENTAL_WEIGHT").unwrap_or(defaults.weights.fundamental),
            env_parse("ANALYST_SENTIMENT_WEIGHT").unwrap_or(defaults.weights.sentiment),
        )?;

        let risk_tolerance = env_parse("ANALYST_RISK_TOLERANCE").unwrap_or(defaults.risk_tolerance);
        if !(risk_tolerance > 0.0 && risk_tolerance < 1.0) {
            return Err(AnalystError::Config(format!(
                "ANALYST_RISK_TOLERANCE must be in (0, 1), got {risk_tolerance}"
            )));
        }

        Ok(Self {
            weights,
            exchange_id: std::env::var("ANALYST_EXCHANGE_ID").unwrap_or(defaults.exchange_id),
            default_timeframe: std::env::var("ANALYST_TIMEFRAME")
                .unwrap_or(defaults.default_timeframe),
            risk_tolerance,
            horizon_days: env_parse("ANALYST_HORIZON_DAYS").unwrap_or(defaults.horizon_days),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = SynthesisWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-9);
        assert!(SynthesisWeights::new(0.35, 0.40, 0.25).is_ok());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        assert!(matches!(
            SynthesisWeights::new(0.5, 0.5, 0.5),
            Err(AnalystError::Config(_))
        ));
        assert!(matches!(
            SynthesisWeights::new(1.2, -0.1, -0.1),
            Err(AnalystError::Config(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = AnalystConfig::default();
        assert_eq!(config.exchange_id, "binance");
        assert_eq!(config.default_timeframe, "4h");
        assert_eq!(config.horizon_days, 30);
    }
}
