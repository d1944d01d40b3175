//! Momentum Scoring
//!
//! RSI as the base score, nudged by the direction of the MACD histogram.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use agent_core::McpClient;

use super::indicators::{self, MACD};
use super::response::SkillReport;
use crate::error::{AnalystError, Result};
use crate::model::{round_dp, trading_pair};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumSignal {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl MomentumSignal {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::StrongBullish
        } else if score >= 55.0 {
            Self::Bullish
        } else if score > 45.0 {
            Self::Neutral
        } else if score > 30.0 {
            Self::Bearish
        } else {
            Self::StrongBearish
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub fn of(rsi: f64) -> Self {
        if rsi > 70.0 {
            Self::Overbought
        } else if rsi < 30.0 {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MomentumData {
    pub momentum_score: f64,
    pub signal: MomentumSignal,
    pub rsi: f64,
    pub rsi_zone: RsiZone,
    pub macd_histogram: Option<f64>,
    pub macd_adjustment: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MomentumMetadata {
    pub timeframe: String,
    pub confidence: f64,
}

pub type MomentumReport = SkillReport<MomentumData, MomentumMetadata>;

/// Score shift from the last two histogram bars
pub fn macd_adjustment(histogram: &[f64]) -> f64 {
    let Some(&last) = histogram.last() else {
        return 0.0;
    };
    let prev = histogram.len().checked_sub(2).map(|i| histogram[i]);

    if last > 0.0 {
        if prev.is_some_and(|p| last > p) { 10.0 } else { 5.0 }
    } else if last < 0.0 {
        if prev.is_some_and(|p| last < p) { -10.0 } else { -5.0 }
    } else {
        0.0
    }
}

pub struct MomentumScorer {
    mcp: Arc<dyn McpClient>,
}

impl MomentumScorer {
    pub fn new(mcp: Arc<dyn McpClient>) -> Self {
        Self { mcp }
    }

    pub async fn score(&self, symbol: &str, timeframe: &str) -> Result<MomentumReport> {
        let pair = trading_pair(symbol);
        let mcp = self.mcp.as_ref();

        let (rsi, macd) = futures::join!(
            indicators::fetch_rsi(mcp, &pair, timeframe),
            mcp.call_tool(MACD, json!({ "symbol": pair, "timeframe": timeframe })),
        );

        let rsi = rsi?
            .last()
            .copied()
            .ok_or_else(|| AnalystError::InsufficientData(format!("No RSI data available for {pair}")))?;

        let histogram = macd
            .map(|reply| indicators::series(&reply, "histogram"))
            .unwrap_or_else(|e| {
                tracing::warn!(symbol = %symbol, error = %e, "MACD unavailable, scoring on RSI alone");
                Vec::new()
            });
        let adjustment = macd_adjustment(&histogram);
        let score = (rsi + adjustment).clamp(0.0, 100.0);

        let confidence = if histogram.is_empty() { 0.65 } else { 0.80 };

        Ok(SkillReport::for_symbol(
            "technical-analysis-skill",
            "momentum",
            symbol,
            MomentumData {
                momentum_score: round_dp(score, 2),
                signal: MomentumSignal::from_score(score),
                rsi: round_dp(rsi, 2),
                rsi_zone: RsiZone::of(rsi),
                macd_histogram: histogram.last().map(|h| round_dp(*h, 4)),
                macd_adjustment: adjustment,
            },
            MomentumMetadata {
                timeframe: timeframe.to_string(),
                confidence,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;
    use agent_core::StaticMcpClient;

    #[test]
    fn test_macd_adjustment() {
        assert!((macd_adjustment(&[0.8, 1.2]) - 10.0).abs() < f64::EPSILON);
        assert!((macd_adjustment(&[1.5, 1.2]) - 5.0).abs() < f64::EPSILON);
        assert!((macd_adjustment(&[-0.2, -0.6]) + 10.0).abs() < f64::EPSILON);
        assert!((macd_adjustment(&[-0.6]) + 5.0).abs() < f64::EPSILON);
        assert!(macd_adjustment(&[]).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_score_with_mock() {
        let scorer = MomentumScorer::new(Arc::new(MockMarketData::new()));
        let report = scorer.score("BTC/USDT", "4h").await.unwrap();

        assert!((report.data.momentum_score - 73.5).abs() < 1e-9);
        assert_eq!(report.data.signal, MomentumSignal::StrongBullish);
        assert_eq!(report.data.rsi_zone, RsiZone::Neutral);
    }

    #[tokio::test]
    async fn test_missing_rsi() {
        let mcp = StaticMcpClient::new()
            .with_response(indicators::RSI, json!({"content": [{"rsi": []}]}));
        let scorer = MomentumScorer::new(Arc::new(mcp));

        let err = scorer.score("ETH", "1h").await.unwrap_err();
        assert!(matches!(err, AnalystError::InsufficientData(_)));
    }
}
