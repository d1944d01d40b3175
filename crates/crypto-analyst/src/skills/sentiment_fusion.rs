//! Sentiment Fusion
//!
//! Blends a sentiment score with a technical score using a weight that moves
//! with volatility: sentiment leads in turbulent markets, technicals lead in
//! quiet ones.
//!
//! | volatility index | alpha (sentiment weight) |
//! |------------------|--------------------------|
//! | > 0.4            | 0.80                     |
//! | > 0.2            | 0.50                     |
//! | otherwise        | 0.20                     |

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use agent_core::McpClient;

use super::indicators::{self, FEAR_GREED_CURRENT};
use super::response::SkillReport;
use crate::error::Result;
use crate::model::{VolatilityRegime, round_dp, trading_pair};

const DEFAULT_VOLATILITY: f64 = 0.30;
const NEUTRAL_SCORE: f64 = 50.0;

/// Five-step combined signal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FusionSignal {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl FusionSignal {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::StrongBuy
        } else if score >= 60.0 {
            Self::Buy
        } else if score >= 40.0 {
            Self::Hold
        } else if score >= 20.0 {
            Self::Sell
        } else {
            Self::StrongSell
        }
    }

    const fn is_buy(self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    const fn is_sell(self) -> bool {
        matches!(self, Self::StrongSell | Self::Sell)
    }
}

/// How closely sentiment and technicals agree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAlignment {
    StronglyAligned,
    Aligned,
    WeaklyAligned,
    Divergent,
}

impl SignalAlignment {
    pub fn between(sentiment: f64, technical: f64) -> Self {
        let diff = (sentiment - technical).abs();
        if diff < 10.0 {
            Self::StronglyAligned
        } else if diff < 20.0 {
            Self::Aligned
        } else if diff < 30.0 {
            Self::WeaklyAligned
        } else {
            Self::Divergent
        }
    }

    const fn is_aligned(self) -> bool {
        matches!(self, Self::StronglyAligned | Self::Aligned)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FusionData {
    pub combined_score: f64,
    pub combined_signal: FusionSignal,
    pub sentiment_score: f64,
    pub technical_score: f64,
    pub volatility_index: f64,
    pub volatility_regime: VolatilityRegime,
    pub alpha: f64,
    pub sentiment_weight: f64,
    pub technical_weight: f64,
    pub signal_alignment: SignalAlignment,
    pub conviction: f64,
    pub trading_recommendation: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FusionMetadata {
    pub timeframe: String,
    pub confidence: f64,
}

pub type FusionReport = SkillReport<FusionData, FusionMetadata>;

/// Sentiment weight for a volatility index
pub fn adaptive_alpha(volatility_index: f64) -> f64 {
    if volatility_index > 0.4 {
        0.80
    } else if volatility_index > 0.2 {
        0.50
    } else {
        0.20
    }
}

pub fn conviction(
    sentiment: f64,
    technical: f64,
    volatility_index: f64,
    alignment: SignalAlignment,
) -> f64 {
    let mut conviction: f64 = match alignment {
        SignalAlignment::StronglyAligned => 0.85,
        SignalAlignment::Aligned => 0.70,
        SignalAlignment::WeaklyAligned => 0.55,
        SignalAlignment::Divergent => 0.40,
    };

    let average = f64::midpoint(sentiment, technical);
    if !(25.0..=75.0).contains(&average) {
        conviction += 0.10;
    }
    if volatility_index > 0.4 && alignment.is_aligned() {
        conviction += 0.05;
    }

    conviction.min(1.0)
}

fn recommendation(
    signal: FusionSignal,
    regime: VolatilityRegime,
    alignment: SignalAlignment,
    sentiment: f64,
    technical: f64,
) -> &'static str {
    let turbulent = matches!(regime, VolatilityRegime::High | VolatilityRegime::VeryHigh);

    if signal.is_buy() && alignment.is_aligned() {
        return if turbulent {
            "Sentiment leading technical - follow sentiment signal (high confidence)"
        } else {
            "Both signals bullish - enter long position"
        };
    }

    if signal.is_sell() && alignment.is_aligned() {
        return if turbulent {
            "Sentiment leading technical - follow sentiment signal (exit/short)"
        } else {
            "Both signals bearish - exit or avoid"
        };
    }

    if alignment == SignalAlignment::Divergent && turbulent {
        return if sentiment > technical {
            "Sentiment bullish, technical lagging - sentiment may lead (watch for technical confirmation)"
        } else {
            "Sentiment bearish, technical lagging - sentiment may lead (caution advised)"
        };
    }

    if alignment == SignalAlignment::Divergent && regime == VolatilityRegime::Low {
        return if technical > sentiment {
            "Technical bullish, sentiment lagging - technical more reliable in low volatility"
        } else {
            "Technical bearish, sentiment lagging - technical more reliable in low volatility"
        };
    }

    if signal == FusionSignal::Hold {
        return "Neutral combined signal - wait for clearer directional bias";
    }

    "Mixed signals - monitor for trend confirmation"
}

/// Volatility-weighted sentiment/technical fusion
pub struct SentimentFusionEngine {
    mcp: Arc<dyn McpClient>,
}

impl SentimentFusionEngine {
    pub fn new(mcp: Arc<dyn McpClient>) -> Self {
        Self { mcp }
    }

    /// Fuse signals for `symbol`, fetching any score not supplied
    pub async fn fuse(
        &self,
        symbol: &str,
        sentiment_score: Option<f64>,
        technical_score: Option<f64>,
        timeframe: &str,
    ) -> Result<FusionReport> {
        let pair = trading_pair(symbol);

        let volatility_index = match indicators::fetch_atr(self.mcp.as_ref(), &pair, timeframe).await {
            Ok(atr) => indicators::latest_percentile(&atr).unwrap_or(DEFAULT_VOLATILITY),
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "ATR unavailable, assuming moderate volatility");
                DEFAULT_VOLATILITY
            }
        };
        let regime = VolatilityRegime::for_fusion(volatility_index);
        let alpha = adaptive_alpha(volatility_index);

        let sentiment = match sentiment_score {
            Some(score) => score,
            None => self.sentiment_score().await,
        };
        let technical = match technical_score {
            Some(score) => score,
            None => self.technical_score(&pair, timeframe).await,
        };

        let combined = alpha.mul_add(sentiment, (1.0 - alpha) * technical);
        let signal = FusionSignal::from_score(combined);
        let alignment = SignalAlignment::between(sentiment, technical);
        let conviction = conviction(sentiment, technical, volatility_index, alignment);

        let mut confidence: f64 = 0.70;
        if alignment == SignalAlignment::Aligned {
            confidence += 0.10;
        }
        if conviction > 0.70 {
            confidence += 0.10;
        }
        if matches!(regime, VolatilityRegime::High | VolatilityRegime::Moderate) {
            confidence += 0.05;
        }

        let data = FusionData {
            combined_score: round_dp(combined, 2),
            combined_signal: signal,
            sentiment_score: round_dp(sentiment, 2),
            technical_score: round_dp(technical, 2),
            volatility_index: round_dp(volatility_index, 2),
            volatility_regime: regime,
            alpha: round_dp(alpha, 2),
            sentiment_weight: round_dp(alpha, 2),
            technical_weight: round_dp(1.0 - alpha, 2),
            signal_alignment: alignment,
            conviction: round_dp(conviction, 2),
            trading_recommendation: recommendation(signal, regime, alignment, sentiment, technical)
                .to_string(),
        };

        tracing::debug!(symbol = %symbol, combined = data.combined_score, "Sentiment fusion complete");

        Ok(SkillReport::for_symbol(
            "sentiment-analysis-skill",
            "sentiment_fusion",
            symbol,
            data,
            FusionMetadata {
                timeframe: timeframe.to_string(),
                confidence: round_dp(confidence.min(0.95), 2),
            },
        ))
    }

    async fn sentiment_score(&self) -> f64 {
        self.mcp
            .call_tool(FEAR_GREED_CURRENT, json!({}))
            .await
            .ok()
            .and_then(|reply| {
                indicators::field(&reply, "text")
                    .and_then(|t| t.as_str())
                    .and_then(indicators::first_number)
            })
            .unwrap_or(NEUTRAL_SCORE)
    }

    async fn technical_score(&self, pair: &str, timeframe: &str) -> f64 {
        indicators::fetch_rsi(self.mcp.as_ref(), pair, timeframe)
            .await
            .ok()
            .and_then(|rsi| rsi.last().copied())
            .unwrap_or(NEUTRAL_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;
    use agent_core::StaticMcpClient;

    #[tokio::test]
    async fn test_fuse_with_fetched_scores() {
        let engine = SentimentFusionEngine::new(Arc::new(MockMarketData::new()));
        let report = engine.fuse("BTC", None, None, "4h").await.unwrap();
        let data = &report.data;

        assert!((data.volatility_index - 0.3).abs() < 1e-9);
        assert_eq!(data.volatility_regime, VolatilityRegime::Moderate);
        assert!((data.alpha - 0.5).abs() < 1e-9);
        assert!((data.sentiment_score - 68.0).abs() < 1e-9);
        assert!((data.technical_score - 63.5).abs() < 1e-9);
        assert!((data.combined_score - 65.75).abs() < 1e-9);
        assert_eq!(data.combined_signal, FusionSignal::Buy);
        assert_eq!(data.signal_alignment, SignalAlignment::StronglyAligned);
        assert_eq!(data.trading_recommendation, "Both signals bullish - enter long position");
        assert!((report.metadata.confidence - 0.85).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fuse_defaults_when_feeds_down() {
        let engine = SentimentFusionEngine::new(Arc::new(StaticMcpClient::new()));
        let report = engine.fuse("ETH", Some(20.0), Some(70.0), "1h").await.unwrap();
        let data = &report.data;

        assert!((data.volatility_index - 0.3).abs() < 1e-9);
        assert_eq!(data.signal_alignment, SignalAlignment::Divergent);
        assert_eq!(data.combined_signal, FusionSignal::Hold);
        assert_eq!(
            data.trading_recommendation,
            "Neutral combined signal - wait for clearer directional bias"
        );
    }

    #[test]
    fn test_conviction_extremes_and_cap() {
        let c = conviction(90.0, 85.0, 0.5, SignalAlignment::StronglyAligned);
        assert!((c - 1.0).abs() < 1e-9);

        let c = conviction(50.0, 10.0, 0.1, SignalAlignment::Divergent);
        assert!((c - 0.40).abs() < 1e-9);
    }

    #[test]
    fn test_divergent_quiet_market_follows_technicals() {
        let text = recommendation(
            FusionSignal::Buy,
            VolatilityRegime::Low,
            SignalAlignment::Divergent,
            30.0,
            80.0,
        );
        assert!(text.starts_with("Technical bullish"));
    }
}
