//! Sentiment Aggregation
//!
//! Pulls every requested sentiment source in parallel and folds the readings
//! into one 0-100 score. Sources that fail are reported as warnings and
//! lower the confidence; the remaining weights are renormalised.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use agent_core::{ConfidencePolicy, gather};

use super::feeds::{
    FearGreedReading, NewsReading, SentimentCategory, SentimentFeeds, SocialReading, WhaleReading,
};
use super::indicators;
use super::response::SkillReport;
use crate::error::{AnalystError, Result};
use crate::model::{round_dp, trading_pair};

const POLICY: ConfidencePolicy = ConfidencePolicy::new(0.70, 0.25);
const DEFAULT_VOLATILITY: f64 = 0.3;
const ATR_SCALE: f64 = 500.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentSource {
    Social,
    #[serde(rename = "feargreed")]
    FearGreed,
    News,
    Whale,
}

impl SentimentSource {
    pub const ALL: [Self; 4] = [Self::Social, Self::FearGreed, Self::News, Self::Whale];

    pub const fn weight(self) -> f64 {
        match self {
            Self::Social => 0.30,
            Self::FearGreed => 0.40,
            Self::News => 0.20,
            Self::Whale => 0.10,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::FearGreed => "feargreed",
            Self::News => "news",
            Self::Whale => "whale",
        }
    }
}

impl fmt::Display for SentimentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentSource {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|src| src.as_str() == s)
            .ok_or_else(|| AnalystError::InvalidAnalysisType {
                value: s.to_string(),
                valid: "social, feargreed, news, whale",
            })
    }
}

/// Readings that made it back, one slot per source
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SourceReadings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<SocialReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feargreed: Option<FearGreedReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news: Option<NewsReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whale: Option<WhaleReading>,
}

impl SourceReadings {
    /// Weighted 0-100 score over the sources present (50 when none are)
    pub fn overall(&self) -> f64 {
        let scored = [
            self.social
                .as_ref()
                .map(|s| (SentimentSource::Social, s.balance / 2.0 + 50.0)),
            self.feargreed
                .as_ref()
                .map(|f| (SentimentSource::FearGreed, f.value)),
            self.news
                .as_ref()
                .map(|n| (SentimentSource::News, n.sentiment * 100.0)),
            self.whale
                .as_ref()
                .map(|w| (SentimentSource::Whale, w.signal.score())),
        ];

        let (weighted, weights) = scored
            .iter()
            .flatten()
            .fold((0.0, 0.0), |(sum, w), (src, score)| {
                (src.weight().mul_add(*score, sum), w + src.weight())
            });

        if weights == 0.0 { 50.0 } else { weighted / weights }
    }
}

enum Reading {
    Social(SocialReading),
    FearGreed(FearGreedReading),
    News(NewsReading),
    Whale(WhaleReading),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateData {
    pub overall_sentiment: f64,
    pub sentiment_category: SentimentCategory,
    #[serde(flatten)]
    pub sources: SourceReadings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateMetadata {
    pub days_analyzed: u32,
    pub sources_count: usize,
    pub confidence: f64,
    pub volatility_index: f64,
    pub warnings: Vec<String>,
}

pub type AggregateReport = SkillReport<AggregateData, AggregateMetadata>;

/// Multi-source crowd sentiment
pub struct SentimentAggregator {
    feeds: SentimentFeeds,
}

impl SentimentAggregator {
    pub const fn new(feeds: SentimentFeeds) -> Self {
        Self { feeds }
    }

    /// Aggregate `sources` (all four when empty) over `days`
    pub async fn aggregate(
        &self,
        asset: &str,
        sources: &[SentimentSource],
        days: u32,
    ) -> Result<AggregateReport> {
        let sources = if sources.is_empty() {
            SentimentSource::ALL.to_vec()
        } else {
            sources.to_vec()
        };

        let feeds = &self.feeds;
        let tasks = sources.iter().map(|src| {
            let fut: BoxFuture<'_, Result<Reading>> = match src {
                SentimentSource::Social => feeds.fetch_social(asset, days).map(|r| r.map(Reading::Social)).boxed(),
                SentimentSource::FearGreed => feeds.fetch_fear_greed().map(|r| r.map(Reading::FearGreed)).boxed(),
                SentimentSource::News => feeds.fetch_news(asset, days).map(|r| Ok(Reading::News(r))).boxed(),
                SentimentSource::Whale => feeds.fetch_whale(asset, days).map(|r| Ok(Reading::Whale(r))).boxed(),
            };
            (*src, fut)
        });

        let (gathered, volatility_index) =
            futures::join!(gather(tasks), self.volatility_index(asset));

        let confidence = gathered.confidence(POLICY);
        let warnings = gathered.warnings();
        let failed = gathered.failed();

        let mut readings = SourceReadings::default();
        for (_, reading) in gathered.successes {
            match reading {
                Reading::Social(s) => readings.social = Some(s),
                Reading::FearGreed(f) => readings.feargreed = Some(f),
                Reading::News(n) => readings.news = Some(n),
                Reading::Whale(w) => readings.whale = Some(w),
            }
        }

        let overall = readings.overall();

        tracing::debug!(
            asset = %asset,
            overall = overall,
            failed = failed,
            "Sentiment aggregated"
        );

        Ok(SkillReport::for_symbol(
            "crypto-sentiment-aggregator",
            "sentiment_aggregated",
            asset,
            AggregateData {
                overall_sentiment: round_dp(overall, 2),
                sentiment_category: SentimentCategory::from_score(overall),
                sources: readings,
            },
            AggregateMetadata {
                days_analyzed: days,
                sources_count: sources.len(),
                confidence: round_dp(confidence, 2),
                volatility_index: round_dp(volatility_index, 2),
                warnings,
            },
        ))
    }

    /// Last ATR scaled against a 500 USD reference move, capped at 1.0
    async fn volatility_index(&self, asset: &str) -> f64 {
        indicators::fetch_atr(self.feeds.client(), &trading_pair(asset), "1d")
            .await
            .ok()
            .and_then(|atr| atr.last().copied())
            .map_or(DEFAULT_VOLATILITY, |atr| (atr / ATR_SCALE).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::feeds::{FearGreedTrend, SocialTrend, WhaleSignal};
    use crate::skills::indicators::{FEAR_GREED_CURRENT, SENTIMENT_BALANCE};
    use crate::source::MockMarketData;
    use agent_core::StaticMcpClient;
    use serde_json::json;
    use std::sync::Arc;

    fn social(balance: f64) -> SocialReading {
        SocialReading {
            volume: 15000.0,
            balance,
            dominance: 25.3,
            trend: SocialTrend::Stable,
        }
    }

    #[test]
    fn test_overall_all_sources() {
        let readings = SourceReadings {
            social: Some(social(20.0)),
            feargreed: Some(FearGreedReading {
                value: 75.0,
                category: SentimentCategory::ExtremeGreed,
                trend: FearGreedTrend::Stable,
            }),
            news: Some(NewsReading {
                sentiment: 0.65,
                article_count: 3,
                trending_topics: Vec::new(),
                error: None,
            }),
            whale: Some(WhaleReading {
                large_tx_count: 2,
                net_flow: 10.0,
                signal: WhaleSignal::Accumulation,
                error: None,
            }),
        };

        assert!((readings.overall() - 68.5).abs() < 1e-9);
    }

    #[test]
    fn test_overall_renormalises_and_defaults() {
        let social_only = SourceReadings {
            social: Some(social(30.0)),
            ..SourceReadings::default()
        };
        assert!((social_only.overall() - 65.0).abs() < 1e-9);
        assert!((SourceReadings::default().overall() - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_aggregate_with_mock() {
        let aggregator = SentimentAggregator::new(SentimentFeeds::new(Arc::new(MockMarketData::new())));
        let report = aggregator.aggregate("BTC", &[], 7).await.unwrap();

        assert_eq!(report.metadata.sources_count, 4);
        assert!((report.metadata.confidence - 0.95).abs() < 1e-9);
        assert!(report.metadata.warnings.is_empty());
        assert_eq!(report.data.sentiment_category, SentimentCategory::Greed);

        let rendered = report.render(true).unwrap();
        assert_eq!(rendered["source"], "crypto-sentiment-aggregator");
        assert_eq!(rendered["data_type"], "sentiment_aggregated");
        assert!(rendered["data"]["feargreed"]["value"].is_number());
    }

    #[tokio::test]
    async fn test_failed_source_lowers_confidence() {
        let mcp = StaticMcpClient::new()
            .with_response(SENTIMENT_BALANCE, json!({"balance": 4.0}))
            .with_failure(FEAR_GREED_CURRENT, "timeout");
        let aggregator = SentimentAggregator::new(SentimentFeeds::new(Arc::new(mcp)));

        let report = aggregator
            .aggregate("BTC", &[SentimentSource::Social, SentimentSource::FearGreed], 7)
            .await
            .unwrap();

        assert!((report.metadata.confidence - 0.825).abs() < 1e-9);
        assert_eq!(report.metadata.warnings.len(), 1);
        assert!(report.metadata.warnings[0].starts_with("feargreed: "));
        assert!((report.data.overall_sentiment - 52.0).abs() < 1e-9);
        assert!((report.metadata.volatility_index - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!("feargreed".parse::<SentimentSource>().unwrap(), SentimentSource::FearGreed);
        assert!("twitter".parse::<SentimentSource>().is_err());
    }
}
