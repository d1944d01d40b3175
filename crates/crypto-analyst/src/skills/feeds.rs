//! Sentiment Feeds
//!
//! Fetchers for the individual crowd-sentiment sources. News and whale
//! readings fall back to neutral values when their server is down; social
//! and fear & greed readings surface the failure to the caller.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use agent_core::McpClient;

use super::indicators::{
    self, CRYPTO_NEWS, FEAR_GREED_CURRENT, FEAR_GREED_HISTORY, SENTIMENT_BALANCE,
    SOCIAL_DOMINANCE, SOCIAL_VOLUME, WHALE_TRANSACTIONS,
};
use super::response::SkillReport;
use crate::error::{AnalystError, Result};
use crate::model::{asset_slug, round_dp};

/// Five-bucket crowd mood on a 0-100 scale
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentCategory {
    #[serde(rename = "Extreme Greed")]
    ExtremeGreed,
    Greed,
    Neutral,
    Fear,
    #[serde(rename = "Extreme Fear")]
    ExtremeFear,
}

impl SentimentCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::ExtremeGreed
        } else if score >= 55.0 {
            Self::Greed
        } else if score >= 45.0 {
            Self::Neutral
        } else if score >= 25.0 {
            Self::Fear
        } else {
            Self::ExtremeFear
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialTrend {
    Increasing,
    Stable,
    Decreasing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FearGreedTrend {
    Improving,
    Stable,
    Deteriorating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhaleSignal {
    Accumulation,
    Distribution,
    Neutral,
}

impl WhaleSignal {
    /// Score contribution on the 0-100 sentiment scale
    pub const fn score(self) -> f64 {
        match self {
            Self::Accumulation => 75.0,
            Self::Distribution => 25.0,
            Self::Neutral => 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocialReading {
    pub volume: f64,
    pub balance: f64,
    pub dominance: f64,
    pub trend: SocialTrend,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FearGreedReading {
    pub value: f64,
    pub category: SentimentCategory,
    pub trend: FearGreedTrend,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsReading {
    /// 0.0 (all negative) - 1.0 (all positive)
    pub sentiment: f64,
    pub article_count: usize,
    pub trending_topics: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhaleReading {
    pub large_tx_count: usize,

    /// Exchange outflows minus inflows (USD)
    pub net_flow: f64,
    pub signal: WhaleSignal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WhaleReading {
    fn neutral(error: Option<String>) -> Self {
        Self {
            large_tx_count: 0,
            net_flow: 0.0,
            signal: WhaleSignal::Neutral,
            error,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedMetadata {
    pub days_analyzed: u32,
    pub confidence: f64,
}

pub fn social_trend(balance: f64) -> SocialTrend {
    if balance > 10.0 {
        SocialTrend::Increasing
    } else if balance < -10.0 {
        SocialTrend::Decreasing
    } else {
        SocialTrend::Stable
    }
}

/// News polarity: positive counts 1, neutral 0.5, negative 0
#[allow(clippy::cast_precision_loss)]
pub fn news_polarity(articles: &[Value]) -> f64 {
    if articles.is_empty() {
        return 0.5;
    }

    let total: f64 = articles
        .iter()
        .map(|a| match a.get("sentiment").and_then(Value::as_str) {
            Some("positive" | "bullish") => 1.0,
            Some("negative" | "bearish") => 0.0,
            _ => 0.5,
        })
        .sum();

    total / articles.len() as f64
}

/// Most frequent tags, ties broken alphabetically
pub fn trending_topics(articles: &[Value], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in articles
        .iter()
        .filter_map(|a| a.get("tags")?.as_array())
        .flatten()
        .filter_map(Value::as_str)
    {
        *counts.entry(tag).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(limit).map(|(t, _)| t.to_string()).collect()
}

/// Direct access to each sentiment source
#[derive(Clone)]
pub struct SentimentFeeds {
    mcp: Arc<dyn McpClient>,
}

impl SentimentFeeds {
    pub fn new(mcp: Arc<dyn McpClient>) -> Self {
        Self { mcp }
    }

    pub(crate) fn client(&self) -> &dyn McpClient {
        self.mcp.as_ref()
    }

    /// Volume, balance and dominance; fails only if all three are unavailable
    pub async fn fetch_social(&self, asset: &str, days: u32) -> Result<SocialReading> {
        let params = json!({ "asset": asset_slug(asset), "days": days });
        let (volume, balance, dominance) = futures::join!(
            self.mcp.call_tool(SOCIAL_VOLUME, params.clone()),
            self.mcp.call_tool(SENTIMENT_BALANCE, params.clone()),
            self.mcp.call_tool(SOCIAL_DOMINANCE, params),
        );

        if volume.is_err() && balance.is_err() && dominance.is_err() {
            return Err(AnalystError::DataSource(format!(
                "No social metrics available for {asset}"
            )));
        }

        let read = |r: agent_core::Result<Value>, key: &str| {
            r.ok()
                .and_then(|reply| indicators::reading(&reply, key))
                .unwrap_or_default()
        };
        let balance = read(balance, "balance");

        Ok(SocialReading {
            volume: read(volume, "volume"),
            balance,
            dominance: read(dominance, "dominance"),
            trend: social_trend(balance),
        })
    }

    /// Current index plus trend against the oldest reading of the last week
    pub async fn fetch_fear_greed(&self) -> Result<FearGreedReading> {
        let (current, history) = futures::join!(
            self.mcp.call_tool(FEAR_GREED_CURRENT, json!({})),
            self.mcp.call_tool(FEAR_GREED_HISTORY, json!({ "days": 7 })),
        );

        let value = indicators::reading(&current?, "value")
            .ok_or_else(|| AnalystError::DataSource("Fear & Greed reading missing".into()))?;

        let oldest = history.ok().and_then(|reply| {
            indicators::field(&reply, "data")?
                .as_array()?
                .first()?
                .get("value")?
                .as_f64()
        });

        let trend = match oldest.map(|o| value - o) {
            Some(change) if change > 5.0 => FearGreedTrend::Improving,
            Some(change) if change < -5.0 => FearGreedTrend::Deteriorating,
            _ => FearGreedTrend::Stable,
        };

        Ok(FearGreedReading {
            value,
            category: SentimentCategory::from_score(value),
            trend,
        })
    }

    /// Never fails; an unreachable news server reads as neutral
    pub async fn fetch_news(&self, asset: &str, days: u32) -> NewsReading {
        let params = json!({ "currency": asset.to_uppercase(), "days": days });

        match self.mcp.call_tool(CRYPTO_NEWS, params).await {
            Ok(reply) => {
                let articles = indicators::field(&reply, "articles")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                NewsReading {
                    sentiment: round_dp(news_polarity(&articles), 2),
                    article_count: articles.len(),
                    trending_topics: trending_topics(&articles, 5),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(asset = %asset, error = %e, "News feed unavailable");
                NewsReading {
                    sentiment: 0.5,
                    article_count: 0,
                    trending_topics: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Never fails; an unreachable whale tracker reads as neutral
    pub async fn fetch_whale(&self, asset: &str, days: u32) -> WhaleReading {
        let params = json!({ "asset": asset.to_uppercase(), "days": days });

        let reply = match self.mcp.call_tool(WHALE_TRANSACTIONS, params).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(asset = %asset, error = %e, "Whale tracker unavailable");
                return WhaleReading::neutral(Some(e.to_string()));
            }
        };

        let Some(transactions) = indicators::field(&reply, "transactions").and_then(Value::as_array)
        else {
            return WhaleReading::neutral(None);
        };

        let net_flow: f64 = transactions
            .iter()
            .map(|tx| {
                let amount = tx.get("amount_usd").and_then(Value::as_f64).unwrap_or_default();
                match tx.get("direction").and_then(Value::as_str) {
                    Some("exchange_outflow") => amount,
                    Some("exchange_inflow") => -amount,
                    _ => 0.0,
                }
            })
            .sum();

        let signal = if net_flow > 0.0 {
            WhaleSignal::Accumulation
        } else if net_flow < 0.0 {
            WhaleSignal::Distribution
        } else {
            WhaleSignal::Neutral
        };

        WhaleReading {
            large_tx_count: transactions.len(),
            net_flow: round_dp(net_flow, 2),
            signal,
            error: None,
        }
    }

    /// `news_sentiment` skill envelope
    pub async fn news_report(&self, asset: &str, days: u32) -> SkillReport<NewsReading, FeedMetadata> {
        let reading = self.fetch_news(asset, days).await;
        let confidence = if reading.error.is_some() { 0.50 } else { 0.75 };

        SkillReport::for_symbol(
            "sentiment-analysis-skill",
            "news_sentiment",
            asset,
            reading,
            FeedMetadata {
                days_analyzed: days,
                confidence,
            },
        )
    }

    /// `whale_activity` skill envelope
    pub async fn whale_report(&self, asset: &str, days: u32) -> SkillReport<WhaleReading, FeedMetadata> {
        let reading = self.fetch_whale(asset, days).await;
        let confidence = if reading.error.is_some() { 0.50 } else { 0.75 };

        SkillReport::for_symbol(
            "sentiment-analysis-skill",
            "whale_activity",
            asset,
            reading,
            FeedMetadata {
                days_analyzed: days,
                confidence,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;
    use agent_core::StaticMcpClient;

    fn mock_feeds() -> SentimentFeeds {
        SentimentFeeds::new(Arc::new(MockMarketData::new()))
    }

    #[tokio::test]
    async fn test_social_from_text_readings() {
        let social = mock_feeds().fetch_social("BTC", 7).await.unwrap();
        assert!((social.volume - 15000.0).abs() < 1e-9);
        assert!((social.balance - 12.5).abs() < 1e-9);
        assert!((social.dominance - 25.3).abs() < 1e-9);
        assert_eq!(social.trend, SocialTrend::Increasing);
    }

    #[tokio::test]
    async fn test_social_fails_without_any_metric() {
        let feeds = SentimentFeeds::new(Arc::new(StaticMcpClient::new()));
        assert!(feeds.fetch_social("BTC", 7).await.is_err());
    }

    #[tokio::test]
    async fn test_fear_greed_trend() {
        let reading = mock_feeds().fetch_fear_greed().await.unwrap();
        assert!((reading.value - 68.0).abs() < 1e-9);
        assert_eq!(reading.category, SentimentCategory::Greed);
        assert_eq!(reading.trend, FearGreedTrend::Improving);
    }

    #[tokio::test]
    async fn test_news_fallback_on_error() {
        let mcp = StaticMcpClient::new().with_failure(CRYPTO_NEWS, "Network error");
        let news = SentimentFeeds::new(Arc::new(mcp)).fetch_news("BTC", 7).await;

        assert!((news.sentiment - 0.5).abs() < f64::EPSILON);
        assert_eq!(news.article_count, 0);
        assert!(news.trending_topics.is_empty());
        assert!(news.error.is_some());
    }

    #[tokio::test]
    async fn test_news_and_whales_from_mock() {
        let feeds = mock_feeds();

        let news = feeds.fetch_news("BTC", 7).await;
        assert_eq!(news.article_count, 10);
        assert!((news.sentiment - 0.7).abs() < 1e-9);
        assert_eq!(news.trending_topics[0], "etf");

        let whale = feeds.fetch_whale("BTC", 7).await;
        assert_eq!(whale.large_tx_count, 5);
        assert!((whale.net_flow - 750_000_000.0).abs() < 1e-6);
        assert_eq!(whale.signal, WhaleSignal::Accumulation);
    }

    #[test]
    fn test_category_buckets() {
        assert_eq!(SentimentCategory::from_score(75.0), SentimentCategory::ExtremeGreed);
        assert_eq!(SentimentCategory::from_score(60.0), SentimentCategory::Greed);
        assert_eq!(SentimentCategory::from_score(45.0), SentimentCategory::Neutral);
        assert_eq!(SentimentCategory::from_score(25.0), SentimentCategory::Fear);
        assert_eq!(SentimentCategory::from_score(0.0), SentimentCategory::ExtremeFear);
    }
}
