//! Batch Analysis
//!
//! Runs a symbol x analysis matrix (or one analysis across timeframes) in
//! parallel. Individual failures are dropped from the results and only show
//! up in the confidence and the warning list.

use chrono::Utc;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use agent_core::{ConfidencePolicy, McpClient, gather};

use super::feeds::SentimentFeeds;
use super::momentum::MomentumScorer;
use super::response::SkillReport;
use super::risk_calculator::RiskCalculator;
use super::sentiment_fusion::SentimentFusionEngine;
use super::support_resistance::{LevelQuery, SupportResistanceIdentifier};
use super::volatility::VolatilityAnalyzer;
use crate::error::{AnalystError, Result};
use crate::model::round_dp;

const SYMBOL_POLICY: ConfidencePolicy = ConfidencePolicy::new(0.70, 0.25);
const TIMEFRAME_POLICY: ConfidencePolicy = ConfidencePolicy::new(0.80, 0.15);
const FEED_DAYS: u32 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    SentimentFusion,
    Momentum,
    Volatility,
    SupportResistance,
    NewsSentiment,
    WhaleActivity,
}

impl AnalysisKind {
    pub const ALL: [Self; 6] = [
        Self::SentimentFusion,
        Self::Momentum,
        Self::Volatility,
        Self::SupportResistance,
        Self::NewsSentiment,
        Self::WhaleActivity,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SentimentFusion => "sentiment_fusion",
            Self::Momentum => "momentum",
            Self::Volatility => "volatility",
            Self::SupportResistance => "support_resistance",
            Self::NewsSentiment => "news_sentiment",
            Self::WhaleActivity => "whale_activity",
        }
    }

    /// Analyses that depend on the candle timeframe
    pub const fn is_timeframe_based(self) -> bool {
        matches!(self, Self::Momentum | Self::Volatility | Self::SupportResistance)
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AnalystError::UnsupportedAnalysisType(s.to_string()))
    }
}

/// First occurrence of each entry in order, plus the repeats that were dropped
fn dedupe<'a, S: AsRef<str> + 'a>(items: impl IntoIterator<Item = &'a S>) -> (Vec<&'a str>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    let mut repeats = Vec::new();

    for item in items {
        let item = item.as_ref();
        if seen.insert(item) {
            unique.push(item);
        } else {
            repeats.push(item.to_string());
        }
    }
    (unique, repeats)
}

/// One cell of the symbol x analysis matrix
#[derive(Clone, Debug, PartialEq, Eq)]
struct BatchTask {
    symbol: String,
    kind: AnalysisKind,
}

impl fmt::Display for BatchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.kind)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiSymbolMetadata {
    pub symbols_analyzed: usize,
    pub total_analyses: usize,
    pub failed_analyses: usize,
    pub timeframe: String,
    pub execution_time_ms: i64,
    pub confidence: f64,
    pub warnings: Vec<String>,

    /// Repeated symbols or analysis types dropped before running
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiTimeframeMetadata {
    pub analysis_type: AnalysisKind,
    pub timeframes_analyzed: usize,
    pub failed_analyses: usize,
    pub execution_time_ms: i64,
    pub confidence: f64,

    /// Repeated timeframes dropped before running
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_timeframes: Vec<String>,
}

/// `symbol -> analysis -> data`
pub type MultiSymbolReport = SkillReport<BTreeMap<String, BTreeMap<String, Value>>, MultiSymbolMetadata>;

/// `timeframe -> data`
pub type MultiTimeframeReport = SkillReport<BTreeMap<String, Value>, MultiTimeframeMetadata>;

type Pending<'a> = BoxFuture<'a, Result<Value>>;

/// The skills a batch dispatches to, built once per run
struct SkillSet {
    fusion: SentimentFusionEngine,
    momentum: MomentumScorer,
    levels: SupportResistanceIdentifier,
    volatility: VolatilityAnalyzer,
    feeds: SentimentFeeds,
}

impl SkillSet {
    fn new(mcp: &Arc<dyn McpClient>) -> Self {
        Self {
            fusion: SentimentFusionEngine::new(Arc::clone(mcp)),
            momentum: MomentumScorer::new(Arc::clone(mcp)),
            levels: SupportResistanceIdentifier::new(Arc::clone(mcp)),
            volatility: VolatilityAnalyzer::new(RiskCalculator::new(Arc::clone(mcp))),
            feeds: SentimentFeeds::new(Arc::clone(mcp)),
        }
    }

    /// Data section of one analysis, pair-based skills get `{S}/USDT`
    fn run<'a>(&'a self, kind: AnalysisKind, symbol: &'a str, timeframe: &'a str) -> Pending<'a> {
        async move {
            let pair = format!("{symbol}/USDT");
            let data = match kind {
                AnalysisKind::SentimentFusion => {
                    serde_json::to_value(self.fusion.fuse(symbol, None, None, timeframe).await?.data)?
                }
                AnalysisKind::Momentum => {
                    serde_json::to_value(self.momentum.score(&pair, timeframe).await?.data)?
                }
                AnalysisKind::SupportResistance => {
                    let query = LevelQuery::timeframe(timeframe);
                    serde_json::to_value(self.levels.identify(&pair, &query).await?.data)?
                }
                AnalysisKind::Volatility => {
                    serde_json::to_value(self.volatility.analyze(&pair, timeframe).await?.data)?
                }
                AnalysisKind::NewsSentiment => {
                    serde_json::to_value(self.feeds.news_report(symbol, FEED_DAYS).await.data)?
                }
                AnalysisKind::WhaleActivity => {
                    serde_json::to_value(self.feeds.whale_report(symbol, FEED_DAYS).await.data)?
                }
            };
            Ok(data)
        }
        .boxed()
    }
}

/// Parallel analysis across symbols and timeframes
pub struct BatchAnalyzer {
    mcp: Arc<dyn McpClient>,
}

impl BatchAnalyzer {
    pub fn new(mcp: Arc<dyn McpClient>) -> Self {
        Self { mcp }
    }

    /// Run every requested analysis for every symbol
    ///
    /// Analysis names that are not recognised are skipped. Repeated symbols
    /// and analysis names run once and are listed in `duplicates`.
    pub async fn analyze_multi_symbol<S: AsRef<str>, T: AsRef<str>>(
        &self,
        symbols: &[S],
        analysis_types: &[T],
        timeframe: &str,
    ) -> MultiSymbolReport {
        let started = Utc::now();
        let (symbols, mut duplicates) = dedupe(symbols);
        let (names, repeated_types) = dedupe(analysis_types);
        duplicates.extend(repeated_types);
        if !duplicates.is_empty() {
            tracing::debug!(duplicates = ?duplicates, "Dropping repeated batch entries");
        }

        let kinds: Vec<AnalysisKind> = names
            .into_iter()
            .filter_map(|name| match name.parse() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    tracing::debug!(analysis_type = %name, "Skipping unknown analysis type");
                    None
                }
            })
            .collect();

        let skills = SkillSet::new(&self.mcp);
        let tasks = symbols.iter().flat_map(|symbol| {
            let symbol = *symbol;
            let skills = &skills;
            kinds.iter().copied().map(move |kind| {
                let key = BatchTask {
                    symbol: symbol.to_string(),
                    kind,
                };
                (key, skills.run(kind, symbol, timeframe))
            })
        });

        let gathered = gather(tasks).await;
        let confidence = gathered.confidence(SYMBOL_POLICY);
        let warnings = gathered.warnings();
        let failed = gathered.failed();
        let total = gathered.successes.len();

        let mut data: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
        for (task, value) in gathered.successes {
            data.entry(task.symbol)
                .or_default()
                .insert(task.kind.to_string(), value);
        }

        let execution_time_ms = (Utc::now() - started).num_milliseconds();

        tracing::info!(
            symbols = symbols.len(),
            analyses = total,
            failed = failed,
            elapsed_ms = execution_time_ms,
            "Multi-symbol batch complete"
        );

        SkillReport::new(
            "batch-analysis-skill",
            "multi_symbol_analysis",
            data,
            MultiSymbolMetadata {
                symbols_analyzed: symbols.len(),
                total_analyses: total,
                failed_analyses: failed,
                timeframe: timeframe.to_string(),
                execution_time_ms,
                confidence: round_dp(confidence, 2),
                warnings,
                duplicates,
            },
        )
    }

    /// Run one timeframe-based analysis for `symbol` on each timeframe
    ///
    /// A repeated timeframe runs once and is listed in `duplicate_timeframes`.
    pub async fn analyze_multi_timeframe<S: AsRef<str>>(
        &self,
        symbol: &str,
        timeframes: &[S],
        analysis_type: &str,
    ) -> Result<MultiTimeframeReport> {
        let kind = analysis_type
            .parse::<AnalysisKind>()
            .ok()
            .filter(|k| k.is_timeframe_based())
            .ok_or_else(|| AnalystError::UnsupportedAnalysisType(analysis_type.to_string()))?;

        let started = Utc::now();
        let (timeframes, duplicate_timeframes) = dedupe(timeframes);
        if !duplicate_timeframes.is_empty() {
            tracing::debug!(duplicates = ?duplicate_timeframes, "Dropping repeated timeframes");
        }

        let skills = SkillSet::new(&self.mcp);
        let tasks = timeframes
            .iter()
            .map(|tf| (tf.to_string(), skills.run(kind, symbol, tf)));

        let gathered = gather(tasks).await;
        let confidence = gathered.confidence(TIMEFRAME_POLICY);
        let failed = gathered.failed();
        let analyzed = gathered.successes.len();
        let data: BTreeMap<String, Value> = gathered.successes.into_iter().collect();

        let execution_time_ms = (Utc::now() - started).num_milliseconds();

        tracing::info!(
            symbol = %symbol,
            analysis_type = %kind,
            timeframes = analyzed,
            failed = failed,
            "Multi-timeframe batch complete"
        );

        Ok(SkillReport::for_symbol(
            "batch-analysis-skill",
            "multi_timeframe_analysis",
            symbol,
            data,
            MultiTimeframeMetadata {
                analysis_type: kind,
                timeframes_analyzed: analyzed,
                failed_analyses: failed,
                execution_time_ms,
                confidence: round_dp(confidence, 2),
                duplicate_timeframes,
            },
        ))
    }

    /// Every analysis type for every symbol
    pub async fn comprehensive_scan<S: AsRef<str>>(
        &self,
        symbols: &[S],
        timeframe: &str,
    ) -> MultiSymbolReport {
        let all = AnalysisKind::ALL.map(AnalysisKind::as_str);
        let symbols: Vec<&str> = symbols.iter().map(AsRef::as_ref).collect();
        self.analyze_multi_symbol(&symbols, &all, timeframe).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::indicators;
    use crate::source::MockMarketData;

    fn analyzer(mock: MockMarketData) -> BatchAnalyzer {
        BatchAnalyzer::new(Arc::new(mock))
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("whale_activity".parse::<AnalysisKind>().unwrap(), AnalysisKind::WhaleActivity);
        assert!("astrology".parse::<AnalysisKind>().is_err());
        assert!(AnalysisKind::Volatility.is_timeframe_based());
        assert!(!AnalysisKind::NewsSentiment.is_timeframe_based());
    }

    #[tokio::test]
    async fn test_multi_symbol_skips_unknown_types() {
        let report = analyzer(MockMarketData::new())
            .analyze_multi_symbol(&["BTC", "ETH"], &["momentum", "volatility", "astrology"], "4h")
            .await;

        assert_eq!(report.metadata.symbols_analyzed, 2);
        assert_eq!(report.metadata.total_analyses, 4);
        assert_eq!(report.metadata.failed_analyses, 0);
        assert!((report.metadata.confidence - 0.95).abs() < 1e-9);
        assert!(report.data["BTC"]["momentum"]["momentum_score"].is_number());
        assert!(report.data["ETH"].contains_key("volatility"));
    }

    #[tokio::test]
    async fn test_multi_symbol_drops_failures() {
        let mock = MockMarketData::new().fail_tool(indicators::RSI);
        let report = analyzer(mock)
            .analyze_multi_symbol(&["BTC", "SOL"], &["momentum", "whale_activity"], "4h")
            .await;

        assert_eq!(report.metadata.total_analyses, 2);
        assert_eq!(report.metadata.failed_analyses, 2);
        assert!((report.metadata.confidence - round_dp(SYMBOL_POLICY.score(0.5), 2)).abs() < 1e-9);
        assert!(report.metadata.warnings.iter().any(|w| w.starts_with("BTC:momentum: ")));
        assert!(!report.data["SOL"].contains_key("momentum"));
    }

    #[tokio::test]
    async fn test_multi_timeframe() {
        let report = analyzer(MockMarketData::new())
            .analyze_multi_timeframe("BTC", &["1h", "4h", "1d"], "momentum")
            .await
            .unwrap();

        assert_eq!(report.symbol.as_deref(), Some("BTC"));
        assert_eq!(report.metadata.timeframes_analyzed, 3);
        assert!((report.metadata.confidence - 0.95).abs() < 1e-9);
        assert!(report.data.contains_key("1d"));
    }

    #[tokio::test]
    async fn test_repeated_timeframes_run_once() {
        let report = analyzer(MockMarketData::new())
            .analyze_multi_timeframe("BTC", &["4h", "1d", "4h"], "momentum")
            .await
            .unwrap();

        assert_eq!(report.metadata.timeframes_analyzed, 2);
        assert_eq!(report.metadata.duplicate_timeframes, vec!["4h"]);
        assert_eq!(report.data.keys().collect::<Vec<_>>(), vec!["1d", "4h"]);

        let rendered = report.render(true).unwrap();
        assert_eq!(rendered["metadata"]["duplicate_timeframes"][0], "4h");
    }

    #[tokio::test]
    async fn test_repeated_symbols_and_types_run_once() {
        let report = analyzer(MockMarketData::new())
            .analyze_multi_symbol(&["BTC", "BTC"], &["momentum", "momentum"], "4h")
            .await;

        assert_eq!(report.metadata.symbols_analyzed, 1);
        assert_eq!(report.metadata.total_analyses, 1);
        assert_eq!(report.metadata.duplicates, vec!["BTC", "momentum"]);
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let (unique, repeats) = dedupe(&["1h", "4h", "1h", "1d", "4h"]);
        assert_eq!(unique, vec!["1h", "4h", "1d"]);
        assert_eq!(repeats, vec!["1h", "4h"]);
    }

    #[tokio::test]
    async fn test_multi_timeframe_rejects_symbol_level_analysis() {
        let err = analyzer(MockMarketData::new())
            .analyze_multi_timeframe("BTC", &["4h"], "news_sentiment")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unsupported analysis type: news_sentiment");
    }

    #[tokio::test]
    async fn test_comprehensive_scan_covers_all_types() {
        let report = analyzer(MockMarketData::new())
            .comprehensive_scan(&["BTC"], "4h")
            .await;

        assert_eq!(report.data["BTC"].len() + report.metadata.failed_analyses, 6);
        let rendered = report.render(true).unwrap();
        assert_eq!(rendered["data_type"], "multi_symbol_analysis");
        assert!(rendered.get("symbol").is_none());
    }
}
