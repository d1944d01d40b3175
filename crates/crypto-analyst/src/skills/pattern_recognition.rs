//! Chart Pattern Recognition
//!
//! Slides eight normalized chart templates across min-max scaled closes and
//! keeps every window whose Pearson correlation clears the template's
//! threshold. Matches are confirmed against the volume that preceded them.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use agent_core::McpClient;

use super::indicators::{self, FETCH_OHLCV};
use super::response::SkillReport;
use crate::error::{AnalystError, Result};
use crate::model::round_dp;

const MIN_CANDLES: usize = 20;
const VOLUME_BASELINE: usize = 20;

/// Bias weight one side needs over the other to win
const BIAS_MARGIN: f64 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

impl PatternBias {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

/// A normalized price shape
#[derive(Clone, Copy, Debug)]
pub struct ChartTemplate {
    pub name: &'static str,
    pub points: &'static [f64],
    pub min_correlation: f64,
    pub bias: PatternBias,
    pub interpretation: &'static str,
}

/// Every reversal and continuation shape has its mirror image in the set,
/// so matching uses the signed correlation.
pub const TEMPLATES: [ChartTemplate; 8] = [
    ChartTemplate {
        name: "head_shoulders",
        points: &[0.5, 0.8, 0.5, 1.0, 0.5, 0.8, 0.5],
        min_correlation: 0.75,
        bias: PatternBias::Bearish,
        interpretation: "Bearish reversal",
    },
    ChartTemplate {
        name: "inverse_head_shoulders",
        points: &[0.5, 0.2, 0.5, 0.0, 0.5, 0.2, 0.5],
        min_correlation: 0.75,
        bias: PatternBias::Bullish,
        interpretation: "Bullish reversal",
    },
    ChartTemplate {
        name: "double_top",
        points: &[0.3, 0.9, 0.4, 0.9, 0.3],
        min_correlation: 0.80,
        bias: PatternBias::Bearish,
        interpretation: "Bearish reversal",
    },
    ChartTemplate {
        name: "double_bottom",
        points: &[0.7, 0.1, 0.6, 0.1, 0.7],
        min_correlation: 0.80,
        bias: PatternBias::Bullish,
        interpretation: "Bullish reversal",
    },
    ChartTemplate {
        name: "ascending_triangle",
        points: &[0.2, 0.8, 0.3, 0.8, 0.4, 0.8, 0.5],
        min_correlation: 0.70,
        bias: PatternBias::Bullish,
        interpretation: "Bullish continuation",
    },
    ChartTemplate {
        name: "descending_triangle",
        points: &[0.8, 0.2, 0.7, 0.2, 0.6, 0.2, 0.5],
        min_correlation: 0.70,
        bias: PatternBias::Bearish,
        interpretation: "Bearish continuation",
    },
    ChartTemplate {
        name: "bull_flag",
        points: &[0.0, 0.8, 0.7, 0.8, 0.7, 0.8],
        min_correlation: 0.72,
        bias: PatternBias::Bullish,
        interpretation: "Bullish continuation",
    },
    ChartTemplate {
        name: "bear_flag",
        points: &[1.0, 0.2, 0.3, 0.2, 0.3, 0.2],
        min_correlation: 0.72,
        bias: PatternBias::Bearish,
        interpretation: "Bearish continuation",
    },
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternQuery {
    pub timeframe: String,
    pub lookback: u32,
    pub min_confidence: f64,
}

impl Default for PatternQuery {
    fn default() -> Self {
        Self {
            timeframe: "4h".into(),
            lookback: 100,
            min_confidence: 0.70,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub name: String,
    pub confidence: f64,
    pub bias: PatternBias,
    pub interpretation: String,
    pub start_index: usize,
    pub end_index: usize,
    pub volume_confirmed: bool,
    pub target_price: f64,
    pub risk_reward: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternData {
    pub patterns_found: Vec<PatternMatch>,
    pub strongest_pattern: Option<String>,
    pub overall_bias: PatternBias,
    pub pattern_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternMetadata {
    pub timeframe: String,
    pub lookback_periods: u32,
    pub min_confidence: f64,
    pub confidence: f64,
}

pub type PatternReport = SkillReport<PatternData, PatternMetadata>;

/// Min-max scale to 0.0 - 1.0; a flat series maps to 0.5
pub fn normalize(prices: &[f64]) -> Vec<f64> {
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range == 0.0 {
        return vec![0.5; prices.len()];
    }
    prices.iter().map(|p| (p - min) / range).collect()
}

/// Pearson correlation; 0.0 for mismatched lengths or a flat input
#[allow(clippy::cast_precision_loss)]
pub fn correlation(data: &[f64], template: &[f64]) -> f64 {
    if data.len() != template.len() || data.is_empty() {
        return 0.0;
    }

    let n = data.len() as f64;
    let mean_data = data.iter().sum::<f64>() / n;
    let mean_template = template.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut var_data = 0.0;
    let mut var_template = 0.0;
    for (d, t) in data.iter().zip(template) {
        let dd = d - mean_data;
        let dt = t - mean_template;
        numerator += dd * dt;
        var_data += dd * dd;
        var_template += dt * dt;
    }

    let denominator = var_data.sqrt() * var_template.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// `(correlation, start, end)` for every window at or above `min_correlation`
pub fn find_matches(normalized: &[f64], template: &[f64], min_correlation: f64) -> Vec<(f64, usize, usize)> {
    let width = template.len();
    if width == 0 || normalized.len() < width {
        return Vec::new();
    }

    normalized
        .windows(width)
        .enumerate()
        .filter_map(|(start, window)| {
            let corr = correlation(window, template);
            (corr >= min_correlation).then_some((corr, start, start + width - 1))
        })
        .collect()
}

/// Volume during the pattern must be at least 80% of the preceding baseline
///
/// A pattern at the very start of the series has no baseline and passes.
#[allow(clippy::cast_precision_loss)]
pub fn volume_confirms(volumes: &[f64], start: usize, end: usize) -> bool {
    if start > end || end >= volumes.len() {
        return false;
    }

    let during = &volumes[start..=end];
    let pattern_avg = during.iter().sum::<f64>() / during.len() as f64;

    let before = &volumes[start.saturating_sub(VOLUME_BASELINE)..start];
    if before.is_empty() {
        return true;
    }
    let baseline = before.iter().sum::<f64>() / before.len() as f64;
    if baseline == 0.0 {
        return true;
    }

    pattern_avg >= baseline * 0.8
}

/// Measured-move target from the last close, with reward over risk
pub fn target(closes: &[f64], start: usize, end: usize, bias: PatternBias) -> (f64, f64) {
    let Some(current) = closes.last().copied() else {
        return (0.0, 1.0);
    };
    let window = closes.get(start..=end).unwrap_or_default();
    let low = window.iter().copied().fold(f64::INFINITY, f64::min);
    let high = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if window.is_empty() { 0.0 } else { high - low };

    let target = match bias {
        PatternBias::Bullish => current + range,
        PatternBias::Bearish | PatternBias::Neutral => current - range,
    };

    let risk = if window.is_empty() { 0.0 } else { (current - low).abs() };
    let reward = (target - current).abs();
    let risk_reward = if risk > 0.0 { reward / risk } else { 1.0 };

    (target, risk_reward)
}

/// Confidence-weighted vote between bullish and bearish matches
pub fn overall_bias(patterns: &[PatternMatch]) -> PatternBias {
    let weight = |bias: PatternBias| {
        patterns
            .iter()
            .filter(|p| p.bias == bias)
            .map(|p| p.confidence)
            .sum::<f64>()
    };
    let bullish = weight(PatternBias::Bullish);
    let bearish = weight(PatternBias::Bearish);

    if patterns.is_empty() {
        PatternBias::Neutral
    } else if bullish > bearish * BIAS_MARGIN {
        PatternBias::Bullish
    } else if bearish > bullish * BIAS_MARGIN {
        PatternBias::Bearish
    } else {
        PatternBias::Neutral
    }
}

/// Scan closes and volumes against every template
pub fn scan(closes: &[f64], volumes: &[f64], min_confidence: f64) -> Vec<PatternMatch> {
    let normalized = normalize(closes);

    let mut found: Vec<PatternMatch> = TEMPLATES
        .iter()
        .flat_map(|template| {
            find_matches(&normalized, template.points, template.min_correlation)
                .into_iter()
                .map(move |(corr, start, end)| (template, corr, start, end))
        })
        .map(|(template, corr, start, end)| {
            let (target_price, risk_reward) = target(closes, start, end, template.bias);
            PatternMatch {
                name: template.name.to_string(),
                confidence: round_dp(corr, 2),
                bias: template.bias,
                interpretation: template.interpretation.to_string(),
                start_index: start,
                end_index: end,
                volume_confirmed: volume_confirms(volumes, start, end),
                target_price: round_dp(target_price, 2),
                risk_reward: round_dp(risk_reward, 2),
            }
        })
        .filter(|m| m.confidence >= min_confidence)
        .collect();

    found.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    found
}

/// Template-correlation pattern finder over OHLCV history
pub struct PatternRecognizer {
    mcp: Arc<dyn McpClient>,
    exchange_id: String,
}

impl PatternRecognizer {
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

    /// Recognize chart patterns for a trading pair such as `BTC/USDT`
    pub async fn recognize(&self, symbol: &str, query: &PatternQuery) -> Result<PatternReport> {
        let reply = self
            .mcp
            .call_tool(
                FETCH_OHLCV,
                json!({
                    "exchangeId": self.exchange_id,
                    "symbol": symbol,
                    "timeframe": query.timeframe,
                    "limit": query.lookback,
                }),
            )
            .await?;

        let candles = indicators::candles(&reply);
        if candles.len() < MIN_CANDLES {
            return Err(AnalystError::InsufficientData(format!(
                "Insufficient data: only {} candles available",
                candles.len()
            )));
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        let patterns = scan(&closes, &volumes, query.min_confidence);
        let bias = overall_bias(&patterns);
        let confidence = patterns.first().map_or(0.50, |p| p.confidence);

        tracing::debug!(
            symbol = %symbol,
            patterns = patterns.len(),
            bias = bias.as_str(),
            "Chart patterns scanned"
        );

        let data = PatternData {
            strongest_pattern: patterns.first().map(|p| p.name.clone()),
            overall_bias: bias,
            pattern_count: patterns.len(),
            patterns_found: patterns,
        };

        Ok(SkillReport::for_symbol(
            "technical-analysis-skill",
            "chart_patterns",
            symbol,
            data,
            PatternMetadata {
                timeframe: query.timeframe.clone(),
                lookback_periods: query.lookback,
                min_confidence: query.min_confidence,
                confidence: round_dp(confidence, 2),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::StaticMcpClient;
    use serde_json::Value;

    fn template(name: &str) -> &'static ChartTemplate {
        TEMPLATES.iter().find(|t| t.name == name).unwrap()
    }

    fn ohlcv(closes: &[f64], volumes: &[f64]) -> Value {
        let rows: Vec<Value> = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (c, v))| json!([1_700_000_000_000_u64 + i as u64 * 14_400_000, c, c * 1.01, c * 0.99, c, v]))
            .collect();
        json!({ "data": rows })
    }

    fn recognizer(reply: Value) -> PatternRecognizer {
        PatternRecognizer::new(Arc::new(StaticMcpClient::new().with_response(FETCH_OHLCV, reply)))
    }

    /// Flat tape at 100 followed by a double bottom spanning 90 - 105
    fn double_bottom_tape() -> Vec<f64> {
        let mut closes = vec![100.0; 20];
        closes.extend([103.0, 91.0, 101.0, 91.0, 103.0]);
        closes
    }

    #[test]
    fn test_correlation() {
        let points = template("double_top").points;
        assert!((correlation(points, points) - 1.0).abs() < 1e-9);

        let scaled: Vec<f64> = points.iter().map(|p| p * 40.0 + 7.0).collect();
        assert!((correlation(&scaled, points) - 1.0).abs() < 1e-9);

        // Mirror image is perfectly anti-correlated
        assert!((correlation(template("double_bottom").points, points) + 1.0).abs() < 1e-9);

        assert_eq!(correlation(&[1.0, 1.0, 1.0], &[0.1, 0.5, 0.9]), 0.0);
        assert_eq!(correlation(&[1.0, 2.0], &[0.1, 0.5, 0.9]), 0.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&[10.0, 15.0, 20.0]), vec![0.0, 0.5, 1.0]);
        assert_eq!(normalize(&[3.0, 3.0]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_find_matches_locates_embedded_shape() {
        let mut series = vec![0.5; 10];
        series.extend_from_slice(template("double_bottom").points);

        let matches = find_matches(&series, template("double_bottom").points, 0.80);
        let last = matches.last().unwrap();
        assert!((last.0 - 1.0).abs() < 1e-9);
        assert_eq!((last.1, last.2), (10, 14));
    }

    #[test]
    fn test_volume_confirmation() {
        let volumes = [100.0, 100.0, 100.0, 90.0, 85.0, 40.0, 30.0];
        assert!(volume_confirms(&volumes, 3, 4));
        assert!(!volume_confirms(&volumes, 5, 6));
        assert!(volume_confirms(&volumes, 0, 2));
        assert!(!volume_confirms(&volumes, 5, 9));
    }

    #[test]
    fn test_target_and_risk_reward() {
        let closes = [100.0, 90.0, 110.0, 95.0, 105.0];

        let (up, rr) = target(&closes, 1, 3, PatternBias::Bullish);
        assert!((up - 125.0).abs() < 1e-9);
        assert!((rr - 20.0 / 15.0).abs() < 1e-9);

        let (down, _) = target(&closes, 1, 3, PatternBias::Bearish);
        assert!((down - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_overall_bias_needs_margin() {
        let hit = |bias, confidence| PatternMatch {
            name: "x".into(),
            confidence,
            bias,
            interpretation: String::new(),
            start_index: 0,
            end_index: 4,
            volume_confirmed: true,
            target_price: 0.0,
            risk_reward: 1.0,
        };

        assert_eq!(overall_bias(&[]), PatternBias::Neutral);
        assert_eq!(
            overall_bias(&[hit(PatternBias::Bullish, 0.9), hit(PatternBias::Bearish, 0.8)]),
            PatternBias::Neutral
        );
        assert_eq!(
            overall_bias(&[hit(PatternBias::Bullish, 0.9), hit(PatternBias::Bearish, 0.7)]),
            PatternBias::Bullish
        );
        assert_eq!(overall_bias(&[hit(PatternBias::Bearish, 0.75)]), PatternBias::Bearish);
    }

    #[tokio::test]
    async fn test_recognize_double_bottom() {
        let closes = double_bottom_tape();
        let report = recognizer(ohlcv(&closes, &[1000.0; 25]))
            .recognize("BTC/USDT", &PatternQuery::default())
            .await
            .unwrap();
        let data = &report.data;

        assert_eq!(data.strongest_pattern.as_deref(), Some("double_bottom"));
        assert_eq!(data.overall_bias, PatternBias::Bullish);
        assert_eq!(data.pattern_count, data.patterns_found.len());
        assert!(data.patterns_found.iter().all(|p| p.confidence >= 0.70));

        let best = &data.patterns_found[0];
        assert_eq!((best.start_index, best.end_index), (20, 24));
        assert!(best.volume_confirmed);
        assert!((best.target_price - 115.0).abs() < 1e-9);
        assert!((report.metadata.confidence - best.confidence).abs() < 1e-9);
        assert_eq!(report.data_type, "chart_patterns");
    }

    #[tokio::test]
    async fn test_flat_tape_has_no_patterns() {
        let report = recognizer(ohlcv(&[100.0; 30], &[1000.0; 30]))
            .recognize("ETH/USDT", &PatternQuery::default())
            .await
            .unwrap();

        assert!(report.data.patterns_found.is_empty());
        assert_eq!(report.data.strongest_pattern, None);
        assert_eq!(report.data.overall_bias, PatternBias::Neutral);
        assert!((report.metadata.confidence - 0.50).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_recognize_rejects_short_history() {
        let err = recognizer(ohlcv(&[100.0; 12], &[1.0; 12]))
            .recognize("BTC/USDT", &PatternQuery::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Insufficient data: only 12 candles available");
    }
}
