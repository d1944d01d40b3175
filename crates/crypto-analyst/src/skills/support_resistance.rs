//! Support/Resistance Identification
//!
//! Pivot highs and lows over a lookback window, clustered by price and ranked
//! by touch count and traded volume near the level.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use agent_core::McpClient;

use super::indicators::{self, Candle, FETCH_OHLCV};
use super::response::SkillReport;
use crate::error::{AnalystError, Result};
use crate::model::round_dp;

const PIVOT_WINDOW: usize = 5;
const MIN_CANDLES: usize = 20;
const VOLUME_BAND: f64 = 0.01;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelQuery {
    pub timeframe: String,
    pub lookback: u32,

    /// Relative distance for two pivots to join a cluster
    pub tolerance: f64,
    pub top_n: usize,
}

impl Default for LevelQuery {
    fn default() -> Self {
        Self {
            timeframe: "1d".into(),
            lookback: 100,
            tolerance: 0.01,
            top_n: 5,
        }
    }
}

impl LevelQuery {
    pub fn timeframe(timeframe: impl Into<String>) -> Self {
        Self {
            timeframe: timeframe.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub strength: f64,
    pub touches: usize,
    pub volume_weight: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelData {
    pub support_levels: Vec<PriceLevel>,
    pub resistance_levels: Vec<PriceLevel>,
    pub current_price: f64,
    pub nearest_support: Option<f64>,
    pub nearest_resistance: Option<f64>,
    pub support_distance: Option<f64>,
    pub resistance_distance: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelMetadata {
    pub timeframe: String,
    pub lookback_periods: u32,
    pub tolerance: f64,
    pub confidence: f64,
}

pub type LevelReport = SkillReport<LevelData, LevelMetadata>;

/// Indices whose value dominates every neighbour within `window`
fn pivots(values: &[f64], window: usize, dominates: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    if values.len() <= window * 2 {
        return Vec::new();
    }

    (window..values.len() - window)
        .filter(|&i| (i - window..=i + window).all(|j| dominates(values[i], values[j])))
        .collect()
}

pub fn pivot_highs(highs: &[f64], window: usize) -> Vec<usize> {
    pivots(highs, window, |a, b| a >= b)
}

pub fn pivot_lows(lows: &[f64], window: usize) -> Vec<usize> {
    pivots(lows, window, |a, b| a <= b)
}

/// Group sorted prices into (mean, count) clusters
///
/// A price joins the open cluster when it is within `tolerance` of the
/// cluster's running mean.
#[allow(clippy::cast_precision_loss)]
pub fn cluster(prices: &[f64], tolerance: f64) -> Vec<(f64, usize)> {
    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut clusters = Vec::new();
    let mut current: Vec<f64> = Vec::new();
    let mean = |c: &[f64]| c.iter().sum::<f64>() / c.len() as f64;

    for price in sorted {
        if current.is_empty() {
            current.push(price);
            continue;
        }

        let m = mean(&current);
        if (price - m).abs() / m <= tolerance {
            current.push(price);
        } else {
            clusters.push((m, current.len()));
            current = vec![price];
        }
    }

    if !current.is_empty() {
        clusters.push((mean(&current), current.len()));
    }

    clusters
}

/// Share of volume traded within 1% of `target`, saturating at 10% of total
fn volume_weight(target: f64, prices: &[f64], volumes: &[f64]) -> f64 {
    let total: f64 = volumes.iter().sum();
    if total == 0.0 || target == 0.0 {
        return 0.0;
    }

    let at_level: f64 = prices
        .iter()
        .zip(volumes)
        .filter(|(p, _)| (**p - target).abs() / target <= VOLUME_BAND)
        .map(|(_, v)| v)
        .sum();

    (at_level / (total * 0.1)).min(1.0)
}

#[allow(clippy::cast_precision_loss)]
fn rank_levels(
    clusters: Vec<(f64, usize)>,
    prices: &[f64],
    volumes: &[f64],
    top_n: usize,
) -> Vec<PriceLevel> {
    let mut levels: Vec<PriceLevel> = clusters
        .into_iter()
        .map(|(price, touches)| {
            let weight = volume_weight(price, prices, volumes);
            let touch_score = (touches as f64 / 5.0).min(1.0);
            PriceLevel {
                price: round_dp(price, 2),
                strength: round_dp(0.6f64.mul_add(touch_score, 0.4 * weight), 2),
                touches,
                volume_weight: round_dp(weight, 2),
            }
        })
        .collect();

    levels.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    levels.truncate(top_n);
    levels
}

/// Pivot-based level finder over OHLCV history
pub struct SupportResistanceIdentifier {
    mcp: Arc<dyn McpClient>,
    exchange_id: String,
}

impl SupportResistanceIdentifier {
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

    /// Identify levels for a trading pair such as `BTC/USDT`
    #[allow(clippy::cast_precision_loss)]
    pub async fn identify(&self, symbol: &str, query: &LevelQuery) -> Result<LevelReport> {
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

        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let current_price = candles.last().map_or(0.0, |c: &Candle| c.close);

        let resistance_prices: Vec<f64> = pivot_highs(&highs, PIVOT_WINDOW)
            .into_iter()
            .map(|i| highs[i])
            .collect();
        let support_prices: Vec<f64> = pivot_lows(&lows, PIVOT_WINDOW)
            .into_iter()
            .map(|i| lows[i])
            .collect();

        let top_n = query.top_n.max(1);
        let resistance = rank_levels(cluster(&resistance_prices, query.tolerance), &highs, &volumes, top_n);
        let support = rank_levels(cluster(&support_prices, query.tolerance), &lows, &volumes, top_n);

        let nearest_support = support
            .iter()
            .map(|l| l.price)
            .filter(|p| *p < current_price)
            .reduce(f64::max);
        let nearest_resistance = resistance
            .iter()
            .map(|l| l.price)
            .filter(|p| *p > current_price)
            .reduce(f64::min);

        let n = top_n as f64;
        let confidence = (support.len() as f64 / n)
            .mul_add(0.15, 0.70 + (resistance.len() as f64 / n) * 0.10)
            .min(0.95);

        tracing::debug!(
            symbol = %symbol,
            supports = support.len(),
            resistances = resistance.len(),
            "Support/resistance identified"
        );

        let data = LevelData {
            support_levels: support,
            resistance_levels: resistance,
            current_price: round_dp(current_price, 2),
            nearest_support: nearest_support.map(|p| round_dp(p, 2)),
            nearest_resistance: nearest_resistance.map(|p| round_dp(p, 2)),
            support_distance: nearest_support.map(|p| round_dp(p - current_price, 2)),
            resistance_distance: nearest_resistance.map(|p| round_dp(p - current_price, 2)),
        };

        Ok(SkillReport::for_symbol(
            "technical-analysis-skill",
            "support_resistance",
            symbol,
            data,
            LevelMetadata {
                timeframe: query.timeframe.clone(),
                lookback_periods: query.lookback,
                tolerance: query.tolerance,
                confidence: round_dp(confidence, 2),
            },
        ))
    }
}
