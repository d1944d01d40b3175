//! MCP response readers
//!
//! Indicator servers answer either with the payload at the top level or
//! wrapped as `{"content": [{...}]}`. Everything here tolerates both.

use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

use agent_core::McpClient;

use crate::error::{AnalystError, Result};

pub const FETCH_TICKER: &str = "mcp__ccxt-mcp__fetchTicker";
pub const FETCH_OHLCV: &str = "mcp__ccxt-mcp__fetchOHLCV";
pub const AVERAGE_TRUE_RANGE: &str = "mcp__crypto-indicators-mcp__calculate_average_true_range";
pub const BOLLINGER_BANDS: &str = "mcp__crypto-indicators-mcp__calculate_bollinger_bands";
pub const RSI: &str = "mcp__crypto-indicators-mcp__calculate_relative_strength_index";
pub const MACD: &str = "mcp__crypto-indicators-mcp__calculate_macd";
pub const FEAR_GREED_CURRENT: &str = "mcp__crypto-feargreed-mcp__get_current_fng_tool";
pub const FEAR_GREED_HISTORY: &str = "mcp__crypto-feargreed-mcp__get_historical_fng_tool";
pub const SOCIAL_VOLUME: &str = "mcp__santiment-mcp__get_social_volume";
pub const SENTIMENT_BALANCE: &str = "mcp__santiment-mcp__get_sentiment_balance";
pub const SOCIAL_DOMINANCE: &str = "mcp__santiment-mcp__get_social_dominance";
pub const CRYPTO_NEWS: &str = "mcp__cryptopanic-mcp__get_crypto_news";
pub const WHALE_TRANSACTIONS: &str = "mcp__whale-tracker-mcp__get_recent_transactions";
pub const FETCH_TRADES: &str = "mcp__ccxt-mcp__fetchTrades";
pub const ETF_FLOW: &str = "mcp__sosovalue-etf-mcp__get_etf_flow";
pub const LIST_COMMITS: &str = "mcp__github-manager__list_commits";
pub const SEARCH_USERS: &str = "mcp__github-manager__search_users";
pub const SEARCH_ISSUES: &str = "mcp__github-manager__search_issues";

static NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").ok());

/// One OHLCV row
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candle {
    pub timestamp: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Look up `key` at the top level, then inside `content[0]`
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .get(key)
        .or_else(|| value.get("content")?.get(0)?.get(key))
}

/// Numeric series under `key`; a scalar becomes a one-element series
pub fn series(value: &Value, key: &str) -> Vec<f64> {
    match field(value, key) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_f64).collect(),
        Some(other) => other.as_f64().into_iter().collect(),
        None => Vec::new(),
    }
}

pub fn last(value: &Value, key: &str) -> Option<f64> {
    series(value, key).last().copied()
}

/// First decimal number in free text ("Fear & Greed Index: 68 (Greed)" -> 68)
pub fn first_number(text: &str) -> Option<f64> {
    NUMBER.as_ref()?.find(text)?.as_str().parse().ok()
}

/// Numeric reading from a tool reply
///
/// Tries `key`, then a generic `value` field, then the first number in `text`.
pub fn reading(value: &Value, key: &str) -> Option<f64> {
    field(value, key)
        .and_then(Value::as_f64)
        .or_else(|| field(value, "value").and_then(Value::as_f64))
        .or_else(|| field(value, "text").and_then(Value::as_str).and_then(first_number))
}

/// Rank of the latest reading inside its own series (0.0 - 1.0)
///
/// `None` for an empty series; 0.5 when the latest value cannot be located.
pub fn latest_percentile(values: &[f64]) -> Option<f64> {
    let current = *values.last()?;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    #[allow(clippy::cast_precision_loss)]
    let percentile = sorted
        .iter()
        .position(|v| (*v - current).abs() < f64::EPSILON)
        .map_or(0.5, |idx| idx as f64 / sorted.len() as f64);

    Some(percentile)
}

/// Parse `[ts, o, h, l, c, v]` rows from an OHLCV reply
pub fn candles(value: &Value) -> Vec<Candle> {
    let Some(Value::Array(rows)) = field(value, "data") else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let cols = row.as_array()?;
            Some(Candle {
                timestamp: cols.first()?.as_u64()?,
                open: cols.get(1)?.as_f64()?,
                high: cols.get(2)?.as_f64()?,
                low: cols.get(3)?.as_f64()?,
                close: cols.get(4)?.as_f64()?,
                volume: cols.get(5)?.as_f64()?,
            })
        })
        .collect()
}

/// Bollinger width of the latest band: (upper - lower) / middle
pub fn bollinger_width(value: &Value) -> Option<f64> {
    let upper = last(value, "upper")?;
    let lower = last(value, "lower")?;
    let middle = last(value, "middle")?;

    (middle != 0.0).then(|| (upper - lower) / middle)
}

/// Last traded price, erroring when the ticker has none
pub async fn fetch_price(mcp: &dyn McpClient, exchange_id: &str, pair: &str) -> Result<f64> {
    let ticker = mcp
        .call_tool(FETCH_TICKER, json!({ "exchangeId": exchange_id, "symbol": pair }))
        .await?;

    field(&ticker, "last")
        .and_then(Value::as_f64)
        .filter(|p| *p > 0.0)
        .ok_or_else(|| AnalystError::InsufficientData(format!("No ticker price available for {pair}")))
}

pub async fn fetch_atr(mcp: &dyn McpClient, pair: &str, timeframe: &str) -> Result<Vec<f64>> {
    let reply = mcp
        .call_tool(
            AVERAGE_TRUE_RANGE,
            json!({ "symbol": pair, "timeframe": timeframe, "period": 14 }),
        )
        .await?;
    Ok(series(&reply, "atr"))
}

pub async fn fetch_bollinger(mcp: &dyn McpClient, pair: &str, timeframe: &str) -> Result<Value> {
    Ok(mcp
        .call_tool(
            BOLLINGER_BANDS,
            json!({ "symbol": pair, "timeframe": timeframe, "period": 20, "stdDev": 2 }),
        )
        .await?)
}

pub async fn fetch_rsi(mcp: &dyn McpClient, pair: &str, timeframe: &str) -> Result<Vec<f64>> {
    let reply = mcp
        .call_tool(RSI, json!({ "symbol": pair, "timeframe": timeframe, "period": 14 }))
        .await?;
    Ok(series(&reply, "rsi"))
}
