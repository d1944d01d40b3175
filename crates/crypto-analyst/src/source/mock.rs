//! Mock Market Data
//!
//! For testing and demo purposes. Serves static snapshots to the analysts and
//! deterministic canned responses to the skills through [`McpClient`].

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::collections::HashSet;

use agent_core::{AgentError, McpClient, Result as CoreResult};

use super::snapshot::*;
use super::MarketDataSource;
use crate::error::{AnalystError, Result};
use crate::model::RiskLevel;

/// ATR multipliers of price; the last reading sits at the 30th percentile
const ATR_FACTORS: [f64; 10] = [
    0.010, 0.011, 0.012, 0.0115, 0.013, 0.0125, 0.012, 0.0135, 0.014, 0.0118,
];

const RSI_SERIES: [f64; 6] = [48.0, 52.0, 55.0, 58.0, 61.0, 63.5];

/// 50 daily readings: 31 below 68, three below 25, two at 75 or above
const FEAR_GREED_HISTORY: [u8; 50] = [
    45, 52, 38, 61, 24, 55, 70, 69, 41, 58, 72, 49, 63, 30, 68, 57, 22, 74, 50, 64, 35, 69, 60,
    44, 71, 53, 78, 47, 72, 18, 73, 56, 40, 70, 62, 33, 69, 59, 82, 46, 72, 54, 39, 68, 70, 71,
    51, 74, 43, 70,
];

/// Newest first; sums to $500M
const ETF_DAILY_FLOWS_MUSD: [f64; 7] = [95.0, 85.0, 80.0, 70.0, 65.0, 55.0, 50.0];

/// Last seven daily readings, oldest first
const FEAR_GREED_WEEK: [u8; 7] = [60, 62, 63, 65, 66, 67, 68];

/// Mock data source with static snapshots
#[derive(Debug, Default)]
pub struct MockMarketData {
    failing_tools: HashSet<String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an MCP tool fail on every call
    #[must_use]
    pub fn fail_tool(mut self, tool: impl Into<String>) -> Self {
        self.failing_tools.insert(tool.into());
        self
    }

    /// (price, name, risk_tier, 24h volume)
    fn base_price(symbol: &str) -> Option<(Decimal, &'static str, u8, Decimal)> {
        match symbol.to_uppercase().as_str() {
            "BTC" => Some((dec!(97500), "Bitcoin", 1, dec!(28_500_000_000))),
            "ETH" => Some((dec!(3450), "Ethereum", 1, dec!(15_000_000_000))),
            "SOL" => Some((dec!(195), "Solana", 2, dec!(3_000_000_000))),
            "ADA" => Some((dec!(0.95), "Cardano", 2, dec!(650_000_000))),
            "DOT" => Some((dec!(7.20), "Polkadot", 2, dec!(320_000_000))),
            "LINK" => Some((dec!(24.50), "Chainlink", 3, dec!(540_000_000))),
            "AVAX" => Some((dec!(42.00), "Avalanche", 2, dec!(610_000_000))),
            "MATIC" => Some((dec!(0.52), "Polygon", 3, dec!(280_000_000))),
            "ATOM" => Some((dec!(9.80), "Cosmos", 3, dec!(190_000_000))),
            "XRP" => Some((dec!(2.35), "Ripple", 3, dec!(2_100_000_000))),
            "DOGE" => Some((dec!(0.38), "Dogecoin", 5, dec!(1_400_000_000))),
            _ => None,
        }
    }

    fn unsupported(symbol: &str) -> AnalystError {
        AnalystError::DataSource(format!("Asset not supported: {symbol}"))
    }

    /// Price for a `BASE/QUOTE` pair or bare ticker
    fn pair_price(tool: &str, params: &Value) -> CoreResult<f64> {
        let symbol = params
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::ToolValidation(format!("{tool}: missing symbol")))?;
        let base = symbol.split('/').next().unwrap_or(symbol);

        Self::base_price(base)
            .and_then(|(price, ..)| price.to_f64())
            .ok_or_else(|| AgentError::mcp(tool, format!("Unknown symbol {symbol}")))
    }

    fn ohlcv_rows(price: f64, limit: usize) -> Vec<Value> {
        let mut rows = Vec::with_capacity(limit);
        let mut open = price;

        for i in 0..limit {
            #[allow(clippy::cast_precision_loss)]
            let step = i as f64;
            let close = price * 0.03f64.mul_add((step * 0.35).sin(), 1.0);
            let high = open.max(close) * 1.01;
            let low = open.min(close) * 0.99;
            let volume = 1000.0 + ((i % 7) as f64) * 100.0;
            let ts = 1_700_000_000_000_u64 + (i as u64) * 14_400_000;

            rows.push(json!([ts, open, high, low, close, volume]));
            open = close;
        }

        rows
    }

    fn news_articles() -> Value {
        let articles = [
            ("Spot ETF inflows hit weekly record", "positive", vec!["etf", "institutional"]),
            ("Treasury firms keep adding to reserves", "positive", vec!["institutional", "adoption"]),
            ("Halving supply shock narrative returns", "positive", vec!["halving"]),
            ("Options desks see upside skew", "positive", vec!["derivatives", "etf"]),
            ("Payment processor expands settlement support", "positive", vec!["adoption"]),
            ("Inflation hedge demand resurfaces", "positive", vec!["macro", "etf"]),
            ("Regulator delays custody guidance", "negative", vec!["regulation"]),
            ("Exchange outage during volatility spike", "negative", vec!["exchanges"]),
            ("Hashrate steady after difficulty adjustment", "neutral", vec!["mining"]),
            ("Analysts split on quarter-end flows", "neutral", vec!["macro"]),
        ];

        let articles: Vec<Value> = articles
            .iter()
            .map(|(title, sentiment, tags)| json!({"title": title, "sentiment": sentiment, "tags": tags}))
            .collect();

        json!({ "content": [{ "articles": articles }] })
    }

    fn whale_transactions() -> Value {
        json!({
            "content": [{
                "transactions": [
                    {"amount_usd": 420_000_000.0, "direction": "exchange_outflow"},
                    {"amount_usd": 310_000_000.0, "direction": "exchange_outflow"},
                    {"amount_usd": 150_000_000.0, "direction": "exchange_inflow"},
                    {"amount_usd": 260_000_000.0, "direction": "exchange_outflow"},
                    {"amount_usd": 90_000_000.0, "direction": "exchange_inflow"},
                ]
            }]
        })
    }

    /// Newest-first daily ETF flows in the sosovalue text layout
    fn etf_flow_text() -> Value {
        let lines: Vec<String> = ETF_DAILY_FLOWS_MUSD
            .iter()
            .enumerate()
            .map(|(i, flow)| format!("Date: 2025-01-{:02} | Flow: ${flow:.1}M", 20 - i))
            .collect();
        json!({ "content": [{ "text": lines.join("\n") }] })
    }

    /// Three block trades and one retail fill at the pair price
    fn recent_trades(price: f64) -> Value {
        let trades: Vec<Value> = [
            (48_750_000.0, "buy"),
            (29_250_000.0, "buy"),
            (39_000_000.0, "sell"),
            (5_000.0, "buy"),
        ]
        .iter()
        .map(|(usd, side)| json!({ "amount": usd / price, "price": price, "side": side }))
        .collect();
        json!({ "content": [{ "trades": trades }] })
    }

    /// Bitcoin Core commits every 6h, any other repository every 12h
    fn commit_log(params: &Value) -> Value {
        let (count, spacing) = if params["owner"] == "bitcoin" { (100, 6) } else { (40, 12) };
        let now = Utc::now();
        let commits: Vec<Value> = (0..count)
            .map(|i: i64| {
                let date = now - Duration::hours(spacing * i + 1);
                json!({ "sha": format!("{i:07x}"), "commit": { "author": { "date": date.to_rfc3339() } } })
            })
            .collect();
        json!({ "content": [{ "commits": commits }] })
    }

    /// `count_for_btc` entries for bitcoin/bitcoin queries, `otherwise` for the rest
    fn search_results(key: &str, params: &Value, count_for_btc: usize, otherwise: usize) -> Value {
        let query = params.get("q").and_then(Value::as_str).unwrap_or_default();
        let count = if query.contains("bitcoin/bitcoin") { count_for_btc } else { otherwise };
        let items: Vec<Value> = (0..count).map(|i| json!({ "id": i })).collect();
        json!({ "content": [{ key: items }] })
    }

    fn btc_fundamentals() -> ProjectFundamentals {
        ProjectFundamentals {
            symbol: "BTC".into(),
            project_name: "Bitcoin".into(),
            supply: SupplyProfile {
                score: 95.0,
                total_supply: 21_000_000.0,
                circulating_supply: 19_500_000.0,
                max_supply: Some(21_000_000.0),
                inflation_rate: 1.2,
                supply_schedule: "halving_every_4_years".into(),
            },
            distribution: DistributionProfile {
                score: 100.0,
                top_10_holders: 5.2,
                gini_coefficient: 0.68,
                team_allocation: 0.0,
                investor_allocation: 0.0,
                community_allocation: 100.0,
                vesting_schedule: "n/a".into(),
            },
            utility: UtilityProfile {
                score: 92.0,
                use_cases: strings(&[
                    "Store of value",
                    "Medium of exchange",
                    "Unit of account",
                    "Inflation hedge",
                ]),
            },
            development: DevelopmentProfile {
                repository: "bitcoin/bitcoin".into(),
                commit_frequency: "daily".into(),
                contributor_count: 850,
                recent_commits: 245,
                code_quality: "excellent".into(),
                health_score: 0.92,
            },
            network: NetworkProfile {
                uptime_pct: 99.98,
                throughput_tps: 7.0,
                decentralization_score: 95.0,
                security_score: 95.0,
                performance_score: 75.0,
                network_health_score: 98.0,
                consensus_mechanism: "Proof of Work (SHA-256)".into(),
                block_time: "~10 minutes".into(),
            },
            liquidity: LiquidityProfile {
                daily_volume_usd: 28_500_000_000.0,
                bid_ask_spread_pct: 0.01,
                depth_1pct_usd: 125_000_000.0,
                depth_score: 98.0,
                exchange_count: 450,
                tier_1_exchanges: 12,
                major_exchanges: strings(&["Binance", "Coinbase", "Kraken", "Bitstamp"]),
                slippage: SlippageEstimate {
                    usd_10k: 0.005,
                    usd_100k: 0.01,
                    usd_1m: 0.05,
                },
            },
            red_flags: RedFlags {
                critical: Vec::new(),
                major: Vec::new(),
                minor: strings(&[
                    "Transaction throughput limited to 7 tx/sec",
                    "Energy consumption concerns",
                ]),
            },
            risk_factors: RiskFactors {
                centralization_risk: RiskLevel::Low,
                regulatory_risk: RiskLevel::Medium,
                technical_risk: RiskLevel::Low,
                market_risk: RiskLevel::Medium,
            },
        }
    }

    /// Generic profile scaled by risk tier
    fn tiered_fundamentals(
        symbol: &str,
        name: &str,
        tier: u8,
        volume: f64,
    ) -> ProjectFundamentals {
        let tier_penalty = f64::from(tier.saturating_sub(1)) * 6.0;
        let mut minor = strings(&["Concentrated early-investor allocation"]);
        let mut major = Vec::new();
        if tier >= 3 {
            minor.push("Governance controlled by a small validator set".into());
        }
        if tier >= 5 {
            major.push("Uncapped supply with no burn mechanism".into());
        }

        ProjectFundamentals {
            symbol: symbol.to_uppercase(),
            project_name: name.into(),
            supply: SupplyProfile {
                score: 80.0 - tier_penalty,
                total_supply: 1_000_000_000.0,
                circulating_supply: 720_000_000.0,
                max_supply: if tier >= 5 { None } else { Some(1_000_000_000.0) },
                inflation_rate: 2.0 + f64::from(tier),
                supply_schedule: "emission_schedule".into(),
            },
            distribution: DistributionProfile {
                score: 70.0 - tier_penalty,
                top_10_holders: 18.0 + tier_penalty,
                gini_coefficient: 0.82,
                team_allocation: 15.0,
                investor_allocation: 20.0,
                community_allocation: 65.0,
                vesting_schedule: "4_year_linear".into(),
            },
            utility: UtilityProfile {
                score: 78.0 - tier_penalty,
                use_cases: strings(&["Gas fees", "Staking", "Governance"]),
            },
            development: DevelopmentProfile {
                repository: format!("{}/core", name.to_lowercase()),
                commit_frequency: "weekly".into(),
                contributor_count: 120,
                recent_commits: 90,
                code_quality: "good".into(),
                health_score: 0.75,
            },
            network: NetworkProfile {
                uptime_pct: 99.5,
                throughput_tps: 1500.0,
                decentralization_score: 70.0 - tier_penalty,
                security_score: 82.0 - tier_penalty,
                performance_score: 88.0,
                network_health_score: 80.0 - tier_penalty,
                consensus_mechanism: "Proof of Stake".into(),
                block_time: "~2 seconds".into(),
            },
            liquidity: LiquidityProfile {
                daily_volume_usd: volume,
                bid_ask_spread_pct: 0.03 * f64::from(tier),
                depth_1pct_usd: volume * 0.004,
                depth_score: 90.0 - tier_penalty,
                exchange_count: 180,
                tier_1_exchanges: 8,
                major_exchanges: strings(&["Binance", "Coinbase", "Kraken"]),
                slippage: SlippageEstimate {
                    usd_10k: 0.02,
                    usd_100k: 0.08,
                    usd_1m: 0.4,
                },
            },
            red_flags: RedFlags {
                critical: Vec::new(),
                major,
                minor,
            },
            risk_factors: RiskFactors {
                centralization_risk: if tier >= 3 { RiskLevel::Medium } else { RiskLevel::Low },
                regulatory_risk: RiskLevel::Medium,
                technical_risk: RiskLevel::Low,
                market_risk: if tier >= 3 { RiskLevel::High } else { RiskLevel::Medium },
            },
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

#[async_trait]
impl MarketDataSource for MockMarketData {
    async fn institutional_flows(&self, asset: &str, period_days: u32) -> Result<FlowSnapshot> {
        Ok(FlowSnapshot {
            asset: asset.to_string(),
            period_days,
            etf_daily_flows_musd: vec![50.0, 55.0, 65.0, 70.0, 80.0, 85.0, 95.0],
            exchange_net_flow_musd: -149.5,
            institutional_volume_musd: 1200.0,
            retail_volume_musd: 800.0,
        })
    }

    async fn fed_policy(&self) -> Result<FedSnapshot> {
        Ok(FedSnapshot {
            inflation_rate: 2.5,
            inflation_target: 2.0,
            rate_hikes_signaled: false,
            rate_cuts_signaled: false,
            qt_tapering_discussed: true,
            employment_strong: true,
            outlook_quarter: "Q1 2025".into(),
        })
    }

    async fn risk_appetite(&self) -> Result<RiskAppetiteSnapshot> {
        Ok(RiskAppetiteSnapshot {
            vix: 15.2,
            crypto_fear_greed: 68,
            equity_change_pct: 1.8,
            safe_haven_flow_musd: -220.0,
            btc_equity_correlation: 0.22,
        })
    }

    async fn fundamentals(&self, symbol: &str) -> Result<ProjectFundamentals> {
        if symbol.eq_ignore_ascii_case("BTC") {
            return Ok(Self::btc_fundamentals());
        }

        let (_, name, tier, volume) =
            Self::base_price(symbol).ok_or_else(|| Self::unsupported(symbol))?;
        let volume = volume.to_f64().unwrap_or_default();

        Ok(Self::tiered_fundamentals(symbol, name, tier, volume))
    }

    async fn crowd_sentiment(&self, asset: &str) -> Result<CrowdSnapshot> {
        Ok(CrowdSnapshot {
            asset: asset.to_string(),
            fear_greed_index: 68,
            fear_greed_history: FEAR_GREED_HISTORY.to_vec(),
            social: SocialMetrics {
                sentiment_balance: 12.5,
                social_volume: 15_000,
                social_dominance: 25.3,
            },
            extreme_events: vec![
                ExtremeEvent {
                    date: date(2024, 11, 15),
                    fear_greed: 82,
                    outcome: "15% correction within 2 weeks".into(),
                },
                ExtremeEvent {
                    date: date(2024, 8, 5),
                    fear_greed: 22,
                    outcome: "35% rally within 4 weeks".into(),
                },
            ],
        })
    }

    async fn whale_flows(&self, asset: &str) -> Result<WhaleSnapshot> {
        Ok(WhaleSnapshot {
            asset: asset.to_string(),
            large_transaction_volume_usd: 12_500_000_000.0,
            exchange_whale_ratio: 0.68,
        })
    }

    async fn news_flow(&self, asset: &str, period_days: u32) -> Result<NewsSnapshot> {
        Ok(NewsSnapshot {
            asset: asset.to_string(),
            period_days,
            positive_count: 42,
            negative_count: 18,
            neutral_count: 30,
            narratives: strings(&[
                "ETF inflows accelerating",
                "Institutional adoption",
                "Halving cycle dynamics",
                "Inflation hedge narrative",
            ]),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}

#[async_trait]
impl McpClient for MockMarketData {
    async fn call_tool(&self, name: &str, params: Value) -> CoreResult<Value> {
        if self.failing_tools.contains(name) {
            return Err(AgentError::mcp(name, "Simulated outage"));
        }

        tracing::debug!(tool = %name, "Mock MCP call");

        let response = match name {
            "mcp__ccxt-mcp__fetchTicker" => {
                let price = Self::pair_price(name, &params)?;
                json!({ "content": [{ "symbol": params["symbol"], "last": price }] })
            }
            "mcp__ccxt-mcp__fetchOHLCV" => {
                let price = Self::pair_price(name, &params)?;
                let limit = params
                    .get("limit")
                    .and_then(Value::as_u64)
                    .and_then(|l| usize::try_from(l).ok())
                    .unwrap_or(100);
                json!({ "data": Self::ohlcv_rows(price, limit) })
            }
            "mcp__crypto-indicators-mcp__calculate_average_true_range" => {
                let price = Self::pair_price(name, &params)?;
                let atr: Vec<f64> = ATR_FACTORS.iter().map(|f| price * f).collect();
                json!({ "content": [{ "atr": atr }] })
            }
            "mcp__crypto-indicators-mcp__calculate_bollinger_bands" => {
                let price = Self::pair_price(name, &params)?;
                json!({
                    "content": [{
                        "upper": [price * 1.05, price * 1.045, price * 1.04],
                        "middle": [price * 0.99, price * 0.995, price],
                        "lower": [price * 0.93, price * 0.945, price * 0.96],
                    }]
                })
            }
            "mcp__crypto-indicators-mcp__calculate_relative_strength_index" => {
                json!({ "content": [{ "rsi": RSI_SERIES }] })
            }
            "mcp__crypto-indicators-mcp__calculate_macd" => {
                json!({
                    "content": [{
                        "macd": [12.0, 18.5, 24.0],
                        "signal": [11.2, 17.3, 22.4],
                        "histogram": [0.8, 1.2, 1.6],
                    }]
                })
            }
            "mcp__crypto-feargreed-mcp__get_current_fng_tool" => {
                json!({ "content": [{ "text": "Fear & Greed Index: 68 (Greed)", "value": 68 }] })
            }
            "mcp__crypto-feargreed-mcp__get_historical_fng_tool" => {
                let data: Vec<Value> = FEAR_GREED_WEEK.iter().map(|v| json!({ "value": v })).collect();
                json!({ "content": [{ "data": data }] })
            }
            "mcp__santiment-mcp__get_social_volume" => {
                json!({ "content": [{ "text": "15000 mentions", "value": 15000 }] })
            }
            "mcp__santiment-mcp__get_sentiment_balance" => {
                json!({ "content": [{ "text": "balance: 12.5" }] })
            }
            "mcp__santiment-mcp__get_social_dominance" => {
                json!({ "content": [{ "text": "dominance: 25.3%" }] })
            }
            "mcp__cryptopanic-mcp__get_crypto_news" => Self::news_articles(),
            "mcp__whale-tracker-mcp__get_recent_transactions" => Self::whale_transactions(),
            "mcp__sosovalue-etf-mcp__get_etf_flow" => Self::etf_flow_text(),
            "mcp__ccxt-mcp__fetchTrades" => Self::recent_trades(Self::pair_price(name, &params)?),
            "mcp__github-manager__list_commits" => Self::commit_log(&params),
            "mcp__github-manager__search_users" => Self::search_results("users", &params, 100, 45),
            "mcp__github-manager__search_issues" => Self::search_results("items", &params, 6, 3),
            other => return Err(AgentError::ToolNotFound(other.to_string())),
        };

        Ok(response)
    }
}
