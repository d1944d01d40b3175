//! Raw market snapshots
//!
//! Plain data as delivered by a [`super::MarketDataSource`]. Analysts derive
//! every classification from these.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::RiskLevel;

/// ETF and exchange flows over a period
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowSnapshot {
    pub asset: String,
    pub period_days: u32,

    /// One entry per day, oldest first (USD millions)
    pub etf_daily_flows_musd: Vec<f64>,

    /// Net exchange balance change (USD millions, negative = coins leaving)
    pub exchange_net_flow_musd: f64,

    pub institutional_volume_musd: f64,
    pub retail_volume_musd: f64,
}

impl FlowSnapshot {
    pub fn etf_total(&self) -> f64 {
        self.etf_daily_flows_musd.iter().sum()
    }

    pub fn net_flow(&self) -> f64 {
        self.etf_total() + self.exchange_net_flow_musd
    }
}

/// Central bank policy signals
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FedSnapshot {
    pub inflation_rate: f64,
    pub inflation_target: f64,
    pub rate_hikes_signaled: bool,
    pub rate_cuts_signaled: bool,
    pub qt_tapering_discussed: bool,
    pub employment_strong: bool,
    pub outlook_quarter: String,
}

/// Cross-asset risk appetite
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskAppetiteSnapshot {
    pub vix: f64,
    pub crypto_fear_greed: u8,
    pub equity_change_pct: f64,

    /// Flows into bonds/gold (USD millions, negative = outflows)
    pub safe_haven_flow_musd: f64,

    pub btc_equity_correlation: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SupplyProfile {
    pub score: f64,
    pub total_supply: f64,
    pub circulating_supply: f64,
    pub max_supply: Option<f64>,

    /// Annual %
    pub inflation_rate: f64,
    pub supply_schedule: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistributionProfile {
    pub score: f64,
    pub top_10_holders: f64,
    pub gini_coefficient: f64,
    pub team_allocation: f64,
    pub investor_allocation: f64,
    pub community_allocation: f64,
    pub vesting_schedule: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UtilityProfile {
    pub score: f64,
    pub use_cases: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DevelopmentProfile {
    pub repository: String,
    pub commit_frequency: String,
    pub contributor_count: u32,

    /// Commits in the last 30 days
    pub recent_commits: u32,
    pub code_quality: String,

    /// 0.0 - 1.0
    pub health_score: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub uptime_pct: f64,
    pub throughput_tps: f64,
    pub decentralization_score: f64,
    pub security_score: f64,
    pub performance_score: f64,
    pub network_health_score: f64,
    pub consensus_mechanism: String,
    pub block_time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlippageEstimate {
    #[serde(rename = "10k")]
    pub usd_10k: f64,
    #[serde(rename = "100k")]
    pub usd_100k: f64,
    #[serde(rename = "1m")]
    pub usd_1m: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LiquidityProfile {
    pub daily_volume_usd: f64,

    /// Percent
    pub bid_ask_spread_pct: f64,

    /// USD resting within 1% of mid
    pub depth_1pct_usd: f64,
    pub depth_score: f64,
    pub exchange_count: u32,
    pub tier_1_exchanges: u32,
    pub major_exchanges: Vec<String>,
    pub slippage: SlippageEstimate,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RedFlags {
    pub critical: Vec<String>,
    pub major: Vec<String>,
    pub minor: Vec<String>,
}

impl RedFlags {
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.major.is_empty() && self.minor.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskFactors {
    pub centralization_risk: RiskLevel,
    pub regulatory_risk: RiskLevel,
    pub technical_risk: RiskLevel,
    pub market_risk: RiskLevel,
}

impl RiskFactors {
    pub fn any_at_least(&self, level: RiskLevel) -> bool {
        [
            self.centralization_risk,
            self.regulatory_risk,
            self.technical_risk,
            self.market_risk,
        ]
        .iter()
        .any(|r| *r >= level)
    }
}

/// Project fundamentals for due diligence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectFundamentals {
    pub symbol: String,
    pub project_name: String,
    pub supply: SupplyProfile,
    pub distribution: DistributionProfile,
    pub utility: UtilityProfile,
    pub development: DevelopmentProfile,
    pub network: NetworkProfile,
    pub liquidity: LiquidityProfile,
    pub red_flags: RedFlags,
    pub risk_factors: RiskFactors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SocialMetrics {
    pub sentiment_balance: f64,
    pub social_volume: u64,
    pub social_dominance: f64,
}

/// A past sentiment extreme and what followed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtremeEvent {
    pub date: NaiveDate,
    pub fear_greed: u8,
    pub outcome: String,
}

/// Crowd positioning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrowdSnapshot {
    pub asset: String,
    pub fear_greed_index: u8,

    /// Daily index readings over the lookback window
    pub fear_greed_history: Vec<u8>,
    pub social: SocialMetrics,
    pub extreme_events: Vec<ExtremeEvent>,
}

/// Large-holder behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WhaleSnapshot {
    pub asset: String,
    pub large_transaction_volume_usd: f64,

    /// Share of large wallets moving coins off exchanges
    pub exchange_whale_ratio: f64,
}

/// Headline counts and themes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsSnapshot {
    pub asset: String,
    pub period_days: u32,
    pub positive_count: u32,
    pub negative_count: u32,
    pub neutral_count: u32,
    pub narratives: Vec<String>,
}
