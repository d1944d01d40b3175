//! Crypto VC Analyst
//!
//! Fundamental due diligence: tokenomics, network health, liquidity, red
//! flags and a weighted risk score. Market risk comes from the
//! [`RiskCalculator`] skill on daily candles.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;

use agent_core::{AgentCapabilities, AgentKind, McpClient};

use super::signal::{Signal, SignalDirection};
use crate::error::Result;
use crate::model::{RiskLevel, VolatilityRegime, round_dp};
use crate::skills::development_activity::{DevelopmentActivityTracker, DevelopmentReport, VelocityTrend};
use crate::skills::risk_calculator::RiskData;
use crate::skills::{DevelopmentMomentum, RiskCalculator, RiskInputs};
use crate::source::{
    DistributionProfile, MarketDataSource, ProjectFundamentals, RedFlags, RiskFactors,
    SlippageEstimate, SupplyProfile, UtilityProfile,
};

/// Market risk is read from daily candles
const MARKET_RISK_TIMEFRAME: &str = "1d";

/// Development window of a full due diligence report
pub const DUE_DILIGENCE_PERIOD_DAYS: u32 = 30;

/// Hard cap on any single allocation (fraction of portfolio)
const MAX_ALLOCATION: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentRecommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl InvestmentRecommendation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "strong_buy",
            Self::Buy => "buy",
            Self::Hold => "hold",
            Self::Sell => "sell",
            Self::StrongSell => "strong_sell",
        }
    }

    /// Clean low risk earns the strong call; any flag at all caps it at buy
    pub fn from_risk(overall: RiskLevel, flags: &RedFlags) -> Self {
        match overall {
            RiskLevel::Low if flags.is_empty() => Self::StrongBuy,
            RiskLevel::Low => Self::Buy,
            RiskLevel::Medium => Self::Hold,
            RiskLevel::High => Self::Sell,
            RiskLevel::Extreme => Self::StrongSell,
        }
    }
}

impl Signal for InvestmentRecommendation {
    fn direction(&self) -> SignalDirection {
        match self {
            Self::StrongBuy | Self::Buy => SignalDirection::Bullish,
            Self::Hold => SignalDirection::Neutral,
            Self::Sell | Self::StrongSell => SignalDirection::Bearish,
        }
    }

    fn label(&self) -> &'static str {
        self.as_str()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityRating {
    Exceptional,
    High,
    Moderate,
    Low,
    VeryLow,
}

impl LiquidityRating {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Exceptional
        } else if score >= 75.0 {
            Self::High
        } else if score >= 50.0 {
            Self::Moderate
        } else if score >= 30.0 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exceptional => "exceptional",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }

    const fn risk(self) -> f64 {
        match self {
            Self::Exceptional => 5.0,
            Self::High => 15.0,
            Self::Moderate => 35.0,
            Self::Low => 60.0,
            Self::VeryLow => 85.0,
        }
    }
}

const fn regulatory_risk(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Low => 15.0,
        RiskLevel::Medium => 35.0,
        RiskLevel::High => 60.0,
        RiskLevel::Extreme => 85.0,
    }
}

const fn market_risk(regime: VolatilityRegime) -> f64 {
    match regime {
        VolatilityRegime::Low => 25.0,
        VolatilityRegime::Moderate => 45.0,
        VolatilityRegime::High => 70.0,
        VolatilityRegime::VeryHigh => 90.0,
        VolatilityRegime::Extreme => 95.0,
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TokenomicsAnalysis {
    pub token: String,
    pub score: f64,
    pub supply_analysis: SupplyProfile,
    pub distribution: DistributionProfile,
    pub utility: UtilityProfile,
    pub red_flags: Vec<String>,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct DevelopmentSummary {
    pub commit_frequency: String,
    pub contributor_count: u32,
    pub recent_commits: u32,
    pub code_quality: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct NetworkIndicators {
    pub network_uptime: f64,
    pub transaction_throughput: f64,
    pub decentralization_score: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct TechnicalHealth {
    pub project: String,
    pub score: f64,
    pub development_activity: DevelopmentSummary,
    pub technical_indicators: NetworkIndicators,
    pub security_score: f64,
    pub performance_score: f64,
    pub network_health_score: f64,
    pub consensus_mechanism: String,
    pub block_time: String,
    pub concerns: Vec<String>,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LiquidityMetrics {
    pub daily_volume: f64,
    pub bid_ask_spread: f64,
    pub market_depth_1pct: f64,
    pub exchange_count: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExchangeAvailability {
    pub exchange_count: u32,
    pub major_exchanges: Vec<String>,
    pub tier_1_exchanges: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct LiquidityAnalysis {
    pub symbol: String,
    pub liquidity_metrics: LiquidityMetrics,
    pub exchange_availability: ExchangeAvailability,
    pub liquidity_rating: LiquidityRating,
    pub slippage_estimate: SlippageEstimate,
    pub score: f64,
    pub warnings: Vec<String>,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RedFlagReport {
    pub symbol: String,
    pub red_flags: RedFlags,
    pub risk_factors: RiskFactors,
    pub overall_risk: RiskLevel,
    pub recommendation: InvestmentRecommendation,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RiskBreakdown {
    pub tokenomics_risk: f64,
    pub technical_risk: f64,
    pub liquidity_risk: f64,
    pub regulatory_risk: f64,
    pub market_risk: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct PositionSizing {
    /// Fractions of portfolio
    pub max_allocation: f64,
    pub recommended_allocation: f64,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RiskScoreReport {
    pub symbol: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub volatility_regime: VolatilityRegime,
    pub risk_breakdown: RiskBreakdown,
    pub position_sizing: PositionSizing,

    /// Percent of portfolio
    pub max_allocation: f64,
    pub warnings: RedFlags,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct GithubMetrics {
    pub repository: String,
    pub commits: usize,
    pub contributors: usize,
    pub merged_pull_requests: usize,
    pub commit_frequency: &'static str,
    pub velocity_trend: VelocityTrend,
}

#[derive(Clone, Debug, Serialize)]
pub struct DevelopmentActivity {
    pub symbol: String,
    pub period_days: u32,
    pub github_metrics: GithubMetrics,

    /// Health score scaled to 0 - 100
    pub activity_score: f64,
    pub momentum: DevelopmentMomentum,
    pub trading_signal: &'static str,
    pub confidence: f64,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecommendationDetails {
    pub action: InvestmentRecommendation,
    pub confidence: f64,

    /// Percent of portfolio
    pub target_allocation: Decimal,
    pub entry_price_range: &'static str,
    pub exit_strategy: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct DueDiligenceReport {
    pub symbol: String,
    pub score: f64,
    pub confidence: f64,
    pub executive_summary: String,
    pub tokenomics: TokenomicsAnalysis,
    pub technical_health: TechnicalHealth,
    pub development_activity: DevelopmentActivity,
    pub liquidity: LiquidityAnalysis,
    pub risk_assessment: RiskScoreReport,
    pub red_flags: RedFlagReport,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: InvestmentRecommendation,
    pub recommendation_details: RecommendationDetails,
    pub timestamp: DateTime<Utc>,
}

pub fn tokenomics(project: &ProjectFundamentals) -> TokenomicsAnalysis {
    let supply = &project.supply;
    let distribution = &project.distribution;
    let score = supply
        .score
        .mul_add(0.5, distribution.score.mul_add(0.2, project.utility.score * 0.3));

    let mut red_flags = Vec::new();
    if supply.max_supply.is_none() {
        red_flags.push("No maximum supply cap".to_string());
    }
    if supply.inflation_rate > 5.0 {
        red_flags.push(format!("High annual inflation ({:.1}%)", supply.inflation_rate));
    }
    if distribution.team_allocation + distribution.investor_allocation > 40.0 {
        red_flags.push(format!(
            "Insiders hold {:.0}% of supply",
            distribution.team_allocation + distribution.investor_allocation
        ));
    }
    if distribution.top_10_holders > 30.0 {
        red_flags.push(format!(
            "Top 10 holders control {:.1}% of supply",
            distribution.top_10_holders
        ));
    }

    let circulating = supply
        .max_supply
        .filter(|max| *max > 0.0)
        .map_or(supply.circulating_supply / supply.total_supply.max(1.0), |max| {
            supply.circulating_supply / max
        });
    let cap = supply.max_supply.map_or_else(
        || "no max supply cap".to_string(),
        |max| format!("fixed max supply ({})", compact(max)),
    );
    let launch = if distribution.team_allocation + distribution.investor_allocation == 0.0 {
        "fair launch with no pre-mine".to_string()
    } else {
        format!(
            "{:.0}% team and investor allocation ({})",
            distribution.team_allocation + distribution.investor_allocation,
            distribution.vesting_schedule
        )
    };

    TokenomicsAnalysis {
        token: project.symbol.clone(),
        score: round_dp(score, 1),
        supply_analysis: supply.clone(),
        distribution: distribution.clone(),
        utility: project.utility.clone(),
        red_flags,
        reasoning: format!(
            "{} tokenomics: {cap}, {launch}, {:.1}% annual inflation ({}). \
             {:.1}% of supply already circulating.",
            project.project_name,
            supply.inflation_rate,
            supply.supply_schedule,
            circulating * 100.0,
        ),
    }
}

pub fn technical_health(project: &ProjectFundamentals) -> TechnicalHealth {
    let network = &project.network;
    let development = &project.development;
    let score = network.security_score.mul_add(
        0.4,
        network
            .performance_score
            .mul_add(0.3, network.network_health_score * 0.3),
    );

    let mut concerns = Vec::new();
    if development.recent_commits < 20 {
        concerns.push(format!(
            "Low development activity ({} commits in 30 days)",
            development.recent_commits
        ));
    }
    if network.decentralization_score < 50.0 {
        concerns.push(format!(
            "Centralization risk (decentralization score {:.0})",
            network.decentralization_score
        ));
    }
    if network.uptime_pct < 99.0 {
        concerns.push(format!("Network uptime below 99% ({:.2}%)", network.uptime_pct));
    }

    let verdict = if concerns.is_empty() {
        "Strong technical health across all metrics."
    } else {
        "Technical concerns warrant monitoring."
    };

    TechnicalHealth {
        project: project.project_name.clone(),
        score: round_dp(score, 1),
        development_activity: DevelopmentSummary {
            commit_frequency: development.commit_frequency.clone(),
            contributor_count: development.contributor_count,
            recent_commits: development.recent_commits,
            code_quality: development.code_quality.clone(),
        },
        technical_indicators: NetworkIndicators {
            network_uptime: network.uptime_pct,
            transaction_throughput: network.throughput_tps,
            decentralization_score: network.decentralization_score,
        },
        security_score: network.security_score,
        performance_score: network.performance_score,
        network_health_score: network.network_health_score,
        consensus_mechanism: network.consensus_mechanism.clone(),
        block_time: network.block_time.clone(),
        concerns,
        reasoning: format!(
            "{} development remains {} with {} contributors and {} commits. \
             Network has {:.2}% uptime. Decentralization score of {:.0}. {verdict}",
            project.project_name,
            development.commit_frequency,
            development.contributor_count,
            development.recent_commits,
            network.uptime_pct,
            network.decentralization_score,
        ),
    }
}

fn volume_score(daily_volume_usd: f64) -> f64 {
    if daily_volume_usd >= 10e9 {
        100.0
    } else if daily_volume_usd >= 1e9 {
        85.0
    } else if daily_volume_usd >= 100e6 {
        65.0
    } else if daily_volume_usd >= 10e6 {
        40.0
    } else {
        20.0
    }
}

fn spread_score(spread_pct: f64) -> f64 {
    if spread_pct <= 0.02 {
        100.0
    } else if spread_pct <= 0.1 {
        85.0
    } else if spread_pct <= 0.5 {
        60.0
    } else {
        30.0
    }
}

pub fn liquidity(project: &ProjectFundamentals) -> LiquidityAnalysis {
    let liquidity = &project.liquidity;
    let score = (volume_score(liquidity.daily_volume_usd)
        + spread_score(liquidity.bid_ask_spread_pct)
        + liquidity.depth_score)
        / 3.0;
    let rating = LiquidityRating::from_score(score);

    let mut warnings = Vec::new();
    if liquidity.bid_ask_spread_pct > 0.5 {
        warnings.push(format!("Wide bid-ask spread ({:.2}%)", liquidity.bid_ask_spread_pct));
    }
    if liquidity.slippage.usd_1m > 1.0 {
        warnings.push(format!(
            "High slippage on $1M orders ({:.2}%)",
            liquidity.slippage.usd_1m
        ));
    }
    if liquidity.tier_1_exchanges < 3 {
        warnings.push("Limited tier-1 exchange listings".into());
    }

    let verdict = if warnings.is_empty() {
        "No liquidity concerns."
    } else {
        "Size entries to available depth."
    };

    LiquidityAnalysis {
        symbol: project.symbol.clone(),
        liquidity_metrics: LiquidityMetrics {
            daily_volume: liquidity.daily_volume_usd,
            bid_ask_spread: liquidity.bid_ask_spread_pct,
            market_depth_1pct: liquidity.depth_1pct_usd,
            exchange_count: liquidity.exchange_count,
        },
        exchange_availability: ExchangeAvailability {
            exchange_count: liquidity.exchange_count,
            major_exchanges: liquidity.major_exchanges.clone(),
            tier_1_exchanges: liquidity.tier_1_exchanges,
        },
        liquidity_rating: rating,
        slippage_estimate: liquidity.slippage.clone(),
        score: round_dp(score, 1),
        warnings,
        reasoning: format!(
            "{} has {} liquidity with ${} daily volume across {} exchanges. \
             Bid-ask spread of {:.2}% and ${} of depth within 1%. {verdict}",
            project.project_name,
            rating.as_str(),
            compact(liquidity.daily_volume_usd),
            liquidity.exchange_count,
            liquidity.bid_ask_spread_pct,
            compact(liquidity.depth_1pct_usd),
        ),
    }
}

/// Overall risk from flag severity and risk factors
pub fn overall_risk(flags: &RedFlags, factors: &RiskFactors) -> RiskLevel {
    if !flags.critical.is_empty() {
        RiskLevel::Extreme
    } else if flags.major.len() >= 2 || factors.any_at_least(RiskLevel::Extreme) {
        RiskLevel::High
    } else if !flags.major.is_empty() || factors.any_at_least(RiskLevel::High) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn red_flags(project: &ProjectFundamentals) -> RedFlagReport {
    let flags = &project.red_flags;
    let overall = overall_risk(flags, &project.risk_factors);
    let recommendation = InvestmentRecommendation::from_risk(overall, flags);

    let summary = match (flags.critical.len(), flags.major.len()) {
        (0, 0) => "No critical or major red flags detected.".to_string(),
        (0, major) => format!("{major} major red flag(s) detected."),
        (critical, _) => format!("{critical} critical red flag(s) detected."),
    };
    let minor = if flags.minor.is_empty() {
        String::new()
    } else {
        format!(" Minor concerns: {}.", flags.minor.join(", "))
    };

    RedFlagReport {
        symbol: project.symbol.clone(),
        red_flags: flags.clone(),
        risk_factors: project.risk_factors.clone(),
        overall_risk: overall,
        recommendation,
        reasoning: format!(
            "{summary}{minor} Overall {overall}-risk profile. Recommendation: {}.",
            recommendation.as_str()
        ),
    }
}

/// Weighted risk score with sizing derived from the stop distance
pub fn risk_score(
    project: &ProjectFundamentals,
    market: &RiskData,
    risk_tolerance: f64,
) -> RiskScoreReport {
    let tokenomics = tokenomics(project);
    let technical = technical_health(project);
    let liquidity = liquidity(project);
    let flags = red_flags(project);

    let tokenomics_risk = (100.0 - tokenomics.score).max(0.0);
    let technical_risk = (100.0 - technical.score).max(0.0);
    let liquidity_risk = liquidity.liquidity_rating.risk();
    let regulatory = regulatory_risk(project.risk_factors.regulatory_risk);
    let market_risk = market_risk(market.volatility_regime);

    let score = tokenomics_risk * 0.20
        + technical_risk * 0.15
        + liquidity_risk * 0.15
        + regulatory * 0.20
        + market_risk * 0.30;
    let level = if score < 25.0 {
        RiskLevel::Low
    } else if score < 50.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    };

    let recommended = if market.position_risk > 0.0 {
        (risk_tolerance / market.position_risk).min(MAX_ALLOCATION)
    } else {
        0.0
    };
    let max_allocation = (recommended * 1.5).min(MAX_ALLOCATION);
    let regime = serde_label(&market.volatility_regime);

    RiskScoreReport {
        symbol: project.symbol.clone(),
        risk_score: round_dp(score, 1),
        risk_level: level,
        volatility_regime: market.volatility_regime,
        risk_breakdown: RiskBreakdown {
            tokenomics_risk: round_dp(tokenomics_risk, 1),
            technical_risk: round_dp(technical_risk, 1),
            liquidity_risk,
            regulatory_risk: regulatory,
            market_risk,
        },
        position_sizing: PositionSizing {
            max_allocation: round_dp(max_allocation, 3),
            recommended_allocation: round_dp(recommended, 3),
            reasoning: format!(
                "Risk score {score:.1}/100 ({level}). Market volatility ({regime}) suggests \
                 {:.1}% allocation with stop-loss at {:.2}%. \
                 Max allocation capped at {:.1}% based on risk tolerance.",
                recommended * 100.0,
                market.stop_loss_percent,
                max_allocation * 100.0,
            ),
        },
        max_allocation: round_dp(max_allocation * 100.0, 1),
        warnings: project.red_flags.clone(),
        reasoning: format!(
            "Risk score of {score:.1}/100 indicates {level} risk profile. \
             Tokenomics score of {} (risk: {tokenomics_risk:.1}). \
             Technical health score of {} (risk: {technical_risk:.1}). \
             Liquidity rating '{}' (risk: {liquidity_risk}). \
             Market volatility regime: {regime} (risk: {market_risk}). \
             Recommendation: {} with {:.1}% suggested allocation.",
            tokenomics.score,
            technical.score,
            liquidity.liquidity_rating.as_str(),
            flags.recommendation.as_str(),
            recommended * 100.0,
        ),
    }
}

/// Project view of a tracked GitHub reading
pub fn development_activity(project: &ProjectFundamentals, tracked: &DevelopmentReport) -> DevelopmentActivity {
    let data = &tracked.data;
    let repository = tracked
        .metadata
        .repository
        .clone()
        .unwrap_or_else(|| project.development.repository.clone());

    DevelopmentActivity {
        symbol: project.symbol.clone(),
        period_days: tracked.metadata.period_days,
        github_metrics: GithubMetrics {
            repository,
            commits: data.commit_count,
            contributors: data.contributor_count,
            merged_pull_requests: data.release_count,
            commit_frequency: data.commit_frequency.as_str(),
            velocity_trend: data.velocity_trend,
        },
        activity_score: round_dp(data.health_score * 100.0, 1),
        momentum: data.development_momentum,
        trading_signal: data.trading_signal,
        confidence: tracked.metadata.confidence,
        warnings: tracked.metadata.warnings.clone(),
        timestamp: tracked.timestamp,
    }
}

const fn entry_range(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "current_to_10pct_pullback",
        RiskLevel::Medium => "wait_for_20pct_pullback",
        RiskLevel::High => "small_starter_position_only",
        RiskLevel::Extreme => "avoid",
    }
}

const fn exit_strategy(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Long-term hold (5+ years) with trailing stop at -30% from ATH",
        RiskLevel::Medium => "Take partial profits at +50%, trailing stop at -20%",
        RiskLevel::High => "Tight stop at -15%, take profits at +30%",
        RiskLevel::Extreme => "Exit existing positions",
    }
}

fn target_allocation(level: RiskLevel) -> Decimal {
    match level {
        RiskLevel::Low => dec!(15.0),
        RiskLevel::Medium => dec!(10.0),
        RiskLevel::High => dec!(5.0),
        RiskLevel::Extreme => Decimal::ZERO,
    }
}

/// Full due diligence from one fundamentals snapshot, one risk reading and
/// one development reading
pub fn due_diligence(
    project: &ProjectFundamentals,
    market: &RiskData,
    development: DevelopmentActivity,
    risk_tolerance: f64,
) -> DueDiligenceReport {
    let tokenomics = tokenomics(project);
    let technical = technical_health(project);
    let liquidity = liquidity(project);
    let flags = red_flags(project);
    let risk = risk_score(project, market, risk_tolerance);

    let score = tokenomics.score * 0.35
        + technical.score * 0.30
        + liquidity.score * 0.25
        + (100.0 - risk.risk_score) * 0.10;

    #[allow(clippy::cast_precision_loss)]
    let confidence = (0.88
        - 0.10 * flags.red_flags.major.len() as f64
        - 0.25 * flags.red_flags.critical.len() as f64)
        .max(0.40);

    let mut strengths = Vec::new();
    if tokenomics.score > 70.0 {
        strengths.push(format!("Strong tokenomics (score: {}/100)", tokenomics.score));
    }
    if technical.score > 70.0 {
        strengths.push(format!("Robust technical health (score: {}/100)", technical.score));
    }
    if liquidity.score > 70.0 {
        strengths.push(format!(
            "Excellent liquidity (rating: {})",
            liquidity.liquidity_rating.as_str()
        ));
    }
    if risk.risk_score < 30.0 {
        strengths.push(format!("Low risk profile (risk: {}/100)", risk.risk_score));
    }

    let mut concerns = Vec::new();
    if tokenomics.score < 40.0 {
        concerns.push(format!("Weak tokenomics (score: {}/100)", tokenomics.score));
    }
    if technical.score < 40.0 {
        concerns.push(format!("Technical health concerns (score: {}/100)", technical.score));
    }
    if liquidity.score < 40.0 {
        concerns.push(format!(
            "Poor liquidity (rating: {})",
            liquidity.liquidity_rating.as_str()
        ));
    }
    if risk.risk_score > 70.0 {
        concerns.push(format!("High risk profile (risk: {}/100)", risk.risk_score));
    }
    concerns.extend(flags.red_flags.critical.iter().map(|f| format!("CRITICAL: {f}")));
    concerns.extend(flags.red_flags.major.iter().map(|f| format!("MAJOR: {f}")));
    concerns.extend(flags.red_flags.minor.iter().cloned());

    let level = risk.risk_level;
    let allocation = if flags.overall_risk == RiskLevel::Extreme {
        Decimal::ZERO
    } else {
        target_allocation(level)
    };
    let action = flags.recommendation;

    let quality = if score >= 85.0 {
        "excellent"
    } else if score >= 70.0 {
        "solid"
    } else if score >= 50.0 {
        "mixed"
    } else {
        "weak"
    };
    let executive_summary = format!(
        "{} presents a {level}-risk ({:.0}/100) investment opportunity with {quality} fundamentals. \
         Tokenomics score of {}/100 and technical health score of {}/100. \
         {} liquidity enables {} capital deployment. \
         Recommended action: {} with {allocation}% portfolio allocation.",
        project.symbol,
        risk.risk_score,
        tokenomics.score,
        technical.score,
        capitalize(liquidity.liquidity_rating.as_str()),
        if liquidity.score >= 75.0 { "efficient" } else { "cautious" },
        action.as_str(),
    );

    DueDiligenceReport {
        symbol: project.symbol.clone(),
        score: round_dp(score, 1),
        confidence: round_dp(confidence, 2),
        executive_summary,
        tokenomics,
        technical_health: technical,
        development_activity: development,
        liquidity,
        red_flags: flags,
        strengths,
        concerns,
        recommendation: action,
        recommendation_details: RecommendationDetails {
            action,
            confidence: round_dp(confidence, 2),
            target_allocation: allocation,
            entry_price_range: entry_range(level),
            exit_strategy: exit_strategy(level),
        },
        risk_assessment: risk,
        timestamp: Utc::now(),
    }
}

/// `28500000000` -> `28.5B`
fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>().replace('_', " ")
    })
}

fn serde_label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Fundamental analyst
pub struct CryptoVcAnalyst {
    source: Arc<dyn MarketDataSource>,
    risk: RiskCalculator,
    development: DevelopmentActivityTracker,
    risk_tolerance: f64,
}

impl CryptoVcAnalyst {
    pub const NAME: &'static str = "crypto_vc_analyst";

    pub fn new(source: Arc<dyn MarketDataSource>, mcp: Arc<dyn McpClient>) -> Self {
        Self {
            source,
            risk: RiskCalculator::new(mcp.clone()),
            development: DevelopmentActivityTracker::new(mcp),
            risk_tolerance: RiskInputs::default().risk_tolerance,
        }
    }

    #[must_use]
    pub fn with_exchange(mut self, exchange_id: impl Into<String>) -> Self {
        self.risk = self.risk.with_exchange(exchange_id);
        self
    }

    #[must_use]
    pub const fn with_risk_tolerance(mut self, risk_tolerance: f64) -> Self {
        self.risk_tolerance = risk_tolerance;
        self
    }

    async fn market_risk(&self, symbol: &str) -> Result<RiskData> {
        let inputs = RiskInputs {
            risk_tolerance: self.risk_tolerance,
            ..RiskInputs::default()
        };
        let report = self.risk.calculate(symbol, MARKET_RISK_TIMEFRAME, inputs).await?;
        Ok(report.data)
    }

    pub async fn analyze_tokenomics(&self, symbol: &str) -> Result<TokenomicsAnalysis> {
        Ok(tokenomics(&self.source.fundamentals(symbol).await?))
    }

    pub async fn assess_technical_health(&self, symbol: &str) -> Result<TechnicalHealth> {
        Ok(technical_health(&self.source.fundamentals(symbol).await?))
    }

    pub async fn analyze_liquidity(&self, symbol: &str) -> Result<LiquidityAnalysis> {
        Ok(liquidity(&self.source.fundamentals(symbol).await?))
    }

    pub async fn identify_red_flags(&self, symbol: &str) -> Result<RedFlagReport> {
        Ok(red_flags(&self.source.fundamentals(symbol).await?))
    }

    pub async fn calculate_risk_score(&self, symbol: &str) -> Result<RiskScoreReport> {
        let (project, market) =
            futures::try_join!(self.source.fundamentals(symbol), self.market_risk(symbol))?;
        Ok(risk_score(&project, &market, self.risk_tolerance))
    }

    async fn development_of(&self, project: &ProjectFundamentals, period_days: u32) -> DevelopmentActivity {
        let tracked = self
            .development
            .track(&project.symbol, Some(&project.development.repository), period_days)
            .await;
        development_activity(project, &tracked)
    }

    /// GitHub activity of the project's repository over `period_days`
    pub async fn track_development_activity(&self, symbol: &str, period_days: u32) -> Result<DevelopmentActivity> {
        let project = self.source.fundamentals(symbol).await?;
        Ok(self.development_of(&project, period_days).await)
    }

    /// Due diligence with the development reading taken over `period_days`
    pub async fn generate_due_diligence_report(&self, symbol: &str, period_days: u32) -> Result<DueDiligenceReport> {
        let (project, market) =
            futures::try_join!(self.source.fundamentals(symbol), self.market_risk(symbol))?;
        let development = self.development_of(&project, period_days).await;
        let report = due_diligence(&project, &market, development, self.risk_tolerance);

        tracing::info!(
            symbol = %symbol,
            score = report.score,
            recommendation = report.recommendation.as_str(),
            "Due diligence complete"
        );
        Ok(report)
    }

    pub fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::new(
            AgentKind::SpecializedAgent,
            Self::NAME,
            "Fundamental analysis and due diligence for crypto projects",
            "fundamental_analysis",
        )
        .with_capabilities(&[
            "tokenomics_analysis",
            "technical_health_assessment",
            "liquidity_analysis",
            "risk_scoring",
            "red_flag_identification",
            "due_diligence_reporting",
            "development_activity_tracking",
        ])
        .with_required_mcps(&["crypto-projects-mcp", "ccxt-mcp", "crypto-indicators-mcp"])
        .with_optional_mcps(&["github-manager"])
        .with_use_cases(&[
            "Pre-investment due diligence",
            "Portfolio construction",
            "Risk assessment",
            "Position sizing",
            "Red flag detection",
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalystError;
    use crate::source::MockMarketData;

    fn analyst() -> CryptoVcAnalyst {
        let mock = Arc::new(MockMarketData::new());
        CryptoVcAnalyst::new(mock.clone(), mock)
    }

    #[tokio::test]
    async fn test_btc_component_scores() {
        let analyst = analyst();

        let tokenomics = analyst.analyze_tokenomics("BTC").await.unwrap();
        assert!((tokenomics.score - 95.1).abs() < 1e-9);
        assert!(tokenomics.red_flags.is_empty());

        let technical = analyst.assess_technical_health("BTC").await.unwrap();
        assert!((technical.score - 89.9).abs() < 1e-9);

        let liquidity = analyst.analyze_liquidity("BTC").await.unwrap();
        assert!((liquidity.score - 99.3).abs() < 1e-9);
        assert_eq!(liquidity.liquidity_rating, LiquidityRating::Exceptional);
    }

    #[tokio::test]
    async fn test_btc_flags_and_risk() {
        let analyst = analyst();

        let flags = analyst.identify_red_flags("BTC").await.unwrap();
        assert_eq!(flags.overall_risk, RiskLevel::Low);
        assert_eq!(flags.recommendation, InvestmentRecommendation::Buy);

        let risk = analyst.calculate_risk_score("BTC").await.unwrap();
        assert!((risk.risk_score - 23.7).abs() < 1e-9);
        assert_eq!(risk.risk_level, RiskLevel::Low);
        assert!((risk.risk_breakdown.market_risk - 45.0).abs() < 1e-9);
        assert!(risk.position_sizing.max_allocation <= MAX_ALLOCATION);
    }

    #[tokio::test]
    async fn test_btc_due_diligence() {
        let report = analyst().generate_due_diligence_report("BTC", DUE_DILIGENCE_PERIOD_DAYS).await.unwrap();

        assert!((report.score - 92.7).abs() < 0.05);
        assert!((report.confidence - 0.88).abs() < 1e-9);
        assert_eq!(report.recommendation, InvestmentRecommendation::Buy);
        assert_eq!(report.recommendation_details.target_allocation, dec!(15.0));
        assert_eq!(report.recommendation_details.entry_price_range, "current_to_10pct_pullback");
        assert_eq!(report.strengths.len(), 4);
        assert_eq!(report.concerns.len(), 2);
        assert!(report.executive_summary.starts_with("BTC presents a low-risk"));
    }

    #[tokio::test]
    async fn test_development_activity() {
        let activity = analyst().track_development_activity("BTC", 30).await.unwrap();
        assert!((activity.activity_score - 85.0).abs() < 1e-9);
        assert_eq!(activity.github_metrics.repository, "bitcoin/bitcoin");
        assert_eq!(activity.github_metrics.commits, 100);
        assert_eq!(activity.github_metrics.contributors, 100);
        assert_eq!(activity.github_metrics.commit_frequency, "moderate");
        assert_eq!(activity.momentum, DevelopmentMomentum::Strong);
        assert!(activity.warnings.is_empty());
    }

    fn commit_reply(count: i64, spacing_hours: i64) -> serde_json::Value {
        let now = Utc::now();
        let commits: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                let date = now - chrono::Duration::hours(spacing_hours * i + 1);
                serde_json::json!({ "date": date.to_rfc3339() })
            })
            .collect();
        serde_json::json!({ "commits": commits })
    }

    #[tokio::test]
    async fn test_development_activity_follows_commit_history() {
        use crate::skills::indicators::{LIST_COMMITS, SEARCH_ISSUES, SEARCH_USERS};
        use agent_core::StaticMcpClient;

        let with_commits = |commits: serde_json::Value| {
            let client = StaticMcpClient::new()
                .with_response(LIST_COMMITS, commits)
                .with_response(SEARCH_USERS, serde_json::json!({ "users": vec![serde_json::json!({}); 25] }))
                .with_response(SEARCH_ISSUES, serde_json::json!({ "items": [] }));
            CryptoVcAnalyst::new(Arc::new(MockMarketData::new()), Arc::new(client))
        };

        let busy = with_commits(commit_reply(320, 2)).track_development_activity("BTC", 30).await.unwrap();
        let quiet = with_commits(commit_reply(6, 96)).track_development_activity("BTC", 30).await.unwrap();

        assert_eq!(busy.github_metrics.commits, 320);
        assert_eq!(busy.github_metrics.commit_frequency, "very_high");
        assert_eq!(quiet.github_metrics.commits, 6);
        assert_eq!(quiet.github_metrics.commit_frequency, "very_low");
        assert!(busy.activity_score > quiet.activity_score);
        assert_ne!(busy.trading_signal, quiet.trading_signal);
    }

    #[tokio::test]
    async fn test_due_diligence_uses_requested_period() {
        let report = analyst().generate_due_diligence_report("BTC", 7).await.unwrap();
        assert_eq!(report.development_activity.period_days, 7);
        assert_eq!(report.development_activity.github_metrics.commits, 28);
    }

    #[tokio::test]
    async fn test_high_tier_asset_carries_major_flag() {
        let report = analyst().generate_due_diligence_report("DOGE", DUE_DILIGENCE_PERIOD_DAYS).await.unwrap();

        assert_eq!(report.red_flags.overall_risk, RiskLevel::Medium);
        assert_eq!(report.recommendation, InvestmentRecommendation::Hold);
        assert!((report.confidence - 0.78).abs() < 1e-9);
        assert!(report.concerns.iter().any(|c| c.starts_with("MAJOR: ")));
    }

    #[tokio::test]
    async fn test_unknown_asset_errors() {
        let err = analyst().analyze_tokenomics("NOPE").await.unwrap_err();
        assert!(matches!(err, AnalystError::DataSource(_)));
    }

    #[test]
    fn test_overall_risk_rules() {
        let factors = RiskFactors {
            centralization_risk: RiskLevel::Low,
            regulatory_risk: RiskLevel::Low,
            technical_risk: RiskLevel::Low,
            market_risk: RiskLevel::Low,
        };
        let mut flags = RedFlags::default();
        assert_eq!(overall_risk(&flags, &factors), RiskLevel::Low);
        assert_eq!(
            InvestmentRecommendation::from_risk(RiskLevel::Low, &flags),
            InvestmentRecommendation::StrongBuy
        );

        flags.major = vec!["a".into(), "b".into()];
        assert_eq!(overall_risk(&flags, &factors), RiskLevel::High);

        flags.critical = vec!["rug".into()];
        assert_eq!(overall_risk(&flags, &factors), RiskLevel::Extreme);
        assert_eq!(
            InvestmentRecommendation::from_risk(RiskLevel::Extreme, &flags),
            InvestmentRecommendation::StrongSell
        );
    }
}
