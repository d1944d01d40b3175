//! Crypto Macro Analyst
//!
//! Macro regime, institutional flows, central bank policy and cross-asset
//! risk appetite. Every classification is a pure function over the snapshots
//! delivered by the injected [`MarketDataSource`].

use serde::Serialize;
use std::sync::Arc;

use agent_core::{AgentCapabilities, AgentKind, McpClient};

use super::signal::{Signal, SignalDirection};
use crate::error::Result;
use crate::model::round_dp;
use crate::skills::institutional_flow::{InstitutionalFlowData, InstitutionalFlowTracker};
use crate::source::{FedSnapshot, FlowSnapshot, MarketDataSource, RiskAppetiteSnapshot};

/// Net flow (USD millions) beyond which flows count as directional
const FLOW_THRESHOLD_MUSD: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroRegime {
    RiskOn,
    RiskOff,
    Neutral,
    Transitioning,
}

impl MacroRegime {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RiskOn => "risk_on",
            Self::RiskOff => "risk_off",
            Self::Neutral => "neutral",
            Self::Transitioning => "transitioning",
        }
    }
}

/// Headline macro call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketView {
    Bullish,
    Bearish,
    Neutral,
}

impl Signal for MarketView {
    fn direction(&self) -> SignalDirection {
        match self {
            Self::Bullish => SignalDirection::Bullish,
            Self::Bearish => SignalDirection::Bearish,
            Self::Neutral => SignalDirection::Neutral,
        }
    }

    fn label(&self) -> &'static str {
        self.direction().as_str()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStance {
    Hawkish,
    NeutralToHawkish,
    Neutral,
    NeutralToDovish,
    Dovish,
}

impl PolicyStance {
    pub fn classify(fed: &FedSnapshot) -> Self {
        if fed.rate_hikes_signaled {
            Self::Hawkish
        } else if fed.rate_cuts_signaled {
            Self::Dovish
        } else if fed.inflation_rate - fed.inflation_target > 1.0 {
            Self::NeutralToHawkish
        } else if fed.qt_tapering_discussed {
            Self::NeutralToDovish
        } else {
            Self::Neutral
        }
    }

    pub const fn rate_outlook(self) -> &'static str {
        match self {
            Self::Hawkish => "higher",
            Self::NeutralToHawkish => "stable_to_higher",
            Self::Neutral => "stable",
            Self::NeutralToDovish => "stable_to_lower",
            Self::Dovish => "lower",
        }
    }

    pub const fn crypto_impact(self) -> MarketView {
        match self {
            Self::Hawkish | Self::NeutralToHawkish => MarketView::Bearish,
            Self::Neutral => MarketView::Neutral,
            Self::NeutralToDovish | Self::Dovish => MarketView::Bullish,
        }
    }

    const fn posture(self) -> &'static str {
        match self.crypto_impact() {
            MarketView::Bullish => "accommodative",
            MarketView::Bearish => "restrictive",
            MarketView::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Inflow,
    Outflow,
    Neutral,
}

impl FlowDirection {
    pub fn of(net_flow_musd: f64) -> Self {
        if net_flow_musd > FLOW_THRESHOLD_MUSD {
            Self::Inflow
        } else if net_flow_musd < -FLOW_THRESHOLD_MUSD {
            Self::Outflow
        } else {
            Self::Neutral
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowTrend {
    Accelerating,
    Decelerating,
    Steady,
}

impl FlowTrend {
    /// Late half of the window against the early half, with a 10% band
    pub fn of(daily: &[f64]) -> Self {
        let half = daily.len() / 2;
        if half == 0 {
            return Self::Steady;
        }
        let early = mean(&daily[..half]);
        let late = mean(&daily[daily.len() - half..]);
        let band = early.abs() * 0.10;

        if late > early + band {
            Self::Accelerating
        } else if late < early - band {
            Self::Decelerating
        } else {
            Self::Steady
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Accelerating => "accelerating",
            Self::Decelerating => "decelerating",
            Self::Steady => "steady",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSentiment {
    RiskOn,
    RiskOff,
    Neutral,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegimeIndicators {
    pub fed_policy: &'static str,
    pub risk_sentiment: &'static str,
    pub institutional_flows: &'static str,
    pub correlation_regime: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegimeAssessment {
    pub asset: String,
    pub regime: MacroRegime,
    pub confidence: f64,
    pub indicators: RegimeIndicators,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct EtfFlows {
    pub total: f64,
    pub daily_average: f64,
    pub trend: FlowTrend,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExchangeFlows {
    pub institutional_volume: f64,
    pub retail_volume: f64,
    pub ratio: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct FlowAnalysis {
    pub asset: String,
    pub period_days: u32,
    pub net_flow: f64,
    pub flow_direction: FlowDirection,
    pub etf_flows: EtfFlows,
    pub exchange_flows: ExchangeFlows,
    pub interpretation: String,

    /// ETF tape plus exchange block trades, when tracked over MCP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institutional: Option<InstitutionalFlowData>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FedImpact {
    pub policy_stance: PolicyStance,
    pub rate_outlook: &'static str,
    pub impact_on_crypto: MarketView,
    pub key_factors: Vec<String>,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RiskIndicators {
    pub vix: f64,
    pub crypto_fear_greed: u8,
    pub equity_performance: &'static str,
    pub safe_haven_flows: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct RiskSentimentAssessment {
    pub sentiment: RiskSentiment,
    pub confidence: f64,
    pub indicators: RiskIndicators,
    pub crypto_implication: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MacroOutlook {
    pub asset: String,
    pub recommendation: MarketView,
    pub confidence: f64,
    pub regime: MacroRegime,
    pub key_drivers: Vec<String>,
    pub risks: Vec<String>,
    pub entry_timing: &'static str,
    pub exit_timing: &'static str,
    pub reasoning: String,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

/// `+$500M` / `-$120M`
fn signed_musd(value: f64) -> String {
    let sign = if value < 0.0 { '-' } else { '+' };
    format!("{sign}${:.0}M", value.abs())
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

/// Flow reading without any I/O
pub fn analyze_flows(flows: &FlowSnapshot) -> FlowAnalysis {
    let total = flows.etf_total();
    let net = flows.net_flow();
    let direction = FlowDirection::of(net);
    let trend = FlowTrend::of(&flows.etf_daily_flows_musd);
    let ratio = if flows.retail_volume_musd > 0.0 {
        flows.institutional_volume_musd / flows.retail_volume_musd
    } else {
        0.0
    };

    let pressure = match direction {
        FlowDirection::Inflow => "Strong institutional buying pressure",
        FlowDirection::Outflow => "Institutional selling pressure",
        FlowDirection::Neutral => "Balanced institutional positioning",
    };
    let positioning = if ratio > 1.2 {
        "indicates smart money accumulation"
    } else if ratio < 0.8 {
        "shows retail-driven trading"
    } else {
        "shows balanced participation"
    };
    let implication = match direction {
        FlowDirection::Inflow => "Bullish signal for medium-term price action.",
        FlowDirection::Outflow => "Bearish signal for medium-term price action.",
        FlowDirection::Neutral => "No directional signal from flows.",
    };

    FlowAnalysis {
        asset: flows.asset.clone(),
        period_days: flows.period_days,
        net_flow: round_dp(net, 1),
        flow_direction: direction,
        etf_flows: EtfFlows {
            total: round_dp(total, 1),
            daily_average: round_dp(mean(&flows.etf_daily_flows_musd), 1),
            trend,
        },
        exchange_flows: ExchangeFlows {
            institutional_volume: flows.institutional_volume_musd,
            retail_volume: flows.retail_volume_musd,
            ratio: round_dp(ratio, 2),
        },
        interpretation: format!(
            "{pressure} with ETF flows {}. Institutional/retail volume ratio of {ratio:.1}x {positioning}. {implication}",
            trend.as_str()
        ),
        institutional: None,
    }
}

/// Fed policy reading without any I/O
pub fn analyze_fed(fed: &FedSnapshot) -> FedImpact {
    let stance = PolicyStance::classify(fed);
    let gap = fed.inflation_rate - fed.inflation_target;

    let mut key_factors = Vec::new();
    key_factors.push(if gap <= 0.0 {
        format!(
            "Inflation at {:.1}% (at or below {:.0}% target)",
            fed.inflation_rate, fed.inflation_target
        )
    } else if gap <= 1.0 {
        format!(
            "Inflation moderating to {:.1}% (approaching {:.0}% target)",
            fed.inflation_rate, fed.inflation_target
        )
    } else {
        format!(
            "Inflation elevated at {:.1}% ({:.0}% target)",
            fed.inflation_rate, fed.inflation_target
        )
    });
    key_factors.push(if fed.rate_hikes_signaled {
        format!("Rate hikes signaled for {}", fed.outlook_quarter)
    } else if fed.rate_cuts_signaled {
        format!("Rate cuts signaled for {}", fed.outlook_quarter)
    } else {
        format!("No rate hikes signaled for {}", fed.outlook_quarter)
    });
    if fed.qt_tapering_discussed {
        key_factors.push("QT tapering discussions ongoing".into());
    }
    key_factors.push(if fed.employment_strong {
        "Employment remains strong".into()
    } else {
        "Employment softening".into()
    });

    let reasoning = match stance.crypto_impact() {
        MarketView::Bullish => {
            "Fed maintaining patient stance with inflation moderating. \
             No near-term rate hikes creates favorable liquidity environment for crypto. \
             Easing balance-sheet pressure would further support risk assets."
        }
        MarketView::Bearish => {
            "Fed leaning toward tightening with inflation above target. \
             Higher rates drain liquidity from risk assets. \
             Crypto faces a monetary headwind until policy turns."
        }
        MarketView::Neutral => {
            "Fed on hold with no clear policy bias. \
             Liquidity conditions are stable and not a driver for crypto either way."
        }
    };

    FedImpact {
        policy_stance: stance,
        rate_outlook: stance.rate_outlook(),
        impact_on_crypto: stance.crypto_impact(),
        key_factors,
        reasoning: reasoning.to_string(),
    }
}

/// Cross-asset risk appetite without any I/O
pub fn analyze_risk_appetite(risk: &RiskAppetiteSnapshot) -> RiskSentimentAssessment {
    let votes = [
        vote(risk.vix < 20.0, risk.vix > 30.0),
        vote(risk.crypto_fear_greed > 55, risk.crypto_fear_greed < 45),
        vote(risk.equity_change_pct > 0.5, risk.equity_change_pct < -0.5),
        vote(risk.safe_haven_flow_musd < 0.0, risk.safe_haven_flow_musd > 0.0),
    ];
    let on = votes.iter().filter(|v| **v > 0).count();
    let off = votes.iter().filter(|v| **v < 0).count();

    let sentiment = if on >= 3 {
        RiskSentiment::RiskOn
    } else if off >= 3 {
        RiskSentiment::RiskOff
    } else {
        RiskSentiment::Neutral
    };

    #[allow(clippy::cast_precision_loss)]
    let confidence = 0.07f64.mul_add(on.max(off) as f64, 0.50);

    let implication = match sentiment {
        RiskSentiment::RiskOn => {
            "Risk-on sentiment supports crypto upside. \
             Low volatility and firm equities indicate investor risk appetite. \
             Outflows from safe havens confirm capital rotation into growth assets."
        }
        RiskSentiment::RiskOff => {
            "Risk-off sentiment weighs on crypto. \
             Elevated volatility and safe-haven demand point to de-risking across portfolios."
        }
        RiskSentiment::Neutral => {
            "Mixed cross-asset signals. \
             No clear rotation into or out of risk assets."
        }
    };

    RiskSentimentAssessment {
        sentiment,
        confidence: round_dp(confidence, 2),
        indicators: RiskIndicators {
            vix: risk.vix,
            crypto_fear_greed: risk.crypto_fear_greed,
            equity_performance: if risk.equity_change_pct > 0.5 {
                "positive"
            } else if risk.equity_change_pct < -0.5 {
                "negative"
            } else {
                "flat"
            },
            safe_haven_flows: if risk.safe_haven_flow_musd < 0.0 {
                "outflows"
            } else if risk.safe_haven_flow_musd > 0.0 {
                "inflows"
            } else {
                "flat"
            },
        },
        crypto_implication: implication.to_string(),
    }
}

const fn vote(risk_on: bool, risk_off: bool) -> i8 {
    if risk_on {
        1
    } else if risk_off {
        -1
    } else {
        0
    }
}

const fn correlation_regime(correlation: f64) -> &'static str {
    if correlation < 0.3 {
        "decoupling"
    } else if correlation > 0.7 {
        "coupled"
    } else {
        "moderate"
    }
}

/// Regime vote over fed posture, risk appetite and flows
pub fn assess_regime(
    flows: &FlowSnapshot,
    fed: &FedSnapshot,
    risk: &RiskAppetiteSnapshot,
) -> RegimeAssessment {
    let stance = PolicyStance::classify(fed);
    let appetite = analyze_risk_appetite(risk);
    let direction = FlowDirection::of(flows.net_flow());

    let votes = [
        match stance.crypto_impact() {
            MarketView::Bullish => 1,
            MarketView::Bearish => -1,
            MarketView::Neutral => 0,
        },
        match appetite.sentiment {
            RiskSentiment::RiskOn => 1,
            RiskSentiment::RiskOff => -1,
            RiskSentiment::Neutral => 0,
        },
        match direction {
            FlowDirection::Inflow => 1,
            FlowDirection::Outflow => -1,
            FlowDirection::Neutral => 0,
        },
    ];
    let on = votes.iter().filter(|v| **v > 0).count();
    let off = votes.iter().filter(|v| **v < 0).count();

    let regime = match (on, off) {
        (on, 0) if on >= 2 => MacroRegime::RiskOn,
        (0, off) if off >= 2 => MacroRegime::RiskOff,
        (on, off) if on > 0 && off > 0 => MacroRegime::Transitioning,
        _ => MacroRegime::Neutral,
    };

    #[allow(clippy::cast_precision_loss)]
    let confidence = 0.10f64.mul_add(on.max(off) as f64, 0.55).min(0.95);

    let correlation = correlation_regime(risk.btc_equity_correlation);
    let institutional_share =
        flows.institutional_volume_musd / (flows.institutional_volume_musd + flows.retail_volume_musd).max(1.0);

    let fed_sentence = match stance.crypto_impact() {
        MarketView::Bullish => "Fed maintaining accommodative stance with no rate hikes signaled.",
        MarketView::Bearish => "Fed tilting restrictive with tightening risk still in play.",
        MarketView::Neutral => "Fed policy on hold with no directional bias.",
    };
    let flow_sentence = match direction {
        FlowDirection::Inflow => "net institutional buying",
        FlowDirection::Outflow => "net institutional selling",
        FlowDirection::Neutral => "balanced institutional activity",
    };
    let correlation_sentence = match correlation {
        "decoupling" => "Crypto decoupling from equities indicates independent strength.",
        "coupled" => "Crypto trading in lockstep with equities.",
        _ => "Crypto moderately correlated with equities.",
    };

    RegimeAssessment {
        asset: flows.asset.clone(),
        regime,
        confidence: round_dp(confidence, 2),
        indicators: RegimeIndicators {
            fed_policy: stance.posture(),
            risk_sentiment: match appetite.sentiment {
                RiskSentiment::RiskOn => "positive",
                RiskSentiment::RiskOff => "negative",
                RiskSentiment::Neutral => "mixed",
            },
            institutional_flows: match direction {
                FlowDirection::Inflow => "net_buying",
                FlowDirection::Outflow => "net_selling",
                FlowDirection::Neutral => "balanced",
            },
            correlation_regime: correlation,
        },
        reasoning: format!(
            "{fed_sentence} {} ETF flows show {flow_sentence} ({} over {} days). \
             Institutional platforms carry {} of exchange volume. {correlation_sentence}",
            flows.asset,
            signed_musd(flows.etf_total()),
            flows.period_days,
            percent(institutional_share),
        ),
    }
}

/// Macroeconomic analyst
pub struct CryptoMacroAnalyst {
    source: Arc<dyn MarketDataSource>,
    flows: InstitutionalFlowTracker,
}

impl CryptoMacroAnalyst {
    pub const NAME: &'static str = "crypto_macro_analyst";

    pub fn new(source: Arc<dyn MarketDataSource>, mcp: Arc<dyn McpClient>) -> Self {
        Self {
            source,
            flows: InstitutionalFlowTracker::new(mcp),
        }
    }

    pub async fn analyze_macro_regime(&self, asset: &str, lookback_days: u32) -> Result<RegimeAssessment> {
        let (flows, fed, risk) = futures::try_join!(
            self.source.institutional_flows(asset, lookback_days),
            self.source.fed_policy(),
            self.source.risk_appetite(),
        )?;
        let assessment = assess_regime(&flows, &fed, &risk);

        tracing::debug!(asset = %asset, regime = assessment.regime.as_str(), "Macro regime assessed");
        Ok(assessment)
    }

    /// Snapshot flow reading extended with the ETF and block-trade tape
    pub async fn track_institutional_flows(&self, asset: &str, period_days: u32) -> Result<FlowAnalysis> {
        let (flows, tracked) = futures::join!(
            self.source.institutional_flows(asset, period_days),
            self.flows.track(asset, period_days),
        );
        let mut analysis = analyze_flows(&flows?);

        for warning in &tracked.metadata.warnings {
            tracing::warn!(asset = %asset, warning = %warning, "Institutional flow channel unavailable");
        }
        analysis.interpretation = format!(
            "{} Tape: {} ({} net over {} days).",
            analysis.interpretation,
            tracked.data.trading_signal,
            signed_musd(tracked.data.net_flow_usd / 1_000_000.0),
            tracked.data.period_days,
        );
        analysis.institutional = Some(tracked.data);

        Ok(analysis)
    }

    pub async fn analyze_fed_impact(&self) -> Result<FedImpact> {
        let fed = self.source.fed_policy().await?;
        Ok(analyze_fed(&fed))
    }

    pub async fn assess_risk_sentiment(&self) -> Result<RiskSentimentAssessment> {
        let risk = self.source.risk_appetite().await?;
        Ok(analyze_risk_appetite(&risk))
    }

    /// Full macro outlook over a weekly flow window
    pub async fn synthesize_macro_outlook(&self, asset: &str, horizon_days: u32) -> Result<MacroOutlook> {
        let (flows, fed, risk) = futures::try_join!(
            self.source.institutional_flows(asset, 7),
            self.source.fed_policy(),
            self.source.risk_appetite(),
        )?;

        let regime = assess_regime(&flows, &fed, &risk);
        let flow = analyze_flows(&flows);
        let fed_impact = analyze_fed(&fed);
        let appetite = analyze_risk_appetite(&risk);

        let recommendation = match regime.regime {
            MacroRegime::RiskOn => MarketView::Bullish,
            MacroRegime::RiskOff => MarketView::Bearish,
            MacroRegime::Neutral | MacroRegime::Transitioning => MarketView::Neutral,
        };
        let confidence = regime.confidence.mul_add(0.6, appetite.confidence * 0.4);

        let mut key_drivers = vec![
            match regime.indicators.fed_policy {
                "accommodative" => "Fed maintaining accommodative policy stance".to_string(),
                "restrictive" => "Fed policy tilting restrictive".to_string(),
                _ => "Fed policy on hold".to_string(),
            },
            format!(
                "Institutional ETF {} {} ({} over {} days)",
                if flow.etf_flows.total >= 0.0 { "inflows" } else { "outflows" },
                flow.etf_flows.trend.as_str(),
                signed_musd(flow.etf_flows.total),
                flow.period_days,
            ),
            format!(
                "{} sentiment with VIX at {:.1}",
                match appetite.sentiment {
                    RiskSentiment::RiskOn => "Risk-on",
                    RiskSentiment::RiskOff => "Risk-off",
                    RiskSentiment::Neutral => "Mixed risk",
                },
                appetite.indicators.vix,
            ),
        ];
        match regime.indicators.correlation_regime {
            "decoupling" => key_drivers.push("Crypto decoupling from equities (independent strength)".into()),
            "coupled" => key_drivers.push("Crypto trading in lockstep with equities".into()),
            _ => {}
        }

        let mut risks = vec![
            if fed_impact.impact_on_crypto == MarketView::Bearish {
                "Further monetary tightening".to_string()
            } else {
                "Unexpected Fed hawkish pivot".to_string()
            },
            "Geopolitical events triggering risk-off".into(),
            "Regulatory uncertainty".into(),
        ];
        if flow.etf_flows.trend == FlowTrend::Decelerating {
            risks.push("Institutional inflows losing momentum".into());
        }
        if appetite.indicators.vix > 25.0 {
            risks.push("Elevated equity volatility".into());
        }

        let entry_timing = match recommendation {
            MarketView::Bullish => "favorable_now",
            MarketView::Neutral => "wait_for_confirmation",
            MarketView::Bearish => "defer_entries",
        };
        let entry_sentence = match recommendation {
            MarketView::Bullish => "entry recommended now",
            MarketView::Neutral => "entry deferred until confirmation",
            MarketView::Bearish => "new entries deferred",
        };

        let reasoning = format!(
            "Macro regime is {} with {} confidence. \
             Institutional flows show {} of ${:.1}M over past week. \
             Fed policy is {} with {} crypto impact. \
             Risk sentiment is {} ({} confidence). \
             Combined signals suggest {horizon_days}-day {} outlook with {entry_sentence}. \
             Monitor Fed statements for potential regime change signals.",
            regime.regime.as_str(),
            percent(regime.confidence),
            serde_label(&flow.flow_direction),
            flow.net_flow,
            serde_label(&fed_impact.policy_stance),
            fed_impact.impact_on_crypto.label(),
            serde_label(&appetite.sentiment),
            percent(appetite.confidence),
            recommendation.label(),
        );

        tracing::info!(
            asset = %asset,
            recommendation = recommendation.label(),
            confidence = confidence,
            "Macro outlook synthesized"
        );

        Ok(MacroOutlook {
            asset: asset.to_string(),
            recommendation,
            confidence: round_dp(confidence, 2),
            regime: regime.regime,
            key_drivers,
            risks,
            entry_timing,
            exit_timing: "monitor_fed_statements",
            reasoning,
        })
    }

    pub fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::new(
            AgentKind::SpecializedAgent,
            Self::NAME,
            "Macroeconomic analysis and institutional flow tracking",
            "macroeconomic_analysis",
        )
        .with_capabilities(&[
            "macro_regime_assessment",
            "institutional_flow_tracking",
            "fed_policy_analysis",
            "risk_sentiment_analysis",
            "macro_synthesis",
        ])
        .with_required_mcps(&["grok-search-mcp", "etf-flow-mcp", "ccxt-mcp"])
        .with_optional_mcps(&["perplexity"])
        .with_use_cases(&[
            "Market timing decisions",
            "Institutional flow analysis",
            "Fed policy impact assessment",
            "Risk regime identification",
            "Strategic entry/exit timing",
        ])
    }
}

/// snake_case wire name of a unit enum
fn serde_label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;

    fn analyst() -> CryptoMacroAnalyst {
        let mock = Arc::new(MockMarketData::new());
        CryptoMacroAnalyst::new(mock.clone(), mock)
    }

    fn fed(hikes: bool, cuts: bool, inflation: f64, qt: bool) -> FedSnapshot {
        FedSnapshot {
            inflation_rate: inflation,
            inflation_target: 2.0,
            rate_hikes_signaled: hikes,
            rate_cuts_signaled: cuts,
            qt_tapering_discussed: qt,
            employment_strong: true,
            outlook_quarter: "Q3".into(),
        }
    }

    #[test]
    fn test_policy_stance() {
        assert_eq!(PolicyStance::classify(&fed(true, false, 2.5, true)), PolicyStance::Hawkish);
        assert_eq!(PolicyStance::classify(&fed(false, true, 2.5, false)), PolicyStance::Dovish);
        assert_eq!(PolicyStance::classify(&fed(false, false, 3.5, true)), PolicyStance::NeutralToHawkish);
        assert_eq!(PolicyStance::classify(&fed(false, false, 2.5, true)), PolicyStance::NeutralToDovish);
        assert_eq!(PolicyStance::classify(&fed(false, false, 2.5, false)), PolicyStance::Neutral);
    }

    #[test]
    fn test_flow_trend_and_direction() {
        assert_eq!(FlowTrend::of(&[10.0, 10.0, 20.0, 20.0]), FlowTrend::Accelerating);
        assert_eq!(FlowTrend::of(&[20.0, 20.0, 10.0, 10.0]), FlowTrend::Decelerating);
        assert_eq!(FlowTrend::of(&[10.0, 10.5]), FlowTrend::Steady);
        assert_eq!(FlowTrend::of(&[]), FlowTrend::Steady);

        assert_eq!(FlowDirection::of(51.0), FlowDirection::Inflow);
        assert_eq!(FlowDirection::of(-51.0), FlowDirection::Outflow);
        assert_eq!(FlowDirection::of(50.0), FlowDirection::Neutral);
    }

    #[tokio::test]
    async fn test_mock_regime() {
        let regime = analyst().analyze_macro_regime("BTC", 30).await.unwrap();

        assert_eq!(regime.regime, MacroRegime::RiskOn);
        assert!((regime.confidence - 0.85).abs() < 1e-9);
        assert_eq!(regime.indicators.fed_policy, "accommodative");
        assert_eq!(regime.indicators.institutional_flows, "net_buying");
        assert_eq!(regime.indicators.correlation_regime, "decoupling");
    }

    #[tokio::test]
    async fn test_mock_flows() {
        let flows = analyst().track_institutional_flows("BTC", 7).await.unwrap();

        assert!((flows.net_flow - 350.5).abs() < 1e-9);
        assert_eq!(flows.flow_direction, FlowDirection::Inflow);
        assert!((flows.etf_flows.total - 500.0).abs() < 1e-9);
        assert!((flows.etf_flows.daily_average - 71.4).abs() < 1e-9);
        assert_eq!(flows.etf_flows.trend, FlowTrend::Accelerating);
        assert!((flows.exchange_flows.ratio - 1.5).abs() < 1e-9);

        let tape = flows.institutional.unwrap();
        assert!((tape.net_flow_usd - 539_000_000.0).abs() < 1e-3);
        assert!(flows.interpretation.ends_with(
            "Tape: Strong institutional accumulation - bullish bias (+$539M net over 7 days)."
        ));
    }

    fn etf_text(flows_musd: &[f64]) -> serde_json::Value {
        let lines: Vec<String> = flows_musd
            .iter()
            .enumerate()
            .map(|(i, f)| format!("Date: 2025-02-{:02} | Flow: ${f:.1}M", 10 - i))
            .collect();
        serde_json::json!({ "content": [{ "text": lines.join("\n") }] })
    }

    #[tokio::test]
    async fn test_flow_tape_follows_mcp_inputs() {
        use crate::skills::indicators::{ETF_FLOW, FETCH_TRADES};
        use agent_core::StaticMcpClient;

        let with_etf = |flows: &[f64]| {
            let client = StaticMcpClient::new()
                .with_response(ETF_FLOW, etf_text(flows))
                .with_response(FETCH_TRADES, serde_json::json!({ "trades": [] }));
            CryptoMacroAnalyst::new(Arc::new(MockMarketData::new()), Arc::new(client))
        };

        let buying = with_etf(&[150.0, 120.0, 90.0]).track_institutional_flows("BTC", 7).await.unwrap();
        let selling = with_etf(&[-150.0, -120.0, -90.0]).track_institutional_flows("BTC", 7).await.unwrap();

        let (buying_tape, selling_tape) = (buying.institutional.unwrap(), selling.institutional.unwrap());
        assert!((buying_tape.etf_net_flow_usd - 360_000_000.0).abs() < 1e-3);
        assert!((selling_tape.etf_net_flow_usd + 360_000_000.0).abs() < 1e-3);
        assert_ne!(buying_tape.flow_direction, selling_tape.flow_direction);
        assert_ne!(buying.interpretation, selling.interpretation);
        assert!(selling.interpretation.contains("-$360M net"));
    }

    #[tokio::test]
    async fn test_mock_fed_and_risk() {
        let analyst = analyst();
        let fed = analyst.analyze_fed_impact().await.unwrap();
        assert_eq!(fed.policy_stance, PolicyStance::NeutralToDovish);
        assert_eq!(fed.rate_outlook, "stable_to_lower");
        assert_eq!(fed.impact_on_crypto, MarketView::Bullish);
        assert_eq!(fed.key_factors[0], "Inflation moderating to 2.5% (approaching 2% target)");

        let risk = analyst.assess_risk_sentiment().await.unwrap();
        assert_eq!(risk.sentiment, RiskSentiment::RiskOn);
        assert!((risk.confidence - 0.78).abs() < 1e-9);
        assert_eq!(risk.indicators.safe_haven_flows, "outflows");
    }

    #[tokio::test]
    async fn test_mock_outlook() {
        let outlook = analyst().synthesize_macro_outlook("BTC", 30).await.unwrap();

        assert_eq!(outlook.recommendation, MarketView::Bullish);
        assert!((outlook.confidence - 0.82).abs() < 1e-9);
        assert_eq!(outlook.entry_timing, "favorable_now");
        assert!(outlook.reasoning.contains("inflow of $350.5M"));
        assert!(outlook.reasoning.contains("30-day bullish outlook"));
        assert_eq!(outlook.key_drivers.len(), 4);
    }

    #[test]
    fn test_regime_transitioning_on_split_votes() {
        let flows = FlowSnapshot {
            asset: "BTC".into(),
            period_days: 7,
            etf_daily_flows_musd: vec![-40.0, -60.0],
            exchange_net_flow_musd: 0.0,
            institutional_volume_musd: 500.0,
            retail_volume_musd: 500.0,
        };
        let risk = RiskAppetiteSnapshot {
            vix: 14.0,
            crypto_fear_greed: 70,
            equity_change_pct: 1.0,
            safe_haven_flow_musd: -10.0,
            btc_equity_correlation: 0.5,
        };

        let regime = assess_regime(&flows, &fed(false, false, 2.2, false), &risk);
        assert_eq!(regime.regime, MacroRegime::Transitioning);
        assert_eq!(regime.indicators.correlation_regime, "moderate");
    }
}
