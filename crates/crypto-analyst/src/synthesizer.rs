//! Thesis Synthesizer
//!
//! Strategic orchestrator. Runs the three specialist analysts, normalizes
//! their headline calls to [`SignalDirection`], resolves disagreement and
//! turns the weighted result into an investment thesis.
//!
//! [`synthesize`] is pure: the same inputs always serialize to the same
//! output. All I/O lives in [`ThesisSynthesizer`].

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use agent_core::{AgentCapabilities, AgentKind, McpClient};

use crate::agents::signal::{
    ConflictSeverity, ConflictType, Signal, SignalDirection, ThesisType, classify_thesis,
    detect_conflict,
};
use crate::agents::{
    CryptoMacroAnalyst, CryptoSentimentAnalyst, CryptoVcAnalyst, DUE_DILIGENCE_PERIOD_DAYS, DueDiligenceReport,
    MacroOutlook, SentimentOutlook,
};
use crate::config::{AnalystConfig, SynthesisWeights};
use crate::error::Result;
use crate::model::{RiskLevel, asset_slug, round_dp};
use crate::source::MarketDataSource;

const DEFAULT_MACRO_CONFIDENCE: f64 = 0.75;
const DEFAULT_FUNDAMENTAL_CONFIDENCE: f64 = 0.80;
const DEFAULT_SENTIMENT_CONFIDENCE: f64 = 0.70;
const DEFAULT_RISK_SCORE: f64 = 50.0;
const DEFAULT_ALLOCATION: Decimal = dec!(10.0);
const ALLOCATION_CAP: Decimal = dec!(25.0);

/// One analyst's headline call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalystSignal {
    pub label: String,
    pub direction: SignalDirection,
    pub confidence: Option<f64>,
}

impl AnalystSignal {
    pub fn typed(signal: &impl Signal, confidence: Option<f64>) -> Self {
        Self {
            label: signal.label().to_string(),
            direction: signal.direction(),
            confidence,
        }
    }

    /// Free-text call, normalized by keyword match
    pub fn from_text(label: impl Into<String>, confidence: Option<f64>) -> Self {
        let label = label.into();
        Self {
            direction: SignalDirection::from_text(&label),
            label,
            confidence,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MacroInputs {
    pub signal: AnalystSignal,
    pub regime: Option<String>,

    #[serde(default)]
    pub key_drivers: Vec<String>,

    #[serde(default)]
    pub risks: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundamentalInputs {
    pub signal: AnalystSignal,
    pub risk_score: Option<f64>,
    pub risk_level: Option<RiskLevel>,

    /// Percent of portfolio
    pub target_allocation: Option<Decimal>,

    /// Critical and major red flags
    #[serde(default)]
    pub risk_flags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentInputs {
    pub signal: AnalystSignal,
    pub assessment: Option<String>,

    #[serde(default)]
    pub contrarian_opportunity: bool,

    pub buy_trigger: Option<String>,
    pub sell_trigger: Option<String>,
}

impl From<&MacroOutlook> for MacroInputs {
    fn from(outlook: &MacroOutlook) -> Self {
        Self {
            signal: AnalystSignal::typed(&outlook.recommendation, Some(outlook.confidence)),
            regime: Some(outlook.regime.as_str().to_string()),
            key_drivers: outlook.key_drivers.clone(),
            risks: outlook.risks.clone(),
        }
    }
}

impl From<&DueDiligenceReport> for FundamentalInputs {
    fn from(report: &DueDiligenceReport) -> Self {
        let details = &report.recommendation_details;
        let flags = &report.red_flags.red_flags;

        Self {
            signal: AnalystSignal::typed(&details.action, Some(details.confidence)),
            risk_score: Some(report.risk_assessment.risk_score),
            risk_level: Some(report.risk_assessment.risk_level),
            target_allocation: Some(details.target_allocation),
            risk_flags: flags.critical.iter().chain(&flags.major).cloned().collect(),
        }
    }
}

impl From<&SentimentOutlook> for SentimentInputs {
    fn from(outlook: &SentimentOutlook) -> Self {
        Self {
            signal: AnalystSignal::typed(&outlook.recommended_action, Some(outlook.confidence)),
            assessment: Some(outlook.sentiment_assessment.to_string()),
            contrarian_opportunity: outlook.contrarian_opportunity,
            buy_trigger: Some(outlook.monitoring_triggers.buy_trigger.to_string()),
            sell_trigger: Some(outlook.monitoring_triggers.sell_trigger.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThesisAction {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl ThesisAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG_SELL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentSignals {
    #[serde(rename = "macro")]
    pub macro_signal: String,
    pub fundamental: String,
    pub sentiment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThesisRecommendation {
    pub action: ThesisAction,

    /// Percent of portfolio
    pub target_allocation: Decimal,
    pub entry_strategy: &'static str,
    pub exit_strategy: &'static str,
    pub reasoning: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConflictRecord {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub description: &'static str,
}

impl From<ConflictType> for ConflictRecord {
    fn from(conflict_type: ConflictType) -> Self {
        Self {
            conflict_type,
            severity: conflict_type.severity(),
            description: conflict_type.description(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConflictResolution {
    pub conflict_type: ConflictType,
    pub resolution_strategy: &'static str,
    pub final_decision: ThesisAction,
    pub rationale: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Synthesis {
    pub thesis_type: ThesisType,
    pub conflict_detected: ConflictType,
    pub conflict: ConflictRecord,
    pub resolution: ConflictResolution,
    pub agent_signals: AgentSignals,
    pub recommendation: ThesisRecommendation,
    pub confidence: f64,
}

fn weighted_confidence(
    weights: &SynthesisWeights,
    macro_view: &MacroInputs,
    fundamental: &FundamentalInputs,
    sentiment: &SentimentInputs,
) -> f64 {
    let macro_conf = macro_view.signal.confidence.unwrap_or(DEFAULT_MACRO_CONFIDENCE);
    let fundamental_conf = fundamental
        .signal
        .confidence
        .unwrap_or(DEFAULT_FUNDAMENTAL_CONFIDENCE);
    let sentiment_conf = sentiment.signal.confidence.unwrap_or(DEFAULT_SENTIMENT_CONFIDENCE);

    let weighted = weights.macro_weight * macro_conf
        + weights.fundamental * fundamental_conf
        + weights.sentiment * sentiment_conf;

    round_dp(weighted.clamp(0.0, 1.0), 2)
}

const fn entry_strategy(thesis: ThesisType, contrarian_opportunity: bool) -> &'static str {
    match thesis {
        ThesisType::StrongBullish | ThesisType::Bullish if contrarian_opportunity => {
            "Enter immediately - contrarian opportunity at sentiment extreme"
        }
        ThesisType::StrongBullish | ThesisType::Bullish => "Dollar-cost average over 2-4 weeks",
        ThesisType::Neutral => "Wait for clearer signals or accumulate on dips",
        ThesisType::Bearish | ThesisType::StrongBearish => "Avoid new entries - wait for regime change",
    }
}

fn exit_strategy(thesis: ThesisType, risk_level: RiskLevel) -> &'static str {
    match thesis {
        ThesisType::StrongBullish | ThesisType::Bullish if risk_level == RiskLevel::Low => {
            "Long-term hold (5+ years) with -30% trailing stop from ATH"
        }
        ThesisType::StrongBullish | ThesisType::Bullish => {
            "Medium-term hold (1-2 years) with -25% trailing stop"
        }
        ThesisType::Neutral => "Maintain trailing stop at -20%, exit if thesis deteriorates",
        ThesisType::Bearish | ThesisType::StrongBearish => "Exit within 2 weeks or on next rally",
    }
}

fn recommendation(
    thesis: ThesisType,
    macro_view: &MacroInputs,
    fundamental: &FundamentalInputs,
    sentiment: &SentimentInputs,
) -> ThesisRecommendation {
    let base = fundamental.target_allocation.unwrap_or(DEFAULT_ALLOCATION);
    let risk_score = fundamental.risk_score.unwrap_or(DEFAULT_RISK_SCORE);
    let risk_level = fundamental.risk_level.unwrap_or(RiskLevel::Medium);
    let regime = macro_view.regime.as_deref().unwrap_or("neutral");

    let (action, allocation, reasoning) = match thesis {
        ThesisType::StrongBullish => (
            ThesisAction::StrongBuy,
            (base * dec!(1.2)).min(ALLOCATION_CAP),
            format!(
                "All analytical dimensions aligned bullish. \
                 Macro regime: {regime}, Risk score: {risk_score}/100 ({risk_level}), \
                 Sentiment favorable. High-conviction opportunity."
            ),
        ),
        ThesisType::Bullish => (
            ThesisAction::Buy,
            base,
            "Majority bullish signals with manageable risks. \
             Some caution warranted but overall positive outlook."
                .to_string(),
        ),
        ThesisType::Neutral => (
            ThesisAction::Hold,
            base * dec!(0.7),
            "Mixed signals across analytical dimensions. \
             Maintain current exposure but do not increase."
                .to_string(),
        ),
        ThesisType::Bearish => (
            ThesisAction::Sell,
            base * dec!(0.5),
            "Majority bearish signals detected. \
             Reduce exposure by 50% and monitor for improvement."
                .to_string(),
        ),
        ThesisType::StrongBearish => (
            ThesisAction::StrongSell,
            Decimal::ZERO,
            "All analytical dimensions aligned bearish. \
             Exit position and wait for better entry opportunity."
                .to_string(),
        ),
    };

    ThesisRecommendation {
        action,
        target_allocation: allocation
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
        entry_strategy: entry_strategy(thesis, sentiment.contrarian_opportunity),
        exit_strategy: exit_strategy(thesis, risk_level),
        reasoning,
    }
}

const fn resolve(conflict: ConflictType, action: ThesisAction) -> ConflictResolution {
    let (resolution_strategy, rationale) = match conflict {
        ConflictType::FundamentalVsSentiment => (
            "fundamentals_lead_sentiment_times",
            "Fundamentals set the direction; weak sentiment is used to stage entries.",
        ),
        ConflictType::MacroVsFundamental => (
            "scale_position_for_macro",
            "Macro headwinds against solid fundamentals; size down and stagger entries until the regime improves.",
        ),
        ConflictType::SentimentVsMacro => (
            "macro_sets_direction",
            "Macro outlook sets the direction; sentiment is treated as a timing input.",
        ),
        ConflictType::NoConflict => ("consensus", "All analysts aligned; act on the weighted thesis."),
    };

    ConflictResolution {
        conflict_type: conflict,
        resolution_strategy,
        final_decision: action,
        rationale,
    }
}

/// Combine three analyst calls into one thesis
pub fn synthesize(
    weights: &SynthesisWeights,
    macro_view: &MacroInputs,
    fundamental: &FundamentalInputs,
    sentiment: &SentimentInputs,
) -> Synthesis {
    let directions = [
        macro_view.signal.direction,
        fundamental.signal.direction,
        sentiment.signal.direction,
    ];
    let thesis = classify_thesis(directions);
    let conflict = detect_conflict(directions[0], directions[1], directions[2]);
    let recommendation = recommendation(thesis, macro_view, fundamental, sentiment);

    Synthesis {
        thesis_type: thesis,
        conflict_detected: conflict,
        conflict: conflict.into(),
        resolution: resolve(conflict, recommendation.action),
        agent_signals: AgentSignals {
            macro_signal: macro_view.signal.label.clone(),
            fundamental: fundamental.signal.label.clone(),
            sentiment: sentiment.signal.label.clone(),
        },
        recommendation,
        confidence: weighted_confidence(weights, macro_view, fundamental, sentiment),
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ComprehensiveAnalysis {
    pub asset: String,
    pub macro_analysis: MacroOutlook,
    pub fundamental_analysis: Box<DueDiligenceReport>,
    pub sentiment_analysis: SentimentOutlook,
    pub synthesis: Synthesis,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PriceRange {
    pub low: Decimal,
    pub high: Decimal,
}

#[derive(Clone, Debug, Serialize)]
pub struct SupportingAnalysis {
    pub macro_regime: String,
    pub fundamental_score: f64,
    pub sentiment_regime: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ThesisTriggers {
    pub buy_trigger: String,
    pub sell_trigger: String,
    pub regime_change: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct InvestmentThesis {
    pub asset: String,
    pub thesis_type: ThesisType,
    pub executive_summary: String,
    pub recommendation: ThesisRecommendation,
    pub confidence: f64,

    /// Static placeholder levels until a price feed drives them
    pub entry_range: PriceRange,
    pub exit_targets: Vec<Decimal>,
    pub stop_loss: Decimal,

    /// Fraction of portfolio
    pub position_size: Decimal,
    pub key_catalysts: Vec<String>,
    pub conflicts_detected: ConflictType,
    pub conflicts_resolved: bool,
    pub conflict: ConflictRecord,
    pub resolution: ConflictResolution,
    pub time_horizon: &'static str,
    pub horizon_days: u32,
    pub supporting_analysis: SupportingAnalysis,
    pub key_drivers: Vec<String>,
    pub key_risks: Vec<String>,
    pub monitoring_triggers: ThesisTriggers,
    pub synthesis: Synthesis,
    pub timestamp: DateTime<Utc>,
}

fn executive_summary(
    asset: &str,
    synthesis: &Synthesis,
    macro_view: &MacroInputs,
    fundamental: &FundamentalInputs,
    sentiment: &SentimentInputs,
) -> String {
    let rec = &synthesis.recommendation;

    format!(
        "{asset} Investment Thesis: {} ({:.0}% confidence)\n\n\
         Recommendation: {} with {:.1}% portfolio allocation\n\n\
         Multi-Domain Analysis:\n\
         - Macro: {} (regime: {})\n\
         - Fundamental: {} (risk score: {}/100)\n\
         - Sentiment: {} (assessment: {})\n\n\
         Synthesis: {}\n\n\
         Entry Strategy: {}\n\
         Exit Strategy: {}",
        synthesis.thesis_type.as_str().to_uppercase(),
        synthesis.confidence * 100.0,
        rec.action.as_str(),
        rec.target_allocation,
        macro_view.signal.label,
        macro_view.regime.as_deref().unwrap_or("neutral"),
        fundamental.signal.label,
        fundamental.risk_score.unwrap_or(DEFAULT_RISK_SCORE),
        sentiment.signal.label,
        sentiment.assessment.as_deref().unwrap_or("neutral"),
        rec.reasoning,
        rec.entry_strategy,
        rec.exit_strategy,
    )
}

/// Build the thesis around an existing synthesis
pub fn build_thesis(
    asset: &str,
    horizon_days: u32,
    synthesis: Synthesis,
    macro_view: &MacroInputs,
    fundamental: &FundamentalInputs,
    sentiment: &SentimentInputs,
) -> InvestmentThesis {
    let risk_score = fundamental.risk_score.unwrap_or(DEFAULT_RISK_SCORE);
    let assessment = sentiment.assessment.clone().unwrap_or_else(|| "neutral".into());

    let drivers: Vec<String> = macro_view
        .key_drivers
        .iter()
        .cloned()
        .chain([
            format!("Fundamental risk score: {risk_score}/100"),
            format!("Sentiment: {assessment}"),
        ])
        .collect();
    let risks: Vec<String> = macro_view
        .risks
        .iter()
        .chain(&fundamental.risk_flags)
        .take(5)
        .cloned()
        .collect();

    let entry_range = PriceRange {
        low: dec!(40000),
        high: dec!(45000),
    };
    let stop_loss = entry_range.low * dec!(0.85);
    let position_size = synthesis.recommendation.target_allocation / dec!(100);

    InvestmentThesis {
        asset: asset.to_string(),
        thesis_type: synthesis.thesis_type,
        executive_summary: executive_summary(asset, &synthesis, macro_view, fundamental, sentiment),
        recommendation: synthesis.recommendation.clone(),
        confidence: synthesis.confidence,
        entry_range,
        exit_targets: vec![dec!(50000), dec!(60000), dec!(75000)],
        stop_loss,
        position_size,
        key_catalysts: drivers.iter().take(3).cloned().collect(),
        conflicts_detected: synthesis.conflict_detected,
        conflicts_resolved: synthesis.conflict_detected == ConflictType::NoConflict,
        conflict: synthesis.conflict.clone(),
        resolution: synthesis.resolution.clone(),
        time_horizon: "medium_term",
        horizon_days,
        supporting_analysis: SupportingAnalysis {
            macro_regime: macro_view.regime.clone().unwrap_or_else(|| "neutral".into()),
            fundamental_score: risk_score,
            sentiment_regime: assessment,
        },
        key_drivers: drivers.into_iter().take(5).collect(),
        key_risks: risks,
        monitoring_triggers: ThesisTriggers {
            buy_trigger: sentiment.buy_trigger.clone().unwrap_or_else(|| "N/A".into()),
            sell_trigger: sentiment.sell_trigger.clone().unwrap_or_else(|| "N/A".into()),
            regime_change: "Monitor Fed policy announcements",
        },
        synthesis,
        timestamp: Utc::now(),
    }
}

/// Orchestrator over the three specialist analysts
pub struct ThesisSynthesizer {
    macro_analyst: CryptoMacroAnalyst,
    vc_analyst: CryptoVcAnalyst,
    sentiment_analyst: CryptoSentimentAnalyst,
    weights: SynthesisWeights,
}

impl ThesisSynthesizer {
    pub const NAME: &'static str = "thesis_synthesizer";

    pub fn new(source: Arc<dyn MarketDataSource>, mcp: Arc<dyn McpClient>) -> Self {
        Self {
            macro_analyst: CryptoMacroAnalyst::new(source.clone(), mcp.clone()),
            vc_analyst: CryptoVcAnalyst::new(source.clone(), mcp),
            sentiment_analyst: CryptoSentimentAnalyst::new(source),
            weights: SynthesisWeights::default(),
        }
    }

    pub fn from_config(
        source: Arc<dyn MarketDataSource>,
        mcp: Arc<dyn McpClient>,
        config: &AnalystConfig,
    ) -> Self {
        let mut synthesizer = Self::new(source, mcp).with_weights(config.weights);
        synthesizer.vc_analyst = synthesizer
            .vc_analyst
            .with_exchange(config.exchange_id.clone())
            .with_risk_tolerance(config.risk_tolerance);
        synthesizer
    }

    #[must_use]
    pub const fn with_weights(mut self, weights: SynthesisWeights) -> Self {
        self.weights = weights;
        self
    }

    pub const fn weights(&self) -> &SynthesisWeights {
        &self.weights
    }

    pub const fn macro_analyst(&self) -> &CryptoMacroAnalyst {
        &self.macro_analyst
    }

    pub const fn vc_analyst(&self) -> &CryptoVcAnalyst {
        &self.vc_analyst
    }

    pub const fn sentiment_analyst(&self) -> &CryptoSentimentAnalyst {
        &self.sentiment_analyst
    }

    /// Run all three analysts concurrently, then synthesize
    pub async fn orchestrate_comprehensive_analysis(
        &self,
        asset: &str,
        horizon_days: u32,
    ) -> Result<ComprehensiveAnalysis> {
        let slug = asset_slug(asset);
        tracing::info!(asset = %asset, horizon_days, "Orchestrating comprehensive analysis");

        let (macro_analysis, fundamental_analysis, sentiment_analysis) = futures::join!(
            self.macro_analyst.synthesize_macro_outlook(asset, horizon_days),
            self.vc_analyst.generate_due_diligence_report(asset, DUE_DILIGENCE_PERIOD_DAYS),
            self.sentiment_analyst.synthesize_sentiment_outlook(&slug, horizon_days),
        );
        let macro_analysis = macro_analysis?;
        let fundamental_analysis = fundamental_analysis?;
        let sentiment_analysis = sentiment_analysis?;

        let synthesis = synthesize(
            &self.weights,
            &(&macro_analysis).into(),
            &(&fundamental_analysis).into(),
            &(&sentiment_analysis).into(),
        );

        tracing::info!(
            asset = %asset,
            thesis = synthesis.thesis_type.as_str(),
            conflict = synthesis.conflict_detected.as_str(),
            confidence = synthesis.confidence,
            "Synthesis complete"
        );

        Ok(ComprehensiveAnalysis {
            asset: asset.to_string(),
            macro_analysis,
            fundamental_analysis: Box::new(fundamental_analysis),
            sentiment_analysis,
            synthesis,
            timestamp: Utc::now(),
        })
    }

    pub async fn generate_investment_thesis(
        &self,
        asset: &str,
        horizon_days: u32,
    ) -> Result<InvestmentThesis> {
        let analysis = self.orchestrate_comprehensive_analysis(asset, horizon_days).await?;

        let macro_view = MacroInputs::from(&analysis.macro_analysis);
        let fundamental = FundamentalInputs::from(analysis.fundamental_analysis.as_ref());
        let sentiment = SentimentInputs::from(&analysis.sentiment_analysis);

        Ok(build_thesis(
            asset,
            horizon_days,
            analysis.synthesis,
            &macro_view,
            &fundamental,
            &sentiment,
        ))
    }

    pub fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::new(
            AgentKind::OrchestratorAgent,
            Self::NAME,
            "Strategic orchestrator for multi-domain investment synthesis",
            "multi_domain_synthesis",
        )
        .with_capabilities(&[
            "agent_orchestration",
            "multi_domain_synthesis",
            "conflict_resolution",
            "thesis_generation",
            "investment_recommendations",
        ])
        .with_coordinated_agents(vec![
            CryptoMacroAnalyst::NAME.to_string(),
            CryptoVcAnalyst::NAME.to_string(),
            CryptoSentimentAnalyst::NAME.to_string(),
        ])
        .with_use_cases(&[
            "Comprehensive investment analysis",
            "Multi-domain synthesis",
            "Conflicting signal resolution",
            "Portfolio construction",
            "Strategic decision-making",
        ])
    }

    /// Orchestrator first, then each specialist
    pub fn all_capabilities(&self) -> Vec<AgentCapabilities> {
        vec![
            self.capabilities(),
            self.macro_analyst.capabilities(),
            self.vc_analyst.capabilities(),
            self.sentiment_analyst.capabilities(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;

    fn synthesizer() -> ThesisSynthesizer {
        let mock = Arc::new(MockMarketData::new());
        ThesisSynthesizer::new(mock.clone(), mock)
    }

    fn inputs(
        macro_label: &str,
        fundamental_label: &str,
        sentiment_label: &str,
    ) -> (MacroInputs, FundamentalInputs, SentimentInputs) {
        (
            MacroInputs {
                signal: AnalystSignal::from_text(macro_label, None),
                regime: None,
                key_drivers: Vec::new(),
                risks: Vec::new(),
            },
            FundamentalInputs {
                signal: AnalystSignal::from_text(fundamental_label, None),
                risk_score: None,
                risk_level: None,
                target_allocation: None,
                risk_flags: Vec::new(),
            },
            SentimentInputs {
                signal: AnalystSignal::from_text(sentiment_label, None),
                assessment: None,
                contrarian_opportunity: false,
                buy_trigger: None,
                sell_trigger: None,
            },
        )
    }

    #[test]
    fn test_missing_confidence_defaults() {
        let (m, f, s) = inputs("bullish", "buy", "neutral");
        let synthesis = synthesize(&SynthesisWeights::default(), &m, &f, &s);

        // 0.35 * 0.75 + 0.40 * 0.80 + 0.25 * 0.70
        assert!((synthesis.confidence - 0.76).abs() < 1e-9);
        assert_eq!(synthesis.recommendation.target_allocation, dec!(10.0));
        assert!((0.0..=1.0).contains(&synthesis.confidence));
    }

    #[test]
    fn test_synthesis_is_pure() {
        let (m, f, s) = inputs("bearish", "strong_buy", "distribute");
        let weights = SynthesisWeights::default();

        let first = serde_json::to_string(&synthesize(&weights, &m, &f, &s)).unwrap();
        let second = serde_json::to_string(&synthesize(&weights, &m, &f, &s)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_allocation_table() {
        let weights = SynthesisWeights::default();
        let allocation = |m: &str, f: &str, s: &str| {
            let (mut mi, mut fi, si) = inputs(m, f, s);
            mi.regime = Some("risk_on".into());
            fi.target_allocation = Some(dec!(22.0));
            synthesize(&weights, &mi, &fi, &si).recommendation
        };

        let strong = allocation("bullish", "buy", "accumulate");
        assert_eq!(strong.action, ThesisAction::StrongBuy);
        assert_eq!(strong.target_allocation, dec!(25.0));

        assert_eq!(allocation("neutral", "hold", "neutral").target_allocation, dec!(15.4));
        assert_eq!(allocation("bearish", "sell", "neutral").target_allocation, dec!(11.0));

        let exit = allocation("bearish", "strong_sell", "distribute");
        assert_eq!(exit.action, ThesisAction::StrongSell);
        assert_eq!(exit.target_allocation, Decimal::ZERO);
        assert_eq!(exit.entry_strategy, "Avoid new entries - wait for regime change");
    }

    #[test]
    fn test_entry_and_exit_lookup() {
        let weights = SynthesisWeights::default();
        let (m, mut f, mut s) = inputs("bullish", "buy", "neutral");
        s.contrarian_opportunity = true;
        f.risk_level = Some(RiskLevel::Low);

        let rec = synthesize(&weights, &m, &f, &s).recommendation;
        assert_eq!(rec.entry_strategy, "Enter immediately - contrarian opportunity at sentiment extreme");
        assert_eq!(rec.exit_strategy, "Long-term hold (5+ years) with -30% trailing stop from ATH");

        s.contrarian_opportunity = false;
        f.risk_level = Some(RiskLevel::High);
        let rec = synthesize(&weights, &m, &f, &s).recommendation;
        assert_eq!(rec.entry_strategy, "Dollar-cost average over 2-4 weeks");
        assert_eq!(rec.exit_strategy, "Medium-term hold (1-2 years) with -25% trailing stop");
    }

    #[test]
    fn test_conflict_record_and_resolution() {
        let (m, f, s) = inputs("bearish", "buy", "bullish");
        let synthesis = synthesize(&SynthesisWeights::default(), &m, &f, &s);

        assert_eq!(synthesis.conflict_detected, ConflictType::MacroVsFundamental);
        assert_eq!(synthesis.conflict.severity, ConflictSeverity::Major);
        assert_eq!(synthesis.resolution.final_decision, synthesis.recommendation.action);

        let json = serde_json::to_value(&synthesis.conflict).unwrap();
        assert_eq!(json["type"], "macro_vs_fundamental");
        assert_eq!(json["severity"], "major");
    }

    #[tokio::test]
    async fn test_mock_comprehensive_analysis() {
        let analysis = synthesizer().orchestrate_comprehensive_analysis("BTC", 30).await.unwrap();
        let synthesis = &analysis.synthesis;

        assert_eq!(analysis.sentiment_analysis.asset, "bitcoin");
        assert_eq!(synthesis.thesis_type, ThesisType::Bullish);
        assert_eq!(synthesis.recommendation.action, ThesisAction::Buy);
        assert_eq!(synthesis.recommendation.target_allocation, dec!(15.0));
        assert_eq!(synthesis.conflict_detected, ConflictType::NoConflict);
        assert!((synthesis.confidence - 0.83).abs() < 1e-9);
        assert_eq!(synthesis.agent_signals.sentiment, "monitor_and_wait");
    }

    #[tokio::test]
    async fn test_mock_thesis() {
        let thesis = synthesizer().generate_investment_thesis("BTC", 30).await.unwrap();

        assert_eq!(thesis.stop_loss, dec!(34000));
        assert_eq!(thesis.position_size, dec!(0.15));
        assert_eq!(thesis.exit_targets.len(), 3);
        assert!(thesis.conflicts_resolved);
        assert!(thesis.key_drivers.len() <= 5);
        assert!(thesis.key_risks.len() <= 5);
        assert_eq!(thesis.key_catalysts.len(), 3);
        assert_eq!(thesis.monitoring_triggers.regime_change, "Monitor Fed policy announcements");
        assert!(thesis.executive_summary.starts_with("BTC Investment Thesis: BULLISH (83% confidence)"));
    }

    #[tokio::test]
    async fn test_fundamental_inputs_from_due_diligence() {
        let report = synthesizer()
            .vc_analyst()
            .generate_due_diligence_report("DOGE", DUE_DILIGENCE_PERIOD_DAYS)
            .await
            .unwrap();
        let inputs = FundamentalInputs::from(&report);
        let flags = &report.red_flags.red_flags;

        assert_eq!(inputs.target_allocation, Some(report.recommendation_details.target_allocation));
        assert_eq!(inputs.risk_flags, flags.critical.iter().chain(&flags.major).cloned().collect::<Vec<_>>());
        assert!(!inputs.risk_flags.is_empty());
        assert!(flags.minor.iter().all(|minor| !inputs.risk_flags.contains(minor)));
    }

    #[tokio::test]
    async fn test_unsupported_asset_propagates() {
        assert!(synthesizer().generate_investment_thesis("NOPE", 30).await.is_err());
    }

    #[test]
    fn test_capabilities() {
        let caps = synthesizer().all_capabilities();
        assert_eq!(caps.len(), 4);
        assert_eq!(caps[0].kind, AgentKind::OrchestratorAgent);
        assert_eq!(caps[0].coordinated_agents.len(), 3);
        assert!(caps[0].required_mcps.is_empty());
    }
}
