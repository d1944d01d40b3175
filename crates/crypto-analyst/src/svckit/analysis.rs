//! Analysis Tools
//!
//! One tool per specialist analyst. `analysis_type` selects a single
//! dimension or the full outlook (the default).

use async_trait::async_trait;
use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::{into_tool_result, percent};
use crate::agents::{
    MacroAnalysis, MacroAnalysisType, ProjectAnalysis, ProjectAnalysisType, SentimentAnalysis,
    SentimentAnalysisType, Signal, analyze_crypto_macro, analyze_crypto_project, analyze_crypto_sentiment,
};
use crate::synthesizer::ThesisSynthesizer;

const DEFAULT_ANALYSIS: &str = "full";

fn analysis_type_param(valid: &str) -> ParameterSchema {
    ParameterSchema::optional(
        "analysis_type",
        "string",
        format!("Analysis dimension: {valid}"),
        Some(DEFAULT_ANALYSIS.into()),
    )
}

fn analysis_type(call: &ToolCall) -> &str {
    call.str_arg("analysis_type").unwrap_or(DEFAULT_ANALYSIS)
}

fn period_param() -> ParameterSchema {
    ParameterSchema::optional(
        "period_days",
        "number",
        "Lookback window in days (1-365); defaults depend on the analysis type",
        None,
    )
}

/// Oversized values saturate so the range check rejects them
fn period_days(call: &ToolCall) -> Option<u32> {
    call.u64_arg("period_days")
        .map(|days| u32::try_from(days).unwrap_or(u32::MAX))
}

pub struct MacroAnalysisTool {
    synthesizer: Arc<ThesisSynthesizer>,
}

impl MacroAnalysisTool {
    pub const NAME: &'static str = "analyze_crypto_macro";

    pub const fn new(synthesizer: Arc<ThesisSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for MacroAnalysisTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Macroeconomic regime analysis: risk-on/risk-off regime, Fed policy impact, \
                          institutional flows and risk sentiment."
                .into(),
            parameters: vec![
                ParameterSchema::required("symbol", "string", "Cryptocurrency symbol (e.g., 'BTC', 'ETH', 'SOL')"),
                analysis_type_param(MacroAnalysisType::VALID),
                period_param(),
            ],
            category: Some("analysis".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = call.require_str("symbol")?.to_uppercase();
        let outcome =
            analyze_crypto_macro(self.synthesizer.macro_analyst(), &symbol, analysis_type(call), period_days(call))
                .await;

        into_tool_result(Self::NAME, outcome, |analysis| match analysis {
            MacroAnalysis::Full(outlook) => format!(
                "Regime: {} | Recommendation: {} | Confidence: {}",
                outlook.regime.as_str(),
                outlook.recommendation.label(),
                percent(outlook.confidence)
            ),
            MacroAnalysis::Regime(regime) => format!(
                "Regime: {} ({} confidence)",
                regime.regime.as_str(),
                percent(regime.confidence)
            ),
            MacroAnalysis::Flows(flows) => flows.interpretation.clone(),
            MacroAnalysis::Fed(fed) => fed.reasoning.clone(),
            MacroAnalysis::Sentiment(risk) => risk.crypto_implication.clone(),
        })
    }
}

pub struct FundamentalAnalysisTool {
    synthesizer: Arc<ThesisSynthesizer>,
}

impl FundamentalAnalysisTool {
    pub const NAME: &'static str = "analyze_crypto_fundamental";

    pub const fn new(synthesizer: Arc<ThesisSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for FundamentalAnalysisTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Fundamental due diligence: tokenomics, technical health, liquidity, \
                          development activity, red flags and risk-adjusted position sizing."
                .into(),
            parameters: vec![
                ParameterSchema::required("symbol", "string", "Cryptocurrency symbol (e.g., 'BTC', 'ETH', 'SOL')"),
                analysis_type_param(ProjectAnalysisType::VALID),
                period_param(),
            ],
            category: Some("analysis".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = call.require_str("symbol")?.to_uppercase();
        let outcome =
            analyze_crypto_project(self.synthesizer.vc_analyst(), &symbol, analysis_type(call), period_days(call))
                .await;

        into_tool_result(Self::NAME, outcome, |analysis| match analysis {
            ProjectAnalysis::Full(report) => format!(
                "Overall Score: {}/100 | Recommendation: {} | Risk: {}",
                report.score,
                report.recommendation.as_str(),
                report.risk_assessment.risk_level
            ),
            ProjectAnalysis::Risk(risk) => format!(
                "Risk score: {}/100 ({}) | Max allocation: {:.1}%",
                risk.risk_score, risk.risk_level, risk.max_allocation
            ),
            ProjectAnalysis::Flags(flags) => format!(
                "Overall risk: {} | Recommendation: {}",
                flags.overall_risk,
                flags.recommendation.as_str()
            ),
            ProjectAnalysis::Tokenomics(t) => format!("Tokenomics score: {}/100", t.score),
            ProjectAnalysis::Technical(t) => format!("Technical health: {}/100", t.score),
            ProjectAnalysis::Liquidity(l) => format!("Liquidity score: {}/100", l.score),
            ProjectAnalysis::Development(d) => format!("Activity score: {}/100", d.activity_score),
        })
    }
}

pub struct SentimentAnalysisTool {
    synthesizer: Arc<ThesisSynthesizer>,
}

impl SentimentAnalysisTool {
    pub const NAME: &'static str = "analyze_crypto_sentiment";

    pub const fn new(synthesizer: Arc<ThesisSynthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for SentimentAnalysisTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Market psychology: Fear & Greed, social sentiment, whale activity, \
                          news flow and contrarian signals."
                .into(),
            parameters: vec![
                ParameterSchema::required(
                    "asset",
                    "string",
                    "Asset name or ticker (e.g., 'bitcoin', 'ETH', 'solana')",
                ),
                analysis_type_param(SentimentAnalysisType::VALID),
                period_param(),
            ],
            category: Some("analysis".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let asset = call.require_str("asset")?;
        let outcome =
            analyze_crypto_sentiment(self.synthesizer.sentiment_analyst(), asset, analysis_type(call), period_days(call))
                .await;

        into_tool_result(Self::NAME, outcome, |analysis| match analysis {
            SentimentAnalysis::Full(outlook) => format!(
                "Sentiment: {} | Action: {} | Confidence: {}",
                outlook.sentiment_assessment,
                outlook.recommended_action.label(),
                percent(outlook.confidence)
            ),
            SentimentAnalysis::Signal(call) => format!(
                "Contrarian signal: {} ({} confidence)",
                call.signal.as_str(),
                percent(call.confidence)
            ),
            SentimentAnalysis::Crowd(crowd) => crowd.reasoning.clone(),
            SentimentAnalysis::Extremes(extremes) => extremes.reasoning.clone(),
            SentimentAnalysis::Whales(whales) => whales.reasoning.clone(),
            SentimentAnalysis::News(news) => news.reasoning.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;

    fn synthesizer() -> Arc<ThesisSynthesizer> {
        let mock = Arc::new(MockMarketData::new());
        Arc::new(ThesisSynthesizer::new(mock.clone(), mock))
    }

    #[tokio::test]
    async fn test_macro_full_by_default() {
        let tool = MacroAnalysisTool::new(synthesizer());
        let result = tool
            .execute(&ToolCall::new(MacroAnalysisTool::NAME).arg("symbol", "btc"))
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.output.starts_with("Regime: "));
        assert_eq!(result.data.unwrap()["asset"], "BTC");
    }

    #[tokio::test]
    async fn test_invalid_analysis_type_is_failed_result() {
        let tool = FundamentalAnalysisTool::new(synthesizer());
        let call = ToolCall::new(FundamentalAnalysisTool::NAME)
            .arg("symbol", "BTC")
            .arg("analysis_type", "astrology");

        let result = tool.execute(&call).await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Invalid analysis_type"));
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_failed_result() {
        let tool = FundamentalAnalysisTool::new(synthesizer());
        let call = ToolCall::new(FundamentalAnalysisTool::NAME).arg("symbol", "NOPE");

        let result = tool.execute(&call).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_period_days_argument() {
        let tool = MacroAnalysisTool::new(synthesizer());
        let call = ToolCall::new(MacroAnalysisTool::NAME)
            .arg("symbol", "BTC")
            .arg("analysis_type", "flows")
            .arg("period_days", 14);

        let result = tool.execute(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()["period_days"], 14);

        let rejected = tool
            .execute(&call.clone().arg("period_days", 5_000_000_000_u64))
            .await
            .unwrap();
        assert!(!rejected.success);
        assert!(rejected.output.starts_with("period_days must be between 1 and 365"));
    }

    #[tokio::test]
    async fn test_sentiment_single_dimension() {
        let tool = SentimentAnalysisTool::new(synthesizer());
        let call = ToolCall::new(SentimentAnalysisTool::NAME)
            .arg("asset", "BTC")
            .arg("analysis_type", "crowd");

        let result = tool.execute(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()["asset"], "bitcoin");
    }
}
