//! Investment Thesis Tool
//!
//! Runs every analyst and returns the synthesized, actionable thesis.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use agent_core::{
    AgentError, ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
};

use super::{into_tool_result, percent};
use crate::synthesizer::ThesisSynthesizer;

const MIN_HORIZON_DAYS: u64 = 7;
const MAX_HORIZON_DAYS: u64 = 365;

pub struct InvestmentThesisTool {
    synthesizer: Arc<ThesisSynthesizer>,
    default_horizon_days: u32,
}

impl InvestmentThesisTool {
    pub const NAME: &'static str = "generate_investment_thesis";

    pub const fn new(synthesizer: Arc<ThesisSynthesizer>, default_horizon_days: u32) -> Self {
        Self {
            synthesizer,
            default_horizon_days,
        }
    }

    fn horizon_days(&self, call: &ToolCall) -> CoreResult<u32> {
        let Some(days) = call.u64_arg("horizon_days") else {
            return Ok(self.default_horizon_days);
        };

        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&days) {
            return Err(AgentError::ToolValidation(format!(
                "horizon_days must be between {MIN_HORIZON_DAYS} and {MAX_HORIZON_DAYS}, got {days}"
            )));
        }
        u32::try_from(days).map_err(|e| AgentError::ToolValidation(e.to_string()))
    }
}

#[async_trait]
impl Tool for InvestmentThesisTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Synthesize macro, fundamental and sentiment analysis into one thesis: \
                          recommendation, entry range, exit targets, stop loss, position size, \
                          catalysts and risks."
                .into(),
            parameters: vec![
                ParameterSchema::required("symbol", "string", "Cryptocurrency symbol (e.g., 'BTC', 'ETH', 'SOL')"),
                ParameterSchema::optional(
                    "horizon_days",
                    "number",
                    "Investment horizon in days (7-365)",
                    Some(json!(self.default_horizon_days)),
                ),
            ],
            category: Some("orchestration".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbol = call.require_str("symbol")?.to_uppercase();
        let horizon_days = match self.horizon_days(call) {
            Ok(days) => days,
            Err(err) => return Ok(ToolResult::failure(Self::NAME, err.to_string())),
        };

        let outcome = self
            .synthesizer
            .generate_investment_thesis(&symbol, horizon_days)
            .await;

        into_tool_result(Self::NAME, outcome, |thesis| {
            format!(
                "{} | {} | Position: {:.1}% | Confidence: {}",
                thesis.thesis_type,
                thesis.recommendation.action.as_str(),
                thesis.recommendation.target_allocation,
                percent(thesis.confidence)
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;

    fn tool() -> InvestmentThesisTool {
        let mock = Arc::new(MockMarketData::new());
        InvestmentThesisTool::new(Arc::new(ThesisSynthesizer::new(mock.clone(), mock)), 30)
    }

    #[tokio::test]
    async fn test_thesis_summary() {
        let call = ToolCall::new(InvestmentThesisTool::NAME).arg("symbol", "BTC");
        let result = tool().execute(&call).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "bullish | BUY | Position: 15.0% | Confidence: 83%");

        let data = result.data.unwrap();
        assert_eq!(data["horizon_days"], 30);
        assert_eq!(data["recommendation"]["action"], "BUY");
    }

    #[tokio::test]
    async fn test_horizon_out_of_range() {
        let call = ToolCall::new(InvestmentThesisTool::NAME)
            .arg("symbol", "BTC")
            .arg("horizon_days", 1000);

        let result = tool().execute(&call).await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("horizon_days"));
    }
}
