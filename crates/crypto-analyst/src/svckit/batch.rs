//! Batch Analysis Tool
//!
//! Fans skill analyses out over several symbols in one call.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use agent_core::{
    McpClient, ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
};

use super::percent;
use crate::skills::{AnalysisKind, BatchAnalyzer};

pub struct BatchAnalysisTool {
    analyzer: BatchAnalyzer,
    default_timeframe: String,
}

impl BatchAnalysisTool {
    pub const NAME: &'static str = "batch_analysis";

    pub fn new(mcp: Arc<dyn McpClient>, default_timeframe: impl Into<String>) -> Self {
        Self {
            analyzer: BatchAnalyzer::new(mcp),
            default_timeframe: default_timeframe.into(),
        }
    }
}

#[async_trait]
impl Tool for BatchAnalysisTool {
    fn schema(&self) -> ToolSchema {
        let kinds: Vec<&str> = AnalysisKind::ALL.iter().map(|k| k.as_str()).collect();

        ToolSchema {
            name: Self::NAME.into(),
            description: "Run skill analyses across several symbols in parallel. \
                          Failed cells are reported as warnings and lower the confidence."
                .into(),
            parameters: vec![
                ParameterSchema::required("symbols", "array", "Symbols to analyze (e.g., ['BTC', 'ETH'])"),
                ParameterSchema::optional(
                    "analysis_types",
                    "array",
                    format!("Analyses to run; all when omitted ({})", kinds.join(", ")),
                    None,
                ),
                ParameterSchema::optional(
                    "timeframe",
                    "string",
                    "Candle timeframe for technical analyses",
                    Some(json!(self.default_timeframe)),
                ),
            ],
            category: Some("analysis".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbols = call.str_list_arg("symbols").unwrap_or_default();
        if symbols.is_empty() {
            return Ok(ToolResult::failure(Self::NAME, "symbols must be a non-empty array"));
        }
        let timeframe = call.str_arg("timeframe").unwrap_or(&self.default_timeframe);

        let report = match call.str_list_arg("analysis_types") {
            Some(types) => {
                if !types.iter().any(|t| t.parse::<AnalysisKind>().is_ok()) {
                    return Ok(ToolResult::failure(
                        Self::NAME,
                        format!("No supported analysis types in {types:?}"),
                    ));
                }
                self.analyzer.analyze_multi_symbol(&symbols, &types, timeframe).await
            }
            None => self.analyzer.comprehensive_scan(&symbols, timeframe).await,
        };

        let meta = &report.metadata;
        let summary = format!(
            "{} symbols | {} analyses | {} failed | Confidence: {}",
            meta.symbols_analyzed,
            meta.total_analyses,
            meta.failed_analyses,
            percent(meta.confidence)
        );

        Ok(ToolResult::success(Self::NAME, summary).with_data(serde_json::to_value(&report)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;

    fn tool() -> BatchAnalysisTool {
        BatchAnalysisTool::new(Arc::new(MockMarketData::new()), "4h")
    }

    #[tokio::test]
    async fn test_batch_over_two_symbols() {
        let call = ToolCall::new(BatchAnalysisTool::NAME)
            .arg("symbols", json!(["BTC", "ETH"]))
            .arg("analysis_types", json!(["momentum", "volatility"]));

        let result = tool().execute(&call).await.unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("2 symbols | 4 analyses | 0 failed"));

        let data = result.data.unwrap();
        assert!(data["data"]["BTC"]["momentum"].is_object());
        assert_eq!(data["metadata"]["timeframe"], "4h");
    }

    #[tokio::test]
    async fn test_batch_rejects_unknown_types_and_empty_symbols() {
        let unknown = ToolCall::new(BatchAnalysisTool::NAME)
            .arg("symbols", json!(["BTC"]))
            .arg("analysis_types", json!(["tarot"]));
        assert!(!tool().execute(&unknown).await.unwrap().success);

        let empty = ToolCall::new(BatchAnalysisTool::NAME).arg("symbols", json!([]));
        assert!(!tool().execute(&empty).await.unwrap().success);
    }
}
