//! Service Kit - Analyst Tools
//!
//! `agent_core::Tool` adapters over the router, the analysts, the thesis
//! synthesizer and the batch skill.

mod analysis;
mod batch;
mod route_query;
mod thesis;

pub use analysis::{FundamentalAnalysisTool, MacroAnalysisTool, SentimentAnalysisTool};
pub use batch::BatchAnalysisTool;
pub use route_query::RouteQueryTool;
pub use thesis::InvestmentThesisTool;

use agent_core::{McpClient, Result as CoreResult, ToolRegistry, ToolResult};
use serde::Serialize;
use std::sync::Arc;

use crate::config::AnalystConfig;
use crate::error::{AnalystError, Result};
use crate::router::TaskRouter;
use crate::source::MarketDataSource;
use crate::synthesizer::ThesisSynthesizer;

/// Registry with every analyst tool
pub fn analyst_registry(
    source: Arc<dyn MarketDataSource>,
    mcp: Arc<dyn McpClient>,
    config: &AnalystConfig,
) -> Result<ToolRegistry> {
    let synthesizer = Arc::new(ThesisSynthesizer::from_config(source, mcp.clone(), config));

    let mut registry = ToolRegistry::new();
    registry.register(RouteQueryTool::new(Arc::new(TaskRouter::new()?)));
    registry.register(MacroAnalysisTool::new(synthesizer.clone()));
    registry.register(FundamentalAnalysisTool::new(synthesizer.clone()));
    registry.register(SentimentAnalysisTool::new(synthesizer.clone()));
    registry.register(InvestmentThesisTool::new(synthesizer, config.horizon_days));
    registry.register(BatchAnalysisTool::new(mcp, config.default_timeframe.clone()));

    tracing::debug!(tools = registry.len(), "Analyst tools registered");
    Ok(registry)
}

/// Caller mistakes become failed results; everything else is an error
fn into_tool_result<T: Serialize>(
    tool: &str,
    outcome: Result<T>,
    summary: impl FnOnce(&T) -> String,
) -> CoreResult<ToolResult> {
    match outcome {
        Ok(value) => {
            let output = summary(&value);
            Ok(ToolResult::success(tool, output).with_data(serde_json::to_value(&value)?))
        }
        Err(
            err @ (AnalystError::InvalidAnalysisType { .. }
            | AnalystError::UnsupportedAnalysisType(_)
            | AnalystError::InvalidPeriod(_)
            | AnalystError::InsufficientData(_)
            | AnalystError::DataSource(_)),
        ) => {
            tracing::debug!(tool = %tool, error = %err, "Tool call rejected");
            Ok(ToolResult::failure(tool, err.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;

    #[test]
    fn test_registry_lists_all_tools() {
        let mock = Arc::new(MockMarketData::new());
        let registry = analyst_registry(mock.clone(), mock, &AnalystConfig::default()).unwrap();

        assert_eq!(
            registry.names(),
            vec![
                "analyze_crypto_fundamental",
                "analyze_crypto_macro",
                "analyze_crypto_sentiment",
                "batch_analysis",
                "generate_investment_thesis",
                "route_query",
            ]
        );
    }
}
