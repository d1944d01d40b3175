//! Route Query Tool
//!
//! Tells the caller which execution path suits a natural-language query.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::percent;
use crate::router::TaskRouter;

pub struct RouteQueryTool {
    router: Arc<TaskRouter>,
}

impl RouteQueryTool {
    pub const NAME: &'static str = "route_query";

    pub const fn new(router: Arc<TaskRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Tool for RouteQueryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: Self::NAME.into(),
            description: "Route a query to the optimal execution path (skill, agent or orchestrator). \
                          Returns target, complexity, handler and confidence."
                .into(),
            parameters: vec![ParameterSchema::required(
                "query",
                "string",
                "Natural language query, e.g. 'Calculate RSI for BTC' or 'Should I buy Ethereum now?'",
            )],
            category: Some("routing".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.require_str("query")?;
        let decision = self.router.route(query);

        let target = decision.target.as_str();
        let summary = format!(
            "{}: {} (confidence: {})",
            target.to_uppercase(),
            decision.handler,
            percent(decision.confidence)
        );

        Ok(ToolResult::success(Self::NAME, summary).with_data(json!({
            "routing": decision,
            "recommendation": format!("Use {target} for this query type"),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_route_query_summary() {
        let tool = RouteQueryTool::new(Arc::new(TaskRouter::new().unwrap()));
        let call = ToolCall::new("route_query").arg("query", "Calculate RSI for BTC");

        let result = tool.execute(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "SKILL: technical_analysis.momentum_scoring (confidence: 95%)");

        let data = result.data.unwrap();
        assert_eq!(data["routing"]["target"], "skill");
        assert_eq!(data["recommendation"], "Use skill for this query type");
    }

    #[tokio::test]
    async fn test_route_query_requires_query() {
        let tool = RouteQueryTool::new(Arc::new(TaskRouter::new().unwrap()));
        assert!(tool.execute(&ToolCall::new("route_query")).await.is_err());
    }
}
