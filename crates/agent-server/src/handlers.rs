//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use agent_core::{AgentCapabilities, AgentError, ToolCall, ToolResult, ToolSchema};
use crypto_analyst::{
    AnalystError, InvestmentThesis, RoutingDecision,
    agents::{
        MacroAnalysis, ProjectAnalysis, SentimentAnalysis, analyze_crypto_macro,
        analyze_crypto_project, analyze_crypto_sentiment,
    },
    skills::MultiSymbolReport,
};

use crate::state::AppState;

const MIN_HORIZON_DAYS: u32 = 7;
const MAX_HORIZON_DAYS: u32 = 365;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub data_source: String,
    pub data_source_healthy: bool,
    pub tools: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub arguments: HashMap<String, Value>,

    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub query: String,
}

fn default_analysis_type() -> String {
    "full".into()
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub asset: String,

    #[serde(default = "default_analysis_type")]
    pub analysis_type: String,

    /// Lookback window; each analysis type has its own default
    #[serde(default)]
    pub period_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ThesisRequest {
    pub asset: String,

    #[serde(default)]
    pub horizon_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub symbols: Vec<String>,

    #[serde(default)]
    pub analysis_types: Option<Vec<String>>,

    #[serde(default)]
    pub timeframe: Option<String>,
}

// ============================================================================
// Error mapping
// ============================================================================

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn analyst_error(err: AnalystError) -> ApiError {
    match err {
        AnalystError::InvalidAnalysisType { .. } | AnalystError::UnsupportedAnalysisType(_) => {
            api_error(StatusCode::BAD_REQUEST, err.to_string(), "INVALID_ANALYSIS_TYPE")
        }
        AnalystError::InvalidPeriod(_) => api_error(StatusCode::BAD_REQUEST, err.to_string(), "INVALID_INPUT"),
        AnalystError::DataSource(_) | AnalystError::InsufficientData(_) => {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), "DATA_UNAVAILABLE")
        }
        AnalystError::Core(inner) => agent_error(&inner),
        other => {
            tracing::error!(error = %other, "Analysis failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string(), "ANALYSIS_ERROR")
        }
    }
}

fn agent_error(err: &AgentError) -> ApiError {
    let (status, code) = match err {
        AgentError::ToolNotFound(_) => (StatusCode::NOT_FOUND, "TOOL_NOT_FOUND"),
        AgentError::ToolValidation(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        AgentError::Mcp { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        _ => {
            tracing::error!(error = %err, "Tool execution failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "TOOL_ERROR")
        }
    };
    api_error(status, err.user_message(), code)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        data_source: state.source.name().to_string(),
        data_source_healthy: state.source.health_check().await,
        tools: state.tools.len(),
    })
}

pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSchema>> {
    Json(state.tools.schemas())
}

pub async fn execute_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<ToolRequest>,
) -> ApiResult<ToolResult> {
    let call = ToolCall {
        name,
        arguments: payload.arguments,
        id: payload.id,
    };

    let result = state.tools.execute(&call).await.map_err(|e| agent_error(&e))?;
    tracing::info!(tool = %call.name, success = result.success, "Tool executed");
    Ok(Json(result))
}

pub async fn route_query(
    State(state): State<AppState>,
    Json(payload): Json<RouteRequest>,
) -> ApiResult<RoutingDecision> {
    if payload.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query must not be empty", "INVALID_INPUT"));
    }
    Ok(Json(state.router.route(&payload.query)))
}

pub async fn analyze_macro(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<MacroAnalysis> {
    let symbol = payload.asset.to_uppercase();
    analyze_crypto_macro(state.synthesizer.macro_analyst(), &symbol, &payload.analysis_type, payload.period_days)
        .await
        .map(Json)
        .map_err(analyst_error)
}

pub async fn analyze_fundamental(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<ProjectAnalysis> {
    let symbol = payload.asset.to_uppercase();
    analyze_crypto_project(state.synthesizer.vc_analyst(), &symbol, &payload.analysis_type, payload.period_days)
        .await
        .map(Json)
        .map_err(analyst_error)
}

pub async fn analyze_sentiment(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<SentimentAnalysis> {
    analyze_crypto_sentiment(
        state.synthesizer.sentiment_analyst(),
        &payload.asset,
        &payload.analysis_type,
        payload.period_days,
    )
    .await
    .map(Json)
    .map_err(analyst_error)
}

pub async fn generate_thesis(
    State(state): State<AppState>,
    Json(payload): Json<ThesisRequest>,
) -> ApiResult<InvestmentThesis> {
    let horizon_days = payload.horizon_days.unwrap_or(state.config.horizon_days);
    if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&horizon_days) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("horizon_days must be between {MIN_HORIZON_DAYS} and {MAX_HORIZON_DAYS}"),
            "INVALID_INPUT",
        ));
    }

    state
        .synthesizer
        .generate_investment_thesis(&payload.asset.to_uppercase(), horizon_days)
        .await
        .map(Json)
        .map_err(analyst_error)
}

pub async fn batch_analysis(
    State(state): State<AppState>,
    Json(payload): Json<BatchRequest>,
) -> ApiResult<MultiSymbolReport> {
    if payload.symbols.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "symbols must not be empty", "INVALID_INPUT"));
    }
    let timeframe = payload
        .timeframe
        .as_deref()
        .unwrap_or(&state.config.default_timeframe);

    let report = match &payload.analysis_types {
        Some(types) => state.batch.analyze_multi_symbol(&payload.symbols, types, timeframe).await,
        None => state.batch.comprehensive_scan(&payload.symbols, timeframe).await,
    };
    Ok(Json(report))
}

pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentCapabilities>> {
    Json(state.synthesizer.all_capabilities())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use crypto_analyst::{AnalystConfig, MockMarketData};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> axum::Router {
        let mock = Arc::new(MockMarketData::new());
        let state = AppState::new(mock.clone(), mock, AnalystConfig::default()).unwrap();
        app(state)
    }

    async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["data_source_healthy"], true);
        assert_eq!(body["tools"], 6);
    }

    #[tokio::test]
    async fn test_list_tools_and_agents() {
        let (_, tools) = send(Method::GET, "/api/tools", None).await;
        assert_eq!(tools.as_array().unwrap().len(), 6);

        let (_, agents) = send(Method::GET, "/api/agents", None).await;
        assert_eq!(agents[0]["name"], "thesis_synthesizer");
        assert_eq!(agents[0]["type"], "orchestrator_agent");
        assert_eq!(agents.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_execute_tool() {
        let body = json!({ "arguments": { "query": "Calculate RSI for BTC" }, "id": "req-7" });
        let (status, result) = send(Method::POST, "/api/tools/route_query", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["success"], true);
        assert_eq!(result["id"], "req-7");
        assert_eq!(result["data"]["routing"]["target"], "skill");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_404() {
        let (status, body) = send(Method::POST, "/api/tools/nope", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TOOL_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_route() {
        let (status, decision) =
            send(Method::POST, "/api/route", Some(json!({ "query": "Complete investment thesis for SOL" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decision["target"], "orchestrator");

        let (status, _) = send(Method::POST, "/api/route", Some(json!({ "query": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_endpoints() {
        let (status, body) = send(
            Method::POST,
            "/api/analyze/macro",
            Some(json!({ "asset": "btc", "analysis_type": "fed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["policy_stance"].is_string());

        let (status, body) = send(Method::POST, "/api/analyze/fundamental", Some(json!({ "asset": "BTC" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "BTC");

        let (status, body) = send(
            Method::POST,
            "/api/analyze/sentiment",
            Some(json!({ "asset": "BTC", "analysis_type": "whales" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["asset"], "bitcoin");
    }

    #[tokio::test]
    async fn test_invalid_analysis_type_is_400() {
        let (status, body) = send(
            Method::POST,
            "/api/analyze/sentiment",
            Some(json!({ "asset": "bitcoin", "analysis_type": "vibes" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ANALYSIS_TYPE");
        assert!(body["error"].as_str().unwrap().contains("Invalid analysis_type"));
    }

    #[tokio::test]
    async fn test_analyze_period_days() {
        let (status, body) = send(
            Method::POST,
            "/api/analyze/fundamental",
            Some(json!({ "asset": "BTC", "analysis_type": "development", "period_days": 7 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["period_days"], 7);
        assert_eq!(body["github_metrics"]["commits"], 28);

        let (status, body) = send(
            Method::POST,
            "/api/analyze/macro",
            Some(json!({ "asset": "BTC", "analysis_type": "flows", "period_days": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_thesis() {
        let (status, thesis) =
            send(Method::POST, "/api/thesis", Some(json!({ "asset": "BTC", "horizon_days": 90 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(thesis["thesis_type"], "bullish");
        assert_eq!(thesis["horizon_days"], 90);

        let (status, _) =
            send(Method::POST, "/api/thesis", Some(json!({ "asset": "BTC", "horizon_days": 3 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch() {
        let body = json!({ "symbols": ["BTC", "ETH"], "analysis_types": ["momentum"] });
        let (status, report) = send(Method::POST, "/api/batch", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["metadata"]["symbols_analyzed"], 2);
        assert_eq!(report["metadata"]["timeframe"], "4h");

        let (status, _) = send(Method::POST, "/api/batch", Some(json!({ "symbols": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
