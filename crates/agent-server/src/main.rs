//! crypto-analyst HTTP Server
//!
//! Axum-based server exposing the query router, the specialist analysts,
//! thesis generation, batch analysis and the analyst tool registry.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crypto_analyst::{AnalystConfig, MarketDataSource, MockMarketData};

use crate::handlers::{
    analyze_fundamental, analyze_macro, analyze_sentiment, batch_analysis, execute_tool,
    generate_thesis, health_check, list_agents, list_tools, route_query,
};
use crate::state::AppState;

pub(crate) fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Tools
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(execute_tool))
        // Routing and analysis
        .route("/api/route", post(route_query))
        .route("/api/analyze/macro", post(analyze_macro))
        .route("/api/analyze/fundamental", post(analyze_fundamental))
        .route("/api/analyze/sentiment", post(analyze_sentiment))
        .route("/api/thesis", post(generate_thesis))
        .route("/api/batch", post(batch_analysis))
        .route("/api/agents", get(list_agents))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AnalystConfig::from_env()?;
    tracing::info!(
        exchange = %config.exchange_id,
        timeframe = %config.default_timeframe,
        macro_weight = config.weights.macro_weight,
        fundamental_weight = config.weights.fundamental,
        sentiment_weight = config.weights.sentiment,
        "Loaded analyst config"
    );

    // One in-memory backend serves both the analyst snapshots and skill MCP calls
    let mock = Arc::new(MockMarketData::new());
    if mock.health_check().await {
        tracing::info!(source = mock.name(), "Data source ready");
    } else {
        tracing::warn!(source = mock.name(), "Data source unhealthy - analyses will fail");
    }

    let state = AppState::new(mock.clone(), mock, config)?;

    tracing::info!("Registered {} tools:", state.tools.len());
    for name in state.tools.names() {
        tracing::info!("  • {}", name);
    }

    let app = app(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("crypto-analyst server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  GET  /api/tools               - List tool schemas");
    tracing::info!("  POST /api/tools/{{name}}        - Execute a tool");
    tracing::info!("  POST /api/route               - Route a query");
    tracing::info!("  POST /api/analyze/{{domain}}    - macro | fundamental | sentiment");
    tracing::info!("  POST /api/thesis              - Investment thesis");
    tracing::info!("  POST /api/batch               - Multi-symbol skill batch");
    tracing::info!("  GET  /api/agents              - Agent capabilities");

    axum::serve(listener, app).await?;

    Ok(())
}
