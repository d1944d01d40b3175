//! Application State

use std::sync::Arc;

use agent_core::{McpClient, ToolRegistry};
use crypto_analyst::{
    AnalystConfig, MarketDataSource, TaskRouter, ThesisSynthesizer, skills::BatchAnalyzer,
    tools::analyst_registry,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Snapshot provider behind every analyst
    pub source: Arc<dyn MarketDataSource>,

    /// Tool registry with all analyst tools
    pub tools: Arc<ToolRegistry>,

    pub router: Arc<TaskRouter>,

    /// Orchestrator; also owns the three specialist analysts
    pub synthesizer: Arc<ThesisSynthesizer>,

    pub batch: Arc<BatchAnalyzer>,

    pub config: Arc<AnalystConfig>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        mcp: Arc<dyn McpClient>,
        config: AnalystConfig,
    ) -> crypto_analyst::Result<Self> {
        let tools = analyst_registry(source.clone(), mcp.clone(), &config)?;
        let synthesizer = ThesisSynthesizer::from_config(source.clone(), mcp.clone(), &config);

        Ok(Self {
            source,
            tools: Arc::new(tools),
            router: Arc::new(TaskRouter::new()?),
            synthesizer: Arc::new(synthesizer),
            batch: Arc::new(BatchAnalyzer::new(mcp)),
            config: Arc::new(config),
        })
    }
}
