//! Market Data Sources
//!
//! The analysts never reach for data on their own: a [`MarketDataSource`] is
//! injected at construction and every snapshot comes through it.

mod mock;
mod snapshot;

pub use mock::MockMarketData;
pub use snapshot::*;

use async_trait::async_trait;

use crate::error::Result;

/// Market data provider (Strategy pattern)
///
/// Implement this for each backend: MCP servers, REST aggregators, fixtures.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// ETF and exchange flows for `asset` over `period_days`
    async fn institutional_flows(&self, asset: &str, period_days: u32) -> Result<FlowSnapshot>;

    async fn fed_policy(&self) -> Result<FedSnapshot>;

    async fn risk_appetite(&self) -> Result<RiskAppetiteSnapshot>;

    /// Tokenomics, network, liquidity and red flags for a ticker
    async fn fundamentals(&self, symbol: &str) -> Result<ProjectFundamentals>;

    /// Fear & greed and social readings for an asset slug
    async fn crowd_sentiment(&self, asset: &str) -> Result<CrowdSnapshot>;

    async fn whale_flows(&self, asset: &str) -> Result<WhaleSnapshot>;

    async fn news_flow(&self, asset: &str, period_days: u32) -> Result<NewsSnapshot>;

    /// Check if the source is reachable
    async fn health_check(&self) -> bool;

    /// Source name
    fn name(&self) -> &str;
}
