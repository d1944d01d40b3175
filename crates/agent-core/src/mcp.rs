//! MCP Client Boundary
//!
//! Skills reach external data servers (exchanges, indicator engines, sentiment
//! feeds) through named MCP tools such as `mcp__ccxt-mcp__fetchOHLCV`.
//! The transport lives outside this workspace; everything here talks to the
//! [`McpClient`] trait.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{AgentError, Result};

/// MCP client trait - abstracts over transports
///
/// All methods take `&self` so a client can be shared through `Arc`.
#[async_trait]
pub trait McpClient: Send + Sync {
    /// Call a tool by its fully-qualified name
    async fn call_tool(&self, name: &str, params: Value) -> Result<Value>;
}

/// In-memory client with canned responses
///
/// Unknown tools fail with [`AgentError::ToolNotFound`]; tools registered
/// through [`StaticMcpClient::with_failure`] fail with [`AgentError::Mcp`].
#[derive(Debug, Default)]
pub struct StaticMcpClient {
    responses: HashMap<String, Value>,
    failures: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StaticMcpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `tool` with `response`
    #[must_use]
    pub fn with_response(mut self, tool: impl Into<String>, response: Value) -> Self {
        self.responses.insert(tool.into(), response);
        self
    }

    /// Make `tool` fail with `message`
    #[must_use]
    pub fn with_failure(mut self, tool: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(tool.into(), message.into());
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl McpClient for StaticMcpClient {
    async fn call_tool(&self, name: &str, _params: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failures.get(name) {
            return Err(AgentError::mcp(name, message.clone()));
        }

        self.responses
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_client_responses() {
        let client = StaticMcpClient::new()
            .with_response("mcp__ccxt-mcp__fetchTicker", json!({"last": 97500.0}))
            .with_failure("mcp__cryptopanic-mcp__get_crypto_news", "Network error");

        let ticker = client
            .call_tool("mcp__ccxt-mcp__fetchTicker", json!({}))
            .await
            .unwrap();
        assert_eq!(ticker["last"], 97500.0);

        let err = client
            .call_tool("mcp__cryptopanic-mcp__get_crypto_news", json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Network error"));

        let missing = client.call_tool("unknown", json!({})).await.unwrap_err();
        assert!(matches!(missing, AgentError::ToolNotFound(_)));

        assert_eq!(client.call_count(), 3);
    }
}
