//! # agent-core
//!
//! Shared plumbing for the analyst workspace: the tool system, the MCP client
//! boundary and the partial-failure gather used by every skill.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Server / Router                     │
//! │  ┌─────────────┐   ┌──────────────────┐   ┌───────────────┐  │
//! │  │    Tools    │──▶│ Skills / Agents  │──▶│   McpClient   │  │
//! │  │   Registry  │   │  gather(tasks)   │   │  (Strategy)   │  │
//! │  └─────────────┘   └──────────────────┘   └───────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `McpClient` trait keeps transports (stdio, HTTP, in-memory) out of the
//! analysis code. `gather` turns a set of independent calls into successes,
//! failures and a completion ratio that feeds confidence scores.

pub mod capability;
pub mod error;
pub mod gather;
pub mod mcp;
pub mod tool;

pub use capability::{AgentCapabilities, AgentKind};
pub use error::{AgentError, Result};
pub use gather::{ConfidencePolicy, Gathered, TaskFailure, gather};
pub use mcp::{McpClient, StaticMcpClient};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
