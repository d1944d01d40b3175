//! # crypto-analyst
//!
//! Multi-domain cryptocurrency analysis. Cheap deterministic skills answer
//! data questions; three specialist analysts cover macro, fundamentals and
//! market psychology; the thesis synthesizer reconciles them.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  query ──▶ TaskRouter ──┬──▶ skills (momentum, volatility, ...)  │
//! │                         ├──▶ specialist analyst                  │
//! │                         └──▶ ThesisSynthesizer                   │
//! │                                   │                              │
//! │              ┌────────────────────┼────────────────────┐         │
//! │              ▼                    ▼                    ▼         │
//! │        macro analyst         vc analyst       sentiment analyst  │
//! │              └──── signal ────────┴──── signal ────────┘         │
//! │                                   ▼                              │
//! │              thesis type, conflict, allocation, strategy         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every analyst reads through an injected [`MarketDataSource`]; skills go
//! through an [`agent_core::McpClient`]. [`MockMarketData`] serves both.

pub mod agents;
pub mod config;
pub mod error;
pub mod model;
pub mod router;
pub mod skills;
pub mod source;
pub mod svckit;
pub mod synthesizer;

pub use config::{AnalystConfig, SynthesisWeights};
pub use error::{AnalystError, Result};
pub use model::{RiskLevel, VolatilityRegime};
pub use router::{QueryComplexity, RouteTarget, RoutingDecision, TaskRouter};
pub use source::{MarketDataSource, MockMarketData};
pub use synthesizer::{ComprehensiveAnalysis, InvestmentThesis, Synthesis, ThesisSynthesizer};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        BatchAnalysisTool, FundamentalAnalysisTool, InvestmentThesisTool, MacroAnalysisTool,
        RouteQueryTool, SentimentAnalysisTool, analyst_registry,
    };
}
