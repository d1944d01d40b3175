//! Skills
//!
//! Deterministic analysis procedures over MCP tool data. Each skill returns a
//! [`SkillReport`] envelope and never needs an LLM in the loop.

pub mod batch;
pub mod development_activity;
pub mod feeds;
pub mod indicators;
pub mod institutional_flow;
pub mod momentum;
pub mod pattern_recognition;
pub mod response;
pub mod risk_calculator;
pub mod sentiment_aggregator;
pub mod sentiment_fusion;
pub mod support_resistance;
pub mod volatility;

pub use batch::{AnalysisKind, BatchAnalyzer, MultiSymbolReport, MultiTimeframeReport};
pub use development_activity::{DevelopmentActivityTracker, DevelopmentData, DevelopmentMomentum, DevelopmentReport};
pub use feeds::{SentimentCategory, SentimentFeeds, WhaleSignal};
pub use institutional_flow::{InstitutionalFlowData, InstitutionalFlowReport, InstitutionalFlowTracker};
pub use momentum::{MomentumReport, MomentumScorer, MomentumSignal};
pub use pattern_recognition::{PatternBias, PatternQuery, PatternRecognizer, PatternReport};
pub use response::SkillReport;
pub use risk_calculator::{RiskCalculator, RiskCategory, RiskInputs, RiskReport};
pub use sentiment_aggregator::{AggregateReport, SentimentAggregator, SentimentSource};
pub use sentiment_fusion::{FusionReport, FusionSignal, SentimentFusionEngine, SignalAlignment};
pub use support_resistance::{LevelQuery, LevelReport, SupportResistanceIdentifier};
pub use volatility::{VolatilityAnalyzer, VolatilityReport};
