//! Error Types for Crypto Analyst

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalystError>;

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Invalid analysis_type '{value}'. Valid types: {valid}")]
    InvalidAnalysisType { value: String, valid: &'static str },

    #[error("Unsupported analysis type: {0}")]
    UnsupportedAnalysisType(String),

    #[error("period_days must be between 1 and 365, got {0}")]
    InvalidPeriod(u32),

    #[error("{0}")]
    InsufficientData(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Core(#[from] AgentError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AnalystError> for AgentError {
    fn from(err: AnalystError) -> Self {
        match err {
            AnalystError::InvalidAnalysisType { .. }
            | AnalystError::UnsupportedAnalysisType(_)
            | AnalystError::InvalidPeriod(_) => Self::ToolValidation(err.to_string()),
            AnalystError::Core(inner) => inner,
            AnalystError::Config(msg) => Self::Config(msg),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_analysis_type_message() {
        let err = AnalystError::InvalidAnalysisType {
            value: "bogus".into(),
            valid: "regime, flows, fed, sentiment, full",
        };
        assert_eq!(
            err.to_string(),
            "Invalid analysis_type 'bogus'. Valid types: regime, flows, fed, sentiment, full"
        );

        let core: AgentError = err.into();
        assert!(matches!(core, AgentError::ToolValidation(msg) if msg.contains("Invalid analysis_type")));
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err = AnalystError::from(AgentError::mcp("mcp__ccxt-mcp__fetchTicker", "timeout"));
        let core: AgentError = err.into();
        assert!(core.is_retryable());
    }
}
