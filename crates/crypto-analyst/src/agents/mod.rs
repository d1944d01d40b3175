//! Specialist analysts
//!
//! Three single-domain agents (macro, fundamental, sentiment) whose headline
//! calls the synthesizer combines.

pub mod dispatch;
pub mod macro_analyst;
pub mod sentiment_analyst;
pub mod signal;
pub mod vc_analyst;

pub use dispatch::{
    MacroAnalysis, MacroAnalysisType, ProjectAnalysis, ProjectAnalysisType, SentimentAnalysis,
    SentimentAnalysisType, analyze_crypto_macro, analyze_crypto_project, analyze_crypto_sentiment,
};
pub use macro_analyst::{CryptoMacroAnalyst, MacroOutlook, MacroRegime, MarketView};
pub use sentiment_analyst::{
    ContrarianSignal, CryptoSentimentAnalyst, RecommendedAction, SentimentOutlook, SentimentRegime,
};
pub use signal::{
    ConflictSeverity, ConflictType, Signal, SignalDirection, ThesisType, classify_thesis,
    detect_conflict,
};
pub use vc_analyst::{CryptoVcAnalyst, DUE_DILIGENCE_PERIOD_DAYS, DueDiligenceReport, InvestmentRecommendation};
