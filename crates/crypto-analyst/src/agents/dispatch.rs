//! Analysis dispatch
//!
//! String-keyed entry points used by tools and HTTP handlers. The
//! `analysis_type` is parsed up front so an unknown value never reaches an
//! analyst.

use serde::Serialize;
use std::str::FromStr;

use super::macro_analyst::{
    CryptoMacroAnalyst, FedImpact, FlowAnalysis, MacroOutlook, RegimeAssessment,
    RiskSentimentAssessment,
};
use super::sentiment_analyst::{
    ContrarianCall, CrowdAnalysis, CryptoSentimentAnalyst, NewsAnalysis, SentimentExtremes,
    SentimentOutlook, WhaleActivity,
};
use super::vc_analyst::{
    CryptoVcAnalyst, DUE_DILIGENCE_PERIOD_DAYS, DevelopmentActivity, DueDiligenceReport, LiquidityAnalysis, RedFlagReport,
    RiskScoreReport, TechnicalHealth, TokenomicsAnalysis,
};
use crate::error::{AnalystError, Result};
use crate::model::asset_slug;

pub const MAX_PERIOD_DAYS: u32 = 365;

/// Requested window, or `default` when none was given
fn window(period_days: Option<u32>, default: u32) -> Result<u32> {
    match period_days {
        None => Ok(default),
        Some(days) if (1..=MAX_PERIOD_DAYS).contains(&days) => Ok(days),
        Some(days) => Err(AnalystError::InvalidPeriod(days)),
    }
}

macro_rules! analysis_kind {
    ($name:ident, $valid:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const VALID: &'static str = $valid;

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AnalystError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(AnalystError::InvalidAnalysisType {
                        value: other.to_string(),
                        valid: Self::VALID,
                    }),
                }
            }
        }
    };
}

analysis_kind!(MacroAnalysisType, "regime, flows, fed, sentiment, full", {
    Regime => "regime",
    Flows => "flows",
    Fed => "fed",
    Sentiment => "sentiment",
    Full => "full",
});

analysis_kind!(ProjectAnalysisType, "tokenomics, technical, development, liquidity, risk, flags, full", {
    Tokenomics => "tokenomics",
    Technical => "technical",
    Development => "development",
    Liquidity => "liquidity",
    Risk => "risk",
    Flags => "flags",
    Full => "full",
});

analysis_kind!(SentimentAnalysisType, "crowd, extremes, whales, news, signal, full", {
    Crowd => "crowd",
    Extremes => "extremes",
    Whales => "whales",
    News => "news",
    Signal => "signal",
    Full => "full",
});

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum MacroAnalysis {
    Regime(RegimeAssessment),
    Flows(FlowAnalysis),
    Fed(FedImpact),
    Sentiment(RiskSentimentAssessment),
    Full(MacroOutlook),
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ProjectAnalysis {
    Tokenomics(TokenomicsAnalysis),
    Technical(TechnicalHealth),
    Development(DevelopmentActivity),
    Liquidity(LiquidityAnalysis),
    Risk(RiskScoreReport),
    Flags(RedFlagReport),
    Full(Box<DueDiligenceReport>),
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum SentimentAnalysis {
    Crowd(CrowdAnalysis),
    Extremes(SentimentExtremes),
    Whales(WhaleActivity),
    News(NewsAnalysis),
    Signal(ContrarianCall),
    Full(SentimentOutlook),
}

/// Macro analysis; flows default to a weekly window, everything else to 30 days
pub async fn analyze_crypto_macro(
    analyst: &CryptoMacroAnalyst,
    asset: &str,
    analysis_type: &str,
    period_days: Option<u32>,
) -> Result<MacroAnalysis> {
    let kind: MacroAnalysisType = analysis_type.parse()?;
    let days = window(period_days, if kind == MacroAnalysisType::Flows { 7 } else { 30 })?;
    tracing::debug!(asset = %asset, analysis_type = kind.as_str(), days, "Dispatching macro analysis");

    Ok(match kind {
        MacroAnalysisType::Regime => MacroAnalysis::Regime(analyst.analyze_macro_regime(asset, days).await?),
        MacroAnalysisType::Flows => MacroAnalysis::Flows(analyst.track_institutional_flows(asset, days).await?),
        MacroAnalysisType::Fed => MacroAnalysis::Fed(analyst.analyze_fed_impact().await?),
        MacroAnalysisType::Sentiment => MacroAnalysis::Sentiment(analyst.assess_risk_sentiment().await?),
        MacroAnalysisType::Full => MacroAnalysis::Full(analyst.synthesize_macro_outlook(asset, days).await?),
    })
}

/// Project analysis; `period_days` sets the development window (30 by default)
pub async fn analyze_crypto_project(
    analyst: &CryptoVcAnalyst,
    symbol: &str,
    analysis_type: &str,
    period_days: Option<u32>,
) -> Result<ProjectAnalysis> {
    let kind: ProjectAnalysisType = analysis_type.parse()?;
    let days = window(period_days, DUE_DILIGENCE_PERIOD_DAYS)?;
    tracing::debug!(symbol = %symbol, analysis_type = kind.as_str(), days, "Dispatching project analysis");

    Ok(match kind {
        ProjectAnalysisType::Tokenomics => ProjectAnalysis::Tokenomics(analyst.analyze_tokenomics(symbol).await?),
        ProjectAnalysisType::Technical => ProjectAnalysis::Technical(analyst.assess_technical_health(symbol).await?),
        ProjectAnalysisType::Development => {
            ProjectAnalysis::Development(analyst.track_development_activity(symbol, days).await?)
        }
        ProjectAnalysisType::Liquidity => ProjectAnalysis::Liquidity(analyst.analyze_liquidity(symbol).await?),
        ProjectAnalysisType::Risk => ProjectAnalysis::Risk(analyst.calculate_risk_score(symbol).await?),
        ProjectAnalysisType::Flags => ProjectAnalysis::Flags(analyst.identify_red_flags(symbol).await?),
        ProjectAnalysisType::Full => {
            ProjectAnalysis::Full(Box::new(analyst.generate_due_diligence_report(symbol, days).await?))
        }
    })
}

/// Sentiment analysis; tickers are mapped to feed slugs (BTC -> bitcoin)
///
/// News defaults to a weekly window, the full outlook to 30 days.
pub async fn analyze_crypto_sentiment(
    analyst: &CryptoSentimentAnalyst,
    asset: &str,
    analysis_type: &str,
    period_days: Option<u32>,
) -> Result<SentimentAnalysis> {
    let kind: SentimentAnalysisType = analysis_type.parse()?;
    let days = window(period_days, if kind == SentimentAnalysisType::News { 7 } else { 30 })?;
    let slug = asset_slug(asset);
    tracing::debug!(asset = %slug, analysis_type = kind.as_str(), days, "Dispatching sentiment analysis");

    Ok(match kind {
        SentimentAnalysisType::Crowd => SentimentAnalysis::Crowd(analyst.analyze_crowd_sentiment(&slug).await?),
        SentimentAnalysisType::Extremes => {
            SentimentAnalysis::Extremes(analyst.detect_sentiment_extremes(&slug).await?)
        }
        SentimentAnalysisType::Whales => SentimentAnalysis::Whales(analyst.track_whale_activity(&slug).await?),
        SentimentAnalysisType::News => SentimentAnalysis::News(analyst.analyze_news_sentiment(&slug, days).await?),
        SentimentAnalysisType::Signal => {
            SentimentAnalysis::Signal(analyst.generate_contrarian_signal(&slug).await?)
        }
        SentimentAnalysisType::Full => {
            SentimentAnalysis::Full(analyst.synthesize_sentiment_outlook(&slug, days).await?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;
    use std::sync::Arc;

    #[test]
    fn test_parse_analysis_types() {
        assert_eq!("fed".parse::<MacroAnalysisType>().unwrap(), MacroAnalysisType::Fed);
        assert_eq!("flags".parse::<ProjectAnalysisType>().unwrap(), ProjectAnalysisType::Flags);
        assert_eq!("whales".parse::<SentimentAnalysisType>().unwrap(), SentimentAnalysisType::Whales);
        assert!("FULL".parse::<MacroAnalysisType>().is_err());
    }

    #[tokio::test]
    async fn test_invalid_type_message() {
        let mock = Arc::new(MockMarketData::new());
        let analyst = CryptoMacroAnalyst::new(mock.clone(), mock);
        let err = analyze_crypto_macro(&analyst, "BTC", "invalid", None).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Invalid analysis_type"));
        assert!(message.contains("regime, flows, fed, sentiment, full"));
    }

    #[test]
    fn test_window_defaults_and_bounds() {
        assert_eq!(window(None, 7).unwrap(), 7);
        assert_eq!(window(Some(90), 7).unwrap(), 90);
        assert!(matches!(window(Some(0), 30), Err(AnalystError::InvalidPeriod(0))));
        assert_eq!(
            window(Some(400), 30).unwrap_err().to_string(),
            "period_days must be between 1 and 365, got 400"
        );
    }

    #[tokio::test]
    async fn test_period_days_reaches_the_analyst() {
        let mock = Arc::new(MockMarketData::new());
        let analyst = CryptoMacroAnalyst::new(mock.clone(), mock.clone());

        let MacroAnalysis::Flows(weekly) = analyze_crypto_macro(&analyst, "BTC", "flows", None).await.unwrap() else {
            panic!("expected flow analysis");
        };
        let MacroAnalysis::Flows(monthly) = analyze_crypto_macro(&analyst, "BTC", "flows", Some(30)).await.unwrap()
        else {
            panic!("expected flow analysis");
        };
        assert_eq!(weekly.period_days, 7);
        assert_eq!(monthly.period_days, 30);

        let vc = CryptoVcAnalyst::new(mock.clone(), mock);
        let ProjectAnalysis::Development(dev) = analyze_crypto_project(&vc, "BTC", "development", Some(7)).await.unwrap()
        else {
            panic!("expected development activity");
        };
        assert_eq!(dev.period_days, 7);
        assert_eq!(dev.github_metrics.commits, 28);
    }

    #[tokio::test]
    async fn test_out_of_range_period_is_rejected() {
        let analyst = CryptoSentimentAnalyst::new(Arc::new(MockMarketData::new()));
        let err = analyze_crypto_sentiment(&analyst, "BTC", "news", Some(0)).await.unwrap_err();
        assert!(matches!(err, AnalystError::InvalidPeriod(0)));
    }

    #[tokio::test]
    async fn test_untagged_serialization() {
        let mock = Arc::new(MockMarketData::new());
        let analyst = CryptoVcAnalyst::new(mock.clone(), mock);

        let flags = analyze_crypto_project(&analyst, "BTC", "flags", None).await.unwrap();
        let json = serde_json::to_value(flags).unwrap();
        assert_eq!(json["recommendation"], "buy");
        assert_eq!(json["overall_risk"], "low");
    }

    #[tokio::test]
    async fn test_sentiment_maps_ticker_to_slug() {
        let analyst = CryptoSentimentAnalyst::new(Arc::new(MockMarketData::new()));
        let SentimentAnalysis::Crowd(crowd) = analyze_crypto_sentiment(&analyst, "BTC", "crowd", None).await.unwrap() else {
            panic!("expected crowd analysis");
        };
        assert_eq!(crowd.asset, "bitcoin");
    }
}
