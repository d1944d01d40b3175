//! Crypto Sentiment Analyst
//!
//! Contrarian reading of crowd psychology: fear & greed, whale positioning
//! against retail, and news narratives.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use agent_core::{AgentCapabilities, AgentKind};

use super::signal::{Signal, SignalDirection};
use crate::error::Result;
use crate::model::round_dp;
use crate::source::{CrowdSnapshot, MarketDataSource, NewsSnapshot, SocialMetrics, WhaleSnapshot};

/// News window the outlook and signal are computed over
const NEWS_WINDOW_DAYS: u32 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentRegime {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl SentimentRegime {
    pub const fn from_index(fear_greed: u8) -> Self {
        match fear_greed {
            0..=24 => Self::ExtremeFear,
            25..=44 => Self::Fear,
            45..=54 => Self::Neutral,
            55..=74 => Self::Greed,
            _ => Self::ExtremeGreed,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtremeFear => "extreme_fear",
            Self::Fear => "fear",
            Self::Neutral => "neutral",
            Self::Greed => "greed",
            Self::ExtremeGreed => "extreme_greed",
        }
    }

    pub const fn is_extreme(self) -> bool {
        matches!(self, Self::ExtremeFear | Self::ExtremeGreed)
    }

    /// Headline assessment handed to the synthesizer
    pub const fn assessment(self) -> &'static str {
        match self {
            Self::ExtremeFear => "contrarian_buy",
            Self::Fear => "bearish",
            Self::Neutral => "neutral",
            Self::Greed => "bullish",
            Self::ExtremeGreed => "contrarian_sell",
        }
    }

    const fn retail_sentiment(self) -> &'static str {
        match self {
            Self::ExtremeFear => "bearish",
            Self::Fear => "neutral_to_bearish",
            Self::Neutral => "neutral",
            Self::Greed => "neutral_to_bullish",
            Self::ExtremeGreed => "bullish",
        }
    }

    const fn retail_direction(self) -> SignalDirection {
        match self {
            Self::ExtremeFear | Self::Fear => SignalDirection::Bearish,
            Self::Neutral => SignalDirection::Neutral,
            Self::Greed | Self::ExtremeGreed => SignalDirection::Bullish,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContrarianSignal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl ContrarianSignal {
    /// Lean against the crowd; plain greed only flips to sell once whales distribute
    pub const fn from_regime(regime: SentimentRegime, whales_distributing: bool) -> Self {
        match regime {
            SentimentRegime::ExtremeFear => Self::StrongBuy,
            SentimentRegime::Fear => Self::Buy,
            SentimentRegime::Neutral => Self::Hold,
            SentimentRegime::Greed if whales_distributing => Self::Sell,
            SentimentRegime::Greed => Self::Hold,
            SentimentRegime::ExtremeGreed => Self::StrongSell,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "strong_buy",
            Self::Buy => "buy",
            Self::Hold => "hold",
            Self::Sell => "sell",
            Self::StrongSell => "strong_sell",
        }
    }

    const fn base_confidence(self) -> f64 {
        match self {
            Self::Hold => 0.72,
            Self::Buy | Self::Sell => 0.80,
            Self::StrongBuy | Self::StrongSell => 0.88,
        }
    }

    const fn timings(self) -> (&'static str, &'static str) {
        match self {
            Self::StrongBuy => ("enter_now", "wait_for_extreme_greed"),
            Self::Buy => ("scale_in_gradually", "wait_for_extreme_greed"),
            Self::Hold => ("wait_for_extreme_fear", "wait_for_extreme_greed"),
            Self::Sell => ("avoid_new_entries", "take_partial_profits"),
            Self::StrongSell => ("avoid_new_entries", "exit_now"),
        }
    }
}

impl Signal for ContrarianSignal {
    fn direction(&self) -> SignalDirection {
        match self {
            Self::StrongBuy | Self::Buy => SignalDirection::Bullish,
            Self::Hold => SignalDirection::Neutral,
            Self::Sell | Self::StrongSell => SignalDirection::Bearish,
        }
    }

    fn label(&self) -> &'static str {
        self.as_str()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Accumulate,
    MonitorAndWait,
    Distribute,
}

impl RecommendedAction {
    pub const fn from_signal(signal: ContrarianSignal) -> Self {
        match signal {
            ContrarianSignal::StrongBuy | ContrarianSignal::Buy => Self::Accumulate,
            ContrarianSignal::Hold => Self::MonitorAndWait,
            ContrarianSignal::Sell | ContrarianSignal::StrongSell => Self::Distribute,
        }
    }
}

impl Signal for RecommendedAction {
    fn direction(&self) -> SignalDirection {
        match self {
            Self::Accumulate => SignalDirection::Bullish,
            Self::MonitorAndWait => SignalDirection::Neutral,
            Self::Distribute => SignalDirection::Bearish,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Accumulate => "accumulate",
            Self::MonitorAndWait => "monitor_and_wait",
            Self::Distribute => "distribute",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WhaleBehavior {
    Accumulation,
    Distribution,
    Neutral,
}

impl WhaleBehavior {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Accumulation => "accumulation",
            Self::Distribution => "distribution",
            Self::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceSignal {
    AlignedBullish,
    AlignedBearish,
    /// Whales buying into retail fear
    BullishDivergence,
    /// Whales selling into retail greed
    BearishDivergence,
    Mixed,
}

impl DivergenceSignal {
    const fn classify(whales: SignalDirection, retail: SignalDirection) -> Self {
        use SignalDirection::{Bearish, Bullish};
        match (whales, retail) {
            (Bullish, Bullish) => Self::AlignedBullish,
            (Bearish, Bearish) => Self::AlignedBearish,
            (Bullish, Bearish) => Self::BullishDivergence,
            (Bearish, Bullish) => Self::BearishDivergence,
            _ => Self::Mixed,
        }
    }

    pub const fn is_divergence(self) -> bool {
        matches!(self, Self::BullishDivergence | Self::BearishDivergence)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CrowdAnalysis {
    pub asset: String,
    pub fear_greed_index: u8,
    pub sentiment_regime: SentimentRegime,
    pub social_metrics: SocialMetrics,
    pub interpretation: String,
    pub contrarian_signal: ContrarianSignal,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExtremeEventRecord {
    pub date: NaiveDate,
    pub fear_greed: u8,
    pub regime: SentimentRegime,
    pub outcome: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PatternAnalysis {
    pub extreme_fear_opportunities: usize,
    pub extreme_greed_warnings: usize,
    pub mean_reversion_timeframe: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct SentimentExtremes {
    pub asset: String,
    pub current_percentile: f64,
    pub is_extreme: bool,
    pub extreme_events: Vec<ExtremeEventRecord>,
    pub pattern_analysis: PatternAnalysis,
    pub current_signal: &'static str,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct WhaleMetrics {
    pub large_transaction_volume: f64,
    pub exchange_whale_ratio: f64,
    pub accumulation_distribution: WhaleBehavior,
}

#[derive(Clone, Debug, Serialize)]
pub struct WhaleActivity {
    pub asset: String,
    pub whale_sentiment: SignalDirection,
    pub retail_sentiment: &'static str,
    pub divergence_detected: bool,
    pub whale_metrics: WhaleMetrics,
    pub signal: DivergenceSignal,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct HeadlineAnalysis {
    pub positive_count: u32,
    pub negative_count: u32,
    pub neutral_count: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewsAnalysis {
    pub asset: String,
    pub news_sentiment: SignalDirection,

    /// -1.0 - 1.0
    pub sentiment_score: f64,
    pub top_narratives: Vec<String>,

    /// Share of directional headlines that are negative
    pub fud_fomo_index: f64,
    pub headline_analysis: HeadlineAnalysis,
    pub narrative_shift: &'static str,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SignalRationale {
    pub crowd_sentiment: String,
    pub sentiment_extreme: &'static str,
    pub whale_divergence: bool,
    pub news_sentiment: SignalDirection,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContrarianCall {
    pub asset: String,
    pub signal: ContrarianSignal,
    pub confidence: f64,
    pub entry_timing: &'static str,
    pub exit_timing: &'static str,
    pub rationale: SignalRationale,
    pub risk_factors: Vec<String>,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MonitoringTriggers {
    pub buy_trigger: &'static str,
    pub sell_trigger: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct SentimentOutlook {
    pub asset: String,
    pub sentiment_assessment: &'static str,
    pub contrarian_opportunity: bool,
    pub recommended_action: RecommendedAction,
    pub confidence: f64,
    pub key_insights: Vec<String>,
    pub monitoring_triggers: MonitoringTriggers,
    pub reasoning: String,
}

fn whale_behavior(whales: &WhaleSnapshot) -> WhaleBehavior {
    if whales.exchange_whale_ratio > 0.6 {
        WhaleBehavior::Accumulation
    } else if whales.exchange_whale_ratio < 0.4 {
        WhaleBehavior::Distribution
    } else {
        WhaleBehavior::Neutral
    }
}

/// Crowd regime and the contrarian signal it implies on its own
pub fn analyze_crowd(crowd: &CrowdSnapshot) -> CrowdAnalysis {
    let fng = crowd.fear_greed_index;
    let regime = SentimentRegime::from_index(fng);
    let signal = ContrarianSignal::from_regime(regime, false);
    let label = regime.as_str().to_uppercase();

    let (interpretation, reasoning) = match regime {
        SentimentRegime::ExtremeFear => (
            format!(
                "Market in {label} regime (F&G: {fng}). Capitulation-grade pessimism with \
                 retail exiting. Historically the strongest contrarian buying zone."
            ),
            format!(
                "Fear level of {fng} is extreme (<25). Crowd capitulation has preceded the best \
                 risk/reward entries. STRONG BUY while fear persists."
            ),
        ),
        SentimentRegime::Fear => (
            format!(
                "Market in {label} regime (F&G: {fng}). Pessimism dominating social channels. \
                 Contrarian buying interest starts to build here."
            ),
            format!(
                "Fear level of {fng} is below neutral but not extreme. Scale into positions and \
                 add aggressively if the index falls below 25."
            ),
        ),
        SentimentRegime::Neutral => (
            format!(
                "Market in {label} regime (F&G: {fng}). No crowd positioning edge in either direction."
            ),
            format!(
                "Sentiment at {fng} offers no contrarian signal. HOLD and wait for \
                 fear (<25) or greed (75+) extremes."
            ),
        ),
        SentimentRegime::Greed => (
            format!(
                "Market in {label} regime (F&G: {fng}). Positive sentiment balance with \
                 elevated social volume indicates retail FOMO building. Approaching overbought \
                 territory where contrarian selling signals may emerge."
            ),
            format!(
                "Greed level of {fng} not yet extreme (needs 75+ for strong sell signal). \
                 However, rising social volume and positive sentiment suggest caution. \
                 HOLD and monitor for extreme greed (75+) which would trigger SELL signal. \
                 Best contrarian opportunities emerge at extreme fear (<25)."
            ),
        ),
        SentimentRegime::ExtremeGreed => (
            format!(
                "Market in {label} regime (F&G: {fng}). Euphoric positioning and crowded longs. \
                 Historically a distribution zone."
            ),
            format!(
                "Greed level of {fng} is extreme (75+). Euphoria has preceded sharp corrections. \
                 STRONG SELL into strength."
            ),
        ),
    };

    CrowdAnalysis {
        asset: crowd.asset.clone(),
        fear_greed_index: fng,
        sentiment_regime: regime,
        social_metrics: crowd.social.clone(),
        interpretation,
        contrarian_signal: signal,
        reasoning,
    }
}

/// Where the current reading ranks inside its history
pub fn analyze_extremes(crowd: &CrowdSnapshot) -> SentimentExtremes {
    let current = crowd.fear_greed_index;
    let history = &crowd.fear_greed_history;

    #[allow(clippy::cast_precision_loss)]
    let percentile = if history.is_empty() {
        50.0
    } else {
        history.iter().filter(|v| **v < current).count() as f64 / history.len() as f64 * 100.0
    };
    let is_extreme = !(25.0..75.0).contains(&percentile);

    let fear_count = history.iter().filter(|v| **v < 25).count();
    let greed_count = history.iter().filter(|v| **v >= 75).count();

    let current_signal = match SentimentRegime::from_index(current) {
        SentimentRegime::ExtremeFear => "buy_signal",
        SentimentRegime::ExtremeGreed => "sell_signal",
        _ => "monitor_for_extreme",
    };

    let standing = if is_extreme {
        "at a historical extreme"
    } else if percentile > 50.0 {
        "above average but not extreme"
    } else {
        "below average but not extreme"
    };
    let action = match current_signal {
        "buy_signal" => "Extreme fear now - deploy capital on the contrarian buy signal.",
        "sell_signal" => "Extreme greed now - take profits on the contrarian sell signal.",
        _ => "Not at extreme now - monitor for <25 (buy signal) or 75+ (sell signal).",
    };

    SentimentExtremes {
        asset: crowd.asset.clone(),
        current_percentile: round_dp(percentile, 1),
        is_extreme,
        extreme_events: crowd
            .extreme_events
            .iter()
            .map(|event| ExtremeEventRecord {
                date: event.date,
                fear_greed: event.fear_greed,
                regime: SentimentRegime::from_index(event.fear_greed),
                outcome: event.outcome.clone(),
            })
            .collect(),
        pattern_analysis: PatternAnalysis {
            extreme_fear_opportunities: fear_count,
            extreme_greed_warnings: greed_count,
            mean_reversion_timeframe: "2-4 weeks",
        },
        current_signal,
        reasoning: format!(
            "Current sentiment at {percentile:.0}th percentile - {standing}. \
             Historical analysis shows extreme fear (<25) creates 2-4 week buying opportunities \
             with avg 30%+ gains. Extreme greed (75+) triggers 2-4 week corrections avg 10-15%. \
             {action}"
        ),
    }
}

/// Whale behaviour against the retail regime
pub fn analyze_whales(whales: &WhaleSnapshot, crowd: &CrowdSnapshot) -> WhaleActivity {
    let behavior = whale_behavior(whales);
    let whale_sentiment = match behavior {
        WhaleBehavior::Accumulation => SignalDirection::Bullish,
        WhaleBehavior::Distribution => SignalDirection::Bearish,
        WhaleBehavior::Neutral => SignalDirection::Neutral,
    };
    let regime = SentimentRegime::from_index(crowd.fear_greed_index);
    let signal = DivergenceSignal::classify(whale_sentiment, regime.retail_direction());

    let custody = match behavior {
        WhaleBehavior::Accumulation => "moving funds off exchanges (self-custody = bullish)",
        WhaleBehavior::Distribution => "keeping funds on exchanges (sell-side liquidity = bearish)",
        WhaleBehavior::Neutral => "split between exchanges and self-custody",
    };
    let alignment = match signal {
        DivergenceSignal::AlignedBullish => {
            "No divergence detected - both whales and retail aligned bullish."
        }
        DivergenceSignal::AlignedBearish => {
            "No divergence detected - both whales and retail aligned bearish."
        }
        DivergenceSignal::BullishDivergence => {
            "Bullish divergence - whales accumulating while retail is fearful."
        }
        DivergenceSignal::BearishDivergence => {
            "Bearish divergence - whales distributing while retail is greedy."
        }
        DivergenceSignal::Mixed => "Mixed positioning with no clear divergence.",
    };

    WhaleActivity {
        asset: whales.asset.clone(),
        whale_sentiment,
        retail_sentiment: regime.retail_sentiment(),
        divergence_detected: signal.is_divergence(),
        whale_metrics: WhaleMetrics {
            large_transaction_volume: whales.large_transaction_volume_usd,
            exchange_whale_ratio: whales.exchange_whale_ratio,
            accumulation_distribution: behavior,
        },
        signal,
        reasoning: format!(
            "Whales showing {} behavior with {:.0}% of large wallets {custody}. \
             Retail sentiment {} (F&G: {}). {alignment} \
             Strong signal when whales accumulate during retail fear.",
            behavior.as_str(),
            whales.exchange_whale_ratio * 100.0,
            regime.retail_sentiment(),
            crowd.fear_greed_index,
        ),
    }
}

/// Headline balance over the news window
pub fn analyze_news(news: &NewsSnapshot) -> NewsAnalysis {
    let directional = f64::from(news.positive_count + news.negative_count);
    let (score, fud_fomo) = if directional > 0.0 {
        (
            (f64::from(news.positive_count) - f64::from(news.negative_count)) / directional,
            f64::from(news.negative_count) / directional,
        )
    } else {
        (0.0, 0.5)
    };

    let sentiment = if score > 0.2 {
        SignalDirection::Bullish
    } else if score < -0.2 {
        SignalDirection::Bearish
    } else {
        SignalDirection::Neutral
    };
    let shift = match sentiment {
        SignalDirection::Bullish => "bullish_momentum_building",
        SignalDirection::Bearish => "bearish_pressure_building",
        SignalDirection::Neutral => "no_clear_shift",
    };
    let fomo = if fud_fomo < 0.5 {
        "shows FOMO building but not yet extreme"
    } else {
        "shows FUD outweighing hype"
    };
    let themes = news.narratives.iter().take(2).cloned().collect::<Vec<_>>().join(" and ");

    NewsAnalysis {
        asset: news.asset.clone(),
        news_sentiment: sentiment,
        sentiment_score: round_dp(score, 2),
        top_narratives: news.narratives.clone(),
        fud_fomo_index: round_dp(fud_fomo, 2),
        headline_analysis: HeadlineAnalysis {
            positive_count: news.positive_count,
            negative_count: news.negative_count,
            neutral_count: news.neutral_count,
        },
        narrative_shift: shift,
        reasoning: format!(
            "News sentiment {sentiment} ({score:.2}) with {} bullish vs {} bearish headlines \
             over past {} days. Top narratives: {themes}. FUD/FOMO ratio of {fud_fomo:.2} {fomo}.",
            news.positive_count, news.negative_count, news.period_days,
        ),
    }
}

struct SentimentReadings {
    crowd: CrowdAnalysis,
    extremes: SentimentExtremes,
    whales: WhaleActivity,
    news: NewsAnalysis,
    call: ContrarianCall,
}

fn contrarian_call(
    crowd: &CrowdAnalysis,
    extremes: &SentimentExtremes,
    whales: &WhaleActivity,
    news: &NewsAnalysis,
) -> ContrarianCall {
    let regime = crowd.sentiment_regime;
    let signal = ContrarianSignal::from_regime(
        regime,
        whales.whale_metrics.accumulation_distribution == WhaleBehavior::Distribution,
    );
    let confirmed = matches!(
        (whales.signal, signal.direction()),
        (DivergenceSignal::BullishDivergence, SignalDirection::Bullish)
            | (DivergenceSignal::BearishDivergence, SignalDirection::Bearish)
    );
    let confidence = signal.base_confidence() + if confirmed { 0.05 } else { 0.0 };
    let (entry_timing, exit_timing) = signal.timings();
    let fng = crowd.fear_greed_index;

    let mut risk_factors = Vec::new();
    if regime.is_extreme() {
        risk_factors.push("Sentiment at extreme - sharp reversal risk".to_string());
    } else if fng >= 55 {
        risk_factors.push("Sentiment elevated but not extreme".into());
    } else if fng < 45 {
        risk_factors.push("Sentiment depressed but not extreme".into());
    }
    if whales.divergence_detected {
        risk_factors.push("Whale/retail divergence may take time to resolve".into());
    } else {
        risk_factors.push("No contrarian divergence detected".into());
    }
    if fng >= 55 && news.news_sentiment == SignalDirection::Bullish {
        risk_factors.push("FOMO building in retail".into());
    } else if fng < 45 && news.news_sentiment == SignalDirection::Bearish {
        risk_factors.push("FUD dominating headlines".into());
    }

    let standing = if regime.is_extreme() {
        "at an extreme"
    } else {
        "not at an extreme"
    };
    let whale_sentence = if whales.divergence_detected {
        format!("Whale divergence detected ({}).", serde_label(&whales.signal))
    } else {
        format!(
            "No whale divergence detected - whales and retail aligned {}.",
            whales.whale_sentiment
        )
    };

    ContrarianCall {
        asset: crowd.asset.clone(),
        signal,
        confidence: round_dp(confidence, 2),
        entry_timing,
        exit_timing,
        rationale: SignalRationale {
            crowd_sentiment: format!("{} (F&G: {fng})", regime.as_str()),
            sentiment_extreme: extremes.current_signal,
            whale_divergence: whales.divergence_detected,
            news_sentiment: news.news_sentiment,
        },
        risk_factors,
        reasoning: format!(
            "Current Fear & Greed at {fng} ({}) - {standing}. \
             Best contrarian opportunities emerge at extremes: \
             <25 (extreme fear = BUY) or 75+ (extreme greed = SELL). \
             Current signal: {}. Entry timing: {entry_timing}. Exit timing: {exit_timing}. \
             {whale_sentence}",
            regime.as_str(),
            signal.as_str(),
        ),
    }
}

fn serde_label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Behavioural finance analyst
pub struct CryptoSentimentAnalyst {
    source: Arc<dyn MarketDataSource>,
}

impl CryptoSentimentAnalyst {
    pub const NAME: &'static str = "crypto_sentiment_analyst";

    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    pub async fn analyze_crowd_sentiment(&self, asset: &str) -> Result<CrowdAnalysis> {
        let crowd = self.source.crowd_sentiment(asset).await?;
        Ok(analyze_crowd(&crowd))
    }

    pub async fn detect_sentiment_extremes(&self, asset: &str) -> Result<SentimentExtremes> {
        let crowd = self.source.crowd_sentiment(asset).await?;
        Ok(analyze_extremes(&crowd))
    }

    pub async fn track_whale_activity(&self, asset: &str) -> Result<WhaleActivity> {
        let (whales, crowd) = futures::try_join!(
            self.source.whale_flows(asset),
            self.source.crowd_sentiment(asset),
        )?;
        Ok(analyze_whales(&whales, &crowd))
    }

    pub async fn analyze_news_sentiment(&self, asset: &str, period_days: u32) -> Result<NewsAnalysis> {
        let news = self.source.news_flow(asset, period_days).await?;
        Ok(analyze_news(&news))
    }

    async fn readings(&self, asset: &str) -> Result<SentimentReadings> {
        let (crowd, whales, news) = futures::try_join!(
            self.source.crowd_sentiment(asset),
            self.source.whale_flows(asset),
            self.source.news_flow(asset, NEWS_WINDOW_DAYS),
        )?;

        let whales = analyze_whales(&whales, &crowd);
        let news = analyze_news(&news);
        let extremes = analyze_extremes(&crowd);
        let crowd = analyze_crowd(&crowd);
        let call = contrarian_call(&crowd, &extremes, &whales, &news);

        Ok(SentimentReadings {
            crowd,
            extremes,
            whales,
            news,
            call,
        })
    }

    pub async fn generate_contrarian_signal(&self, asset: &str) -> Result<ContrarianCall> {
        Ok(self.readings(asset).await?.call)
    }

    pub async fn synthesize_sentiment_outlook(&self, asset: &str, horizon_days: u32) -> Result<SentimentOutlook> {
        let SentimentReadings {
            crowd,
            extremes,
            whales,
            news,
            call,
        } = self.readings(asset).await?;

        let regime = crowd.sentiment_regime;
        let action = RecommendedAction::from_signal(call.signal);
        let confidence = (0.70_f64
            + if whales.divergence_detected { 0.0 } else { 0.06 }
            + if regime.is_extreme() { 0.10 } else { 0.0 })
        .min(0.95);

        let fng = crowd.fear_greed_index;
        let standing = match regime {
            SentimentRegime::ExtremeFear | SentimentRegime::ExtremeGreed => "at an extreme",
            SentimentRegime::Greed => "elevated but not extreme",
            SentimentRegime::Fear => "depressed but not extreme",
            SentimentRegime::Neutral => "neutral",
        };
        let behavior = whales.whale_metrics.accumulation_distribution.as_str();
        let relation = if whales.divergence_detected {
            "diverging from retail"
        } else {
            "aligned with retail"
        };

        let key_insights = vec![
            format!("Fear & Greed at {fng} - {standing}"),
            format!("Whales {behavior} - {relation}"),
            format!(
                "News sentiment {} with {:.2} score",
                news.news_sentiment, news.sentiment_score
            ),
            "Best opportunities emerge at F&G <25 (extreme fear) or 75+ (extreme greed)".to_string(),
        ];

        let opportunity = if regime.is_extreme() {
            "Contrarian opportunity present at a sentiment extreme"
        } else {
            "No contrarian opportunity present - need extreme fear (<25) for buy signal or \
             extreme greed (75+) for sell signal"
        };
        let narratives = news.top_narratives.iter().take(2).cloned().collect::<Vec<_>>().join(", ");

        let reasoning = format!(
            "Current sentiment regime: {} (F&G: {fng}). {opportunity}. \
             Whales showing {behavior} behavior, {relation}. \
             News sentiment {} with {narratives} as top narratives. \
             Recommended action: {} over a {horizon_days}-day horizon. \
             Historical analysis shows {} mean reversion after extremes.",
            regime.as_str(),
            news.news_sentiment,
            action.label(),
            extremes.pattern_analysis.mean_reversion_timeframe,
        );

        tracing::info!(
            asset = %asset,
            regime = regime.as_str(),
            action = action.label(),
            "Sentiment outlook synthesized"
        );

        Ok(SentimentOutlook {
            asset: crowd.asset,
            sentiment_assessment: regime.assessment(),
            contrarian_opportunity: regime.is_extreme(),
            recommended_action: action,
            confidence: round_dp(confidence, 2),
            key_insights,
            monitoring_triggers: MonitoringTriggers {
                buy_trigger: "Fear & Greed drops below 25 (extreme fear)",
                sell_trigger: "Fear & Greed reaches 75 (extreme greed)",
            },
            reasoning,
        })
    }

    pub fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::new(
            AgentKind::SpecializedAgent,
            Self::NAME,
            "Market psychology and behavioral finance analysis",
            "behavioral_finance",
        )
        .with_capabilities(&[
            "crowd_sentiment_analysis",
            "sentiment_extreme_detection",
            "whale_activity_tracking",
            "news_sentiment_analysis",
            "contrarian_signal_generation",
            "sentiment_synthesis",
        ])
        .with_required_mcps(&[
            "crypto-sentiment-mcp",
            "crypto-feargreed-mcp",
            "cryptopanic-mcp-server",
        ])
        .with_optional_mcps(&["grok-search-mcp"])
        .with_use_cases(&[
            "Contrarian market timing",
            "Sentiment extreme identification",
            "Whale vs. retail divergence",
            "FUD/FOMO cycle tracking",
            "Behavioral finance insights",
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMarketData;

    fn analyst() -> CryptoSentimentAnalyst {
        CryptoSentimentAnalyst::new(Arc::new(MockMarketData::new()))
    }

    fn whales(ratio: f64) -> WhaleSnapshot {
        WhaleSnapshot {
            asset: "bitcoin".into(),
            large_transaction_volume_usd: 1.0e9,
            exchange_whale_ratio: ratio,
        }
    }

    #[test]
    fn test_regime_buckets() {
        assert_eq!(SentimentRegime::from_index(0), SentimentRegime::ExtremeFear);
        assert_eq!(SentimentRegime::from_index(24), SentimentRegime::ExtremeFear);
        assert_eq!(SentimentRegime::from_index(25), SentimentRegime::Fear);
        assert_eq!(SentimentRegime::from_index(45), SentimentRegime::Neutral);
        assert_eq!(SentimentRegime::from_index(55), SentimentRegime::Greed);
        assert_eq!(SentimentRegime::from_index(75), SentimentRegime::ExtremeGreed);
        assert_eq!(SentimentRegime::from_index(100), SentimentRegime::ExtremeGreed);
    }

    #[test]
    fn test_seventy_five_is_extreme_everywhere() {
        let crowd = CrowdSnapshot {
            asset: "bitcoin".into(),
            fear_greed_index: 75,
            fear_greed_history: vec![10, 40, 50, 75],
            social: SocialMetrics {
                sentiment_balance: 8.0,
                social_volume: 20_000,
                social_dominance: 30.0,
            },
            extreme_events: Vec::new(),
        };

        let analysis = analyze_crowd(&crowd);
        assert_eq!(analysis.sentiment_regime, SentimentRegime::ExtremeGreed);
        assert!(analysis.reasoning.contains("is extreme (75+)"));

        let extremes = analyze_extremes(&crowd);
        assert!((extremes.current_percentile - 75.0).abs() < 1e-9);
        assert!(extremes.is_extreme);
        assert_eq!(extremes.pattern_analysis.extreme_greed_warnings, 1);
        assert_eq!(extremes.pattern_analysis.extreme_fear_opportunities, 1);
        assert_eq!(extremes.current_signal, "sell_signal");
    }

    #[test]
    fn test_contrarian_signal() {
        use ContrarianSignal as C;
        use SentimentRegime as R;

        assert_eq!(C::from_regime(R::ExtremeFear, false), C::StrongBuy);
        assert_eq!(C::from_regime(R::Fear, false), C::Buy);
        assert_eq!(C::from_regime(R::Neutral, true), C::Hold);
        assert_eq!(C::from_regime(R::Greed, false), C::Hold);
        assert_eq!(C::from_regime(R::Greed, true), C::Sell);
        assert_eq!(C::from_regime(R::ExtremeGreed, false), C::StrongSell);

        assert_eq!(RecommendedAction::from_signal(C::StrongBuy).label(), "accumulate");
        assert_eq!(RecommendedAction::from_signal(C::Hold).direction(), SignalDirection::Neutral);
    }

    #[tokio::test]
    async fn test_mock_crowd_and_extremes() {
        let analyst = analyst();
        let crowd = analyst.analyze_crowd_sentiment("bitcoin").await.unwrap();
        assert_eq!(crowd.sentiment_regime, SentimentRegime::Greed);
        assert_eq!(crowd.contrarian_signal, ContrarianSignal::Hold);

        let extremes = analyst.detect_sentiment_extremes("bitcoin").await.unwrap();
        assert!((extremes.current_percentile - 62.0).abs() < 1e-9);
        assert!(!extremes.is_extreme);
        assert_eq!(extremes.pattern_analysis.extreme_fear_opportunities, 3);
        assert_eq!(extremes.pattern_analysis.extreme_greed_warnings, 2);
        assert_eq!(extremes.current_signal, "monitor_for_extreme");
        assert_eq!(extremes.extreme_events[0].regime, SentimentRegime::ExtremeGreed);
    }

    #[tokio::test]
    async fn test_mock_whales_and_news() {
        let analyst = analyst();
        let whales = analyst.track_whale_activity("bitcoin").await.unwrap();
        assert_eq!(whales.whale_sentiment, SignalDirection::Bullish);
        assert_eq!(whales.retail_sentiment, "neutral_to_bullish");
        assert_eq!(whales.signal, DivergenceSignal::AlignedBullish);
        assert!(!whales.divergence_detected);

        let news = analyst.analyze_news_sentiment("bitcoin", 7).await.unwrap();
        assert_eq!(news.news_sentiment, SignalDirection::Bullish);
        assert!((news.sentiment_score - 0.4).abs() < 1e-9);
        assert!((news.fud_fomo_index - 0.3).abs() < 1e-9);
        assert_eq!(news.narrative_shift, "bullish_momentum_building");
    }

    #[tokio::test]
    async fn test_mock_signal_and_outlook() {
        let analyst = analyst();
        let call = analyst.generate_contrarian_signal("bitcoin").await.unwrap();
        assert_eq!(call.signal, ContrarianSignal::Hold);
        assert!((call.confidence - 0.72).abs() < 1e-9);
        assert_eq!(call.entry_timing, "wait_for_extreme_fear");
        assert_eq!(
            call.risk_factors,
            vec![
                "Sentiment elevated but not extreme",
                "No contrarian divergence detected",
                "FOMO building in retail",
            ]
        );

        let outlook = analyst.synthesize_sentiment_outlook("bitcoin", 30).await.unwrap();
        assert_eq!(outlook.sentiment_assessment, "bullish");
        assert_eq!(outlook.recommended_action, RecommendedAction::MonitorAndWait);
        assert!(!outlook.contrarian_opportunity);
        assert!((outlook.confidence - 0.76).abs() < 1e-9);
        assert_eq!(outlook.key_insights[0], "Fear & Greed at 68 - elevated but not extreme");
    }

    #[test]
    fn test_divergence_boosts_confidence() {
        let crowd = CrowdSnapshot {
            asset: "bitcoin".into(),
            fear_greed_index: 30,
            fear_greed_history: vec![30, 40, 50],
            social: SocialMetrics {
                sentiment_balance: -4.0,
                social_volume: 9000,
                social_dominance: 20.0,
            },
            extreme_events: Vec::new(),
        };
        let news = NewsSnapshot {
            asset: "bitcoin".into(),
            period_days: 7,
            positive_count: 10,
            negative_count: 30,
            neutral_count: 5,
            narratives: vec!["Regulatory crackdown".into()],
        };

        let whale = analyze_whales(&whales(0.75), &crowd);
        assert_eq!(whale.signal, DivergenceSignal::BullishDivergence);

        let call = contrarian_call(&analyze_crowd(&crowd), &analyze_extremes(&crowd), &whale, &analyze_news(&news));
        assert_eq!(call.signal, ContrarianSignal::Buy);
        assert!((call.confidence - 0.85).abs() < 1e-9);
        assert!(call.risk_factors.contains(&"FUD dominating headlines".to_string()));
    }

    #[test]
    fn test_distributing_whales_flip_greed_to_sell() {
        let crowd = CrowdSnapshot {
            asset: "bitcoin".into(),
            fear_greed_index: 62,
            fear_greed_history: vec![62],
            social: SocialMetrics {
                sentiment_balance: 3.0,
                social_volume: 12_000,
                social_dominance: 22.0,
            },
            extreme_events: Vec::new(),
        };
        let whale = analyze_whales(&whales(0.3), &crowd);
        assert_eq!(whale.whale_metrics.accumulation_distribution, WhaleBehavior::Distribution);
        assert_eq!(whale.signal, DivergenceSignal::BearishDivergence);

        let news = NewsSnapshot {
            asset: "bitcoin".into(),
            period_days: 7,
            positive_count: 20,
            negative_count: 20,
            neutral_count: 0,
            narratives: Vec::new(),
        };
        let call = contrarian_call(&analyze_crowd(&crowd), &analyze_extremes(&crowd), &whale, &analyze_news(&news));
        assert_eq!(call.signal, ContrarianSignal::Sell);
        assert!((call.confidence - 0.85).abs() < 1e-9);
    }
}
