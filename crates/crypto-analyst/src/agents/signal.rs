//! Signal taxonomy
//!
//! Every analyst exposes its headline call as a typed enum implementing
//! [`Signal`]. The synthesizer only ever sees the three-way
//! [`SignalDirection`] those enums map to.

use serde::{Deserialize, Serialize};
use std::fmt;

const BULLISH_KEYWORDS: [&str; 4] = ["bullish", "buy", "strong_buy", "accumulate"];
const BEARISH_KEYWORDS: [&str; 4] = ["bearish", "sell", "strong_sell", "distribute"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl SignalDirection {
    /// Keyword match on free text
    ///
    /// Bullish keywords are checked first, so "buy, then sell" is bullish.
    /// Anything unmatched (including the empty string) is neutral.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if BULLISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Bullish
        } else if BEARISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed analyst call with a total mapping onto [`SignalDirection`]
pub trait Signal {
    fn direction(&self) -> SignalDirection;

    /// Wire label, e.g. `monitor_and_wait`
    fn label(&self) -> &'static str;
}

/// Majority vote over the three analyst directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThesisType {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl ThesisType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrongBullish => "strong_bullish",
            Self::Bullish => "bullish",
            Self::Neutral => "neutral",
            Self::Bearish => "bearish",
            Self::StrongBearish => "strong_bearish",
        }
    }

    pub const fn is_bullish(self) -> bool {
        matches!(self, Self::StrongBullish | Self::Bullish)
    }
}

impl fmt::Display for ThesisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify from (macro, fundamental, sentiment) directions
///
/// Only the bullish/bearish tallies matter, not which analysts agree.
pub fn classify_thesis(directions: [SignalDirection; 3]) -> ThesisType {
    let bullish = directions.iter().filter(|d| **d == SignalDirection::Bullish).count();
    let bearish = directions.iter().filter(|d| **d == SignalDirection::Bearish).count();

    match (bullish, bearish) {
        (3, _) => ThesisType::StrongBullish,
        (2, _) => ThesisType::Bullish,
        (_, 3) => ThesisType::StrongBearish,
        (_, 2) => ThesisType::Bearish,
        _ => ThesisType::Neutral,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    None,
    Minor,
    Moderate,
    Major,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Strong fundamentals, weak sentiment
    FundamentalVsSentiment,
    /// Macro headwinds against good fundamentals
    MacroVsFundamental,
    /// Sentiment leaning away from the macro call
    SentimentVsMacro,
    NoConflict,
}

impl ConflictType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FundamentalVsSentiment => "fundamental_vs_sentiment",
            Self::MacroVsFundamental => "macro_vs_fundamental",
            Self::SentimentVsMacro => "sentiment_vs_macro",
            Self::NoConflict => "no_conflict",
        }
    }

    pub const fn severity(self) -> ConflictSeverity {
        match self {
            Self::MacroVsFundamental => ConflictSeverity::Major,
            Self::FundamentalVsSentiment => ConflictSeverity::Moderate,
            Self::SentimentVsMacro => ConflictSeverity::Minor,
            Self::NoConflict => ConflictSeverity::None,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::FundamentalVsSentiment => {
                "Fundamentals are bullish while crowd sentiment is bearish"
            }
            Self::MacroVsFundamental => "Macro backdrop is bearish against bullish fundamentals",
            Self::SentimentVsMacro => "Sentiment direction disagrees with the macro outlook",
            Self::NoConflict => "All analysts aligned",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First matching rule wins; later pairwise disagreements are not reported
pub fn detect_conflict(
    macro_view: SignalDirection,
    fundamental: SignalDirection,
    sentiment: SignalDirection,
) -> ConflictType {
    use SignalDirection::{Bearish, Bullish, Neutral};

    if fundamental == Bullish && sentiment == Bearish {
        ConflictType::FundamentalVsSentiment
    } else if macro_view == Bearish && fundamental == Bullish {
        ConflictType::MacroVsFundamental
    } else if sentiment != Neutral && sentiment != macro_view {
        ConflictType::SentimentVsMacro
    } else {
        ConflictType::NoConflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SignalDirection::{Bearish, Bullish, Neutral};

    #[test]
    fn test_from_text_is_total() {
        assert_eq!(SignalDirection::from_text("STRONG_BUY"), Bullish);
        assert_eq!(SignalDirection::from_text("distribute"), Bearish);
        assert_eq!(SignalDirection::from_text("monitor_and_wait"), Neutral);
        assert_eq!(SignalDirection::from_text(""), Neutral);
        assert_eq!(SignalDirection::from_text("buy the dip, sell the rip"), Bullish);
    }

    #[test]
    fn test_classify_thesis() {
        let from = |a: &str, b: &str, c: &str| {
            classify_thesis([
                SignalDirection::from_text(a),
                SignalDirection::from_text(b),
                SignalDirection::from_text(c),
            ])
        };

        assert_eq!(from("bullish", "strong_buy", "bullish"), ThesisType::StrongBullish);
        assert_eq!(from("neutral", "hold", "neutral"), ThesisType::Neutral);
        assert_eq!(from("bullish", "buy", "monitor_and_wait"), ThesisType::Bullish);
        assert_eq!(from("bearish", "sell", "neutral"), ThesisType::Bearish);
        assert_eq!(from("bearish", "strong_sell", "distribute"), ThesisType::StrongBearish);
        assert_eq!(from("bullish", "sell", "neutral"), ThesisType::Neutral);
    }

    #[test]
    fn test_conflict_priority() {
        assert_eq!(detect_conflict(Bearish, Bullish, Bullish), ConflictType::MacroVsFundamental);
        assert_eq!(detect_conflict(Bearish, Bullish, Bearish), ConflictType::FundamentalVsSentiment);
        assert_eq!(detect_conflict(Neutral, Neutral, Bullish), ConflictType::SentimentVsMacro);
        assert_eq!(detect_conflict(Bullish, Bullish, Neutral), ConflictType::NoConflict);
        assert_eq!(detect_conflict(Bullish, Bullish, Bullish), ConflictType::NoConflict);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ConflictType::MacroVsFundamental.severity() > ConflictType::FundamentalVsSentiment.severity());
        assert!(ConflictType::FundamentalVsSentiment.severity() > ConflictType::SentimentVsMacro.severity());
        assert_eq!(ConflictType::NoConflict.severity(), ConflictSeverity::None);
    }
}
