//! Task Router
//!
//! Sends a free-text query to the cheapest path that can answer it: a
//! procedural skill, a specialist agent, or the thesis orchestrator.
//! Matching is case-insensitive and the first matching tier wins.

use regex::{Regex, RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const ORCHESTRATOR_PATTERNS: &[&str] = &[
    r"(complete|comprehensive|full)\s+(analysis|thesis)",
    r"(investment|trading)\s+(thesis|strategy)",
    r"(synthesize|combine|integrate)\s+(all|multiple)",
];

const COMPLEX_PATTERNS: &[&str] = &[
    r"(analyze|evaluate|assess)\s+(investment|opportunity)",
    r"(fundamental|tokenomics|project)\s+analysis",
    r"(risk|due\s+diligence)\s+assessment",
    r"(macro|macroeconomic)\s+(analysis|conditions)",
    r"should\s+i\s+(buy|sell|hold)",
    r"(entry|exit)\s+point",
    r"(portfolio|allocation)\s+recommendation",
];

const SIMPLE_PATTERNS: &[&str] = &[
    r"(get|fetch|retrieve|show)\s+(price|volume|market|data)",
    r"(latest|current|recent)\s+(news|tweets|articles)",
    r"(extract|scrape|pull)\s+(content|data)",
    r"calculate\s+(rsi|macd|bollinger|ema|sma)",
    r"(momentum|volatility|trend)\s+indicator",
    r"technical\s+analysis\s+for",
    r"(social|news|whale)\s+sentiment",
    r"fear\s+(and\s+)?greed\s+index",
    r"(track|monitor)\s+(sentiment|volume)",
];

const STRATEGIC_INTENT_PATTERNS: &[&str] = &[
    r"should\s+(i|we)",
    r"(recommend|advise|suggest)",
    r"(analyze|assess|evaluate|compare)",
    r"(considering|given|based\s+on)",
    r"(opinion|view|perspective)",
    r"(best|optimal|ideal)",
];

/// Ordered; first match picks the skill
const SKILL_TABLE: &[(&str, &str)] = &[
    (r"(medium|article|blog)", "data_extraction.extract_medium"),
    (r"(twitter|tweet|social\s+media)", "data_extraction.extract_twitter"),
    (r"(arxiv|paper|research)", "data_extraction.extract_arxiv"),
    (r"(rsi|macd|momentum|oscillator)", "technical_analysis.momentum_scoring"),
    (r"(volatility|atr|bollinger|bands)", "technical_analysis.volatility_assessment"),
    (r"(pattern|support|resistance|trend\s+line)", "technical_analysis.pattern_recognition"),
    (r"(social|sentiment|fear|greed|fomo)", "sentiment_analysis.social_sentiment_tracker"),
    (r"(whale|large\s+transaction|accumulation)", "sentiment_analysis.whale_activity_monitor"),
    (r"(news|article\s+sentiment|media)", "sentiment_analysis.news_sentiment_scorer"),
    (r"(fusion|combine|sentiment\s+(and\s+)?technical)", "sentiment_analysis.sentiment_fusion"),
];

const DEFAULT_SKILL: &str = "data_extraction.aggregate_sentiment";

/// Ordered; first match picks the agent
const AGENT_TABLE: &[(&str, &str)] = &[
    (r"(macro|macroeconomic|fed|inflation|rates)", "agents.crypto_macro_analyst"),
    (
        r"(fundamental|tokenomics|project|team|due\s+diligence|risk)",
        "agents.crypto_vc_analyst",
    ),
    (
        r"(sentiment|psychology|fear|greed|fomo|capitulation)",
        "agents.crypto_sentiment_analyst",
    ),
];

const DEFAULT_AGENT: &str = "agents.crypto_vc_analyst";
const ORCHESTRATOR_HANDLER: &str = "orchestrator.thesis_synthesizer";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    Skill,
    Agent,
    Orchestrator,
}

impl RouteTarget {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Agent => "agent",
            Self::Orchestrator => "orchestrator",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryComplexity {
    /// Direct data retrieval
    Simple,
    /// Single-domain, could go either way
    Moderate,
    /// Needs agent reasoning
    Complex,
    /// Multi-domain investment decision
    Strategic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub target: RouteTarget,
    pub complexity: QueryComplexity,
    pub handler: String,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug)]
pub struct TaskRouter {
    orchestrator: RegexSet,
    complex: RegexSet,
    simple: RegexSet,
    strategic_intent: RegexSet,
    skills: Vec<(Regex, &'static str)>,
    agents: Vec<(Regex, &'static str)>,
}

fn pattern_set(patterns: &[&str]) -> Result<RegexSet> {
    Ok(RegexSetBuilder::new(patterns).case_insensitive(true).build()?)
}

fn handler_table(table: &[(&str, &'static str)]) -> Result<Vec<(Regex, &'static str)>> {
    let mut compiled = Vec::with_capacity(table.len());
    for (pattern, handler) in table {
        compiled.push((Regex::new(pattern)?, *handler));
    }
    Ok(compiled)
}

fn first_handler(table: &[(Regex, &'static str)], query: &str, default: &'static str) -> &'static str {
    table
        .iter()
        .find(|(re, _)| re.is_match(query))
        .map_or(default, |(_, handler)| *handler)
}

impl TaskRouter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            orchestrator: pattern_set(ORCHESTRATOR_PATTERNS)?,
            complex: pattern_set(COMPLEX_PATTERNS)?,
            simple: pattern_set(SIMPLE_PATTERNS)?,
            strategic_intent: pattern_set(STRATEGIC_INTENT_PATTERNS)?,
            skills: handler_table(SKILL_TABLE)?,
            agents: handler_table(AGENT_TABLE)?,
        })
    }

    pub fn route(&self, query: &str) -> RoutingDecision {
        let query = query.to_lowercase();

        let decision = if self.orchestrator.is_match(&query) {
            RoutingDecision {
                target: RouteTarget::Orchestrator,
                complexity: QueryComplexity::Strategic,
                handler: ORCHESTRATOR_HANDLER.into(),
                confidence: 0.90,
                reasoning: "Multi-domain synthesis requires strategic orchestration".into(),
            }
        } else if self.complex.is_match(&query) {
            let handler = self.agent_for(&query);
            RoutingDecision {
                target: RouteTarget::Agent,
                complexity: QueryComplexity::Complex,
                handler: handler.into(),
                confidence: 0.85,
                reasoning: format!("Complex analysis requires {handler} strategic reasoning"),
            }
        } else if self.simple.is_match(&query) {
            let handler = self.skill_for(&query);
            RoutingDecision {
                target: RouteTarget::Skill,
                complexity: QueryComplexity::Simple,
                handler: handler.into(),
                confidence: 0.95,
                reasoning: format!("Procedural data query best handled by {handler}"),
            }
        } else if self.strategic_intent.is_match(&query) {
            RoutingDecision {
                target: RouteTarget::Agent,
                complexity: QueryComplexity::Moderate,
                handler: self.agent_for(&query).into(),
                confidence: 0.70,
                reasoning: "Moderate complexity with strategic intent - routing to agent".into(),
            }
        } else {
            RoutingDecision {
                target: RouteTarget::Skill,
                complexity: QueryComplexity::Moderate,
                handler: self.skill_for(&query).into(),
                confidence: 0.75,
                reasoning: "Moderate complexity - defaulting to procedural skill".into(),
            }
        };

        tracing::debug!(
            route = decision.target.as_str(),
            handler = %decision.handler,
            confidence = decision.confidence,
            "Routed query"
        );
        decision
    }

    fn skill_for(&self, query: &str) -> &'static str {
        first_handler(&self.skills, query, DEFAULT_SKILL)
    }

    fn agent_for(&self, query: &str) -> &'static str {
        first_handler(&self.agents, query, DEFAULT_AGENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(query: &str) -> RoutingDecision {
        TaskRouter::new().unwrap().route(query)
    }

    #[test]
    fn test_simple_indicator_query_goes_to_skill() {
        let decision = route("Calculate RSI for BTC");
        assert_eq!(decision.target, RouteTarget::Skill);
        assert_eq!(decision.complexity, QueryComplexity::Simple);
        assert_eq!(decision.handler, "technical_analysis.momentum_scoring");
        assert!((decision.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_orchestrator_wins_over_complex() {
        // Also matches "should i buy"
        let decision = route("Give me a comprehensive analysis, should I buy ETH?");
        assert_eq!(decision.target, RouteTarget::Orchestrator);
        assert_eq!(decision.handler, "orchestrator.thesis_synthesizer");
        assert!((decision.confidence - 0.90).abs() < f64::EPSILON);
    }

    #[test]
    fn test_complex_query_picks_agent_by_domain() {
        let decision = route("What are the macro conditions for crypto right now?");
        assert_eq!(decision.target, RouteTarget::Agent);
        assert_eq!(decision.complexity, QueryComplexity::Complex);
        assert_eq!(decision.handler, "agents.crypto_macro_analyst");

        assert_eq!(route("Run a due diligence assessment on SOL").handler, "agents.crypto_vc_analyst");
    }

    #[test]
    fn test_strategic_intent_without_pattern() {
        let decision = route("Compare the crowd psychology on ETH and SOL");
        assert_eq!(decision.target, RouteTarget::Agent);
        assert_eq!(decision.complexity, QueryComplexity::Moderate);
        assert_eq!(decision.handler, "agents.crypto_sentiment_analyst");
        assert!((decision.confidence - 0.70).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_skill() {
        let decision = route("bitcoin");
        assert_eq!(decision.target, RouteTarget::Skill);
        assert_eq!(decision.complexity, QueryComplexity::Moderate);
        assert_eq!(decision.handler, "data_extraction.aggregate_sentiment");
        assert!((decision.confidence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_skill_table_order() {
        // "whale sentiment" hits the sentiment row before the whale row
        assert_eq!(
            route("Whale sentiment for BTC").handler,
            "sentiment_analysis.social_sentiment_tracker"
        );
        assert_eq!(
            route("Show volume around support levels").handler,
            "technical_analysis.pattern_recognition"
        );
    }

    #[test]
    fn test_decision_serializes_snake_case() {
        let json = serde_json::to_value(route("Full thesis on BTC")).unwrap();
        assert_eq!(json["target"], "orchestrator");
        assert_eq!(json["complexity"], "strategic");
    }
}
