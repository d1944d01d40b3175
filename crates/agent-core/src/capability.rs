//! Agent Capabilities
//!
//! Self-description an agent publishes so routers and UIs can discover it.

use serde::{Deserialize, Serialize};

/// What kind of agent this is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Single-domain analyst
    SpecializedAgent,
    /// Coordinates other agents
    OrchestratorAgent,
}

/// Capability metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub name: String,
    pub description: String,

    #[serde(rename = "type")]
    pub kind: AgentKind,

    pub domain: String,
    pub capabilities: Vec<String>,
    pub required_mcps: Vec<String>,
    pub optional_mcps: Vec<String>,

    /// Fraction of tokens saved versus free-form reasoning (0.0 for agents)
    pub token_efficiency: f64,

    pub use_cases: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coordinated_agents: Vec<String>,
}

impl AgentCapabilities {
    pub fn new(
        kind: AgentKind,
        name: impl Into<String>,
        description: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            domain: domain.into(),
            capabilities: Vec::new(),
            required_mcps: Vec::new(),
            optional_mcps: Vec::new(),
            token_efficiency: 0.0,
            use_cases: Vec::new(),
            coordinated_agents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_capabilities(mut self, items: &[&str]) -> Self {
        self.capabilities = to_strings(items);
        self
    }

    #[must_use]
    pub fn with_required_mcps(mut self, items: &[&str]) -> Self {
        self.required_mcps = to_strings(items);
        self
    }

    #[must_use]
    pub fn with_optional_mcps(mut self, items: &[&str]) -> Self {
        self.optional_mcps = to_strings(items);
        self
    }

    #[must_use]
    pub fn with_use_cases(mut self, items: &[&str]) -> Self {
        self.use_cases = to_strings(items);
        self
    }

    #[must_use]
    pub fn with_coordinated_agents(mut self, items: Vec<String>) -> Self {
        self.coordinated_agents = items;
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
