//! Skill response envelope

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::Result;

/// Standard envelope every skill returns
#[derive(Clone, Debug, Serialize)]
pub struct SkillReport<D, M> {
    pub timestamp: DateTime<Utc>,

    /// Producing skill family, e.g. `technical-analysis-skill`
    pub source: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Set instead of `symbol` by asset-level skills
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,

    pub data_type: &'static str,
    pub data: D,
    pub metadata: M,
}

impl<D: Serialize, M: Serialize> SkillReport<D, M> {
    /// Envelope not tied to a single symbol or asset
    pub fn new(source: &'static str, data_type: &'static str, data: D, metadata: M) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            symbol: None,
            asset: None,
            data_type,
            data,
            metadata,
        }
    }

    pub fn for_symbol(
        source: &'static str,
        data_type: &'static str,
        symbol: impl Into<String>,
        data: D,
        metadata: M,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            symbol: Some(symbol.into()),
            asset: None,
            data_type,
            data,
            metadata,
        }
    }

    pub fn for_asset(
        source: &'static str,
        data_type: &'static str,
        asset: impl Into<String>,
        data: D,
        metadata: M,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            symbol: None,
            asset: Some(asset.into()),
            data_type,
            data,
            metadata,
        }
    }

    /// Full envelope when `verbose`, otherwise only `{"data": ...}`
    pub fn render(&self, verbose: bool) -> Result<Value> {
        if verbose {
            Ok(serde_json::to_value(self)?)
        } else {
            Ok(json!({ "data": serde_json::to_value(&self.data)? }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Meta {
        confidence: f64,
    }

    #[test]
    fn test_render_minimal_and_full() {
        let report = SkillReport::for_symbol(
            "technical-analysis-skill",
            "momentum",
            "BTC/USDT",
            json!({"score": 73.5}),
            Meta { confidence: 0.8 },
        );

        let minimal = report.render(false).unwrap();
        assert_eq!(minimal, json!({"data": {"score": 73.5}}));

        let full = report.render(true).unwrap();
        assert_eq!(full["data_type"], "momentum");
        assert_eq!(full["symbol"], "BTC/USDT");
        assert!(full.get("asset").is_none());
        assert_eq!(full["metadata"]["confidence"], 0.8);
    }
}
