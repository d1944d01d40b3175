//! Development Activity Tracking
//!
//! GitHub commit velocity, contributor base and merged work for a project's
//! primary repository. More than 20 monthly contributors with rising commit
//! velocity is read as a leading fundamental signal.

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

use agent_core::{McpClient, gather};

use super::indicators::{LIST_COMMITS, SEARCH_ISSUES, SEARCH_USERS, field};
use super::response::SkillReport;
use crate::error::Result;
use crate::model::round_dp;

const PER_PAGE: u32 = 100;

/// Fewer commits than this cannot establish a trend
const MIN_TREND_COMMITS: usize = 10;

/// Lines changed per commit when estimating churn
const LINES_PER_COMMIT: u32 = 50;

/// Primary repository for a listed asset
pub fn repository_for(asset: &str) -> Option<&'static str> {
    let repo = match asset.to_uppercase().as_str() {
        "BTC" => "bitcoin/bitcoin",
        "ETH" => "ethereum/go-ethereum",
        "SOL" => "solana-labs/solana",
        "ADA" => "input-output-hk/cardano-node",
        "DOT" => "paritytech/polkadot",
        "AVAX" => "ava-labs/avalanchego",
        "MATIC" => "maticnetwork/bor",
        "LINK" => "smartcontractkit/chainlink",
        "UNI" => "Uniswap/v3-core",
        "ATOM" => "cosmos/cosmos-sdk",
        _ => return None,
    };
    Some(repo)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitFrequency {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl CommitFrequency {
    #[allow(clippy::cast_precision_loss)]
    pub fn of(commit_count: usize, period_days: u32) -> Self {
        let per_day = if period_days == 0 {
            0.0
        } else {
            commit_count as f64 / f64::from(period_days)
        };

        if per_day >= 10.0 {
            Self::VeryHigh
        } else if per_day >= 5.0 {
            Self::High
        } else if per_day >= 2.0 {
            Self::Moderate
        } else if per_day >= 0.5 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    VeryActive,
    Active,
    Moderate,
    Low,
    Inactive,
}

impl ActivityLevel {
    #[allow(clippy::cast_precision_loss)]
    pub fn of(commit_count: usize, contributor_count: usize, release_count: usize) -> Self {
        let score = (contributor_count as f64).mul_add(2.0, commit_count as f64 * 0.5) + release_count as f64 * 10.0;

        if score >= 150.0 {
            Self::VeryActive
        } else if score >= 80.0 {
            Self::Active
        } else if score >= 40.0 {
            Self::Moderate
        } else if score >= 10.0 {
            Self::Low
        } else {
            Self::Inactive
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentMomentum {
    Strong,
    Positive,
    Neutral,
    Declining,
    Weak,
}

impl DevelopmentMomentum {
    pub fn of(trend: VelocityTrend, contributor_growth: f64, health_score: f64) -> Self {
        if trend == VelocityTrend::Increasing && contributor_growth > 0.10 && health_score > 0.75 {
            Self::Strong
        } else if trend == VelocityTrend::Increasing || contributor_growth > 0.05 {
            Self::Positive
        } else if trend == VelocityTrend::Decreasing && contributor_growth < 0.0 {
            Self::Declining
        } else if health_score < 0.40 {
            Self::Weak
        } else {
            Self::Neutral
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Declining => "declining",
            Self::Weak => "weak",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DevelopmentData {
    /// Commits per day
    pub velocity: f64,
    pub velocity_trend: VelocityTrend,
    pub contributor_count: usize,
    pub contributor_growth: f64,
    pub commit_count: usize,
    pub commit_frequency: CommitFrequency,
    pub release_count: usize,
    pub code_churn: u32,
    pub health_score: f64,
    pub activity_level: ActivityLevel,
    pub development_momentum: DevelopmentMomentum,
    pub trading_signal: &'static str,
}

impl DevelopmentData {
    fn empty() -> Self {
        Self {
            velocity: 0.0,
            velocity_trend: VelocityTrend::Stable,
            contributor_count: 0,
            contributor_growth: 0.0,
            commit_count: 0,
            commit_frequency: CommitFrequency::VeryLow,
            release_count: 0,
            code_churn: 0,
            health_score: 0.0,
            activity_level: ActivityLevel::Inactive,
            development_momentum: DevelopmentMomentum::Neutral,
            trading_signal: "No development data available",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DevelopmentMetadata {
    pub repository: Option<String>,
    pub period_days: u32,
    pub confidence: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub type DevelopmentReport = SkillReport<DevelopmentData, DevelopmentMetadata>;

/// Author date of a commit, flat (`date`) or GitHub-shaped (`commit.author.date`)
fn commit_date(commit: &Value) -> Option<DateTime<Utc>> {
    commit
        .get("date")
        .or_else(|| commit.get("commit")?.get("author")?.get("date"))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

fn listed<'a>(reply: &'a Value, key: &str) -> &'a [Value] {
    match field(reply, key) {
        Some(Value::Array(items)) => items,
        _ => match reply.get("content").and_then(|c| c.get(0)) {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
    }
}

/// Commit dates inside the period; undated commits count as recent
pub fn commits_in_period(reply: &Value, period_days: u32, now: DateTime<Utc>) -> Vec<Option<DateTime<Utc>>> {
    let since = now - Duration::days(i64::from(period_days));
    listed(reply, "commits")
        .iter()
        .map(commit_date)
        .filter(|date| date.is_none_or(|d| d >= since))
        .collect()
}

/// Commits in the newer half of the period against the older half
#[allow(clippy::cast_precision_loss)]
pub fn velocity_trend(dates: &[Option<DateTime<Utc>>], period_days: u32, now: DateTime<Utc>) -> VelocityTrend {
    let dated: Vec<DateTime<Utc>> = dates.iter().flatten().copied().collect();
    if dated.len() < MIN_TREND_COMMITS {
        return VelocityTrend::Stable;
    }

    let midpoint = now - Duration::hours(i64::from(period_days) * 12);
    let recent = dated.iter().filter(|d| **d > midpoint).count() as f64;
    let earlier = dated.len() as f64 - recent;

    if recent > earlier * 1.2 {
        VelocityTrend::Increasing
    } else if recent < earlier * 0.8 {
        VelocityTrend::Decreasing
    } else {
        VelocityTrend::Stable
    }
}

/// Without contributor history, a base of 20+ is read as growing
pub fn contributor_growth(contributor_count: usize) -> f64 {
    if contributor_count >= 20 { 0.15 } else { -0.05 }
}

#[allow(clippy::cast_precision_loss)]
pub fn health_score(velocity: f64, contributors: usize, growth: f64, releases: usize) -> f64 {
    let velocity_part = if velocity >= 10.0 {
        0.25
    } else if velocity >= 5.0 {
        0.20
    } else if velocity >= 2.0 {
        0.15
    } else {
        velocity * 0.05
    };

    let contributor_part = match contributors {
        50.. => 0.35,
        20..=49 => 0.30,
        10..=19 => 0.25,
        n => n as f64 * 0.02,
    };

    let growth_part = if growth > 0.20 {
        0.20
    } else if growth > 0.10 {
        0.15
    } else if growth > 0.0 {
        0.10
    } else {
        0.05
    };

    let release_part = match releases {
        5.. => 0.20,
        3..=4 => 0.15,
        1..=2 => 0.10,
        0 => 0.05,
    };

    f64::min(velocity_part + contributor_part + growth_part + release_part, 1.0)
}

pub fn trading_signal(
    momentum: DevelopmentMomentum,
    level: ActivityLevel,
    health_score: f64,
    contributors: usize,
) -> &'static str {
    use ActivityLevel::{Active, Inactive, VeryActive};
    use DevelopmentMomentum::{Declining, Neutral, Positive, Strong, Weak};

    let busy = matches!(level, VeryActive | Active);
    if momentum == Strong && busy && contributors >= 20 {
        "Strong development activity - positive fundamental bias"
    } else if matches!(momentum, Strong | Positive) && health_score > 0.65 {
        "Increasing development activity - bullish fundamental"
    } else if busy && momentum == Neutral {
        "Active development - fundamentals solid, monitor momentum"
    } else if momentum == Declining || health_score < 0.35 {
        "Declining development activity - negative fundamental bias"
    } else if momentum == Weak || matches!(level, ActivityLevel::Low | Inactive) {
        "Low development activity - weak fundamental support"
    } else if level == ActivityLevel::Moderate {
        "Moderate development activity - neutral fundamental"
    } else {
        "Development activity unclear - monitor for trend confirmation"
    }
}

/// Raw GitHub readings for one period
#[derive(Clone, Debug, Default)]
pub struct GithubActivity {
    pub commit_dates: Vec<Option<DateTime<Utc>>>,
    pub contributor_count: usize,
    pub release_count: usize,
}

/// Activity reading without any I/O
#[allow(clippy::cast_precision_loss)]
pub fn assess(activity: &GithubActivity, period_days: u32, now: DateTime<Utc>) -> (DevelopmentData, f64) {
    let commit_count = activity.commit_dates.len();
    let velocity = if period_days == 0 {
        0.0
    } else {
        commit_count as f64 / f64::from(period_days)
    };
    let contributors = activity.contributor_count;
    let releases = activity.release_count;

    let trend = velocity_trend(&activity.commit_dates, period_days, now);
    let frequency = CommitFrequency::of(commit_count, period_days);
    let level = ActivityLevel::of(commit_count, contributors, releases);
    let growth = contributor_growth(contributors);
    let health = health_score(velocity, contributors, growth, releases);
    let momentum = DevelopmentMomentum::of(trend, growth, health);

    let mut confidence: f64 = 0.70;
    if commit_count >= 100 {
        confidence += 0.10;
    }
    if contributors >= 20 {
        confidence += 0.10;
    }
    if health > 0.75 {
        confidence += 0.05;
    }

    let data = DevelopmentData {
        velocity: round_dp(velocity, 2),
        velocity_trend: trend,
        contributor_count: contributors,
        contributor_growth: round_dp(growth, 2),
        commit_count,
        commit_frequency: frequency,
        release_count: releases,
        code_churn: u32::try_from(commit_count).unwrap_or(u32::MAX).saturating_mul(LINES_PER_COMMIT),
        health_score: round_dp(health, 2),
        activity_level: level,
        development_momentum: momentum,
        trading_signal: trading_signal(momentum, level, health, contributors),
    };

    (data, confidence.min(0.95))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Feed {
    Commits,
    Contributors,
    Releases,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Commits => "commits",
            Self::Contributors => "contributors",
            Self::Releases => "releases",
        })
    }
}

/// GitHub activity tracker over the `github-manager` MCP
pub struct DevelopmentActivityTracker {
    mcp: Arc<dyn McpClient>,
}

impl DevelopmentActivityTracker {
    pub fn new(mcp: Arc<dyn McpClient>) -> Self {
        Self { mcp }
    }

    fn neutral(asset: &str, repository: Option<&str>, period_days: u32) -> DevelopmentReport {
        SkillReport::for_asset(
            "data-extraction-skill",
            "development_activity",
            asset,
            DevelopmentData::empty(),
            DevelopmentMetadata {
                repository: repository.map(str::to_string),
                period_days,
                confidence: 0.0,
                warnings: Vec::new(),
            },
        )
    }

    /// Track `asset`'s repository, or `repository` (`owner/repo`) when given
    ///
    /// An unknown asset or malformed repository yields the neutral reading
    /// with zero confidence. A feed that fails counts as empty and is listed
    /// in the metadata warnings.
    pub async fn track(&self, asset: &str, repository: Option<&str>, period_days: u32) -> DevelopmentReport {
        let Some(repository) = repository.or_else(|| repository_for(asset)) else {
            return Self::neutral(asset, None, period_days);
        };
        let Some((owner, repo)) = repository
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
        else {
            return Self::neutral(asset, Some(repository), period_days);
        };

        let now = Utc::now();
        let since = now - Duration::days(i64::from(period_days));
        let slug = format!("repo:{owner}/{repo}");

        let tasks: [(Feed, BoxFuture<'_, Result<Value>>); 3] = [
            (
                Feed::Commits,
                self.call(LIST_COMMITS, json!({
                    "owner": owner,
                    "repo": repo,
                    "since": since.to_rfc3339(),
                    "per_page": PER_PAGE,
                })),
            ),
            (Feed::Contributors, self.call(SEARCH_USERS, json!({ "q": slug, "per_page": PER_PAGE }))),
            (
                Feed::Releases,
                self.call(SEARCH_ISSUES, json!({ "q": format!("{slug} is:pr is:merged"), "per_page": PER_PAGE })),
            ),
        ];
        let gathered = gather(tasks).await;
        let warnings = gathered.warnings();

        let mut activity = GithubActivity::default();
        for (feed, reply) in &gathered.successes {
            match feed {
                Feed::Commits => activity.commit_dates = commits_in_period(reply, period_days, now),
                Feed::Contributors => activity.contributor_count = listed(reply, "users").len(),
                Feed::Releases => activity.release_count = listed(reply, "items").len(),
            }
        }

        let (data, confidence) = assess(&activity, period_days, now);

        tracing::debug!(
            asset = %asset,
            repository = %repository,
            commits = data.commit_count,
            momentum = data.development_momentum.as_str(),
            "Development activity tracked"
        );

        SkillReport::for_asset(
            "data-extraction-skill",
            "development_activity",
            asset,
            data,
            DevelopmentMetadata {
                repository: Some(repository.to_string()),
                period_days,
                confidence: round_dp(confidence, 2),
                warnings,
            },
        )
    }

    fn call<'a>(&'a self, tool: &'a str, params: Value) -> BoxFuture<'a, Result<Value>> {
        async move { Ok(self.mcp.call_tool(tool, params).await?) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::StaticMcpClient;

    /// `count` commits, one every `spacing_hours` from an hour ago, newest first
    fn commits(count: usize, spacing_hours: i64) -> Value {
        let now = Utc::now();
        let commits: Vec<Value> = (0..count)
            .map(|i| {
                let date = now - Duration::hours(spacing_hours * i64::try_from(i).unwrap() + 1);
                json!({ "sha": format!("{i:07x}"), "commit": { "author": { "date": date.to_rfc3339() } } })
            })
            .collect();
        json!({ "content": [{ "commits": commits }] })
    }

    fn entries(key: &str, count: usize) -> Value {
        let items: Vec<Value> = (0..count).map(|i| json!({ "id": i })).collect();
        json!({ "content": [{ key: items }] })
    }

    fn client(commit_reply: Value, contributors: usize, merged: usize) -> StaticMcpClient {
        StaticMcpClient::new()
            .with_response(LIST_COMMITS, commit_reply)
            .with_response(SEARCH_USERS, entries("users", contributors))
            .with_response(SEARCH_ISSUES, entries("items", merged))
    }

    fn tracker(client: StaticMcpClient) -> DevelopmentActivityTracker {
        DevelopmentActivityTracker::new(Arc::new(client))
    }

    #[test]
    fn test_classifiers() {
        assert_eq!(CommitFrequency::of(300, 30), CommitFrequency::VeryHigh);
        assert_eq!(CommitFrequency::of(60, 30), CommitFrequency::Moderate);
        assert_eq!(CommitFrequency::of(10, 30), CommitFrequency::VeryLow);
        assert_eq!(CommitFrequency::of(10, 0), CommitFrequency::VeryLow);

        assert_eq!(ActivityLevel::of(100, 100, 6), ActivityLevel::VeryActive);
        assert_eq!(ActivityLevel::of(40, 20, 2), ActivityLevel::Active);
        assert_eq!(ActivityLevel::of(2, 1, 0), ActivityLevel::Inactive);
    }

    #[test]
    fn test_health_score_components() {
        assert!((health_score(12.0, 60, 0.25, 6) - 1.0).abs() < 1e-9);
        assert!((health_score(1.0, 5, -0.05, 0) - 0.25).abs() < 1e-9);
        assert!((health_score(100.0 / 30.0, 100, 0.15, 6) - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_momentum() {
        use VelocityTrend::{Decreasing, Increasing, Stable};

        assert_eq!(DevelopmentMomentum::of(Increasing, 0.15, 0.85), DevelopmentMomentum::Strong);
        assert_eq!(DevelopmentMomentum::of(Stable, 0.15, 0.60), DevelopmentMomentum::Positive);
        assert_eq!(DevelopmentMomentum::of(Decreasing, -0.05, 0.60), DevelopmentMomentum::Declining);
        assert_eq!(DevelopmentMomentum::of(Stable, -0.05, 0.30), DevelopmentMomentum::Weak);
        assert_eq!(DevelopmentMomentum::of(Stable, 0.0, 0.60), DevelopmentMomentum::Neutral);
    }

    #[test]
    fn test_velocity_trend_by_commit_dates() {
        let now = Utc::now();
        let at = |hours: i64| Some(now - Duration::hours(hours));

        let front_loaded: Vec<_> = (0..12).map(|i| at(i * 10)).collect();
        assert_eq!(velocity_trend(&front_loaded, 30, now), VelocityTrend::Increasing);

        let back_loaded: Vec<_> = (0..12).map(|i| at(400 + i * 10)).collect();
        assert_eq!(velocity_trend(&back_loaded, 30, now), VelocityTrend::Decreasing);

        let few: Vec<_> = (0..5).map(|i| at(i)).collect();
        assert_eq!(velocity_trend(&few, 30, now), VelocityTrend::Stable);
    }

    #[test]
    fn test_repository_mapping() {
        assert_eq!(repository_for("eth"), Some("ethereum/go-ethereum"));
        assert_eq!(repository_for("DOGE"), None);
    }

    #[tokio::test]
    async fn test_track_strong_project() {
        let report = tracker(client(commits(100, 6), 100, 6)).track("BTC", None, 30).await;
        let data = &report.data;

        assert_eq!(data.commit_count, 100);
        assert_eq!(data.velocity_trend, VelocityTrend::Increasing);
        assert_eq!(data.commit_frequency, CommitFrequency::Moderate);
        assert_eq!(data.activity_level, ActivityLevel::VeryActive);
        assert!((data.health_score - 0.85).abs() < 1e-9);
        assert_eq!(data.development_momentum, DevelopmentMomentum::Strong);
        assert_eq!(data.code_churn, 5000);
        assert_eq!(data.trading_signal, "Strong development activity - positive fundamental bias");
        assert_eq!(report.metadata.repository.as_deref(), Some("bitcoin/bitcoin"));
        assert!((report.metadata.confidence - 0.95).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_track_counts_only_the_requested_period() {
        // One commit a day for 40 days
        let reply = commits(40, 24);

        let month = tracker(client(reply.clone(), 30, 2)).track("ETH", None, 30).await;
        let week = tracker(client(reply, 30, 2)).track("ETH", None, 7).await;

        assert_eq!(month.data.commit_count, 30);
        assert_eq!(week.data.commit_count, 7);
        assert_eq!(week.metadata.period_days, 7);
    }

    #[tokio::test]
    async fn test_track_small_project_reads_weak() {
        let report = tracker(client(commits(4, 48), 3, 0))
            .track("RAY", Some("raydium-io/raydium-amm"), 30)
            .await;

        assert_eq!(report.data.activity_level, ActivityLevel::Inactive);
        assert_eq!(report.data.contributor_growth, -0.05);
        assert_eq!(report.data.trading_signal, "Declining development activity - negative fundamental bias");
        assert!((report.metadata.confidence - 0.70).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_repository_is_neutral() {
        let unknown = tracker(StaticMcpClient::new()).track("DOGE", None, 30).await;
        assert_eq!(unknown.data.trading_signal, "No development data available");
        assert_eq!(unknown.metadata.confidence, 0.0);
        assert_eq!(unknown.metadata.repository, None);

        let malformed = tracker(StaticMcpClient::new()).track("BTC", Some("bitcoin"), 30).await;
        assert_eq!(malformed.metadata.repository.as_deref(), Some("bitcoin"));
        assert_eq!(malformed.data.commit_count, 0);
    }

    #[tokio::test]
    async fn test_failed_feeds_are_reported() {
        let client = StaticMcpClient::new()
            .with_response(LIST_COMMITS, commits(20, 12))
            .with_failure(SEARCH_USERS, "rate limited");

        let report = tracker(client).track("SOL", None, 30).await;

        assert_eq!(report.data.commit_count, 20);
        assert_eq!(report.data.contributor_count, 0);
        assert_eq!(report.metadata.warnings.len(), 2);
        assert!(report.metadata.warnings[0].starts_with("contributors: "));
    }
}
