//! Data models for the audit analyzer.
//!
//! This module contains the records passed between the pipeline stages:
//! the raw issue as fetched, the trials parsed out of it, and the
//! normalized audit record built from those.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Environment an audit cycle was run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// VSCode chat panel
    Vscode,
    /// GitHub Copilot Chat on the web
    Github,
    /// Not stated in the document
    #[default]
    Unknown,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Vscode => write!(f, "vscode"),
            Environment::Github => write!(f, "github"),
            Environment::Unknown => write!(f, "unknown"),
        }
    }
}

/// One issue as returned by the issue tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Issue number.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Markdown body; absent bodies are treated as empty text.
    #[serde(default)]
    pub body: Option<String>,
    /// Creation timestamp.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Close timestamp, if closed.
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Lifecycle state ("open" / "closed").
    #[serde(default)]
    pub state: String,
}

impl IssueRecord {
    /// The body text, empty when missing.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

/// Layouts accepted for timestamps that carry no offset.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse an RFC 3339 timestamp, reading one without an offset as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
        None => Ok(None),
    }
}

/// A single recorded use of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Use number within the cycle (1-indexed).
    pub index: u32,
    /// Roster id of the agent.
    pub agent_id: String,
    /// Whether the agent stayed within its role.
    pub success: bool,
    /// Free-text observation.
    pub note: String,
}

/// Per-agent counts for one audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBreakdownEntry {
    pub agent_id: String,
    pub uses: u32,
    pub failures: u32,
    pub success_rate_pct: f64,
}

/// One parsed audit document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Issue number of the source document.
    pub issue_number: u64,
    /// Issue title.
    pub title: String,
    /// When the audit issue was opened.
    pub created_at: DateTime<Utc>,
    /// When the audit issue was closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Issue state.
    pub state: String,
    /// Environment the cycle ran in.
    pub environment: Environment,
    /// Number of uses in the cycle.
    pub total_uses: u32,
    /// Number of violations in the cycle.
    pub total_violations: u32,
    /// Success rate, two decimals.
    pub success_rate_pct: f64,
    /// Violation-type tags checked in the document.
    pub violation_types: Vec<String>,
    /// Trials in document order.
    pub trials: Vec<TrialRecord>,
    /// Per-agent counts.
    pub agent_breakdown: Vec<AgentBreakdownEntry>,
}

impl AuditRecord {
    /// Stable identifier used by the history file.
    pub fn audit_id(&self) -> String {
        format!("audit-{}", self.issue_number)
    }

    /// Calendar date the audit was opened.
    pub fn date(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }

    /// Trials marked as failures.
    pub fn failed_trials(&self) -> impl Iterator<Item = &TrialRecord> {
        self.trials.iter().filter(|t| !t.success)
    }
}

/// Success rate of `uses` attempts with `failures` misses, in percent.
///
/// Zero uses reads as a perfect rate.
pub fn success_rate(uses: u32, failures: u32) -> f64 {
    if uses == 0 {
        return 100.0;
    }
    let failures = failures.min(uses);
    (uses - failures) as f64 / uses as f64 * 100.0
}

/// Round to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Vscode.to_string(), "vscode");
        assert_eq!(Environment::Github.to_string(), "github");
        assert_eq!(Environment::default(), Environment::Unknown);
    }

    #[test]
    fn test_issue_deserialize_null_body() {
        let json = r#"{
            "number": 12,
            "title": "[AUDITORÍA] Ciclo",
            "body": null,
            "created_at": "2024-12-05T10:00:00Z",
            "closed_at": null,
            "state": "open",
            "labels": []
        }"#;
        let issue: IssueRecord = serde_json::from_str(json).unwrap();
        assert_eq!(issue.number, 12);
        assert_eq!(issue.body_text(), "");
        assert!(issue.closed_at.is_none());
    }

    #[test]
    fn test_issue_deserialize_timestamp_without_offset() {
        let json = r#"{
            "number": 3,
            "title": "[AUDITORÍA] Ciclo",
            "body": "",
            "created_at": "2024-12-05T10:00:00",
            "closed_at": "2024-12-06 08:30:00",
            "state": "closed"
        }"#;
        let issue: IssueRecord = serde_json::from_str(json).unwrap();
        assert_eq!(issue.created_at.to_rfc3339(), "2024-12-05T10:00:00+00:00");
        assert_eq!(
            issue.closed_at.map(|t| t.to_rfc3339()),
            Some("2024-12-06T08:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(
            parse_timestamp("2024-12-05T10:00:00+02:00").map(|t| t.to_rfc3339()),
            Some("2024-12-05T08:00:00+00:00".to_string())
        );
        assert!(parse_timestamp("2024-12-05T10:00:00.250").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(10, 3), 70.0);
        assert_eq!(success_rate(0, 0), 100.0);
        assert_eq!(success_rate(2, 5), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666_666, 2), 66.67);
        assert_eq!(round_to(66.666_666, 1), 66.7);
        assert_eq!(round_to(50.0, 2), 50.0);
    }
}
