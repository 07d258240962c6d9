//! Where audit issues come from.
//!
//! A source yields raw issue records; everything after that is pure
//! parsing and aggregation.

pub mod github;

use crate::config::Config;
use crate::error::AuditError;
use crate::models::IssueRecord;
use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

pub use github::GitHubClient;

/// Body of the built-in sample audit.
const SAMPLE_AUDIT_BODY: &str = include_str!("../../fixtures/sample_audit.md");

/// Origin of the issues to analyze.
#[derive(Debug, Clone)]
pub enum IssueSource {
    /// JSON file with one issue object or an array of them.
    File(PathBuf),
    /// Issues listed from a GitHub repository.
    GitHub {
        owner: String,
        repo: String,
        token: Option<String>,
    },
    /// The built-in sample audit.
    Sample,
}

/// A JSON document holding either one issue or many.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<IssueRecord>),
    One(Box<IssueRecord>),
}

impl IssueSource {
    /// Short description for progress output.
    pub fn describe(&self) -> String {
        match self {
            IssueSource::File(path) => format!("file {}", path.display()),
            IssueSource::GitHub { owner, repo, .. } => format!("github {}/{}", owner, repo),
            IssueSource::Sample => "built-in sample".to_string(),
        }
    }

    /// Load the issues of this source.
    pub async fn fetch(&self, config: &Config, show_progress: bool) -> Result<Vec<IssueRecord>> {
        let issues = match self {
            IssueSource::File(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                parse_issue_json(&content)
                    .with_context(|| format!("Failed to parse issues in {}", path.display()))?
            }
            IssueSource::GitHub { owner, repo, token } => {
                let client =
                    GitHubClient::new(&config.github, owner.clone(), repo.clone(), token.clone())?;
                client.fetch_audit_issues(show_progress).await?
            }
            IssueSource::Sample => vec![sample_issue()],
        };

        info!("Loaded {} issue(s) from {}", issues.len(), self.describe());
        Ok(issues)
    }
}

/// Parse a JSON document holding one issue or an array of issues.
pub fn parse_issue_json(content: &str) -> Result<Vec<IssueRecord>> {
    let parsed: OneOrMany = serde_json::from_str(content)?;
    Ok(match parsed {
        OneOrMany::Many(issues) => issues,
        OneOrMany::One(issue) => vec![*issue],
    })
}

/// The built-in sample audit issue.
pub fn sample_issue() -> IssueRecord {
    IssueRecord {
        number: 1,
        title: "[AUDITORÍA] Ciclo de 100 usos - Fecha: 2024-12-05".to_string(),
        body: Some(SAMPLE_AUDIT_BODY.to_string()),
        created_at: Utc
            .with_ymd_and_hms(2024, 12, 5, 9, 0, 0)
            .single()
            .unwrap_or_default(),
        closed_at: None,
        state: "open".to_string(),
    }
}

/// Narrow fetched issues (newest first) to the ones to analyze.
pub fn select_issues(
    issues: Vec<IssueRecord>,
    issue: Option<u64>,
    latest: bool,
) -> Result<Vec<IssueRecord>, AuditError> {
    if let Some(number) = issue {
        return issues
            .into_iter()
            .find(|i| i.number == number)
            .map(|i| vec![i])
            .ok_or(AuditError::IssueNotFound(number));
    }

    if latest {
        return Ok(issues.into_iter().take(1).collect());
    }

    Ok(issues)
}
