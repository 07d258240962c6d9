//! GitHub issues client.
//!
//! Lists audit issues through the REST API and keeps the ones whose title
//! marks them as audit cycles.

use crate::config::GitHubConfig;
use crate::error::AuditError;
use crate::models::IssueRecord;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Page size requested from the issues endpoint.
const PER_PAGE: u32 = 100;

/// Fallback title marker for audit issues.
const AUDIT_TITLE_MARKER: &str = "auditoría";

/// Thin client over the issues endpoint.
pub struct GitHubClient {
    http_client: reqwest::Client,
    config: GitHubConfig,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        config: &GitHubConfig,
        owner: String,
        repo: String,
        token: Option<String>,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("auditlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            config: config.clone(),
            owner,
            repo,
            token,
        })
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.config.api_url.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }

    /// Fetch audit issues, newest first.
    pub async fn fetch_audit_issues(&self, show_progress: bool) -> Result<Vec<IssueRecord>> {
        let spinner = if show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .context("Invalid progress template")?,
            );
            pb.set_message(format!(
                "Fetching audit issues from {}/{}",
                self.owner, self.repo
            ));
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        let result = self.request_issues().await;

        if let Some(pb) = spinner {
            match &result {
                Ok(issues) => pb.finish_with_message(format!("Fetched {} issues", issues.len())),
                Err(_) => pb.abandon_with_message("Fetch failed"),
            }
        }

        let issues = result?;
        let total = issues.len();
        let audits: Vec<IssueRecord> = issues
            .into_iter()
            .filter(|issue| is_audit_title(&issue.title, &self.config.title_prefix))
            .collect();

        info!(
            "Found {} audit issues ({} issues listed)",
            audits.len(),
            total
        );
        Ok(audits)
    }

    async fn request_issues(&self) -> Result<Vec<IssueRecord>> {
        let url = self.issues_url();
        let labels = self.config.audit_labels.join(",");
        let per_page = PER_PAGE.to_string();
        debug!("GET {} labels={}", url, labels);

        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("labels", labels.as_str()),
                ("state", "all"),
                ("sort", "created"),
                ("direction", "desc"),
                ("per_page", per_page.as_str()),
            ]);

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!("Request timed out after {}s", self.config.timeout_seconds)
            } else if e.is_connect() {
                anyhow::anyhow!("Cannot connect to {}", self.config.api_url)
            } else {
                anyhow::anyhow!("Failed to send request: {}", e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Api { status, body }.into());
        }

        response
            .json::<Vec<IssueRecord>>()
            .await
            .context("Failed to parse issues response")
    }
}

/// Whether a title names an audit cycle.
pub fn is_audit_title(title: &str, prefix: &str) -> bool {
    (!prefix.is_empty() && title.contains(prefix))
        || title.to_lowercase().contains(AUDIT_TITLE_MARKER)
}
