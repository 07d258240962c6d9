//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.auditlens.toml` files. The configuration carries the agent roster,
//! environments, violation-type tags and grade tiers that every pipeline
//! stage receives explicitly.

use crate::error::AuditError;
use crate::models::Environment;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".auditlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Issue tracker settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Agent roster, in display order.
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,

    /// Known environments, in display order.
    #[serde(default = "default_environments")]
    pub environments: Vec<EnvironmentConfig>,

    /// Violation-type tags, in display order.
    #[serde(default = "default_violation_types")]
    pub violation_types: Vec<ViolationTypeConfig>,

    /// Grade tiers, strictest first.
    #[serde(default = "default_grades")]
    pub grades: Vec<GradeTier>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            output: OutputConfig::default(),
            agents: default_agents(),
            environments: default_environments(),
            violation_types: default_violation_types(),
            grades: default_grades(),
        }
    }
}

/// GitHub issue source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository owner.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Labels an audit issue carries.
    #[serde(default = "default_labels")]
    pub audit_labels: Vec<String>,

    /// Title prefix of audit issues.
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            audit_labels: default_labels(),
            title_prefix: default_title_prefix(),
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_owner() -> String {
    "Angel-Baez".to_string()
}

fn default_repo() -> String {
    "mern-agents-framework".to_string()
}

fn default_labels() -> Vec<String> {
    vec!["audit".to_string()]
}

fn default_title_prefix() -> String {
    "[AUDITORÍA]".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the report, badge, analysis and history.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: String,

    /// Maximum entries kept in the history file.
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// Width of the success-rate progress bar.
    #[serde(default = "default_progress_width")]
    pub progress_width: usize,

    /// Width of the per-agent bar chart.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
            history_cap: default_history_cap(),
            progress_width: default_progress_width(),
            chart_width: default_chart_width(),
        }
    }
}

fn default_reports_dir() -> String {
    "docs/audit-results".to_string()
}

fn default_history_cap() -> usize {
    50
}

fn default_progress_width() -> usize {
    20
}

fn default_chart_width() -> usize {
    30
}

/// One agent of the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Identifier as written in audit tables (kebab-case).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short role description.
    pub role: String,
    /// Tools the agent must never call.
    #[serde(default)]
    pub forbidden_tools: Vec<String>,
}

/// One environment an audit can run in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub id: Environment,
    pub name: String,
}

/// One violation-type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationTypeConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One tier of the grading table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeTier {
    /// Letter grade ("A+", "A", ...).
    pub grade: String,
    /// Minimum success rate in percent.
    pub min_success_rate: f64,
    /// Maximum violation count; unbounded when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_violations: Option<u32>,
    /// Human-readable meaning of the grade.
    #[serde(default)]
    pub description: String,
    /// Text color token.
    #[serde(default)]
    pub color: String,
    /// Badge color token (brightgreen, green, yellow, orange, red).
    #[serde(default)]
    pub badge_color: String,
}

impl GradeTier {
    /// Whether a result falls inside this tier.
    pub fn admits(&self, success_rate_pct: f64, violations: u32) -> bool {
        success_rate_pct >= self.min_success_rate
            && self.max_violations.map_or(true, |max| violations <= max)
    }
}

fn agent(id: &str, name: &str, role: &str, forbidden: &[&str]) -> AgentConfig {
    AgentConfig {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        forbidden_tools: forbidden.iter().map(|t| t.to_string()).collect(),
    }
}

fn default_agents() -> Vec<AgentConfig> {
    const WRITE_TOOLS: &[&str] = &["create_file", "edit_file", "run_in_terminal"];
    vec![
        agent("orchestrator", "Orchestrator", "Router", WRITE_TOOLS),
        agent("backend-architect", "Backend Architect", "Implementation", &["deploy"]),
        agent("frontend-architect", "Frontend Architect", "Implementation", &["deploy"]),
        agent("data-engineer", "Data Engineer", "Implementation", &["deploy"]),
        agent("solution-architect", "Solution Architect", "Design", WRITE_TOOLS),
        agent("security-guardian", "Security Guardian", "Review", &["edit_file"]),
        agent("test-engineer", "Test Engineer", "Quality", &["deploy"]),
        agent("qa-lead", "QA Lead", "Quality", WRITE_TOOLS),
        agent("code-reviewer", "Code Reviewer", "Review", &["create_file", "edit_file"]),
        agent("documentation-engineer", "Documentation Engineer", "Documentation", &["run_in_terminal"]),
        agent("ai-integration-engineer", "AI Integration Engineer", "Implementation", &["deploy"]),
        agent("observability-engineer", "Observability Engineer", "Operations", &["edit_file"]),
        agent("product-manager", "Product Manager", "Planning", WRITE_TOOLS),
        agent("release-manager", "Release Manager", "Operations", &["create_file", "edit_file"]),
        agent("devops-engineer", "DevOps Engineer", "Operations", &["edit_file"]),
    ]
}

fn default_environments() -> Vec<EnvironmentConfig> {
    vec![
        EnvironmentConfig {
            id: Environment::Vscode,
            name: "VSCode Chat".to_string(),
        },
        EnvironmentConfig {
            id: Environment::Github,
            name: "GitHub Copilot Chat".to_string(),
        },
    ]
}

fn default_violation_types() -> Vec<ViolationTypeConfig> {
    [
        ("used_prohibited_tools", "Prohibited tools", "Agent called a tool outside its allowed set"),
        ("implemented_code", "Router implemented code", "Router wrote code instead of delegating"),
        ("no_handoff", "Missing handoff", "Agent did not hand off to the responsible agent"),
        ("out_of_scope", "Out of scope", "Implementation beyond the agent's scope"),
        ("started_mcp_server", "Started MCP server", "Agent started an MCP server on its own"),
        ("ignored_metadata", "Ignored metadata", "Agent ignored its role metadata"),
        ("failed_verification", "Failed verification", "Agent skipped or failed its checks"),
    ]
    .into_iter()
    .map(|(id, name, description)| ViolationTypeConfig {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    })
    .collect()
}

fn default_grades() -> Vec<GradeTier> {
    [
        ("A+", 100.0, Some(0), "Perfect: no violations", "#10b981", "brightgreen"),
        ("A", 97.0, Some(3), "Minor adjustment needed", "#22c55e", "green"),
        ("B", 90.0, Some(10), "Moderate adjustment needed", "#eab308", "yellow"),
        ("C", 80.0, Some(20), "Review needed", "#f97316", "orange"),
        ("D", 0.0, None, "Deep review needed", "#ef4444", "red"),
    ]
    .into_iter()
    .map(
        |(grade, min_success_rate, max_violations, description, color, badge_color)| GradeTier {
            grade: grade.to_string(),
            min_success_rate,
            max_violations,
            description: description.to_string(),
            color: color.to_string(),
            badge_color: badge_color.to_string(),
        },
    )
    .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check that the roster and grade table can drive the pipeline.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.agents.is_empty() {
            return Err(AuditError::InvalidConfig("agent roster is empty".to_string()));
        }
        if self.grades.is_empty() {
            return Err(AuditError::InvalidConfig("no grade tiers configured".to_string()));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.id.as_str()) {
                return Err(AuditError::InvalidConfig(format!(
                    "duplicate agent id '{}'",
                    agent.id
                )));
            }
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.output.reports_dir = dir.display().to_string();
        }

        if let Some((owner, repo)) = args.github_repo.as_deref().and_then(split_repo) {
            self.github.owner = owner.to_string();
            self.github.repo = repo.to_string();
        }
    }

    /// Whether `id` belongs to the roster.
    pub fn is_known_agent(&self, id: &str) -> bool {
        self.agents.iter().any(|a| a.id == id)
    }

    /// Roster entry for `id`.
    pub fn agent(&self, id: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Display name of an environment, falling back to its tag.
    pub fn environment_name(&self, env: Environment) -> String {
        self.environments
            .iter()
            .find(|e| e.id == env)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| env.to_string())
    }

    /// Violation-type entry for `id`.
    pub fn violation_type(&self, id: &str) -> Option<&ViolationTypeConfig> {
        self.violation_types.iter().find(|v| v.id == id)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Split an `owner/repo` string.
fn split_repo(s: &str) -> Option<(&str, &str)> {
    let (owner, repo) = s.split_once('/')?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner, repo))
}
