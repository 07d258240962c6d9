//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::source::IssueSource;
use clap::Parser;
use std::path::PathBuf;

/// AuditLens - agent-framework audit analyzer
///
/// Parses audit-cycle issues (100 recorded agent uses each), computes
/// per-agent and global compliance metrics, grades the cycle and writes a
/// markdown report, an SVG badge and a rolling history.
///
/// Examples:
///   auditlens --sample
///   auditlens --file audits.json --output-dir reports
///   auditlens --github-repo owner/repo --latest --fail-below B
///   auditlens --file audit.json --inspect
///   auditlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file with one issue object or an array of issues
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["github_repo", "sample"])]
    pub file: Option<PathBuf>,

    /// GitHub repository to list audit issues from (owner/repo)
    ///
    /// Defaults to the [github] section of the config file when a token is set.
    #[arg(long, value_name = "OWNER/REPO", conflicts_with = "sample")]
    pub github_repo: Option<String>,

    /// GitHub token used for the issues API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Analyze the built-in sample audit
    #[arg(long)]
    pub sample: bool,

    /// Analyze only this issue number
    #[arg(short, long, value_name = "NUMBER", conflicts_with = "latest")]
    pub issue: Option<u64>,

    /// Analyze only the newest audit issue
    #[arg(short, long)]
    pub latest: bool,

    /// Directory for the report, badge, analysis and history
    ///
    /// Overrides [output].reports_dir from the config file.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .auditlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Also print the report to stdout in this format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub print: Option<OutputFormat>,

    /// Do not update audit-history.json
    #[arg(long)]
    pub no_history: bool,

    /// Print the markdown tables found in each issue and exit
    #[arg(long)]
    pub inspect: bool,

    /// Fail if the computed grade ranks below this grade
    ///
    /// Useful for CI pipelines. Exit code 2 when the gate trips.
    #[arg(long, value_name = "GRADE")]
    pub fail_below: Option<String>,

    /// Generate a default .auditlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref repo) = self.github_repo {
            match repo.split_once('/') {
                Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {}
                _ => return Err("GitHub repository must be in the form owner/repo".to_string()),
            }
        }

        if let Some(ref file) = self.file {
            if !file.is_file() {
                return Err(format!("Issue file does not exist: {}", file.display()));
            }
        }

        if let Some(ref grade) = self.fail_below {
            if grade.trim().is_empty() {
                return Err("--fail-below needs a grade".to_string());
            }
        }

        Ok(())
    }

    /// Where the issues come from.
    ///
    /// An explicit file or repository wins; otherwise the configured
    /// repository is used when a token is available, else the sample.
    pub fn issue_source(&self, owner: &str, repo: &str) -> IssueSource {
        if let Some(ref file) = self.file {
            return IssueSource::File(file.clone());
        }
        if self.sample {
            return IssueSource::Sample;
        }
        if self.github_repo.is_some() || self.token.is_some() {
            return IssueSource::GitHub {
                owner: owner.to_string(),
                repo: repo.to_string(),
                token: self.token.clone(),
            };
        }
        IssueSource::Sample
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
