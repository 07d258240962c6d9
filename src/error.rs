//! Fatal error conditions surfaced to the caller.
//!
//! Parsing never fails; these cover the few situations where there is
//! nothing sensible to fall back to.

use thiserror::Error;

/// Errors that stop an audit run.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The requested issue was not among the fetched candidates.
    #[error("Issue #{0} not found among audit issues")]
    IssueNotFound(u64),

    /// Nothing to aggregate.
    #[error("No audit data found")]
    NoAudits,

    /// The configuration cannot drive the pipeline.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The issue tracker answered with a non-success status.
    #[error("GitHub API error {status}: {body}")]
    Api { status: u16, body: String },
}
