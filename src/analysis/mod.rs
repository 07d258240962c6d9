//! Analysis modules.
//!
//! Assembly turns one issue into an audit record, aggregation folds many
//! records into metrics, and grading maps the headline numbers to a tier.

pub mod aggregator;
pub mod assembler;
pub mod grader;

pub use aggregator::*;
pub use assembler::assemble_audit;
pub use grader::Grader;

use crate::config::GradeTier;
use serde::{Deserialize, Serialize};

/// Aggregated metrics together with the grade they earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditAnalysis {
    #[serde(flatten)]
    pub result: AggregatedResult,
    pub grade: GradeTier,
}

impl AuditAnalysis {
    /// Grade an aggregated result.
    pub fn new(result: AggregatedResult, grader: &Grader<'_>) -> Self {
        let grade = grader
            .grade(result.global.success_rate_pct, result.metadata.total_violations)
            .clone();
        Self { result, grade }
    }
}
