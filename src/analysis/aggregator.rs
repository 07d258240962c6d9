//! Audit aggregation and statistics.
//!
//! This module folds a newest-first sequence of audit records into the
//! metrics the report is built from. The newest record is the "current"
//! snapshot for per-agent metrics and the violation histogram; every
//! record feeds the environment comparison and the timeline.

use crate::config::Config;
use crate::models::{round_to, success_rate, AuditRecord, Environment, TrialRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of agents in each ranking.
pub const RANKING_SIZE: usize = 5;

/// Keyword rules classifying a failed trial by its note; first match wins.
const NOTE_RULES: &[(&[&str], &str)] = &[
    (&["herramienta", "tool"], "used_prohibited_tools"),
    (&["implementó", "código"], "implemented_code"),
    (&["handoff"], "no_handoff"),
    (&["scope", "fuera"], "out_of_scope"),
];

/// Tag for failed trials no keyword rule recognizes.
const CATCH_ALL_TAG: &str = "ignored_metadata";

/// Snapshot of the newest audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub audit_id: String,
    pub issue_number: u64,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    pub environment: Environment,
    pub total_uses: u32,
    pub total_violations: u32,
}

/// Headline rates of the newest audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    pub success_rate_pct: f64,
    pub violation_rate_pct: f64,
}

/// Current metrics of one roster agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub agent_id: String,
    pub display_name: String,
    pub role: String,
    pub uses: u32,
    pub violations: u32,
    pub success_rate_pct: f64,
    /// Notes of this agent's failed trials in the newest audit.
    pub violation_details: Vec<String>,
}

/// Totals of every audit run in one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSummary {
    pub environment: Environment,
    pub name: String,
    pub uses: u32,
    pub violations: u32,
    pub success_rate_pct: f64,
}

/// One bucket of the violation histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationCount {
    pub violation_type: String,
    pub count: u32,
}

/// One audit on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: DateTime<Utc>,
    pub success_rate_pct: f64,
    pub violation_count: u32,
    pub environment: Environment,
}

/// Everything derived from a sequence of audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub metadata: AuditMetadata,
    pub global: GlobalMetrics,
    /// Every roster agent, in roster order, including unused ones.
    pub agent_metrics: Vec<AgentMetrics>,
    pub top_agents: Vec<AgentMetrics>,
    pub bottom_agents: Vec<AgentMetrics>,
    pub environments: Vec<EnvironmentSummary>,
    pub violation_histogram: Vec<ViolationCount>,
    /// Oldest first.
    pub timeline: Vec<TimelinePoint>,
    pub raw_trials: Vec<TrialRecord>,
}

impl AggregatedResult {
    /// Agents with at least one recorded use.
    pub fn active_agents(&self) -> impl Iterator<Item = &AgentMetrics> {
        self.agent_metrics.iter().filter(|a| a.uses > 0)
    }

    /// Histogram buckets with at least one case, largest first.
    pub fn nonzero_violations(&self) -> Vec<&ViolationCount> {
        let mut counts: Vec<_> = self
            .violation_histogram
            .iter()
            .filter(|v| v.count > 0)
            .collect();
        counts.sort_by_key(|v| std::cmp::Reverse(v.count));
        counts
    }
}

/// Aggregate audits ordered newest first.
///
/// Returns `None` when there is nothing to aggregate.
pub fn aggregate(audits: &[AuditRecord], config: &Config) -> Option<AggregatedResult> {
    let latest = audits.first()?;

    let agent_metrics = agent_metrics(latest, config);
    let (top_agents, bottom_agents) = rank_agents(&agent_metrics);

    Some(AggregatedResult {
        metadata: AuditMetadata {
            audit_id: latest.audit_id(),
            issue_number: latest.issue_number,
            date: latest.date(),
            closed_at: latest.closed_at,
            environment: latest.environment,
            total_uses: latest.total_uses,
            total_violations: latest.total_violations,
        },
        global: GlobalMetrics {
            success_rate_pct: latest.success_rate_pct,
            violation_rate_pct: round_to(100.0 - latest.success_rate_pct, 2),
        },
        agent_metrics,
        top_agents,
        bottom_agents,
        environments: environment_comparison(audits, config),
        violation_histogram: violation_histogram(latest, config),
        timeline: timeline(audits),
        raw_trials: latest.trials.clone(),
    })
}

/// Metrics for every roster agent from the newest audit's breakdown.
pub fn agent_metrics(latest: &AuditRecord, config: &Config) -> Vec<AgentMetrics> {
    config
        .agents
        .iter()
        .map(|agent| {
            let entry = latest
                .agent_breakdown
                .iter()
                .find(|e| e.agent_id == agent.id);

            AgentMetrics {
                agent_id: agent.id.clone(),
                display_name: agent.name.clone(),
                role: agent.role.clone(),
                uses: entry.map_or(0, |e| e.uses),
                violations: entry.map_or(0, |e| e.failures),
                success_rate_pct: entry.map_or(100.0, |e| e.success_rate_pct),
                violation_details: latest
                    .failed_trials()
                    .filter(|t| t.agent_id == agent.id)
                    .map(|t| t.note.clone())
                    .collect(),
            }
        })
        .collect()
}

/// Top and bottom agents among those with recorded uses.
///
/// Stable sort by rate, descending; ties keep roster order. The bottom
/// list is worst first.
pub fn rank_agents(metrics: &[AgentMetrics]) -> (Vec<AgentMetrics>, Vec<AgentMetrics>) {
    let mut sorted: Vec<AgentMetrics> = metrics.iter().filter(|a| a.uses > 0).cloned().collect();
    sorted.sort_by(|a, b| b.success_rate_pct.total_cmp(&a.success_rate_pct));

    let top = sorted.iter().take(RANKING_SIZE).cloned().collect();
    let bottom = sorted.iter().rev().take(RANKING_SIZE).cloned().collect();

    (top, bottom)
}

/// Per-environment totals across all audits, in configured order.
pub fn environment_comparison(audits: &[AuditRecord], config: &Config) -> Vec<EnvironmentSummary> {
    config
        .environments
        .iter()
        .filter_map(|env| {
            let matching: Vec<&AuditRecord> =
                audits.iter().filter(|a| a.environment == env.id).collect();
            if matching.is_empty() {
                return None;
            }

            let uses: u32 = matching.iter().map(|a| a.total_uses).sum();
            let violations: u32 = matching.iter().map(|a| a.total_violations).sum();

            Some(EnvironmentSummary {
                environment: env.id,
                name: env.name.clone(),
                uses,
                violations,
                success_rate_pct: round_to(success_rate(uses, violations), 2),
            })
        })
        .collect()
}

/// Classify a failed trial's note into a violation-type tag.
pub fn classify_note(note: &str) -> &'static str {
    let note = note.to_lowercase();
    NOTE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| note.contains(k)))
        .map_or(CATCH_ALL_TAG, |(_, tag)| *tag)
}

/// Histogram of the newest audit's failed trials by violation type.
///
/// Every configured type starts at zero.
pub fn violation_histogram(latest: &AuditRecord, config: &Config) -> Vec<ViolationCount> {
    let mut histogram: Vec<ViolationCount> = config
        .violation_types
        .iter()
        .map(|v| ViolationCount {
            violation_type: v.id.clone(),
            count: 0,
        })
        .collect();

    for trial in latest.failed_trials() {
        let tag = classify_note(&trial.note);
        match histogram.iter_mut().find(|v| v.violation_type == tag) {
            Some(bucket) => bucket.count += 1,
            None => histogram.push(ViolationCount {
                violation_type: tag.to_string(),
                count: 1,
            }),
        }
    }

    histogram
}

/// Timeline of all audits, oldest first.
pub fn timeline(audits: &[AuditRecord]) -> Vec<TimelinePoint> {
    audits
        .iter()
        .rev()
        .map(|a| TimelinePoint {
            date: a.created_at,
            success_rate_pct: a.success_rate_pct,
            violation_count: a.total_violations,
            environment: a.environment,
        })
        .collect()
}
