//! Builds one normalized audit record per issue.
//!
//! Precedence rules:
//! - `total_uses`: number of parsed trials, or [`EXPECTED_USES`] when the
//!   trial table is missing.
//! - `total_violations`: the declared total when non-zero, else the number
//!   of failed trials; never more than `total_uses`.
//! - `agent_breakdown`: the explicit table when present, else folded from
//!   the trials.
//! - `success_rate_pct`: always recomputed from the two totals.

use crate::config::Config;
use crate::models::{round_to, success_rate, AuditRecord, IssueRecord};
use crate::parser::{
    derive_breakdown, extract_declared_violations, extract_environment, extract_violation_types,
    parse_breakdown, parse_trials,
};
use tracing::debug;

/// Size of one audit cycle.
pub const EXPECTED_USES: u32 = 100;

/// Parse an issue into an audit record.
pub fn assemble_audit(issue: &IssueRecord, config: &Config) -> AuditRecord {
    let body = issue.body_text();

    let trials = parse_trials(body, config);
    let explicit_breakdown = parse_breakdown(body, config);
    let agent_breakdown = if explicit_breakdown.is_empty() {
        derive_breakdown(&trials)
    } else {
        explicit_breakdown
    };

    let total_uses = if trials.is_empty() {
        EXPECTED_USES
    } else {
        u32::try_from(trials.len()).unwrap_or(u32::MAX)
    };

    let failed = trials.iter().filter(|t| !t.success).count() as u32;
    let declared = extract_declared_violations(body);
    let total_violations = if declared > 0 { declared } else { failed }.min(total_uses);

    debug!(
        "Issue #{}: {} trials, {} declared / {} counted violations",
        issue.number,
        trials.len(),
        declared,
        failed
    );

    AuditRecord {
        issue_number: issue.number,
        title: issue.title.clone(),
        created_at: issue.created_at,
        closed_at: issue.closed_at,
        state: issue.state.clone(),
        environment: extract_environment(body),
        total_uses,
        total_violations,
        success_rate_pct: round_to(success_rate(total_uses, total_violations), 2),
        violation_types: extract_violation_types(body),
        trials,
        agent_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Environment;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn issue(body: Option<&str>) -> IssueRecord {
        IssueRecord {
            number: 7,
            title: "[AUDITORÍA] Ciclo de 100 usos".to_string(),
            body: body.map(String::from),
            created_at: Utc.with_ymd_and_hms(2024, 12, 5, 9, 30, 0).unwrap(),
            closed_at: None,
            state: "open".to_string(),
        }
    }

    fn trial_table(outcomes: &[bool]) -> String {
        let mut table = String::from("| Uso | Agente | Resultado | Observación |\n|---|---|---|---|\n");
        for (i, ok) in outcomes.iter().enumerate() {
            let marker = if *ok { "✓" } else { "✗" };
            table.push_str(&format!("| {} | orchestrator | {} | nota |\n", i + 1, marker));
        }
        table
    }

    #[test]
    fn test_missing_body_defaults() {
        let record = assemble_audit(&issue(None), &Config::default());

        assert_eq!(record.environment, Environment::Unknown);
        assert!(record.violation_types.is_empty());
        assert!(record.trials.is_empty());
        assert!(record.agent_breakdown.is_empty());
        assert_eq!(record.total_uses, 100);
        assert_eq!(record.total_violations, 0);
        assert_eq!(record.success_rate_pct, 100.0);
    }

    #[test]
    fn test_declared_total_wins() {
        let outcomes = [true, true, false, true, true, true, false, true, true, true];
        let body = format!("{}\n### Total de Violaciones\n3\n", trial_table(&outcomes));
        let record = assemble_audit(&issue(Some(&body)), &Config::default());

        assert_eq!(record.total_uses, 10);
        assert_eq!(record.total_violations, 3);
        assert_eq!(record.success_rate_pct, 70.0);
    }

    #[test]
    fn test_counted_failures_when_not_declared() {
        let body = trial_table(&[true, false, true, true]);
        let record = assemble_audit(&issue(Some(&body)), &Config::default());

        assert_eq!(record.total_uses, 4);
        assert_eq!(record.total_violations, 1);
        assert_eq!(record.success_rate_pct, 75.0);
    }

    #[test]
    fn test_derived_breakdown_scenario() {
        let body = "| 1 | orchestrator | ✓ | ok |\n| 2 | orchestrator | ✗ | implementó código |\n";
        let record = assemble_audit(&issue(Some(body)), &Config::default());

        assert_eq!(record.trials.len(), 2);
        assert_eq!(record.agent_breakdown.len(), 1);
        let entry = &record.agent_breakdown[0];
        assert_eq!(entry.agent_id, "orchestrator");
        assert_eq!(entry.uses, 2);
        assert_eq!(entry.failures, 1);
        assert_eq!(entry.success_rate_pct, 50.0);
    }

    #[test]
    fn test_blank_marker_row_keeps_derived_breakdown() {
        let body = "| 1 | orchestrator | ✓ | ok |\n| 2 | qa-lead |  |  |\n| 3 | orchestrator | ✓ | ok |\n";
        let record = assemble_audit(&issue(Some(body)), &Config::default());

        assert_eq!(record.trials.len(), 3);
        assert_eq!(record.total_violations, 1);
        assert_eq!(record.agent_breakdown.len(), 2);

        let orchestrator = &record.agent_breakdown[0];
        assert_eq!(orchestrator.agent_id, "orchestrator");
        assert_eq!(orchestrator.uses, 2);
        assert_eq!(orchestrator.failures, 0);

        let qa_lead = &record.agent_breakdown[1];
        assert_eq!(qa_lead.agent_id, "qa-lead");
        assert_eq!(qa_lead.uses, 1);
        assert_eq!(qa_lead.failures, 1);
        assert_eq!(qa_lead.success_rate_pct, 0.0);
    }

    #[test]
    fn test_explicit_breakdown_precedence() {
        let body = format!(
            "{}\n| Agente | Usos | Fallas | % Éxito |\n|---|---|---|---|\n| orchestrator | 40 | 2 | 95% |\n",
            trial_table(&[true, false])
        );
        let record = assemble_audit(&issue(Some(&body)), &Config::default());

        assert_eq!(record.agent_breakdown.len(), 1);
        assert_eq!(record.agent_breakdown[0].uses, 40);
        assert_eq!(record.agent_breakdown[0].success_rate_pct, 95.0);
    }

    #[test]
    fn test_declared_total_capped_by_uses() {
        let body = format!("{}\nTotal de violaciones: 9\n", trial_table(&[true, false]));
        let record = assemble_audit(&issue(Some(&body)), &Config::default());

        assert_eq!(record.total_uses, 2);
        assert_eq!(record.total_violations, 2);
        assert_eq!(record.success_rate_pct, 0.0);
    }

    #[test]
    fn test_unknown_agents_do_not_count() {
        let body = "| 1 | orchestrator | ✓ | ok |\n| 2 | ghost-agent | ✗ | x |\n| 3 | qa-lead | ✗ | y |\n";
        let record = assemble_audit(&issue(Some(body)), &Config::default());

        assert_eq!(record.total_uses, 2);
        assert_eq!(record.total_violations, 1);
    }

    proptest! {
        #[test]
        fn property_record_totals_are_consistent(
            outcomes in proptest::collection::vec(any::<bool>(), 0..60),
            declared in proptest::option::of(0u32..200),
        ) {
            let mut body = trial_table(&outcomes);
            if let Some(n) = declared {
                body.push_str(&format!("\nTotal de Violaciones: {}\n", n));
            }
            let record = assemble_audit(&issue(Some(&body)), &Config::default());

            let expected_uses = if outcomes.is_empty() { 100 } else { outcomes.len() as u32 };
            prop_assert_eq!(record.total_uses, expected_uses);
            prop_assert!(record.total_violations <= record.total_uses);
            prop_assert!((0.0..=100.0).contains(&record.success_rate_pct));
        }
    }
}
