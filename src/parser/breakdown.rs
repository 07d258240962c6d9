//! Per-agent breakdown parsing.
//!
//! An audit may carry an explicit `| Agente | Usos | Fallas | % Éxito |`
//! summary. When it does, those numbers win; otherwise the breakdown is
//! folded from the parsed trials.

use crate::config::Config;
use crate::models::{round_to, success_rate, AgentBreakdownEntry, TrialRecord};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref BREAKDOWN_ROW: Regex = Regex::new(
        r"(?i)\|[ \t]*([a-z-]+)[ \t]*\|[ \t]*([0-9]+)?[ \t]*(?:usos?)?[ \t]*\|[ \t]*([0-9]+)?[ \t]*(?:fallas?)?[ \t]*\|[ \t]*([0-9]+(?:\.[0-9]+)?)?%?[ \t]*\|"
    )
    .unwrap();
}

/// Parse the explicit breakdown table of `text`.
///
/// Cells never span lines. Missing counts read as zero; a missing rate is
/// computed from the counts and rounded to one decimal, like derived rates.
pub fn parse_breakdown(text: &str, config: &Config) -> Vec<AgentBreakdownEntry> {
    let entries: Vec<AgentBreakdownEntry> = BREAKDOWN_ROW
        .captures_iter(text)
        .filter_map(|caps| {
            let agent_id = caps[1].trim().to_lowercase();
            if !config.is_known_agent(&agent_id) {
                return None;
            }

            let uses = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(0);
            let failures = caps
                .get(3)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0)
                .min(uses);
            let success_rate_pct = caps
                .get(4)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map(|rate| rate.clamp(0.0, 100.0))
                .unwrap_or_else(|| round_to(success_rate(uses, failures), 1));

            Some(AgentBreakdownEntry {
                agent_id,
                uses,
                failures,
                success_rate_pct,
            })
        })
        .collect();

    debug!("Parsed {} explicit breakdown entries", entries.len());
    entries
}

/// Fold trials into per-agent counts, in order of first appearance.
pub fn derive_breakdown(trials: &[TrialRecord]) -> Vec<AgentBreakdownEntry> {
    let mut entries: Vec<AgentBreakdownEntry> = Vec::new();

    for trial in trials {
        let pos = match entries.iter().position(|e| e.agent_id == trial.agent_id) {
            Some(pos) => pos,
            None => {
                entries.push(AgentBreakdownEntry {
                    agent_id: trial.agent_id.clone(),
                    uses: 0,
                    failures: 0,
                    success_rate_pct: 0.0,
                });
                entries.len() - 1
            }
        };

        let entry = &mut entries[pos];
        entry.uses += 1;
        if !trial.success {
            entry.failures += 1;
        }
    }

    for entry in &mut entries {
        entry.success_rate_pct = round_to(success_rate(entry.uses, entry.failures), 1);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(index: u32, agent: &str, success: bool) -> TrialRecord {
        TrialRecord {
            index,
            agent_id: agent.to_string(),
            success,
            note: String::new(),
        }
    }

    #[test]
    fn test_explicit_table() {
        let text = "\
| Agente | Usos | Fallas | % Éxito |
|--------|------|--------|---------|
| orchestrator | 3 | 1 | 66.7% |
| backend-architect | 2 | 0 | 100% |
| not-an-agent | 9 | 9 | 0% |
";
        let entries = parse_breakdown(text, &Config::default());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].agent_id, "orchestrator");
        assert_eq!(entries[0].uses, 3);
        assert_eq!(entries[0].failures, 1);
        assert_eq!(entries[0].success_rate_pct, 66.7);
        assert_eq!(entries[1].success_rate_pct, 100.0);
    }

    #[test]
    fn test_missing_cells_default() {
        let text = "| qa-lead | 4 | 1 | |\n\n| code-reviewer | | | |\n";
        let entries = parse_breakdown(text, &Config::default());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].success_rate_pct, 75.0);
        assert_eq!(entries[1].uses, 0);
        assert_eq!(entries[1].failures, 0);
        assert_eq!(entries[1].success_rate_pct, 100.0);
    }

    #[test]
    fn test_count_suffixes() {
        let text = "| Orchestrator | 5 usos | 2 fallas | 60% |\n";
        let entries = parse_breakdown(text, &Config::default());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].agent_id, "orchestrator");
        assert_eq!(entries[0].uses, 5);
        assert_eq!(entries[0].failures, 2);
    }

    #[test]
    fn test_trial_rows_are_not_breakdown_rows() {
        let text = "| 1 | orchestrator | ✓ | ok |\n| 2 | orchestrator | ✗ | implementó código |\n";
        assert!(parse_breakdown(text, &Config::default()).is_empty());
    }

    #[test]
    fn test_blank_trial_cells_are_not_breakdown_rows() {
        let text = "| 1 | orchestrator | ✓ | ok |\n| 2 | qa-lead |  |  |\n| 3 | orchestrator | ✓ | ok |\n";
        assert!(parse_breakdown(text, &Config::default()).is_empty());
    }

    #[test]
    fn test_missing_rate_is_rounded() {
        let text = "| orchestrator | 3 | 1 | |\n";
        assert_eq!(parse_breakdown(text, &Config::default())[0].success_rate_pct, 66.7);
    }

    #[test]
    fn test_derive_breakdown() {
        let trials = vec![
            trial(1, "orchestrator", true),
            trial(2, "qa-lead", true),
            trial(3, "orchestrator", false),
        ];
        let entries = derive_breakdown(&trials);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].agent_id, "orchestrator");
        assert_eq!(entries[0].uses, 2);
        assert_eq!(entries[0].failures, 1);
        assert_eq!(entries[0].success_rate_pct, 50.0);
        assert_eq!(entries[1].success_rate_pct, 100.0);
    }

    #[test]
    fn test_derive_rounds_to_one_decimal() {
        let trials = vec![
            trial(1, "orchestrator", true),
            trial(2, "orchestrator", true),
            trial(3, "orchestrator", false),
        ];
        assert_eq!(derive_breakdown(&trials)[0].success_rate_pct, 66.7);
    }
}
