//! Trial table parsing.
//!
//! Reads the "100 uses" table (`| Uso | Agente | Resultado | Observación |`)
//! row by row. Rows whose agent is not on the roster are skipped, since
//! other tables in the same document share the four-cell shape.

use crate::config::Config;
use crate::models::TrialRecord;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref TRIAL_ROW: Regex = Regex::new(
        r"\|[ \t]*([0-9]+)[ \t]*\|[ \t]*([^|\n]*)[ \t]*\|[ \t]*([✓✗×✔]|[^|\n]*)[ \t]*\|[ \t]*([^|\n]*)[ \t]*\|"
    )
    .unwrap();
}

/// Glyphs that mark a successful use.
const SUCCESS_GLYPHS: &[char] = &['✓', '✔', '✅'];

/// Placeholder rows authors leave in unfinished tables.
const PLACEHOLDER: &str = "...";

/// Parse every trial row of `text` whose agent is on the roster.
pub fn parse_trials(text: &str, config: &Config) -> Vec<TrialRecord> {
    let mut trials = Vec::new();
    let mut skipped = 0usize;

    for caps in TRIAL_ROW.captures_iter(text) {
        let agent_id = normalize_agent_id(&caps[2]);
        let index = caps[1].parse::<u32>().ok().filter(|n| *n >= 1);

        match index {
            Some(index)
                if !agent_id.is_empty()
                    && agent_id != PLACEHOLDER
                    && config.is_known_agent(&agent_id) =>
            {
                trials.push(TrialRecord {
                    index,
                    agent_id,
                    success: is_success_marker(&caps[3]),
                    note: caps[4].trim().to_string(),
                });
            }
            _ => skipped += 1,
        }
    }

    debug!("Parsed {} trials ({} rows skipped)", trials.len(), skipped);
    trials
}

/// Lowercase an agent cell and join its words with hyphens.
pub fn normalize_agent_id(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// A result cell counts as success only on a check glyph or "ok".
pub fn is_success_marker(cell: &str) -> bool {
    cell.contains(SUCCESS_GLYPHS) || cell.to_lowercase().contains("ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_row_table() {
        let text = "| 1 | orchestrator | ✓ | ok |\n| 2 | orchestrator | ✗ | implementó código |\n";
        let trials = parse_trials(text, &Config::default());

        assert_eq!(trials.len(), 2);
        assert_eq!(
            trials[0],
            TrialRecord {
                index: 1,
                agent_id: "orchestrator".to_string(),
                success: true,
                note: "ok".to_string(),
            }
        );
        assert!(!trials[1].success);
        assert_eq!(trials[1].note, "implementó código");
    }

    #[test]
    fn test_full_table_with_header() {
        let text = "\
| Uso | Agente | Resultado | Observación |
|-----|--------|-----------|-------------|
| 1   | orchestrator | ✓ | Handoff correcto |
| 2   | Backend Architect | ✔ | Endpoint creado |
| 3   | unknown-bot | ✓ | ignored |
| 4   | ... | ✗ | placeholder |
| 5   | qa-lead | ✗ | Saltó verificaciones |
";
        let trials = parse_trials(text, &Config::default());

        let ids: Vec<_> = trials.iter().map(|t| t.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["orchestrator", "backend-architect", "qa-lead"]);
        assert_eq!(trials[2].index, 5);
        assert!(!trials[2].success);
    }

    #[test]
    fn test_short_row_does_not_swallow_next_row() {
        let text = "| 1 | orchestrator | ✓ | ok |\n| 2 | qa-lead | ✗ |\n| 3 | qa-lead | ✓ | ok |\n";
        let trials = parse_trials(text, &Config::default());

        let indices: Vec<_> = trials.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert!(trials[1].success);
    }

    #[test]
    fn test_blank_marker_is_failure() {
        let text = "| 1 | orchestrator | ✓ | ok |\n| 2 | qa-lead |  |  |\n";
        let trials = parse_trials(text, &Config::default());

        assert_eq!(trials.len(), 2);
        assert!(!trials[1].success);
        assert_eq!(trials[1].note, "");
    }

    #[test]
    fn test_success_markers() {
        assert!(is_success_marker("✓"));
        assert!(is_success_marker(" ✔ "));
        assert!(is_success_marker("✅"));
        assert!(is_success_marker("OK"));
        assert!(!is_success_marker("✗"));
        assert!(!is_success_marker("×"));
        assert!(!is_success_marker(""));
        assert!(!is_success_marker("failed"));
    }

    #[test]
    fn test_normalize_agent_id() {
        assert_eq!(normalize_agent_id("  Backend   Architect "), "backend-architect");
        assert_eq!(normalize_agent_id("qa-lead"), "qa-lead");
        assert_eq!(normalize_agent_id("   "), "");
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_trials("", &Config::default()).is_empty());
    }
}
