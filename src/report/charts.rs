//! Text charts for the markdown report.

use crate::analysis::AgentMetrics;

const FILLED: &str = "█";
const EMPTY: &str = "░";

/// Fixed-width progress bar followed by the percentage.
pub fn progress_bar(pct: f64, width: usize) -> String {
    let filled = filled_cells(pct, width);
    format!(
        "[{}{}] {:.1}%",
        FILLED.repeat(filled),
        EMPTY.repeat(width - filled),
        pct
    )
}

/// One bar per agent, names padded to the longest display name.
pub fn agent_bar_chart(agents: &[&AgentMetrics], width: usize) -> String {
    let name_width = agents
        .iter()
        .map(|a| a.display_name.chars().count())
        .max()
        .unwrap_or(0);

    agents
        .iter()
        .map(|agent| {
            let bar = FILLED.repeat(filled_cells(agent.success_rate_pct, width));
            format!(
                "{:<name_width$} │ {:<width$} {:.1}% {}",
                agent.display_name,
                bar,
                agent.success_rate_pct,
                chart_icon(agent.success_rate_pct),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status glyph for a bar-chart line.
pub fn chart_icon(pct: f64) -> &'static str {
    if pct >= 90.0 {
        "✅"
    } else if pct >= 70.0 {
        "⚠️"
    } else {
        "❌"
    }
}

fn filled_cells(pct: f64, width: usize) -> usize {
    let filled = (pct.clamp(0.0, 100.0) / 100.0 * width as f64).round() as usize;
    filled.min(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(name: &str, rate: f64) -> AgentMetrics {
        AgentMetrics {
            agent_id: name.to_lowercase(),
            display_name: name.to_string(),
            role: "Role".to_string(),
            uses: 10,
            violations: 0,
            success_rate_pct: rate,
            violation_details: Vec::new(),
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(50.0, 4), "[██░░] 50.0%");
        assert_eq!(progress_bar(100.0, 3), "[███] 100.0%");
        assert_eq!(progress_bar(0.0, 2), "[░░] 0.0%");
        assert_eq!(progress_bar(97.5, 20).matches('█').count(), 20);
        assert_eq!(progress_bar(96.0, 20).matches('█').count(), 19);
    }

    #[test]
    fn test_bar_chart_alignment() {
        let a = metrics("Orchestrator", 100.0);
        let b = metrics("QA Lead", 50.0);
        let chart = agent_bar_chart(&[&a, &b], 10);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Orchestrator │ ██████████ 100.0% ✅");
        assert_eq!(lines[1], "QA Lead      │ █████      50.0% ❌");
    }

    #[test]
    fn test_chart_icon() {
        assert_eq!(chart_icon(95.0), "✅");
        assert_eq!(chart_icon(70.0), "⚠️");
        assert_eq!(chart_icon(69.9), "❌");
    }

    #[test]
    fn test_empty_chart() {
        assert_eq!(agent_bar_chart(&[], 10), "");
    }
}
