//! Markdown report generation.
//!
//! This module generates the markdown audit report from a graded
//! analysis. Rendering is pure: the generation timestamp is passed in.

use crate::analysis::{AgentMetrics, AuditAnalysis};
use crate::config::Config;
use crate::report::badge::Badge;
use crate::report::charts::{agent_bar_chart, progress_bar};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Generate a complete Markdown report.
pub fn generate_markdown_report(
    analysis: &AuditAnalysis,
    config: &Config,
    generated_at: DateTime<Utc>,
) -> String {
    let sections = [
        generate_header_section(analysis, config, generated_at),
        generate_grade_section(analysis, config),
        generate_agents_section(analysis, config),
        generate_ranking_section(analysis),
        generate_environment_section(analysis),
        generate_violations_section(analysis, config),
        generate_recommendations_section(analysis, config),
        generate_badge_section(analysis),
        generate_footer(),
    ];

    sections.join("---\n\n")
}

/// Emoji shown next to a grade.
fn grade_emoji(grade: &str) -> &'static str {
    match grade {
        "A+" => "🏆",
        "A" => "🥇",
        "B" => "🥈",
        "C" => "🥉",
        "D" => "📉",
        _ => "📊",
    }
}

/// Status glyph for the agent table.
fn table_status(pct: f64) -> &'static str {
    if pct >= 100.0 {
        "✅"
    } else if pct >= 90.0 {
        "⚠️"
    } else {
        "❌"
    }
}

fn generate_header_section(
    analysis: &AuditAnalysis,
    config: &Config,
    generated_at: DateTime<Utc>,
) -> String {
    let metadata = &analysis.result.metadata;
    let mut section = String::new();

    section.push_str(&format!("# 📊 Audit Report #{}\n\n", metadata.issue_number));
    section.push_str(&format!("**Date:** {}  \n", metadata.date));
    section.push_str(&format!(
        "**Environment:** {}  \n",
        config.environment_name(metadata.environment)
    ));
    section.push_str(&format!("**Total uses:** {}  \n", metadata.total_uses));
    section.push_str(&format!("**Violations:** {}  \n", metadata.total_violations));
    section.push_str(&format!(
        "**Generated:** {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    section
}

fn generate_grade_section(analysis: &AuditAnalysis, config: &Config) -> String {
    let metadata = &analysis.result.metadata;
    let global = &analysis.result.global;
    let grade = &analysis.grade;
    let mut section = String::new();

    section.push_str(&format!(
        "## {} Overall Grade: {} ({}% success)\n\n",
        grade_emoji(&grade.grade),
        grade.grade,
        global.success_rate_pct
    ));
    if !grade.description.is_empty() {
        section.push_str(&format!("{}\n\n", grade.description));
    }

    section.push_str("### Key Metrics\n\n```\n");
    section.push_str(&format!(
        "Success rate: {}\n",
        progress_bar(global.success_rate_pct, config.output.progress_width)
    ));
    section.push_str(&format!(
        "Violations:   {}/{} ({}%)\n",
        metadata.total_violations, metadata.total_uses, global.violation_rate_pct
    ));
    section.push_str("Target:       0 violations\n```\n\n");

    section.push_str(&format!(
        "- ✅ **Success rate:** {}%\n",
        global.success_rate_pct
    ));
    section.push_str(&format!(
        "- ❌ **Violations:** {}/{} ({}%)\n",
        metadata.total_violations, metadata.total_uses, global.violation_rate_pct
    ));
    section.push_str("- 🎯 **Target:** 0 violations\n\n");

    section
}

fn generate_agents_section(analysis: &AuditAnalysis, config: &Config) -> String {
    let mut active: Vec<&AgentMetrics> = analysis.result.active_agents().collect();
    let mut section = String::new();

    section.push_str("## 👥 Evaluated Agents\n\n");

    if active.is_empty() {
        section.push_str("_No per-agent data available_\n\n");
        return section;
    }

    section.push_str("### Results\n\n");
    section.push_str("| Agent | Role | Uses | Violations | % Success | Status |\n");
    section.push_str("|-------|------|------|------------|-----------|--------|\n");
    for agent in &active {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {:.1}% | {} |\n",
            agent.display_name,
            agent.role,
            agent.uses,
            agent.violations,
            agent.success_rate_pct,
            table_status(agent.success_rate_pct)
        ));
    }
    section.push('\n');

    active.sort_by(|a, b| b.success_rate_pct.total_cmp(&a.success_rate_pct));
    section.push_str("### Performance Chart\n\n```\n");
    section.push_str(&agent_bar_chart(&active, config.output.chart_width));
    section.push_str("\n```\n\n");

    section
}

fn generate_ranking_section(analysis: &AuditAnalysis) -> String {
    let mut section = String::new();

    section.push_str("## 🏆 Agent Ranking\n\n");

    section.push_str("### Top 5 (Best Performance)\n\n");
    for (i, agent) in analysis.result.top_agents.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** - {:.1}% success ({} uses)\n",
            i + 1,
            agent.display_name,
            agent.success_rate_pct,
            agent.uses
        ));
    }
    section.push('\n');

    section.push_str("### Bottom 5 (Need Improvement)\n\n");
    for (i, agent) in analysis.result.bottom_agents.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** - {:.1}% success ({} violations)\n",
            i + 1,
            agent.display_name,
            agent.success_rate_pct,
            agent.violations
        ));
    }
    section.push('\n');

    section
}

fn generate_environment_section(analysis: &AuditAnalysis) -> String {
    let mut section = String::new();

    section.push_str("## 🖥️ Environment Comparison\n\n");

    if analysis.result.environments.is_empty() {
        section.push_str("_No environment comparison data available_\n\n");
        return section;
    }

    let blocks: Vec<String> = analysis
        .result
        .environments
        .iter()
        .map(|env| {
            format!(
                "### {}\n- **Uses:** {}\n- **Violations:** {}\n- **Success rate:** {}%\n",
                env.name, env.uses, env.violations, env.success_rate_pct
            )
        })
        .collect();
    section.push_str(&blocks.join("\n"));
    section.push('\n');

    section
}

fn generate_violations_section(analysis: &AuditAnalysis, config: &Config) -> String {
    let mut section = String::new();

    section.push_str("## ❌ Violation Types\n\n");

    let buckets = analysis.result.nonzero_violations();
    if buckets.is_empty() {
        section.push_str("✅ No categorized violations detected\n\n");
        return section;
    }

    let blocks: Vec<String> = buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            let known = config.violation_type(&bucket.violation_type);
            let name = known.map_or(bucket.violation_type.as_str(), |v| v.name.as_str());
            let description = known.map_or("", |v| v.description.as_str());
            format!(
                "{}. **{}** ({} cases)\n   _{}_\n",
                i + 1,
                name,
                bucket.count,
                description
            )
        })
        .collect();
    section.push_str(&blocks.join("\n"));
    section.push('\n');

    section
}

fn generate_recommendations_section(analysis: &AuditAnalysis, config: &Config) -> String {
    let mut section = String::new();

    section.push_str("## 📋 Recommendations\n\n");

    let blocks: Vec<String> = analysis
        .result
        .bottom_agents
        .iter()
        .filter(|a| a.success_rate_pct < 100.0)
        .map(|agent| {
            let forbidden = config
                .agent(&agent.agent_id)
                .map(|a| a.forbidden_tools.join(", "))
                .filter(|tools| !tools.is_empty())
                .unwrap_or_else(|| "N/A".to_string());

            format!(
                "### {}\n\
                 - **Problem:** {} violation(s) in {} uses\n\
                 - **Suggested actions:**\n  \
                 - Reinforce role-specific meta-instructions\n  \
                 - Add negative examples based on the detected violations\n  \
                 - Review forbidden tools list: {}\n",
                agent.display_name, agent.violations, agent.uses, forbidden
            )
        })
        .collect();

    if blocks.is_empty() {
        section.push_str("✅ All agents are performing correctly\n\n");
    } else {
        section.push_str(&blocks.join("\n"));
        section.push('\n');
    }

    section
}

fn generate_badge_section(analysis: &AuditAnalysis) -> String {
    let grade = &analysis.grade;
    let rate = analysis.result.global.success_rate_pct;
    let badge = Badge::quality(grade, rate);
    let mut section = String::new();

    section.push_str("## 🏷️ Quality Badge\n\n");
    section.push_str(&format!(
        "![Quality Badge](https://img.shields.io/badge/Quality-{}-{})\n\n",
        shields_escape(&badge.value),
        grade.badge_color
    ));
    section.push_str("### Local Badge\n\n```html\n");
    section.push_str(&format!(
        "<img src=\"badges/quality-badge.svg\" alt=\"Quality: {}\">\n",
        badge.value
    ));
    section.push_str("```\n\n");

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("## 📈 History\n\n");
    footer.push_str(
        "See [audit-history.json](./audit-history.json) for the full audit history.\n\n",
    );
    footer.push_str("---\n\n");
    footer.push_str("_Report generated by AuditLens_\n");

    footer
}

/// Escape a shields.io static badge path segment.
fn shields_escape(s: &str) -> String {
    s.replace('-', "--")
        .replace('_', "__")
        .replace('%', "%25")
        .replace(' ', "%20")
        .replace('+', "%2B")
}

/// Generate a JSON document of the analysis.
pub fn generate_json_report(analysis: &AuditAnalysis) -> Result<String> {
    serde_json::to_string_pretty(analysis).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, assemble_audit, Grader};
    use crate::models::IssueRecord;
    use chrono::TimeZone;

    fn sample_analysis(body: &str) -> (AuditAnalysis, Config) {
        let config = Config::default();
        let issue = IssueRecord {
            number: 42,
            title: "[AUDITORÍA] Ciclo".to_string(),
            body: Some(body.to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 12, 5, 8, 0, 0).unwrap(),
            closed_at: None,
            state: "open".to_string(),
        };
        let record = assemble_audit(&issue, &config);
        let result = aggregate(&[record], &config).unwrap();
        let grader = Grader::new(&config.grades).unwrap();
        (AuditAnalysis::new(result, &grader), config)
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 6, 10, 0, 0).unwrap()
    }

    const BODY: &str = "\
- [x] GitHub Copilot Chat

| Uso | Agente | Resultado | Observación |
|-----|--------|-----------|-------------|
| 1 | orchestrator | ✓ | Handoff correcto |
| 2 | orchestrator | ✗ | Implementó código |
| 3 | qa-lead | ✓ | ok |
| 4 | qa-lead | ✓ | ok |
";

    #[test]
    fn test_generate_markdown_report() {
        let (analysis, config) = sample_analysis(BODY);
        let markdown = generate_markdown_report(&analysis, &config, generated_at());

        assert!(markdown.starts_with("# 📊 Audit Report #42"));
        assert!(markdown.contains("**Environment:** GitHub Copilot Chat"));
        assert!(markdown.contains("**Generated:** 2024-12-06 10:00:00 UTC"));
        assert!(markdown.contains("Overall Grade: D (75% success)"));
        assert!(markdown.contains("| Orchestrator | Router | 2 | 1 | 50.0% | ❌ |"));
        assert!(markdown.contains("| QA Lead | Quality | 2 | 0 | 100.0% | ✅ |"));
        assert!(markdown.contains("### GitHub Copilot Chat"));
        assert!(markdown.contains("**Router implemented code** (1 cases)"));
        assert!(markdown.contains("Review forbidden tools list: create_file, edit_file, run_in_terminal"));
        assert!(markdown.contains("_Report generated by AuditLens_"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let (analysis, config) = sample_analysis(BODY);
        assert_eq!(
            generate_markdown_report(&analysis, &config, generated_at()),
            generate_markdown_report(&analysis, &config, generated_at())
        );
    }

    #[test]
    fn test_empty_body_report() {
        let (analysis, config) = sample_analysis("");
        let markdown = generate_markdown_report(&analysis, &config, generated_at());

        assert!(markdown.contains("Overall Grade: A+ (100% success)"));
        assert!(markdown.contains("_No per-agent data available_"));
        assert!(markdown.contains("_No environment comparison data available_"));
        assert!(markdown.contains("✅ No categorized violations detected"));
        assert!(markdown.contains("✅ All agents are performing correctly"));
    }

    #[test]
    fn test_shields_escape() {
        assert_eq!(shields_escape("A+ (97.5%)"), "A%2B%20(97.5%25)");
        assert_eq!(shields_escape("a-b_c"), "a--b__c");
    }

    #[test]
    fn test_generate_json_report() {
        let (analysis, _) = sample_analysis(BODY);
        let json = generate_json_report(&analysis).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"agent_metrics\""));
        assert!(json.contains("\"grade\""));
        assert!(json.contains("\"timeline\""));
    }
}
