//! Audit metadata scans: environment, declared violation total and the
//! violation-type checkboxes.
//!
//! Each scan is independent and falls back to a default on no match.

use crate::models::Environment;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECLARED_TOTAL: Regex =
        Regex::new(r"(?i)total\s*(?:de)?\s*violaciones[:\s]*([0-9]+)").unwrap();

    /// Checkbox pattern per violation-type tag, in report order.
    static ref VIOLATION_CHECKBOXES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)\[x\]\s*uso\s*de\s*herramientas\s*prohibidas").unwrap(), "used_prohibited_tools"),
        (Regex::new(r"(?i)\[x\]\s*router\s*ejecut[óo]\s*herramientas").unwrap(), "implemented_code"),
        (Regex::new(r"(?i)\[x\]\s*no\s*hizo\s*handoff").unwrap(), "no_handoff"),
        (Regex::new(r"(?i)\[x\]\s*implementaci[óo]n\s*fuera\s*de\s*scope").unwrap(), "out_of_scope"),
        (Regex::new(r"(?i)\[x\]\s*inici[óo]\s*mcp\s*server").unwrap(), "started_mcp_server"),
        (Regex::new(r"(?i)\[x\]\s*ignor[óo]\s*metadata").unwrap(), "ignored_metadata"),
        (Regex::new(r"(?i)\[x\]\s*fall[óo]\s*verificaciones").unwrap(), "failed_verification"),
    ];
}

/// Detect the environment from its checkbox or a plain mention.
pub fn extract_environment(text: &str) -> Environment {
    let lower = text.to_lowercase();

    if lower.contains("[x] vscode") || lower.contains("vscode chat") {
        Environment::Vscode
    } else if lower.contains("[x] github") || lower.contains("github copilot chat") {
        Environment::Github
    } else {
        Environment::Unknown
    }
}

/// The "Total de Violaciones" value, or 0 when not stated.
pub fn extract_declared_violations(text: &str) -> u32 {
    DECLARED_TOTAL
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Every violation-type tag whose checkbox is ticked.
pub fn extract_violation_types(text: &str) -> Vec<String> {
    VIOLATION_CHECKBOXES
        .iter()
        .filter(|(pattern, _)| pattern.is_match(text))
        .map(|(_, tag)| tag.to_string())
        .collect()
}
