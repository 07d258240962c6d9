//! Rolling audit history.
//!
//! The history file keeps one compact entry per audit, newest first,
//! deduplicated by audit id and capped in length. It is read, patched and
//! rewritten whole on every run; a missing or unreadable file starts an
//! empty history.

use crate::analysis::AuditAnalysis;
use crate::models::{round_to, Environment};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// File name of the history inside the reports directory.
pub const HISTORY_FILE_NAME: &str = "audit-history.json";

/// One audit in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub audit_id: String,
    pub issue_number: u64,
    pub date: String,
    pub environment: Environment,
    #[serde(rename = "successRate")]
    pub success_rate_pct: f64,
    #[serde(rename = "violations")]
    pub violation_count: u32,
    pub grade: String,
    pub total_uses: u32,
}

impl HistoryEntry {
    /// Compact entry for a graded analysis.
    pub fn from_analysis(analysis: &AuditAnalysis) -> Self {
        let metadata = &analysis.result.metadata;
        Self {
            audit_id: metadata.audit_id.clone(),
            issue_number: metadata.issue_number,
            date: metadata.date.clone(),
            environment: metadata.environment,
            success_rate_pct: analysis.result.global.success_rate_pct,
            violation_count: metadata.total_violations,
            grade: analysis.grade.grade.clone(),
            total_uses: metadata.total_uses,
        }
    }
}

/// Summary recomputed on every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_audits: usize,
    pub average_success_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// The persisted history document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditHistory {
    #[serde(default)]
    pub audits: Vec<HistoryEntry>,
    #[serde(default)]
    pub summary: HistorySummary,
}

impl AuditHistory {
    /// Load the history at `path`, or an empty one if it is missing or corrupt.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No history at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    "History file {} is corrupt, starting fresh: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Put `entry` at the front, replacing any entry with the same id, and
    /// keep at most `cap` entries.
    pub fn record(&mut self, entry: HistoryEntry, cap: usize, now: DateTime<Utc>) {
        self.audits.retain(|a| a.audit_id != entry.audit_id);
        self.audits.insert(0, entry);
        self.audits.truncate(cap);
        self.refresh_summary(now);
    }

    fn refresh_summary(&mut self, now: DateTime<Utc>) {
        let count = self.audits.len();
        let average = if count == 0 {
            0.0
        } else {
            self.audits.iter().map(|a| a.success_rate_pct).sum::<f64>() / count as f64
        };

        self.summary = HistorySummary {
            total_audits: count,
            average_success_rate: round_to(average, 2),
            last_updated: Some(now),
        };
    }

    /// Write the whole history to `path` through a temporary file in the
    /// same directory, so readers never see a partial file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let content = serde_json::to_string_pretty(self).context("Failed to serialize history")?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(content.as_bytes())
            .context("Failed to write history")?;
        tmp.persist(path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }

    /// Load, record one entry and write back in a single step.
    pub fn update_file(
        path: &Path,
        entry: HistoryEntry,
        cap: usize,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let mut history = Self::load(path);
        history.record(entry, cap, now);
        history.save(path)?;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entry(number: u64, rate: f64) -> HistoryEntry {
        HistoryEntry {
            audit_id: format!("audit-{}", number),
            issue_number: number,
            date: "2024-12-05".to_string(),
            environment: Environment::Github,
            success_rate_pct: rate,
            violation_count: 0,
            grade: "A".to_string(),
            total_uses: 100,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 6, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_record_summary() {
        let mut history = AuditHistory::default();
        history.record(entry(1, 90.0), 50, now());
        history.record(entry(2, 95.0), 50, now());

        assert_eq!(history.audits[0].audit_id, "audit-2");
        assert_eq!(history.summary.total_audits, 2);
        assert_eq!(history.summary.average_success_rate, 92.5);
        assert_eq!(history.summary.last_updated, Some(now()));
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut history = AuditHistory::default();
        for n in 1..=51 {
            history.record(entry(n, 100.0), 50, now());
        }

        assert_eq!(history.audits.len(), 50);
        assert_eq!(history.summary.total_audits, 50);
        assert_eq!(history.audits[0].issue_number, 51);
        assert_eq!(history.audits[49].issue_number, 2);
        assert!(history.audits.iter().all(|a| a.issue_number != 1));
    }

    #[test]
    fn test_duplicate_replaces_and_moves_to_front() {
        let mut history = AuditHistory::default();
        history.record(entry(1, 80.0), 50, now());
        history.record(entry(2, 90.0), 50, now());
        history.record(entry(1, 99.0), 50, now());

        assert_eq!(history.audits.len(), 2);
        assert_eq!(history.summary.total_audits, 2);
        assert_eq!(history.audits[0].audit_id, "audit-1");
        assert_eq!(history.audits[0].success_rate_pct, 99.0);
        assert_eq!(history.audits[1].audit_id, "audit-2");
    }

    #[test]
    fn test_missing_and_corrupt_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        assert_eq!(AuditHistory::load(&path), AuditHistory::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AuditHistory::load(&path), AuditHistory::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(HISTORY_FILE_NAME);

        let history = AuditHistory::update_file(&path, entry(7, 97.5), 50, now()).unwrap();
        let reloaded = AuditHistory::load(&path);
        assert_eq!(history, reloaded);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"auditId\": \"audit-7\""));
        assert!(raw.contains("\"successRate\": 97.5"));
        assert!(raw.contains("\"totalAudits\": 1"));
    }

    #[test]
    fn test_update_file_rebuilds_corrupt_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        std::fs::write(&path, "garbage").unwrap();

        let history = AuditHistory::update_file(&path, entry(3, 88.0), 50, now()).unwrap();
        assert_eq!(history.audits.len(), 1);
        assert_eq!(history.summary.average_success_rate, 88.0);
    }
}
