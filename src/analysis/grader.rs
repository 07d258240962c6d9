//! Letter grading over ordered threshold tiers.

use crate::config::GradeTier;
use crate::error::AuditError;

/// Picks the first tier a result qualifies for.
///
/// Tiers are walked in configured order, so the strictest tier must come
/// first. A result no tier admits gets the last tier.
#[derive(Debug, Clone, Copy)]
pub struct Grader<'a> {
    tiers: &'a [GradeTier],
}

impl<'a> Grader<'a> {
    /// Create a grader over `tiers`; at least one tier is required.
    pub fn new(tiers: &'a [GradeTier]) -> Result<Self, AuditError> {
        if tiers.is_empty() {
            return Err(AuditError::InvalidConfig(
                "no grade tiers configured".to_string(),
            ));
        }
        Ok(Self { tiers })
    }

    /// Grade a success rate and violation count.
    pub fn grade(&self, success_rate_pct: f64, violations: u32) -> &'a GradeTier {
        let tiers = self.tiers;
        tiers
            .iter()
            .find(|tier| tier.admits(success_rate_pct, violations))
            .unwrap_or(&tiers[tiers.len() - 1])
    }

    /// Position of `grade` in the tier order (0 = best).
    pub fn rank_of(&self, grade: &str) -> Option<usize> {
        self.tiers
            .iter()
            .position(|tier| tier.grade.eq_ignore_ascii_case(grade))
    }
}
