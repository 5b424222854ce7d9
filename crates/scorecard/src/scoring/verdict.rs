use super::domain::CriterionId;

/// Pass/fail resolution for one aggregated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub pass_status: bool,
    pub has_auto_fail: bool,
}

/// Resolve the session verdict. A triggered auto-fail criterion is an
/// unconditional override: no numeric aggregate can compensate for it.
pub fn resolve_verdict(
    percentage_score: f64,
    auto_fail_criteria_ids: &[CriterionId],
    pass_threshold: f64,
) -> Verdict {
    let has_auto_fail = !auto_fail_criteria_ids.is_empty();
    Verdict {
        pass_status: !has_auto_fail && percentage_score >= pass_threshold,
        has_auto_fail,
    }
}
