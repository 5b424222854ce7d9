use std::collections::BTreeMap;

use super::domain::{
    CriteriaGroup, Criterion, CriterionId, CriterionResult, CustomFormula, GroupId,
    ScoreSubmission, ScoringMethod, SessionScoreResult, TemplateSnapshot,
};
use super::evaluate::evaluate_criterion;
use super::validate::ValidationError;
use super::verdict::resolve_verdict;
use super::ScoringError;

/// Template misconfiguration discovered during an aggregation call. Fatal for
/// that call; the engine never substitutes another scoring method.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("scale criterion '{criteria_id}' has unusable bounds [{min}, {max}]")]
    InvalidScaleBounds {
        criteria_id: CriterionId,
        min: f64,
        max: f64,
    },
    #[error("multiple-choice criterion '{criteria_id}' has no positively scored choices")]
    UnscorableChoices { criteria_id: CriterionId },
    #[error("scored criteria weights sum to zero in a weighted template")]
    ZeroWeightSum,
    #[error("group '{0:?}' holds scored criteria but declares no weight")]
    MissingGroupWeight(GroupId),
    #[error("criterion references group '{0:?}' which the snapshot does not define")]
    UnknownGroup(GroupId),
    #[error("scoring method is custom_formula but the template declares no formula")]
    MissingCustomFormula,
    #[error("no evaluator registered for custom formula '{name}'")]
    NoFormulaEvaluator { name: String },
    #[error("points template declares a non-positive max_total_score ({0})")]
    ZeroMaxTotalScore(f64),
    #[error("custom formula '{name}' rejected the score set: {detail}")]
    FormulaRejected { name: String, detail: String },
}

/// One evaluated criterion handed to aggregation and formula evaluators.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCriterion<'a> {
    pub criterion: &'a Criterion,
    pub result: &'a CriterionResult,
}

/// Totals produced by aggregation before verdict resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateTotals {
    pub total_score: f64,
    pub total_possible: f64,
    pub percentage_score: f64,
}

impl AggregateTotals {
    const ZERO: Self = Self {
        total_score: 0.0,
        total_possible: 0.0,
        percentage_score: 0.0,
    };
}

/// Extension seam for the reserved `custom_formula` scoring method. The
/// engine ships no interpreter; a declared formula with no registered
/// evaluator fails closed.
pub trait CustomFormulaEvaluator: Send + Sync {
    fn evaluate(
        &self,
        formula: &CustomFormula,
        scored: &[ScoredCriterion<'_>],
    ) -> Result<AggregateTotals, ConfigurationError>;
}

/// Combine a full score set into the session-level result, including the
/// pass/fail verdict and auto-fail override.
pub fn aggregate_session(
    snapshot: &TemplateSnapshot,
    submissions: &[ScoreSubmission],
) -> Result<SessionScoreResult, ScoringError> {
    aggregate_session_with(snapshot, submissions, None)
}

/// [`aggregate_session`] with an optional custom-formula evaluator attached.
pub fn aggregate_session_with(
    snapshot: &TemplateSnapshot,
    submissions: &[ScoreSubmission],
    formula_evaluator: Option<&dyn CustomFormulaEvaluator>,
) -> Result<SessionScoreResult, ScoringError> {
    // Resubmission is an upsert: only the latest value per criterion counts,
    // matching the keyed writes the session lifecycle performs.
    let mut latest: BTreeMap<&CriterionId, &ScoreSubmission> = BTreeMap::new();
    for submission in submissions {
        latest.insert(&submission.criteria_id, submission);
    }

    let mut evaluated: Vec<(&Criterion, CriterionResult)> = Vec::with_capacity(latest.len());
    for submission in latest.into_values() {
        let criterion = snapshot.criterion(&submission.criteria_id).ok_or_else(|| {
            ValidationError::UnknownCriterion {
                criteria_id: submission.criteria_id.0.clone(),
            }
        })?;
        let result = evaluate_criterion(
            criterion,
            submission.value.as_ref(),
            submission.is_na,
            snapshot.pass_threshold,
        )?;
        evaluated.push((criterion, result));
    }

    aggregate_evaluated(snapshot, &evaluated, formula_evaluator)
}

/// Aggregation over already-evaluated criteria, used by the session lifecycle
/// which evaluates scores as they are submitted.
pub(crate) fn aggregate_evaluated(
    snapshot: &TemplateSnapshot,
    evaluated: &[(&Criterion, CriterionResult)],
    formula_evaluator: Option<&dyn CustomFormulaEvaluator>,
) -> Result<SessionScoreResult, ScoringError> {
    // N/A submissions drop out entirely: no weight in either side of the
    // ratio, and the remaining weights are not renormalized.
    let active: Vec<ScoredCriterion<'_>> = evaluated
        .iter()
        .filter(|(_, result)| !result.is_na())
        .map(|(criterion, result)| ScoredCriterion {
            criterion: *criterion,
            result,
        })
        .collect();

    let totals = match snapshot.scoring_method {
        ScoringMethod::Weighted => aggregate_weighted(snapshot, &active)?,
        ScoringMethod::SimpleAverage => aggregate_simple_average(&active),
        ScoringMethod::PassFail => aggregate_pass_fail(snapshot.pass_threshold, &active),
        ScoringMethod::Points => aggregate_points(snapshot, &active)?,
        ScoringMethod::CustomFormula => {
            let formula = snapshot
                .custom_formula
                .as_ref()
                .ok_or(ConfigurationError::MissingCustomFormula)?;
            let evaluator =
                formula_evaluator.ok_or_else(|| ConfigurationError::NoFormulaEvaluator {
                    name: formula.name.clone(),
                })?;
            evaluator.evaluate(formula, &active)?
        }
    };

    let auto_fail_criteria_ids: Vec<CriterionId> = evaluated
        .iter()
        .filter(|(_, result)| result.is_auto_fail_triggered)
        .map(|(criterion, _)| criterion.id.clone())
        .collect();

    let verdict = resolve_verdict(
        totals.percentage_score,
        &auto_fail_criteria_ids,
        snapshot.pass_threshold,
    );

    Ok(SessionScoreResult {
        total_score: totals.total_score,
        total_possible: totals.total_possible,
        percentage_score: totals.percentage_score,
        pass_status: verdict.pass_status,
        has_auto_fail: verdict.has_auto_fail,
        auto_fail_criteria_ids,
    })
}

fn aggregate_weighted(
    snapshot: &TemplateSnapshot,
    active: &[ScoredCriterion<'_>],
) -> Result<AggregateTotals, ScoringError> {
    if active.is_empty() {
        return Ok(AggregateTotals::ZERO);
    }

    let total_weight: f64 = active.iter().map(|entry| entry.criterion.weight).sum();
    if total_weight <= 0.0 {
        return Err(ConfigurationError::ZeroWeightSum.into());
    }

    let total_score: f64 = active
        .iter()
        .filter_map(|entry| entry.result.weighted_score)
        .sum();

    let grouped = snapshot.groups.iter().any(|group| group.weight.is_some());
    let percentage_score = if grouped {
        grouped_percentage(snapshot, active)?
    } else {
        total_score / total_weight * 100.0
    };

    Ok(AggregateTotals {
        total_score,
        total_possible: total_weight,
        percentage_score,
    })
}

/// Fold group-internal weighted averages through the declared group weights.
/// Ungrouped criteria pool into an implicit group weighted by their summed
/// criterion weights; a group left without a weight while holding scored
/// criteria is a configuration error.
fn grouped_percentage(
    snapshot: &TemplateSnapshot,
    active: &[ScoredCriterion<'_>],
) -> Result<f64, ScoringError> {
    struct GroupAccumulator {
        weighted_sum: f64,
        weight_sum: f64,
    }

    let mut buckets: BTreeMap<Option<GroupId>, GroupAccumulator> = BTreeMap::new();
    for entry in active {
        let normalized = entry.result.normalized_score.unwrap_or(0.0);
        let bucket = buckets
            .entry(entry.criterion.group_id.clone())
            .or_insert(GroupAccumulator {
                weighted_sum: 0.0,
                weight_sum: 0.0,
            });
        bucket.weighted_sum += normalized * entry.criterion.weight;
        bucket.weight_sum += entry.criterion.weight;
    }

    let mut contribution_sum = 0.0;
    let mut group_weight_sum = 0.0;
    for (group_id, bucket) in &buckets {
        if bucket.weight_sum <= 0.0 {
            continue;
        }
        let internal_average = bucket.weighted_sum / bucket.weight_sum;
        let group_weight = match group_id {
            Some(id) => {
                let group: &CriteriaGroup = snapshot
                    .group(id)
                    .ok_or_else(|| ConfigurationError::UnknownGroup(id.clone()))?;
                group
                    .weight
                    .ok_or_else(|| ConfigurationError::MissingGroupWeight(id.clone()))?
            }
            None => bucket.weight_sum,
        };
        contribution_sum += internal_average * group_weight;
        group_weight_sum += group_weight;
    }

    if group_weight_sum <= 0.0 {
        return Err(ConfigurationError::ZeroWeightSum.into());
    }

    Ok(contribution_sum / group_weight_sum)
}

fn aggregate_simple_average(active: &[ScoredCriterion<'_>]) -> AggregateTotals {
    if active.is_empty() {
        return AggregateTotals::ZERO;
    }

    let total_score: f64 = active
        .iter()
        .filter_map(|entry| entry.result.normalized_score)
        .sum();
    let count = active.len() as f64;

    AggregateTotals {
        total_score,
        total_possible: count * 100.0,
        percentage_score: total_score / count,
    }
}

fn aggregate_pass_fail(pass_threshold: f64, active: &[ScoredCriterion<'_>]) -> AggregateTotals {
    if active.is_empty() {
        return AggregateTotals::ZERO;
    }

    let passing = active
        .iter()
        .filter(|entry| entry.result.normalized_score.unwrap_or(0.0) >= pass_threshold)
        .count() as f64;
    let count = active.len() as f64;

    AggregateTotals {
        total_score: passing,
        total_possible: count,
        percentage_score: passing / count * 100.0,
    }
}

fn aggregate_points(
    snapshot: &TemplateSnapshot,
    active: &[ScoredCriterion<'_>],
) -> Result<AggregateTotals, ScoringError> {
    if snapshot.max_total_score <= 0.0 {
        return Err(ConfigurationError::ZeroMaxTotalScore(snapshot.max_total_score).into());
    }

    let total_score: f64 = active
        .iter()
        .filter_map(|entry| entry.result.raw_score)
        .sum();
    let total_possible: f64 = active.iter().map(|entry| entry.criterion.max_score).sum();

    Ok(AggregateTotals {
        total_score,
        total_possible,
        percentage_score: total_score / snapshot.max_total_score * 100.0,
    })
}
