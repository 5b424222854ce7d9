use super::aggregate::ConfigurationError;
use super::domain::{CriteriaConfig, Criterion, CriterionResult, ScoreValue};
use super::validate::{validate_score_value, ValidationError};
use super::ScoringError;

/// Convert one submitted value into raw, normalized (0-100), and weighted
/// scores plus the auto-fail flag.
///
/// `pass_threshold` is the template's pass threshold; it backs the auto-fail
/// threshold when the criterion does not declare its own. Not-applicable
/// submissions evaluate to empty scores and can never trigger auto-fail.
pub fn evaluate_criterion(
    criterion: &Criterion,
    value: Option<&ScoreValue>,
    is_na: bool,
    pass_threshold: f64,
) -> Result<CriterionResult, ScoringError> {
    if is_na {
        return Ok(CriterionResult::not_applicable());
    }

    let value = value.ok_or(ValidationError::MissingValue)?;
    validate_score_value(&criterion.config, value, criterion.is_required)?;

    let (raw, normalized) = score_value(criterion, value)?;
    let normalized = normalized.clamp(0.0, 100.0);
    let weighted = normalized * criterion.weight / 100.0;

    let is_auto_fail_triggered = criterion.is_auto_fail
        && normalized < criterion.auto_fail_threshold_or(pass_threshold);

    Ok(CriterionResult {
        raw_score: Some(raw),
        normalized_score: Some(normalized),
        weighted_score: Some(weighted),
        is_auto_fail_triggered,
    })
}

fn score_value(criterion: &Criterion, value: &ScoreValue) -> Result<(f64, f64), ScoringError> {
    let scored = match (&criterion.config, value) {
        (CriteriaConfig::Boolean, ScoreValue::Boolean(checked)) => {
            let raw = if *checked { 1.0 } else { 0.0 };
            (raw, raw * 100.0)
        }
        (CriteriaConfig::Scale { min, max, .. }, ScoreValue::Scale(raw)) => {
            let span = max - min;
            if span <= 0.0 {
                return Err(ConfigurationError::InvalidScaleBounds {
                    criteria_id: criterion.id.clone(),
                    min: *min,
                    max: *max,
                }
                .into());
            }
            (*raw, (raw - min) / span * 100.0)
        }
        (CriteriaConfig::Percentage { .. }, ScoreValue::Percentage(raw)) => (*raw, *raw),
        (CriteriaConfig::MultipleChoice { choices }, ScoreValue::Choice(choice_id)) => {
            let max_choice_score = choices
                .iter()
                .map(|choice| choice.score)
                .fold(f64::NEG_INFINITY, f64::max);
            if choices.is_empty() || max_choice_score <= 0.0 {
                return Err(ConfigurationError::UnscorableChoices {
                    criteria_id: criterion.id.clone(),
                }
                .into());
            }
            // Validation already pinned the id to the choice list.
            let raw = choices
                .iter()
                .find(|choice| &choice.id == choice_id)
                .map(|choice| choice.score)
                .unwrap_or(0.0);
            (raw, raw / max_choice_score * 100.0)
        }
        (CriteriaConfig::Text, ScoreValue::Text(text)) => {
            // Qualitative criteria gate on presence rather than magnitude.
            let normalized = if text.trim().is_empty() { 0.0 } else { 100.0 };
            (normalized / 100.0, normalized)
        }
        (config, value) => {
            return Err(ValidationError::TypeMismatch {
                expected: config.type_label(),
                found: value.type_label(),
            }
            .into())
        }
    };

    Ok(scored)
}
