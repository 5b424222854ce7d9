use super::domain::{CriteriaConfig, ScoreValue};

const STEP_TOLERANCE: f64 = 1e-9;

/// Rejections for malformed score submissions. Reported to the submitter
/// immediately; nothing is persisted and no session state changes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("value {value} outside allowed range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
    #[error("value {value} does not land on a step of {step} from {min}")]
    OffStep { value: f64, step: f64, min: f64 },
    #[error("choice '{choice_id}' is not in the configured choice list")]
    UnknownChoice { choice_id: String },
    #[error("text value must be non-empty for a required criterion")]
    EmptyText,
    #[error("submission carries neither a value nor a not-applicable marker")]
    MissingValue,
    #[error("criterion '{criteria_id}' is not part of this session's template snapshot")]
    UnknownCriterion { criteria_id: String },
    #[error("this template does not allow marking criteria not applicable")]
    NotApplicableDisallowed,
    #[error("a comment is required for scores normalizing below {threshold}")]
    CommentRequired { threshold: f64 },
}

/// Check one submitted value against the criterion's type configuration.
///
/// Not-applicable submissions bypass this entirely; callers gate `is_na`
/// against the template settings before reaching here.
pub fn validate_score_value(
    config: &CriteriaConfig,
    value: &ScoreValue,
    is_required: bool,
) -> Result<(), ValidationError> {
    match (config, value) {
        (CriteriaConfig::Boolean, ScoreValue::Boolean(_)) => Ok(()),
        (CriteriaConfig::Scale { min, max, step }, ScoreValue::Scale(raw)) => {
            if !raw.is_finite() || raw < min || raw > max {
                return Err(ValidationError::OutOfRange {
                    value: *raw,
                    min: *min,
                    max: *max,
                });
            }
            if let Some(step) = step {
                if *step > 0.0 {
                    let offset = (raw - min) / step;
                    if (offset - offset.round()).abs() > STEP_TOLERANCE {
                        return Err(ValidationError::OffStep {
                            value: *raw,
                            step: *step,
                            min: *min,
                        });
                    }
                }
            }
            Ok(())
        }
        (CriteriaConfig::Percentage { .. }, ScoreValue::Percentage(raw)) => {
            if !raw.is_finite() || !(0.0..=100.0).contains(raw) {
                return Err(ValidationError::OutOfRange {
                    value: *raw,
                    min: 0.0,
                    max: 100.0,
                });
            }
            Ok(())
        }
        (CriteriaConfig::MultipleChoice { choices }, ScoreValue::Choice(choice_id)) => {
            if choices.iter().any(|choice| &choice.id == choice_id) {
                Ok(())
            } else {
                Err(ValidationError::UnknownChoice {
                    choice_id: choice_id.clone(),
                })
            }
        }
        (CriteriaConfig::Text, ScoreValue::Text(text)) => {
            if is_required && text.trim().is_empty() {
                Err(ValidationError::EmptyText)
            } else {
                Ok(())
            }
        }
        (config, value) => Err(ValidationError::TypeMismatch {
            expected: config.type_label(),
            found: value.type_label(),
        }),
    }
}
