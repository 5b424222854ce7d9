use super::common::*;
use crate::scoring::domain::{CriteriaConfig, ScoreValue};
use crate::scoring::evaluate::evaluate_criterion;
use crate::scoring::validate::ValidationError;
use crate::scoring::ScoringError;

const TOLERANCE: f64 = 1e-9;

#[test]
fn scale_three_of_one_to_five_at_weight_fifty() {
    let criterion = criterion("empathy", scale_config(1.0, 5.0), 50.0);

    let result = evaluate_criterion(&criterion, Some(&ScoreValue::Scale(3.0)), false, 70.0)
        .expect("valid scale value evaluates");

    assert_eq!(result.raw_score, Some(3.0));
    assert!((result.normalized_score.unwrap() - 50.0).abs() < TOLERANCE);
    assert!((result.weighted_score.unwrap() - 25.0).abs() < TOLERANCE);
    assert!(!result.is_auto_fail_triggered);
}

#[test]
fn boolean_maps_to_zero_or_one_hundred() {
    let criterion = criterion("greeting", CriteriaConfig::Boolean, 60.0);

    let yes = evaluate_criterion(&criterion, Some(&ScoreValue::Boolean(true)), false, 70.0)
        .expect("boolean evaluates");
    assert_eq!(yes.raw_score, Some(1.0));
    assert_eq!(yes.normalized_score, Some(100.0));

    let no = evaluate_criterion(&criterion, Some(&ScoreValue::Boolean(false)), false, 70.0)
        .expect("boolean evaluates");
    assert_eq!(no.raw_score, Some(0.0));
    assert_eq!(no.normalized_score, Some(0.0));
}

#[test]
fn percentage_passes_through_unchanged() {
    let criterion = criterion("compliance", percentage_config(), 50.0);

    let result = evaluate_criterion(&criterion, Some(&ScoreValue::Percentage(55.0)), false, 70.0)
        .expect("percentage evaluates");

    assert_eq!(result.raw_score, Some(55.0));
    assert_eq!(result.normalized_score, Some(55.0));
    // Color banding stays caller-side; 55 sits under both configured floors.
    assert_eq!(criterion.config.color_for(55.0), None);
    assert_eq!(criterion.config.color_for(65.0), Some("amber"));
    assert_eq!(criterion.config.color_for(92.0), Some("green"));
}

#[test]
fn choice_normalizes_against_best_choice() {
    let criterion = criterion("outcome", choices_config(), 40.0);

    let result = evaluate_criterion(
        &criterion,
        Some(&ScoreValue::Choice("adequate".to_string())),
        false,
        70.0,
    )
    .expect("choice evaluates");

    assert_eq!(result.raw_score, Some(5.0));
    assert!((result.normalized_score.unwrap() - 50.0).abs() < TOLERANCE);
}

#[test]
fn text_gates_on_presence() {
    let mut criterion = criterion("summary", CriteriaConfig::Text, 0.0);
    criterion.is_required = false;

    let present = evaluate_criterion(
        &criterion,
        Some(&ScoreValue::Text("handled well".to_string())),
        false,
        70.0,
    )
    .expect("text evaluates");
    assert_eq!(present.normalized_score, Some(100.0));

    let absent = evaluate_criterion(&criterion, Some(&ScoreValue::Text(String::new())), false, 70.0)
        .expect("optional empty text evaluates");
    assert_eq!(absent.normalized_score, Some(0.0));
}

#[test]
fn not_applicable_never_scores_and_never_auto_fails() {
    let mut criterion = criterion("greeting", CriteriaConfig::Boolean, 60.0);
    criterion.is_auto_fail = true;
    criterion.auto_fail_threshold = Some(100.0);

    let result =
        evaluate_criterion(&criterion, None, true, 70.0).expect("not-applicable evaluates");

    assert_eq!(result.raw_score, None);
    assert_eq!(result.normalized_score, None);
    assert_eq!(result.weighted_score, None);
    assert!(!result.is_auto_fail_triggered);
}

#[test]
fn auto_fail_threshold_defaults_to_pass_threshold() {
    let mut criterion = criterion("disclosure", scale_config(0.0, 4.0), 40.0);
    criterion.is_auto_fail = true;

    // Normalized 50 against a pass threshold of 70 trips the default.
    let tripped = evaluate_criterion(&criterion, Some(&ScoreValue::Scale(2.0)), false, 70.0)
        .expect("scale evaluates");
    assert!(tripped.is_auto_fail_triggered);

    // An explicit lower threshold takes precedence over the default.
    criterion.auto_fail_threshold = Some(25.0);
    let clear = evaluate_criterion(&criterion, Some(&ScoreValue::Scale(2.0)), false, 70.0)
        .expect("scale evaluates");
    assert!(!clear.is_auto_fail_triggered);
}

#[test]
fn missing_value_without_na_marker_fails_loudly() {
    let criterion = criterion("greeting", CriteriaConfig::Boolean, 60.0);

    match evaluate_criterion(&criterion, None, false, 70.0) {
        Err(ScoringError::Validation(ValidationError::MissingValue)) => {}
        other => panic!("expected missing value error, got {other:?}"),
    }
}

#[test]
fn invalid_value_is_rejected_not_defaulted() {
    let criterion = criterion("resolution", scale_config(0.0, 4.0), 40.0);

    match evaluate_criterion(&criterion, Some(&ScoreValue::Scale(9.0)), false, 70.0) {
        Err(ScoringError::Validation(ValidationError::OutOfRange { .. })) => {}
        other => panic!("expected out-of-range rejection, got {other:?}"),
    }
}
