use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::{aggregate_evaluated, ConfigurationError, CustomFormulaEvaluator};
use super::domain::{
    Criterion, CriterionId, CriterionResult, ScoreRecord, ScoreSubmission, SessionId,
    SessionScoreResult, SessionStatus, TemplateSnapshot,
};
use super::evaluate::evaluate_criterion;
use super::validate::ValidationError;
use super::ScoringError;

/// Events driving the session lifecycle. Both the explicit lifecycle
/// endpoints and the score-submission path go through the same transition
/// function, so there is exactly one place status rules live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    Start,
    SubmitScore,
    Complete,
    Cancel,
}

impl SessionEvent {
    pub const fn label(self) -> &'static str {
        match self {
            SessionEvent::Start => "start",
            SessionEvent::SubmitScore => "submit_score",
            SessionEvent::Complete => "complete",
            SessionEvent::Cancel => "cancel",
        }
    }
}

/// Rejected lifecycle transition, carrying the state it was attempted from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct StateTransitionError {
    pub from: SessionStatus,
    pub event: SessionEvent,
}

impl fmt::Display for StateTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot {} a {} session",
            self.event.label(),
            self.from.label()
        )
    }
}

/// Required criteria left unscored at completion time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct MissingRequiredCriteria {
    pub missing: Vec<MissingCriterion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCriterion {
    pub criteria_id: CriterionId,
    pub name: String,
}

impl fmt::Display for MissingRequiredCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .missing
            .iter()
            .map(|criterion| criterion.name.as_str())
            .collect();
        write!(
            f,
            "required criteria without a score or N/A marker: {}",
            names.join(", ")
        )
    }
}

/// Errors surfaced by session mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] StateTransitionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    MissingRequired(#[from] MissingRequiredCriteria),
}

impl From<ScoringError> for SessionError {
    fn from(value: ScoringError) -> Self {
        match value {
            ScoringError::Validation(err) => Self::Validation(err),
            ScoringError::Configuration(err) => Self::Configuration(err),
        }
    }
}

/// Pure transition table for the session state machine.
pub fn transition(
    current: SessionStatus,
    event: SessionEvent,
) -> Result<SessionStatus, StateTransitionError> {
    use SessionEvent as Event;
    use SessionStatus as Status;

    match (current, event) {
        (Status::Pending, Event::Start) => Ok(Status::InProgress),
        (Status::Pending, Event::SubmitScore) => Ok(Status::InProgress),
        (Status::InProgress, Event::SubmitScore) => Ok(Status::InProgress),
        (Status::Pending | Status::InProgress, Event::Complete) => Ok(Status::Completed),
        (Status::Pending | Status::InProgress, Event::Cancel) => Ok(Status::Cancelled),
        (from, event) => Err(StateTransitionError { from, event }),
    }
}

/// One evaluation instance bound to an immutable template snapshot.
///
/// Scores upsert by criterion id while the session is `pending` or
/// `in_progress`; completion runs aggregation exactly once and freezes the
/// result. Terminal sessions reject every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub snapshot: TemplateSnapshot,
    status: SessionStatus,
    scores: BTreeMap<CriterionId, ScoreRecord>,
    result: Option<SessionScoreResult>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(session_id: SessionId, snapshot: TemplateSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            snapshot,
            status: SessionStatus::Pending,
            scores: BTreeMap::new(),
            result: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn result(&self) -> Option<&SessionScoreResult> {
        self.result.as_ref()
    }

    pub fn scores(&self) -> impl Iterator<Item = &ScoreRecord> {
        self.scores.values()
    }

    pub fn score_for(&self, criteria_id: &CriterionId) -> Option<&ScoreRecord> {
        self.scores.get(criteria_id)
    }

    /// Explicitly move a pending session into scoring.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.status = transition(self.status, SessionEvent::Start)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// Submit or replace one score. The first submission against a pending
    /// session implicitly starts it. Replacement is an upsert keyed by
    /// criterion id; repeated submission never duplicates.
    pub fn submit_score(
        &mut self,
        submission: ScoreSubmission,
        now: DateTime<Utc>,
    ) -> Result<&ScoreRecord, SessionError> {
        let next_status = transition(self.status, SessionEvent::SubmitScore)?;

        let criterion = self
            .snapshot
            .criterion(&submission.criteria_id)
            .ok_or_else(|| ValidationError::UnknownCriterion {
                criteria_id: submission.criteria_id.0.clone(),
            })?;

        if submission.is_na && !self.snapshot.settings.allow_not_applicable {
            return Err(ValidationError::NotApplicableDisallowed.into());
        }

        let computed = evaluate_criterion(
            criterion,
            submission.value.as_ref(),
            submission.is_na,
            self.snapshot.pass_threshold,
        )?;

        self.enforce_comment_rule(&submission, &computed)?;

        if self.status == SessionStatus::Pending {
            self.started_at = Some(now);
        }
        self.status = next_status;

        let criteria_id = submission.criteria_id.clone();
        let record = ScoreRecord {
            submission,
            computed,
            recorded_at: now,
        };
        self.scores.insert(criteria_id.clone(), record);
        Ok(&self.scores[&criteria_id])
    }

    /// Complete the session: check required coverage, aggregate, resolve the
    /// verdict, and freeze the result.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<&SessionScoreResult, SessionError> {
        self.complete_with(now, None)
    }

    pub fn complete_with(
        &mut self,
        now: DateTime<Utc>,
        formula_evaluator: Option<&dyn CustomFormulaEvaluator>,
    ) -> Result<&SessionScoreResult, SessionError> {
        let next_status = transition(self.status, SessionEvent::Complete)?;

        if !self.snapshot.settings.allow_partial_submission {
            let missing: Vec<MissingCriterion> = self
                .snapshot
                .required_criteria()
                .filter(|criterion| !self.scores.contains_key(&criterion.id))
                .map(|criterion| MissingCriterion {
                    criteria_id: criterion.id.clone(),
                    name: criterion.name.clone(),
                })
                .collect();
            if !missing.is_empty() {
                return Err(MissingRequiredCriteria { missing }.into());
            }
        }

        // A pending session holds no scores; only templates that permit
        // partial submission may complete one.
        if self.status == SessionStatus::Pending && !self.snapshot.settings.allow_partial_submission
        {
            return Err(StateTransitionError {
                from: self.status,
                event: SessionEvent::Complete,
            }
            .into());
        }

        let evaluated: Vec<(&Criterion, CriterionResult)> = self
            .scores
            .values()
            .filter_map(|record| {
                self.snapshot
                    .criterion(&record.submission.criteria_id)
                    .map(|criterion| (criterion, record.computed.clone()))
            })
            .collect();

        let result = aggregate_evaluated(&self.snapshot, &evaluated, formula_evaluator)?;

        self.status = next_status;
        self.completed_at = Some(now);
        Ok(self.result.insert(result))
    }

    /// Cancel a pending or in-progress session. Completed sessions are
    /// archived, never cancelled, so the audit trail survives.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.status = transition(self.status, SessionEvent::Cancel)?;
        self.cancelled_at = Some(now);
        Ok(())
    }

    fn enforce_comment_rule(
        &self,
        submission: &ScoreSubmission,
        computed: &CriterionResult,
    ) -> Result<(), SessionError> {
        let Some(threshold) = self.snapshot.settings.require_comment_below else {
            return Ok(());
        };
        let Some(normalized) = computed.normalized_score else {
            return Ok(());
        };
        let has_comment = submission
            .comment
            .as_deref()
            .is_some_and(|comment| !comment.trim().is_empty());
        if normalized < threshold && !has_comment {
            return Err(ValidationError::CommentRequired { threshold }.into());
        }
        Ok(())
    }
}
