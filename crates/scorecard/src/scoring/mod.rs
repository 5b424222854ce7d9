//! Scoring engine and session-scoring lifecycle.
//!
//! The computation core (`validate`, `evaluate`, `aggregate`, `verdict`) is
//! pure: given the same template snapshot and score set it is idempotent and
//! side-effect-free, safe to call from any thread. `session` wraps that core
//! in the guarded lifecycle, and `service`/`router` carry it to callers.

pub mod aggregate;
pub mod domain;
pub mod evaluate;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod validate;
pub mod verdict;

#[cfg(test)]
mod tests;

pub use aggregate::{
    aggregate_session, aggregate_session_with, AggregateTotals, ConfigurationError,
    CustomFormulaEvaluator, ScoredCriterion,
};
pub use domain::{
    ChoiceOption, ColorBand, CriteriaConfig, CriteriaGroup, Criterion, CriterionId,
    CriterionResult, CustomFormula, GroupId, ScoreRecord, ScoreSubmission, ScoreValue,
    ScoringMethod, SessionId, SessionScoreResult, SessionStatus, TemplateSettings,
    TemplateSnapshot,
};
pub use evaluate::evaluate_criterion;
pub use repository::{RepositoryError, SessionRepository, SessionStatusView};
pub use router::scoring_router;
pub use service::{ScoringServiceError, SessionScoringService};
pub use session::{
    transition, MissingCriterion, MissingRequiredCriteria, Session, SessionError, SessionEvent,
    StateTransitionError,
};
pub use validate::{validate_score_value, ValidationError};
pub use verdict::{resolve_verdict, Verdict};

/// Engine-level error union for the pure operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
