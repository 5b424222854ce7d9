use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::aggregate::CustomFormulaEvaluator;
use super::domain::{ScoreRecord, ScoreSubmission, SessionId, SessionScoreResult, TemplateSnapshot};
use super::repository::{RepositoryError, SessionRepository};
use super::session::{Session, SessionError};

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("sess-{id:06}"))
}

/// Service composing the scoring engine, session state machine, and
/// repository. The engine itself is pure; every persistence decision lives
/// here, and each transition is written back with a status-conditional update
/// so concurrent attempts for one session cannot both land.
pub struct SessionScoringService<R> {
    repository: Arc<R>,
    formula_evaluator: Option<Arc<dyn CustomFormulaEvaluator>>,
}

impl<R> SessionScoringService<R>
where
    R: SessionRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            formula_evaluator: None,
        }
    }

    /// Attach an evaluator for templates using the `custom_formula` method.
    pub fn with_formula_evaluator(mut self, evaluator: Arc<dyn CustomFormulaEvaluator>) -> Self {
        self.formula_evaluator = Some(evaluator);
        self
    }

    /// Create a session against an immutable template snapshot.
    pub fn create_session(
        &self,
        snapshot: TemplateSnapshot,
    ) -> Result<Session, ScoringServiceError> {
        let session = Session::new(next_session_id(), snapshot, Utc::now());
        let stored = self.repository.insert(session)?;
        info!(session_id = %stored.session_id, template_id = %stored.snapshot.template_id, "scoring session created");
        Ok(stored)
    }

    /// Explicitly start a pending session.
    pub fn start(&self, session_id: &SessionId) -> Result<Session, ScoringServiceError> {
        let mut session = self.fetch_required(session_id)?;
        let previous = session.status();
        session.start(Utc::now())?;
        self.repository.update_from(session.clone(), previous)?;
        Ok(session)
    }

    /// Submit or replace one score for the session.
    pub fn submit_score(
        &self,
        session_id: &SessionId,
        submission: ScoreSubmission,
    ) -> Result<ScoreRecord, ScoringServiceError> {
        let mut session = self.fetch_required(session_id)?;
        let previous = session.status();
        let record = session.submit_score(submission, Utc::now())?.clone();
        self.repository.update_from(session, previous)?;
        Ok(record)
    }

    /// Complete the session, freezing the aggregated result.
    pub fn complete(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionScoreResult, ScoringServiceError> {
        let mut session = self.fetch_required(session_id)?;
        let previous = session.status();
        let result = session
            .complete_with(Utc::now(), self.formula_evaluator.as_deref())?
            .clone();
        self.repository.update_from(session.clone(), previous)?;
        info!(
            session_id = %session.session_id,
            percentage = result.percentage_score,
            pass = result.pass_status,
            has_auto_fail = result.has_auto_fail,
            "scoring session completed"
        );
        Ok(result)
    }

    /// Cancel a pending or in-progress session.
    pub fn cancel(&self, session_id: &SessionId) -> Result<Session, ScoringServiceError> {
        let mut session = self.fetch_required(session_id)?;
        let previous = session.status();
        session.cancel(Utc::now())?;
        self.repository.update_from(session.clone(), previous)?;
        Ok(session)
    }

    /// Fetch a session and its current state for API responses.
    pub fn get(&self, session_id: &SessionId) -> Result<Session, ScoringServiceError> {
        self.fetch_required(session_id)
    }

    fn fetch_required(&self, session_id: &SessionId) -> Result<Session, ScoringServiceError> {
        let session = self
            .repository
            .fetch(session_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(session)
    }
}

/// Error raised by the session scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
