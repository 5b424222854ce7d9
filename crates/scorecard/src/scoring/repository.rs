use serde::Serialize;

use super::domain::{SessionId, SessionScoreResult, SessionStatus};
use super::session::Session;

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `update_from` is the concurrency guard from the lifecycle contract: the
/// store must compare the persisted status against `expected_status` and
/// refuse the write on mismatch, so two racing transitions for the same
/// session cannot both land.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: Session) -> Result<Session, RepositoryError>;
    fn update_from(
        &self,
        session: Session,
        expected_status: SessionStatus,
    ) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError>;
    fn open_sessions(&self, limit: usize) -> Result<Vec<Session>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session status changed underneath this transition")]
    StaleStatus,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of a session's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusView {
    pub session_id: SessionId,
    pub template_id: String,
    pub status: &'static str,
    pub scored_criteria: usize,
    pub total_criteria: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SessionScoreResult>,
}

impl SessionStatusView {
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            template_id: session.snapshot.template_id.clone(),
            status: session.status().label(),
            scored_criteria: session.scores().count(),
            total_criteria: session.snapshot.criteria.len(),
            result: session.result().cloned(),
        }
    }
}
