use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::scoring::domain::{
    ChoiceOption, ColorBand, CriteriaConfig, CriteriaGroup, Criterion, CriterionId, GroupId,
    ScoreSubmission, ScoreValue, ScoringMethod, SessionId, SessionStatus, TemplateSettings,
    TemplateSnapshot,
};
use crate::scoring::repository::{RepositoryError, SessionRepository};
use crate::scoring::service::SessionScoringService;
use crate::scoring::session::Session;

pub(super) fn criterion(id: &str, config: CriteriaConfig, weight: f64) -> Criterion {
    Criterion {
        id: CriterionId(id.to_string()),
        name: id.replace('-', " "),
        group_id: None,
        config,
        weight,
        max_score: weight,
        is_required: true,
        is_auto_fail: false,
        auto_fail_threshold: None,
        sort_order: 0,
    }
}

pub(super) fn scale_config(min: f64, max: f64) -> CriteriaConfig {
    CriteriaConfig::Scale {
        min,
        max,
        step: None,
    }
}

pub(super) fn choices_config() -> CriteriaConfig {
    CriteriaConfig::MultipleChoice {
        choices: vec![
            ChoiceOption {
                id: "excellent".to_string(),
                label: "Excellent".to_string(),
                score: 10.0,
            },
            ChoiceOption {
                id: "adequate".to_string(),
                label: "Adequate".to_string(),
                score: 5.0,
            },
            ChoiceOption {
                id: "poor".to_string(),
                label: "Poor".to_string(),
                score: 0.0,
            },
        ],
    }
}

pub(super) fn percentage_config() -> CriteriaConfig {
    CriteriaConfig::Percentage {
        thresholds: vec![
            ColorBand {
                floor: 80.0,
                color: "green".to_string(),
            },
            ColorBand {
                floor: 60.0,
                color: "amber".to_string(),
            },
        ],
    }
}

/// Two-criterion weighted template: boolean greeting at weight 60, scale 0-4
/// call resolution at weight 40, pass threshold 70.
pub(super) fn weighted_snapshot() -> TemplateSnapshot {
    TemplateSnapshot {
        template_id: "tmpl-qa-standard".to_string(),
        name: "Standard QA scorecard".to_string(),
        scoring_method: ScoringMethod::Weighted,
        pass_threshold: 70.0,
        max_total_score: 100.0,
        custom_formula: None,
        settings: TemplateSettings::default(),
        groups: Vec::new(),
        criteria: vec![
            criterion("greeting", CriteriaConfig::Boolean, 60.0),
            criterion("resolution", scale_config(0.0, 4.0), 40.0),
        ],
    }
}

pub(super) fn grouped_snapshot() -> TemplateSnapshot {
    let mut snapshot = weighted_snapshot();
    snapshot.groups = vec![
        CriteriaGroup {
            id: GroupId("opening".to_string()),
            name: "Opening".to_string(),
            weight: Some(30.0),
            is_required: true,
        },
        CriteriaGroup {
            id: GroupId("handling".to_string()),
            name: "Handling".to_string(),
            weight: Some(70.0),
            is_required: true,
        },
    ];
    snapshot.criteria[0].group_id = Some(GroupId("opening".to_string()));
    snapshot.criteria[1].group_id = Some(GroupId("handling".to_string()));
    snapshot
}

pub(super) fn submission(id: &str, value: ScoreValue) -> ScoreSubmission {
    ScoreSubmission::scored(CriterionId(id.to_string()), value)
}

pub(super) fn na_submission(id: &str) -> ScoreSubmission {
    ScoreSubmission::not_applicable(CriterionId(id.to_string()))
}

pub(super) fn new_session(snapshot: TemplateSnapshot) -> Session {
    Session::new(
        SessionId("sess-test-1".to_string()),
        snapshot,
        chrono::Utc::now(),
    )
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, id: &SessionId) -> Option<Session> {
        self.sessions
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: Session) -> Result<Session, RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&session.session_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    fn update_from(
        &self,
        session: Session,
        expected_status: SessionStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        let stored = guard
            .get(&session.session_id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.status() != expected_status {
            return Err(RepositoryError::StaleStatus);
        }
        guard.insert(session.session_id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn open_sessions(&self, limit: usize) -> Result<Vec<Session>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|session| !session.status().is_terminal())
            .take(limit)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: Session) -> Result<Session, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn update_from(
        &self,
        _session: Session,
        _expected_status: SessionStatus,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn open_sessions(&self, _limit: usize) -> Result<Vec<Session>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

pub(super) fn build_service() -> (Arc<SessionScoringService<MemoryRepository>>, MemoryRepository) {
    let repository = MemoryRepository::default();
    let service = Arc::new(SessionScoringService::new(Arc::new(repository.clone())));
    (service, repository)
}
