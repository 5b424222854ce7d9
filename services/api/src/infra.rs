use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use scorecard::scoring::{
    ChoiceOption, CriteriaConfig, Criterion, CriterionId, RepositoryError, ScoringMethod, Session,
    SessionId, SessionRepository, SessionStatus, TemplateSettings, TemplateSnapshot,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl SessionRepository for InMemorySessionRepository {
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

/// Template snapshot used by the demo command and local exploration.
pub(crate) fn demo_snapshot() -> TemplateSnapshot {
    TemplateSnapshot {
        template_id: "tmpl-support-call".to_string(),
        name: "Support call scorecard".to_string(),
        scoring_method: ScoringMethod::Weighted,
        pass_threshold: 70.0,
        max_total_score: 100.0,
        custom_formula: None,
        settings: TemplateSettings::default(),
        groups: Vec::new(),
        criteria: vec![
            Criterion {
                id: CriterionId("greeting".to_string()),
                name: "Greeting and identification".to_string(),
                group_id: None,
                config: CriteriaConfig::Boolean,
                weight: 20.0,
                max_score: 20.0,
                is_required: true,
                is_auto_fail: false,
                auto_fail_threshold: None,
                sort_order: 1,
            },
            Criterion {
                id: CriterionId("empathy".to_string()),
                name: "Empathy and tone".to_string(),
                group_id: None,
                config: CriteriaConfig::Scale {
                    min: 1.0,
                    max: 5.0,
                    step: Some(1.0),
                },
                weight: 30.0,
                max_score: 30.0,
                is_required: true,
                is_auto_fail: false,
                auto_fail_threshold: None,
                sort_order: 2,
            },
            Criterion {
                id: CriterionId("compliance".to_string()),
                name: "Compliance disclosure".to_string(),
                group_id: None,
                config: CriteriaConfig::Boolean,
                weight: 20.0,
                max_score: 20.0,
                is_required: true,
                is_auto_fail: true,
                auto_fail_threshold: Some(100.0),
                sort_order: 3,
            },
            Criterion {
                id: CriterionId("outcome".to_string()),
                name: "Call outcome".to_string(),
                group_id: None,
                config: CriteriaConfig::MultipleChoice {
                    choices: vec![
                        ChoiceOption {
                            id: "resolved".to_string(),
                            label: "Resolved on first contact".to_string(),
                            score: 10.0,
                        },
                        ChoiceOption {
                            id: "escalated".to_string(),
                            label: "Escalated with context".to_string(),
                            score: 6.0,
                        },
                        ChoiceOption {
                            id: "dropped".to_string(),
                            label: "Dropped without follow-up".to_string(),
                            score: 0.0,
                        },
                    ],
                },
                weight: 30.0,
                max_score: 30.0,
                is_required: true,
                is_auto_fail: false,
                auto_fail_threshold: None,
                sort_order: 4,
            },
        ],
    }
}
