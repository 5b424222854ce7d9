//! Integration specifications for the session scoring lifecycle.
//!
//! Scenarios run end to end through the public service facade and HTTP router
//! so validation, aggregation, and the state machine are exercised without
//! reaching into private modules.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use scorecard::scoring::{
        CriteriaConfig, Criterion, CriterionId, RepositoryError, ScoreSubmission, ScoreValue,
        ScoringMethod, Session, SessionId, SessionRepository, SessionScoringService,
        SessionStatus, TemplateSettings, TemplateSnapshot,
    };

    #[derive(Default, Clone)]
    pub struct MemoryRepository {
        sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
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

    pub fn build_service() -> (Arc<SessionScoringService<MemoryRepository>>, MemoryRepository) {
        let repository = MemoryRepository::default();
        let service = Arc::new(SessionScoringService::new(Arc::new(repository.clone())));
        (service, repository)
    }

    pub fn snapshot() -> TemplateSnapshot {
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
                    name: "Greeting used".to_string(),
                    group_id: None,
                    config: CriteriaConfig::Boolean,
                    weight: 60.0,
                    max_score: 60.0,
                    is_required: true,
                    is_auto_fail: true,
                    auto_fail_threshold: Some(100.0),
                    sort_order: 1,
                },
                Criterion {
                    id: CriterionId("resolution".to_string()),
                    name: "Issue resolution".to_string(),
                    group_id: None,
                    config: CriteriaConfig::Scale {
                        min: 0.0,
                        max: 4.0,
                        step: None,
                    },
                    weight: 40.0,
                    max_score: 40.0,
                    is_required: true,
                    is_auto_fail: false,
                    auto_fail_threshold: None,
                    sort_order: 2,
                },
            ],
        }
    }

    pub fn scored(id: &str, value: ScoreValue) -> ScoreSubmission {
        ScoreSubmission::scored(CriterionId(id.to_string()), value)
    }
}

use common::{build_service, scored, snapshot};
use scorecard::scoring::{
    ScoreValue, ScoringServiceError, SessionError, SessionRepository, SessionStatus,
};

#[test]
fn a_fully_scored_session_completes_with_a_frozen_verdict() {
    let (service, repository) = build_service();
    let session = service.create_session(snapshot()).expect("session created");
    assert_eq!(session.status(), SessionStatus::Pending);
    assert_eq!(repository.open_sessions(10).unwrap().len(), 1);

    service
        .submit_score(
            &session.session_id,
            scored("greeting", ScoreValue::Boolean(true)),
        )
        .expect("score accepted");
    service
        .submit_score(
            &session.session_id,
            scored("resolution", ScoreValue::Scale(2.0)),
        )
        .expect("score accepted");

    let result = service.complete(&session.session_id).expect("completes");
    assert_eq!(result.percentage_score, 80.0);
    assert!(result.pass_status);
    assert!(!result.has_auto_fail);

    let stored = service.get(&session.session_id).expect("fetches");
    assert_eq!(stored.status(), SessionStatus::Completed);
    assert_eq!(stored.result(), Some(&result));
    assert!(repository.open_sessions(10).unwrap().is_empty());

    // The verdict is frozen: no further writes are accepted.
    match service.submit_score(
        &session.session_id,
        scored("greeting", ScoreValue::Boolean(false)),
    ) {
        Err(ScoringServiceError::Session(SessionError::Transition(_))) => {}
        other => panic!("expected transition error, got {other:?}"),
    }
}

#[test]
fn a_missed_auto_fail_criterion_fails_the_session_outright() {
    let (service, _) = build_service();
    let session = service.create_session(snapshot()).expect("session created");

    service
        .submit_score(
            &session.session_id,
            scored("greeting", ScoreValue::Boolean(false)),
        )
        .expect("score accepted");
    service
        .submit_score(
            &session.session_id,
            scored("resolution", ScoreValue::Scale(4.0)),
        )
        .expect("score accepted");

    let result = service.complete(&session.session_id).expect("completes");
    assert!(result.has_auto_fail);
    assert!(!result.pass_status);
    assert_eq!(result.auto_fail_criteria_ids.len(), 1);
    assert_eq!(result.auto_fail_criteria_ids[0].0, "greeting");
}

#[test]
fn cancelling_keeps_the_session_unscored_and_terminal() {
    let (service, repository) = build_service();
    let session = service.create_session(snapshot()).expect("session created");

    service
        .submit_score(
            &session.session_id,
            scored("greeting", ScoreValue::Boolean(true)),
        )
        .expect("score accepted");
    let cancelled = service.cancel(&session.session_id).expect("cancels");
    assert_eq!(cancelled.status(), SessionStatus::Cancelled);
    assert!(repository.open_sessions(10).unwrap().is_empty());

    match service.complete(&session.session_id) {
        Err(ScoringServiceError::Session(SessionError::Transition(error))) => {
            assert_eq!(error.from, SessionStatus::Cancelled);
        }
        other => panic!("expected transition error, got {other:?}"),
    }
}
