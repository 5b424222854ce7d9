use crate::infra::{demo_snapshot, InMemorySessionRepository};
use clap::Args;
use std::sync::Arc;

use scorecard::error::AppError;
use scorecard::scoring::{
    CriterionId, ScoreSubmission, ScoreValue, SessionScoringService, SessionStatusView,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Mark the compliance disclosure as missed to show the auto-fail override
    #[arg(long)]
    pub(crate) miss_compliance: bool,
    /// Empathy rating on the 1-5 scale (default 4)
    #[arg(long, default_value_t = 4.0)]
    pub(crate) empathy: f64,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemorySessionRepository::default());
    let service = SessionScoringService::new(repository);

    let session = service
        .create_session(demo_snapshot())
        .map_err(demo_failure)?;
    println!("Session scoring demo");
    println!(
        "created {} against template '{}'",
        session.session_id, session.snapshot.name
    );

    let submissions = vec![
        ScoreSubmission::scored(
            CriterionId("greeting".to_string()),
            ScoreValue::Boolean(true),
        ),
        ScoreSubmission::scored(
            CriterionId("empathy".to_string()),
            ScoreValue::Scale(args.empathy),
        )
        .with_comment("kept the customer informed throughout"),
        ScoreSubmission::scored(
            CriterionId("compliance".to_string()),
            ScoreValue::Boolean(!args.miss_compliance),
        ),
        ScoreSubmission::scored(
            CriterionId("outcome".to_string()),
            ScoreValue::Choice("resolved".to_string()),
        ),
    ];

    for submission in submissions {
        let criteria_id = submission.criteria_id.clone();
        let record = service
            .submit_score(&session.session_id, submission)
            .map_err(demo_failure)?;
        println!(
            "  scored {:<12} normalized {:>5.1}{}",
            criteria_id,
            record.computed.normalized_score.unwrap_or(0.0),
            if record.computed.is_auto_fail_triggered {
                "  [auto-fail]"
            } else {
                ""
            }
        );
    }

    let result = service
        .complete(&session.session_id)
        .map_err(demo_failure)?;
    println!(
        "\nverdict: {} ({:.1}% against a {:.0}% threshold)",
        if result.pass_status { "PASS" } else { "FAIL" },
        result.percentage_score,
        session.snapshot.pass_threshold
    );
    if result.has_auto_fail {
        let ids: Vec<String> = result
            .auto_fail_criteria_ids
            .iter()
            .map(|id| id.0.clone())
            .collect();
        println!("auto-fail criteria: {}", ids.join(", "));
    }

    let stored = service.get(&session.session_id).map_err(demo_failure)?;
    let view = SessionStatusView::from_session(&stored);
    println!(
        "\nfinal state:\n{}",
        serde_json::to_string_pretty(&view).map_err(|err| AppError::Io(err.into()))?
    );

    Ok(())
}

fn demo_failure(error: scorecard::scoring::ScoringServiceError) -> AppError {
    AppError::Io(std::io::Error::other(error.to_string()))
}
