mod common;

use autoapply_engine::answers::StaticAnswers;
use autoapply_engine::backend::BackendError;
use autoapply_engine::jobs::JobPosting;
use autoapply_engine::outcome::ApplicationOutcome;
use autoapply_engine::outcome_log::OutcomeLogger;
use autoapply_engine::selector::Selector;
use autoapply_engine::workflow::ApplyWorkflow;
use common::*;

const JOB_URL: &str = "https://www.linkedin.com/jobs/view/1/";

fn logger_for(config: &autoapply_engine::config::AppConfig) -> OutcomeLogger {
    OutcomeLogger::new(&config.files.viewed_log, &config.files.applied_log)
}

#[tokio::test(start_paused = true)]
async fn test_relative_link_is_normalized_and_applied() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let mut backend = MockBackend::launched()
        .with(&Selector::css("h1"), "  Rust Engineer\n")
        .with(&Selector::css("a.topcard__org-name-link"), "Ferrous")
        .with(&apply_button(), "Easy Apply")
        .with(&file_input(), "")
        .with(&submit_button(), "Submit application");

    let outcome = workflow
        .apply(&mut backend, &JobPosting::from_link("/jobs/view/1/"))
        .await;

    assert_eq!(outcome, ApplicationOutcome::Completed { submitted: true });
    assert_eq!(backend.navigations, vec![JOB_URL.to_string()]);
    assert_eq!(backend.clicked(&apply_button()), 1);
    assert_eq!(backend.clicked(&submit_button()), 1);
    assert_eq!(backend.uploads.len(), 1);

    let viewed = tokio::fs::read_to_string(&config.files.viewed_log)
        .await
        .unwrap();
    assert_eq!(viewed, format!("Rust Engineer at Ferrous - {}\n", JOB_URL));

    let applied = tokio::fs::read_to_string(&config.files.applied_log)
        .await
        .unwrap();
    assert_eq!(applied.lines().count(), 1);
    assert!(applied.contains(&format!("Rust Engineer at Ferrous - {}", JOB_URL)));
}

#[tokio::test(start_paused = true)]
async fn test_missing_apply_button_skips_without_autofill() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let mut backend = MockBackend::launched()
        .with(&file_input(), "")
        .with(&submit_button(), "Submit application");

    let outcome = workflow
        .apply(&mut backend, &JobPosting::from_link(JOB_URL))
        .await;

    assert_eq!(outcome, ApplicationOutcome::Skipped);
    assert!(backend.clicks.is_empty());
    assert!(backend.uploads.is_empty());
    assert_eq!(backend.probe_count(&file_input()), 0);

    // The viewed line is written even when the job is skipped.
    let viewed = tokio::fs::read_to_string(&config.files.viewed_log)
        .await
        .unwrap();
    assert_eq!(
        viewed,
        format!("Unknown Title at Unknown Company - {}\n", JOB_URL)
    );
    assert!(!config.files.applied_log.exists());
}

#[tokio::test(start_paused = true)]
async fn test_apply_variants_are_tried_in_priority_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let css_variant = Selector::css("button.jobs-apply-button");
    let french_variant = Selector::with_text("button", "Candidature simplifiée");
    let mut backend = MockBackend::launched()
        .with(&french_variant, "Candidature simplifiée")
        .with(&css_variant, "");

    workflow
        .apply(&mut backend, &JobPosting::from_link(JOB_URL))
        .await;

    assert_eq!(backend.clicked(&css_variant), 1);
    assert_eq!(backend.clicked(&french_variant), 0);
}

#[tokio::test(start_paused = true)]
async fn test_late_apply_button_is_found_within_probe_window() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let mut backend = MockBackend::launched().with(&submit_button(), "Submit application");
    backend.appear_after.insert(apply_button().to_string(), 4);

    let outcome = workflow
        .apply(&mut backend, &JobPosting::from_link(JOB_URL))
        .await;

    assert_eq!(outcome, ApplicationOutcome::Completed { submitted: true });
    assert_eq!(backend.probe_count(&apply_button()), 4);
}

#[tokio::test(start_paused = true)]
async fn test_missing_submit_is_completed_but_not_logged_as_applied() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let mut backend = MockBackend::launched().with(&apply_button(), "Easy Apply");

    let outcome = workflow
        .apply(&mut backend, &JobPosting::from_link(JOB_URL))
        .await;

    assert_eq!(outcome, ApplicationOutcome::Completed { submitted: false });
    assert!(config.files.viewed_log.exists());
    assert!(!config.files.applied_log.exists());
}

#[tokio::test(start_paused = true)]
async fn test_closed_browser_yields_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let mut backend = MockBackend::launched().fail_navigation(
        JOB_URL,
        BackendError::from_message(
            "page.goto: Target page, context or browser has been closed",
        ),
    );

    let outcome = workflow
        .apply(&mut backend, &JobPosting::from_link(JOB_URL))
        .await;

    assert!(matches!(outcome, ApplicationOutcome::Restart(_)));
    assert!(!config.files.viewed_log.exists());
}

#[tokio::test(start_paused = true)]
async fn test_session_loss_during_autofill_yields_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let mut backend = MockBackend::launched()
        .with(&apply_button(), "Easy Apply")
        .with(&submit_button(), "Submit application");
    backend.crash_on_click.insert(
        apply_button().to_string(),
        BackendError::SessionClosed("Target closed".into()),
    );

    let outcome = workflow
        .apply(&mut backend, &JobPosting::from_link(JOB_URL))
        .await;

    assert_eq!(
        outcome,
        ApplicationOutcome::Restart("Browser session closed: Target closed".into())
    );
    assert_eq!(backend.clicked(&submit_button()), 0);
    assert!(!config.files.applied_log.exists());
}

#[tokio::test(start_paused = true)]
async fn test_aborted_navigation_yields_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let mut backend = MockBackend::launched().fail_navigation(
        JOB_URL,
        BackendError::NavigationAborted("net::ERR_ABORTED".into()),
    );

    let outcome = workflow
        .apply(&mut backend, &JobPosting::from_link(JOB_URL))
        .await;

    assert!(outcome.is_restart());
}

#[tokio::test(start_paused = true)]
async fn test_other_errors_yield_failed() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let logger = logger_for(&config);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(&config, &logger, &answers);

    let mut backend = MockBackend::launched().fail_navigation(
        JOB_URL,
        BackendError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()),
    );

    let outcome = workflow
        .apply(&mut backend, &JobPosting::from_link(JOB_URL))
        .await;

    assert!(matches!(outcome, ApplicationOutcome::Failed(_)));
}
