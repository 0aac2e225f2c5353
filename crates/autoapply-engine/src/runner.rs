use crate::answers::StaticAnswers;
use crate::backend::{Backend, BackendError};
use crate::config::AppConfig;
use crate::jobs::{self, JobPosting};
use crate::launcher;
use crate::login;
use crate::outcome::{ApplicationOutcome, RunReport};
use crate::outcome_log::OutcomeLogger;
use crate::session::SessionStore;
use crate::workflow::ApplyWorkflow;
use tracing::{error, info, warn};

/// Sinks for the human-readable run report.
#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

impl OutputHandlers {
    pub fn silent() -> Self {
        Self {
            out: |_| {},
            err: |_| {},
        }
    }
}

/// Load the job list and apply to every job in it.
///
/// With no jobs the browser is never launched.
pub async fn run<B: Backend + ?Sized>(
    backend: &mut B,
    config: &AppConfig,
    output: OutputHandlers,
) -> Result<RunReport, BackendError> {
    let jobs = jobs::load_or_empty(&config.files.job_data).await;
    (output.out)(&format!("Found {} job(s) to apply.", jobs.len()));
    if jobs.is_empty() {
        info!(
            "Nothing to do; run the monitor to fill {}",
            config.files.job_data.display()
        );
        return Ok(RunReport::default());
    }

    let report = apply_to_jobs(backend, config, &jobs, output).await?;
    (output.out)("All jobs processed.");
    (output.out)(&report.to_string());
    Ok(report)
}

/// Launch, log in once, then process `jobs` in order.
///
/// A job that ends in [`ApplicationOutcome::Restart`] gets exactly one more
/// attempt on a relaunched, re-authenticated browser; whatever that attempt
/// returns is final. If a relaunch failed, the next job starts by trying
/// again. The browser is closed before returning, on every path.
pub async fn apply_to_jobs<B: Backend + ?Sized>(
    backend: &mut B,
    config: &AppConfig,
    jobs: &[JobPosting],
    output: OutputHandlers,
) -> Result<RunReport, BackendError> {
    let store = SessionStore::new(&config.files.session_state);
    let logger = OutcomeLogger::new(&config.files.viewed_log, &config.files.applied_log);
    let answers = StaticAnswers::new(&config.answers);
    let workflow = ApplyWorkflow::new(config, &logger, &answers);

    if let Err(e) = start_session(backend, config, &store).await {
        launcher::shutdown(backend).await;
        return Err(e);
    }

    let mut report = RunReport::default();
    for (index, job) in jobs.iter().enumerate() {
        info!("Job {}/{}: {}", index + 1, jobs.len(), job.link);

        let mut outcome = if backend.is_ready().await {
            workflow.apply(backend, job).await
        } else {
            // An earlier relaunch failed. Each job gets its own chance to recover.
            warn!("Browser is down, relaunching before {}", job.link);
            relaunch_and_apply(backend, config, &store, &workflow, job).await
        };
        if let ApplicationOutcome::Restart(reason) = &outcome {
            warn!("Relaunching browser to retry {} once ({})", job.link, reason);
            outcome = relaunch_and_apply(backend, config, &store, &workflow, job).await;
        }

        match &outcome {
            ApplicationOutcome::Failed(_) | ApplicationOutcome::Restart(_) => {
                (output.err)(&format!("{} -> {}", job.link, outcome))
            }
            _ => (output.out)(&format!("{} -> {}", job.link, outcome)),
        }
        report.record(job.link.clone(), outcome);
    }

    launcher::shutdown(backend).await;
    Ok(report)
}

/// Tear down whatever is left of the browser, start a fresh session and run
/// `job` on it. A failed relaunch fails the job, not the run.
async fn relaunch_and_apply<B: Backend + ?Sized>(
    backend: &mut B,
    config: &AppConfig,
    store: &SessionStore,
    workflow: &ApplyWorkflow<'_>,
    job: &JobPosting,
) -> ApplicationOutcome {
    launcher::shutdown(backend).await;
    match start_session(backend, config, store).await {
        Ok(()) => workflow.apply(backend, job).await,
        Err(e) => {
            error!("Relaunch failed: {}", e);
            ApplicationOutcome::Failed(format!("relaunch failed: {}", e))
        }
    }
}

/// Launch with the stored session and log in. Login problems other than a
/// dead browser are logged and the run goes on.
async fn start_session<B: Backend + ?Sized>(
    backend: &mut B,
    config: &AppConfig,
    store: &SessionStore,
) -> Result<(), BackendError> {
    launcher::launch(backend, Some(store)).await?;
    match login::login(backend, config, Some(store)).await {
        Ok(outcome) => info!("Login finished: {:?}", outcome),
        Err(e) if e.is_restartable() => return Err(e),
        Err(e) => warn!("Login failed, continuing anyway: {}", e),
    }
    Ok(())
}
