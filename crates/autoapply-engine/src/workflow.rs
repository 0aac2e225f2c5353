use crate::answers::AnswerStrategy;
use crate::autofill::FormAutofill;
use crate::backend::{Backend, BackendError, tolerate};
use crate::config::AppConfig;
use crate::jobs::{JobPosting, normalize_link};
use crate::outcome::ApplicationOutcome;
use crate::outcome_log::OutcomeLogger;
use crate::selector::Selector;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Fixed pause after the load event before touching the page.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// How long to look for an apply button before skipping the job.
pub const APPLY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub const APPLY_PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// Pause after opening the apply panel.
pub const MODAL_DELAY: Duration = Duration::from_secs(2);

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

pub fn title_selectors() -> Vec<Selector> {
    vec![Selector::css("h1")]
}

pub fn company_selectors() -> Vec<Selector> {
    vec![
        Selector::css("a.topcard__org-name-link"),
        Selector::css("span.topcard__flavor"),
        Selector::css(".job-details-jobs-unified-top-card__company-name"),
    ]
}

/// Processes one job posting at a time against a live backend.
pub struct ApplyWorkflow<'a> {
    config: &'a AppConfig,
    logger: &'a OutcomeLogger,
    autofill: FormAutofill<'a>,
}

impl<'a> ApplyWorkflow<'a> {
    pub fn new(
        config: &'a AppConfig,
        logger: &'a OutcomeLogger,
        answers: &'a dyn AnswerStrategy,
    ) -> Self {
        Self {
            config,
            logger,
            autofill: FormAutofill::new(config, answers),
        }
    }

    /// Run the workflow for one job. Never fails: every error becomes an
    /// outcome.
    pub async fn apply<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        job: &JobPosting,
    ) -> ApplicationOutcome {
        match self.try_apply(backend, job).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_restartable() => {
                warn!("Browser went away while applying to {}: {}", job.link, e);
                ApplicationOutcome::Restart(e.to_string())
            }
            Err(e) => {
                error!("Error applying to {}: {}", job.link, e);
                ApplicationOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_apply<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        job: &JobPosting,
    ) -> Result<ApplicationOutcome, BackendError> {
        let link = normalize_link(&job.link, &self.config.site.base_url);

        info!("Navigating to {}", link);
        backend.navigate(&link).await?;
        tokio::time::sleep(SETTLE_DELAY).await;

        let title = first_text(backend, &title_selectors())
            .await?
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let company = first_text(backend, &company_selectors())
            .await?
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());

        info!("Viewed job: {} at {}", title, company);
        if let Err(e) = self.logger.record_viewed(&title, &company, &link).await {
            warn!(
                "Could not write {}: {}",
                self.logger.viewed_path().display(),
                e
            );
        }

        let Some(button) = self.find_apply_button(backend).await? else {
            info!("No apply button on {}, skipping", link);
            return Ok(ApplicationOutcome::Skipped);
        };

        debug!("Clicking apply button {}", button);
        backend.click(&button).await?;
        tokio::time::sleep(MODAL_DELAY).await;

        let submitted = self.autofill.complete(backend).await?;
        if submitted {
            info!("Applied to: {}", link);
            if let Err(e) = self
                .logger
                .record_applied(&title, &company, &link, chrono::Local::now())
                .await
            {
                warn!(
                    "Could not write {}: {}",
                    self.logger.applied_path().display(),
                    e
                );
            }
        } else {
            warn!("Could not complete application for: {}", link);
        }

        Ok(ApplicationOutcome::Completed { submitted })
    }

    /// Poll the configured variants in priority order until one matches or
    /// [`APPLY_PROBE_TIMEOUT`] passes.
    async fn find_apply_button<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<Option<Selector>, BackendError> {
        let deadline = tokio::time::Instant::now() + APPLY_PROBE_TIMEOUT;
        loop {
            for selector in &self.config.site.apply_selectors {
                if tolerate(backend.exists(selector).await, false)? {
                    return Ok(Some(selector.clone()));
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(APPLY_PROBE_INTERVAL).await;
        }
    }
}

/// Text of the first selector that yields non-blank text.
async fn first_text<B: Backend + ?Sized>(
    backend: &mut B,
    selectors: &[Selector],
) -> Result<Option<String>, BackendError> {
    for selector in selectors {
        let text = tolerate(backend.text_content(selector).await, None)?;
        if let Some(text) = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            return Ok(Some(text));
        }
    }
    Ok(None)
}
