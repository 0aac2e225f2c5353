use crate::answers::{AnswerStrategy, FormField};
use crate::backend::{Backend, BackendError, tolerate};
use crate::config::AppConfig;
use crate::config::schema::PHONE_FIELD_LABEL;
use crate::selector::Selector;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Probe rounds for the resume input; modals often render late.
pub const UPLOAD_ATTEMPTS: usize = 5;

pub const UPLOAD_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Pause after clicking Next so the following wizard step can render.
pub const STEP_SETTLE_DELAY: Duration = Duration::from_millis(1500);

pub fn resume_input_selectors() -> Vec<Selector> {
    vec![
        Selector::css("input[type='file']"),
        Selector::css("input[type='file'][accept*='pdf']"),
        Selector::css("input[type='file'][name*='file']"),
    ]
}

pub fn submit_selector() -> Selector {
    Selector::with_text("button", "Submit application")
}

pub fn advance_selectors() -> Vec<Selector> {
    vec![
        Selector::with_text("button", "Next"),
        Selector::with_text("button", "Review"),
    ]
}

/// Drives an opened application panel: resume, known fields, wizard steps.
pub struct FormAutofill<'a> {
    resume_path: PathBuf,
    answers: &'a dyn AnswerStrategy,
    fields: Vec<FormField>,
    max_steps: usize,
}

impl<'a> FormAutofill<'a> {
    pub fn new(config: &AppConfig, answers: &'a dyn AnswerStrategy) -> Self {
        Self {
            resume_path: config.resume_path.clone(),
            answers,
            fields: vec![FormField::by_aria_label(PHONE_FIELD_LABEL)],
            max_steps: config.wizard.max_steps.max(1),
        }
    }

    /// Run every step and report whether the application was submitted.
    ///
    /// Only a clicked submit control counts as success. Session-level errors
    /// are returned so the caller can restart; anything else is logged and
    /// the next step is tried.
    pub async fn complete<B: Backend + ?Sized>(&self, backend: &mut B) -> Result<bool, BackendError> {
        let mut resume_attached = self.upload_resume(backend).await?;
        self.fill_fields(backend).await?;

        let mut steps = 0;
        loop {
            let submit = submit_selector();
            if tolerate(backend.exists(&submit).await, false)? {
                match backend.click(&submit).await {
                    Ok(()) => {
                        info!("Submitted application");
                        return Ok(true);
                    }
                    Err(e) if e.is_restartable() => return Err(e),
                    Err(e) => {
                        warn!("Submit click failed: {}", e);
                        return Ok(false);
                    }
                }
            }

            if steps >= self.max_steps {
                debug!("Wizard step budget ({}) exhausted", self.max_steps);
                return Ok(false);
            }

            let Some(advance) = self.find_advance(backend).await? else {
                debug!("No submit or next control on step {}", steps + 1);
                return Ok(false);
            };

            if let Err(e) = backend.click(&advance).await {
                if e.is_restartable() {
                    return Err(e);
                }
                warn!("Could not advance wizard via {}: {}", advance, e);
                return Ok(false);
            }
            steps += 1;
            tokio::time::sleep(STEP_SETTLE_DELAY).await;

            if !resume_attached {
                if let Some(input) = self.probe_resume_input(backend).await? {
                    resume_attached = self.attach(backend, &input).await?;
                }
            }
            self.fill_fields(backend).await?;
        }
    }

    /// Find a file input and attach the resume, polling up to
    /// [`UPLOAD_ATTEMPTS`] rounds [`UPLOAD_RETRY_DELAY`] apart.
    pub async fn upload_resume<B: Backend + ?Sized>(&self, backend: &mut B) -> Result<bool, BackendError> {
        for attempt in 1..=UPLOAD_ATTEMPTS {
            if let Some(input) = self.probe_resume_input(backend).await? {
                return self.attach(backend, &input).await;
            }
            debug!(
                "Resume input not found (attempt {}/{})",
                attempt, UPLOAD_ATTEMPTS
            );
            if attempt < UPLOAD_ATTEMPTS {
                tokio::time::sleep(UPLOAD_RETRY_DELAY).await;
            }
        }

        info!("Resume file input not found yet");
        Ok(false)
    }

    /// Type answers into the known fields that are present. Returns how many
    /// were filled.
    pub async fn fill_fields<B: Backend + ?Sized>(&self, backend: &mut B) -> Result<usize, BackendError> {
        let mut filled = 0;
        for field in &self.fields {
            if !tolerate(backend.exists(&field.selector).await, false)? {
                continue;
            }
            let Some(value) = self.answers.answer(field) else {
                debug!("No answer for field '{}'", field.label);
                continue;
            };
            match backend.fill(&field.selector, &value).await {
                Ok(()) => filled += 1,
                Err(e) if e.is_restartable() => return Err(e),
                Err(e) => warn!("Could not fill '{}': {}", field.label, e),
            }
        }
        Ok(filled)
    }

    async fn probe_resume_input<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<Option<Selector>, BackendError> {
        for selector in resume_input_selectors() {
            if tolerate(backend.exists(&selector).await, false)? {
                return Ok(Some(selector));
            }
        }
        Ok(None)
    }

    async fn attach<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        input: &Selector,
    ) -> Result<bool, BackendError> {
        match backend
            .set_input_files(input, std::slice::from_ref(&self.resume_path))
            .await
        {
            Ok(()) => {
                info!("Resume attached from {}", self.resume_path.display());
                Ok(true)
            }
            Err(e) if e.is_restartable() => Err(e),
            Err(e) => {
                warn!("Resume upload failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn find_advance<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<Option<Selector>, BackendError> {
        for selector in advance_selectors() {
            if tolerate(backend.exists(&selector).await, false)? {
                return Ok(Some(selector));
            }
        }
        Ok(None)
    }
}
