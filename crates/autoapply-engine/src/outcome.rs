use std::fmt;

/// Terminal state of one job in the apply workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationOutcome {
    /// The apply panel was opened and the form driven to the end.
    /// `submitted` is false when no submit control was ever clicked.
    Completed { submitted: bool },
    /// No apply affordance on the page; nothing was attempted.
    Skipped,
    /// Recoverable failure, the run moves on.
    Failed(String),
    /// The browser or page died under the job; relaunch and retry once.
    Restart(String),
}

impl ApplicationOutcome {
    pub fn is_restart(&self) -> bool {
        matches!(self, ApplicationOutcome::Restart(_))
    }
}

impl fmt::Display for ApplicationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationOutcome::Completed { submitted: true } => write!(f, "applied"),
            ApplicationOutcome::Completed { submitted: false } => write!(f, "incomplete"),
            ApplicationOutcome::Skipped => write!(f, "skipped"),
            ApplicationOutcome::Failed(reason) => write!(f, "error ({})", reason),
            ApplicationOutcome::Restart(reason) => write!(f, "restart ({})", reason),
        }
    }
}

/// Ordered record of every job processed in one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<(String, ApplicationOutcome)>,
}

impl RunReport {
    pub fn record(&mut self, link: impl Into<String>, outcome: ApplicationOutcome) {
        self.outcomes.push((link.into(), outcome));
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, ApplicationOutcome::Completed { submitted: true }))
    }

    pub fn incomplete(&self) -> usize {
        self.count(|o| matches!(o, ApplicationOutcome::Completed { submitted: false }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ApplicationOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ApplicationOutcome::Failed(_)))
    }

    /// Jobs whose retry after a relaunch still ended in a restart signal.
    pub fn restarted(&self) -> usize {
        self.count(ApplicationOutcome::is_restart)
    }

    fn count(&self, pred: impl Fn(&ApplicationOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} job(s): {} applied, {} incomplete, {} skipped, {} failed, {} unrecovered",
            self.len(),
            self.applied(),
            self.incomplete(),
            self.skipped(),
            self.failed(),
            self.restarted()
        )
    }
}
