use crate::selector::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Label of the phone field the default answers cover.
pub const PHONE_FIELD_LABEL: &str = "Phone number";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default = "default_resume_path")]
    pub resume_path: PathBuf,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Answers keyed by form field label.
    #[serde(default = "default_answers")]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub wizard: WizardConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            resume_path: default_resume_path(),
            site: SiteConfig::default(),
            files: FilesConfig::default(),
            browser: BrowserConfig::default(),
            answers: default_answers(),
            wizard: WizardConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Overlay values from the environment. Unset keys leave the current
    /// value untouched.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup("LINKEDIN_EMAIL") {
            self.credentials.username = username;
        }
        if let Some(password) = lookup("LINKEDIN_PASSWORD") {
            self.credentials.password = password;
        }
        if let Some(resume) = lookup("RESUME_PATH") {
            self.resume_path = PathBuf::from(resume);
        }
        if let Some(phone) = lookup("APPLICANT_PHONE") {
            self.answers.insert(PHONE_FIELD_LABEL.to_string(), phone);
        }
        if let Some(headless) = lookup("AUTOAPPLY_HEADLESS") {
            self.browser.headless = is_truthy(&headless);
        }
    }
}

fn is_truthy(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
}

fn default_resume_path() -> PathBuf {
    PathBuf::from("resume_matcher/resume.pdf")
}

fn default_answers() -> BTreeMap<String, String> {
    // Placeholder until a real answer source is configured.
    BTreeMap::from([(PHONE_FIELD_LABEL.to_string(), "9876543210".to_string())])
}

/// Login credentials. Missing values are empty strings, never an error.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Landing page prefix that signals a completed login.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// Apply-button variants in priority order.
    #[serde(default = "default_apply_selectors")]
    pub apply_selectors: Vec<Selector>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_url: default_login_url(),
            feed_url: default_feed_url(),
            apply_selectors: default_apply_selectors(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.linkedin.com".to_string()
}

fn default_login_url() -> String {
    "https://www.linkedin.com/login".to_string()
}

fn default_feed_url() -> String {
    "https://www.linkedin.com/feed/".to_string()
}

pub fn default_apply_selectors() -> Vec<Selector> {
    vec![
        Selector::with_text("button", "Easy Apply"),
        Selector::css("button[aria-label*='Easy Apply']"),
        Selector::css("button.jobs-apply-button"),
        Selector::with_text("button", "Candidature simplifiée"),
        Selector::with_text("button", "Einfach bewerben"),
        Selector::with_text("button", "Solicitud sencilla"),
        Selector::with_text("button", "Candidatura semplice"),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_job_data")]
    pub job_data: PathBuf,
    #[serde(default = "default_session_state")]
    pub session_state: PathBuf,
    #[serde(default = "default_viewed_log")]
    pub viewed_log: PathBuf,
    #[serde(default = "default_applied_log")]
    pub applied_log: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            job_data: default_job_data(),
            session_state: default_session_state(),
            viewed_log: default_viewed_log(),
            applied_log: default_applied_log(),
        }
    }
}

fn default_job_data() -> PathBuf {
    PathBuf::from("job_monitor/job_data.json")
}

fn default_session_state() -> PathBuf {
    PathBuf::from("auth.json")
}

fn default_viewed_log() -> PathBuf {
    PathBuf::from("viewed_jobs.log")
}

fn default_applied_log() -> PathBuf {
    PathBuf::from("applied_jobs.log")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub headless: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WizardConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

fn default_max_steps() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_easy_apply_only")]
    pub easy_apply_only: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            location: default_location(),
            easy_apply_only: default_easy_apply_only(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    vec!["Software Engineer".to_string()]
}

fn default_location() -> String {
    "United States".to_string()
}

fn default_easy_apply_only() -> bool {
    true
}
