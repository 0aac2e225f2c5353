#![allow(dead_code)]

use async_trait::async_trait;
use autoapply_engine::backend::{Backend, BackendError, NavigationResult};
use autoapply_engine::config::AppConfig;
use autoapply_engine::selector::Selector;
use autoapply_engine::session::{Cookie, SessionState};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

pub const BASE: &str = "https://www.linkedin.com";
pub const LOGIN_URL: &str = "https://www.linkedin.com/login";
pub const FEED_URL: &str = "https://www.linkedin.com/feed/";

/// Scripted stand-in for a browser. Elements are keyed by the selector's
/// display form and map to their text.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub ready: bool,
    pub url: String,
    pub elements: HashMap<String, String>,
    /// Element sets swapped in when navigating to a URL.
    pub pages: HashMap<String, HashMap<String, String>>,
    /// Selectors that only match from their n-th probe on.
    pub appear_after: HashMap<String, usize>,
    /// Clicking a selector adds these elements to the page.
    pub reveals: HashMap<String, Vec<(String, String)>>,
    /// Clicking a selector moves the page to a URL.
    pub click_navigates: HashMap<String, String>,
    /// Errors returned by `navigate` for a URL, consumed front to back.
    pub navigate_errors: HashMap<String, VecDeque<BackendError>>,
    /// Clicking a selector kills the browser; later calls fail with the error.
    pub crash_on_click: HashMap<String, BackendError>,
    pub crashed: Option<BackendError>,
    /// Launches beyond this many fail.
    pub launch_limit: Option<usize>,
    /// Launch attempts (1-based) that fail once.
    pub failing_launches: Vec<usize>,
    pub session: SessionState,
    pub fail_session_export: bool,
    pub script_result: serde_json::Value,

    pub launches: usize,
    pub closes: usize,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub uploads: Vec<(String, Vec<PathBuf>)>,
    pub probes: HashMap<String, usize>,
    pub restored: Vec<SessionState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that has already been launched.
    pub fn launched() -> Self {
        Self {
            ready: true,
            url: "about:blank".into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, selector: &Selector, text: &str) -> Self {
        self.elements.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn page(mut self, url: &str, elements: &[(&Selector, &str)]) -> Self {
        self.pages.insert(
            url.to_string(),
            elements
                .iter()
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .collect(),
        );
        self
    }

    pub fn fail_navigation(mut self, url: &str, error: BackendError) -> Self {
        self.navigate_errors
            .entry(url.to_string())
            .or_default()
            .push_back(error);
        self
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigations.iter().filter(|u| *u == url).count()
    }

    pub fn clicked(&self, selector: &Selector) -> usize {
        let key = selector.to_string();
        self.clicks.iter().filter(|c| **c == key).count()
    }

    pub fn probe_count(&self, selector: &Selector) -> usize {
        self.probes.get(&selector.to_string()).copied().unwrap_or(0)
    }

    fn ensure_ready(&self) -> Result<(), BackendError> {
        if let Some(err) = &self.crashed {
            return Err(err.clone());
        }
        if self.ready {
            Ok(())
        } else {
            Err(BackendError::NotReady)
        }
    }

    fn require(&self, selector: &Selector) -> Result<String, BackendError> {
        let key = selector.to_string();
        if self.elements.contains_key(&key) {
            Ok(key)
        } else {
            Err(BackendError::ElementNotFound { selector: key })
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        self.launches += 1;
        if self.launch_limit.is_some_and(|limit| self.launches > limit)
            || self.failing_launches.contains(&self.launches)
        {
            return Err(BackendError::Other("Failed to launch browser".into()));
        }
        self.ready = true;
        self.crashed = None;
        self.url = "about:blank".into();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.closes += 1;
        self.ready = false;
        self.crashed = None;
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.ready
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        self.ensure_ready()?;
        self.navigations.push(url.to_string());
        if let Some(err) = self
            .navigate_errors
            .get_mut(url)
            .and_then(|errors| errors.pop_front())
        {
            return Err(err);
        }
        self.url = url.to_string();
        if let Some(elements) = self.pages.get(url) {
            self.elements = elements.clone();
        }
        Ok(NavigationResult {
            url: url.to_string(),
            title: String::new(),
        })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        self.ensure_ready()?;
        Ok(self.url.clone())
    }

    async fn exists(&mut self, selector: &Selector) -> Result<bool, BackendError> {
        self.ensure_ready()?;
        let key = selector.to_string();
        let count = self.probes.entry(key.clone()).or_insert(0);
        *count += 1;
        if let Some(after) = self.appear_after.get(&key) {
            if *count >= *after {
                self.elements.entry(key.clone()).or_default();
            }
        }
        Ok(self.elements.contains_key(&key))
    }

    async fn text_content(&mut self, selector: &Selector) -> Result<Option<String>, BackendError> {
        self.ensure_ready()?;
        Ok(self.elements.get(&selector.to_string()).cloned())
    }

    async fn click(&mut self, selector: &Selector) -> Result<(), BackendError> {
        self.ensure_ready()?;
        let key = self.require(selector)?;
        self.clicks.push(key.clone());
        if let Some(revealed) = self.reveals.get(&key).cloned() {
            self.elements.extend(revealed);
        }
        if let Some(url) = self.click_navigates.get(&key).cloned() {
            self.url = url;
        }
        if let Some(err) = self.crash_on_click.get(&key).cloned() {
            self.crashed = Some(err);
        }
        Ok(())
    }

    async fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), BackendError> {
        self.ensure_ready()?;
        let key = self.require(selector)?;
        self.fills.push((key, value.to_string()));
        Ok(())
    }

    async fn set_input_files(
        &mut self,
        selector: &Selector,
        files: &[PathBuf],
    ) -> Result<(), BackendError> {
        self.ensure_ready()?;
        let key = self.require(selector)?;
        self.uploads.push((key, files.to_vec()));
        Ok(())
    }

    async fn session_state(&mut self) -> Result<SessionState, BackendError> {
        self.ensure_ready()?;
        if self.fail_session_export {
            return Err(BackendError::Other("storage unavailable".into()));
        }
        Ok(self.session.clone())
    }

    async fn restore_session(&mut self, state: &SessionState) -> Result<(), BackendError> {
        self.ensure_ready()?;
        self.restored.push(state.clone());
        Ok(())
    }

    async fn execute_script(&mut self, _script: &str) -> Result<serde_json::Value, BackendError> {
        self.ensure_ready()?;
        Ok(self.script_result.clone())
    }
}

/// Configuration with every file inside `dir`.
pub fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.files.job_data = dir.join("job_monitor").join("job_data.json");
    config.files.session_state = dir.join("auth.json");
    config.files.viewed_log = dir.join("viewed_jobs.log");
    config.files.applied_log = dir.join("applied_jobs.log");
    config.resume_path = dir.join("resume.pdf");
    config
}

pub fn sample_session() -> SessionState {
    SessionState {
        cookies: vec![Cookie {
            name: "li_at".into(),
            value: "abc".into(),
            domain: Some(".linkedin.com".into()),
            path: Some("/".into()),
            expires: Some(1_900_000_000.0),
            http_only: Some(true),
            secure: Some(true),
        }],
        origins: vec![],
    }
}

pub fn apply_button() -> Selector {
    Selector::with_text("button", "Easy Apply")
}

pub fn submit_button() -> Selector {
    Selector::with_text("button", "Submit application")
}

pub fn next_button() -> Selector {
    Selector::with_text("button", "Next")
}

pub fn file_input() -> Selector {
    Selector::css("input[type='file']")
}

pub fn phone_input() -> Selector {
    Selector::css("input[aria-label='Phone number']")
}
