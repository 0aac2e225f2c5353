use crate::selector::Selector;
use crate::session::SessionState;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub use crate::error::BackendError;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// Interval used by the default polling waits.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The browser-automation interface the workflow is written against.
///
/// One backend owns one browser with a single page. `launch` may be called
/// again after `close` to obtain a fresh browser.
#[async_trait]
pub trait Backend: Send {
    /// Start the browser and open a blank page.
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the browser and cleanup resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a URL and wait for the load event.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    async fn current_url(&mut self) -> Result<String, BackendError>;

    /// Whether at least one element matches the selector right now.
    async fn exists(&mut self, selector: &Selector) -> Result<bool, BackendError>;

    /// Text of the first matching element, `None` if nothing matches.
    async fn text_content(&mut self, selector: &Selector) -> Result<Option<String>, BackendError>;

    async fn click(&mut self, selector: &Selector) -> Result<(), BackendError>;

    /// Replace the value of the first matching input.
    async fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), BackendError>;

    /// Attach files to the first matching `<input type=file>`.
    async fn set_input_files(
        &mut self,
        selector: &Selector,
        files: &[PathBuf],
    ) -> Result<(), BackendError>;

    /// Export cookies (and any other context state) of the running browser.
    async fn session_state(&mut self) -> Result<SessionState, BackendError>;

    /// Seed the running browser with previously exported state.
    async fn restore_session(&mut self, state: &SessionState) -> Result<(), BackendError>;

    /// Execute a script in the page and return its JSON result.
    async fn execute_script(&mut self, _script: &str) -> Result<serde_json::Value, BackendError> {
        Err(BackendError::NotSupported("execute_script".into()))
    }

    /// Poll until the selector matches or the timeout elapses.
    async fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> Result<(), BackendError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.exists(selector).await? {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BackendError::Timeout {
                    operation: format!("waiting for {}", selector),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Poll until the page URL starts with `prefix` or the timeout elapses.
    async fn wait_for_url(&mut self, prefix: &str, timeout: Duration) -> Result<(), BackendError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.current_url().await?.starts_with(prefix) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BackendError::Timeout {
                    operation: format!("waiting for url {}", prefix),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Swallow non-session errors of an optional probe, using `fallback`.
pub(crate) fn tolerate<T>(result: Result<T, BackendError>, fallback: T) -> Result<T, BackendError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_restartable() => Err(e),
        Err(e) => {
            debug!("Ignoring probe error: {}", e);
            Ok(fallback)
        }
    }
}
