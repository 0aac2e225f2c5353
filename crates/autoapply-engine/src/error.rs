/// Error kinds surfaced by a browser backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    // ============================================================
    // Navigation Errors
    // ============================================================
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Navigation aborted: {0}")]
    NavigationAborted(String),

    // ============================================================
    // Session Errors
    // ============================================================
    /// The page, context or browser went away underneath us.
    #[error("Browser session closed: {0}")]
    SessionClosed(String),

    #[error("Not ready")]
    NotReady,

    // ============================================================
    // Element Errors
    // ============================================================
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Script execution error: {0}")]
    Script(String),

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    // ============================================================
    // System Errors
    // ============================================================
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

/// Driver messages meaning the page, context or browser was torn down.
const SESSION_CLOSED_MARKERS: &[&str] = &[
    "Target page, context or browser has been closed",
    "receiver is gone",
    "Target closed",
    "Session closed",
    "browser has disconnected",
];

/// Driver messages meaning an in-flight navigation was cancelled.
const NAVIGATION_ABORTED_MARKERS: &[&str] = &[
    "net::ERR_ABORTED",
    "Navigation aborted",
    "navigation was aborted",
];

impl BackendError {
    /// Classify a free-text driver error into a tagged variant.
    ///
    /// This is the only place where error text is inspected; everything
    /// downstream matches on the variant.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if SESSION_CLOSED_MARKERS.iter().any(|m| message.contains(m)) {
            BackendError::SessionClosed(message)
        } else if NAVIGATION_ABORTED_MARKERS.iter().any(|m| message.contains(m)) {
            BackendError::NavigationAborted(message)
        } else {
            BackendError::Other(message)
        }
    }

    /// Whether the caller should relaunch the browser and retry the job.
    pub fn is_restartable(&self) -> bool {
        matches!(
            self,
            BackendError::SessionClosed(_) | BackendError::NavigationAborted(_)
        )
    }
}
