use crate::backend::{Backend, BackendError, tolerate};
use crate::config::AppConfig;
use crate::selector::Selector;
use crate::session::SessionStore;
use std::time::Duration;
use tracing::{info, warn};

/// How long to wait for the landing page after submitting credentials.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Window left to a human to clear a checkpoint or MFA prompt.
pub const MANUAL_CHALLENGE_WINDOW: Duration = Duration::from_secs(5);

pub fn username_selector() -> Selector {
    Selector::css("input#username")
}

pub fn password_selector() -> Selector {
    Selector::css("input#password")
}

pub fn submit_selector() -> Selector {
    Selector::css("button[type='submit']")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials were accepted and the landing page loaded.
    Authenticated,
    /// The login page showed no form; a restored session was already valid.
    AlreadyAuthenticated,
    /// The landing page never appeared. A challenge is assumed and the run
    /// continues optimistically.
    ChallengeAssumed,
}

/// Log in and persist the resulting session.
///
/// The flow cannot tell a completed login from a pending challenge, so it
/// never fails on that account; only browser errors are returned.
pub async fn login<B: Backend + ?Sized>(
    backend: &mut B,
    config: &AppConfig,
    store: Option<&SessionStore>,
) -> Result<LoginOutcome, BackendError> {
    info!("Opening login page {}", config.site.login_url);
    backend.navigate(&config.site.login_url).await?;

    let outcome = if !tolerate(backend.exists(&username_selector()).await, true)? {
        info!("Login form not shown; session already authenticated");
        LoginOutcome::AlreadyAuthenticated
    } else {
        let credentials = &config.credentials;
        if !credentials.is_complete() {
            warn!("Credentials incomplete; submitting whatever is set");
        }
        backend
            .fill(&username_selector(), &credentials.username)
            .await?;
        backend
            .fill(&password_selector(), &credentials.password)
            .await?;
        backend.click(&submit_selector()).await?;

        match backend
            .wait_for_url(&config.site.feed_url, LOGIN_TIMEOUT)
            .await
        {
            Ok(()) => {
                info!("Logged in");
                LoginOutcome::Authenticated
            }
            Err(e) if e.is_restartable() => return Err(e),
            Err(e) => {
                warn!(
                    "Did not reach the feed ({}). If a checkpoint or MFA is shown, complete it in the browser",
                    e
                );
                tokio::time::sleep(MANUAL_CHALLENGE_WINDOW).await;
                LoginOutcome::ChallengeAssumed
            }
        }
    };

    if let Some(store) = store {
        persist_session(backend, store).await?;
    }
    Ok(outcome)
}

/// Capture and save the browser session. Failures are logged, not returned,
/// unless the browser itself is gone.
pub async fn persist_session<B: Backend + ?Sized>(
    backend: &mut B,
    store: &SessionStore,
) -> Result<(), BackendError> {
    let state = match backend.session_state().await {
        Ok(state) => state,
        Err(e) if e.is_restartable() => return Err(e),
        Err(e) => {
            warn!("Could not capture session state: {}", e);
            return Ok(());
        }
    };

    match store.save(&state).await {
        Ok(()) => info!(
            "Saved session ({} cookie(s)) to {}",
            state.cookies.len(),
            store.path().display()
        ),
        Err(e) => warn!("Could not persist session: {}", e),
    }
    Ok(())
}
