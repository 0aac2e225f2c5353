use crate::backend::{Backend, BackendError};
use crate::session::SessionStore;
use tracing::{info, warn};

/// Start the browser, seeding it from the session file when one exists.
///
/// A missing file is the normal first run. An unreadable or corrupt file is
/// reported and the browser starts with a fresh context. Returns whether a
/// stored session was restored.
pub async fn launch<B: Backend + ?Sized>(
    backend: &mut B,
    store: Option<&SessionStore>,
) -> Result<bool, BackendError> {
    backend.launch().await?;

    let Some(store) = store else {
        return Ok(false);
    };

    match store.load().await {
        Ok(Some(state)) if !state.is_empty() => {
            info!(
                "Restoring {} cookie(s) from {}",
                state.cookies.len(),
                store.path().display()
            );
            if let Err(e) = backend.restore_session(&state).await {
                if e.is_restartable() {
                    return Err(e);
                }
                warn!("Could not restore session state: {}", e);
                return Ok(false);
            }
            Ok(true)
        }
        Ok(_) => {
            info!(
                "No saved session at {}, starting fresh",
                store.path().display()
            );
            Ok(false)
        }
        Err(e) => {
            warn!("{}; starting with a fresh session", e);
            Ok(false)
        }
    }
}

/// Close the browser, logging instead of failing.
pub async fn shutdown<B: Backend + ?Sized>(backend: &mut B) {
    if let Err(e) = backend.close().await {
        warn!("Error while closing browser (ignored): {}", e);
    }
}
