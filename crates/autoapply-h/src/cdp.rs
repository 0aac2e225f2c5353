use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

/// How long `close` waits for Chromium to exit before killing it.
const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

pub type CdpResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One Chromium process driven over CDP, with a single working page.
pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    closed: Arc<AtomicBool>,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(visible: bool) -> CdpResult<Self> {
        let mut config_builder = BrowserConfig::builder();
        config_builder = config_builder.no_sandbox(); // Often needed in docker/CI/restricted envs
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;
        config_builder = config_builder.user_data_dir(&user_data_dir);

        if visible {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }

        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin);
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let (browser, handler) = Browser::launch(
            config_builder
                .build()
                .map_err(|e| format!("Failed to build browser config: {}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        // Auto-accept alert/confirm/prompt so they never block evaluation.
        let mut dialog_events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;

        let page_clone = page.clone();
        tokio::spawn(async move {
            while let Some(event) = dialog_events.next().await {
                tracing::info!(
                    "Handling JavaScript Dialog: {} ({:?})",
                    event.message,
                    event.r#type
                );
                if let Err(e) = page_clone
                    .execute(HandleJavaScriptDialogParams::new(true))
                    .await
                {
                    tracing::error!("Failed to handle/accept dialog: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
            closed,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    /// True once the CDP connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn close(mut self) -> CdpResult<()> {
        let result = if self.is_closed() {
            // The connection is gone but the process may still be alive.
            if let Some(Err(e)) = self.browser.kill().await {
                tracing::debug!("Error killing disconnected browser: {}", e);
            }
            Ok(())
        } else {
            self.browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| format!("Error closing browser: {}", e))
        };
        if !wait_for_exit(self.browser.wait()).await {
            tracing::warn!("Browser did not exit within {:?}, killing it", EXIT_TIMEOUT);
            if let Some(Err(e)) = self.browser.kill().await {
                tracing::debug!("Error killing browser: {}", e);
            }
        }
        self.handler_task.abort();

        if self.cleanup_user_data_dir {
            if let Some(dir) = self.user_data_dir.take() {
                if let Err(e) = std::fs::remove_dir_all(&dir) {
                    tracing::debug!("Failed to clean up user-data-dir {}: {}", dir.display(), e);
                }
            }
        }

        result?;
        Ok(())
    }
}

/// Await process exit for at most [`EXIT_TIMEOUT`]. False on timeout.
async fn wait_for_exit<F>(wait: F) -> bool
where
    F: Future<Output = std::io::Result<Option<ExitStatus>>>,
{
    match tokio::time::timeout(EXIT_TIMEOUT, wait).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::debug!("Error waiting for browser exit: {}", e);
            true
        }
        Err(_) => false,
    }
}

fn spawn_handler_task(mut handler: Handler, closed: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("Browser handler error (ignoring): {}", e);
            }
        }
        closed.store(true, Ordering::SeqCst);
        tracing::info!("Browser handler task ended");
    })
}

fn resolve_user_data_dir() -> CdpResult<(PathBuf, bool)> {
    if let Ok(dir) = std::env::var("AUTOAPPLY_USER_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        tracing::info!(
            "Using user data dir from AUTOAPPLY_USER_DATA_DIR: {}",
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("System clock error: {}", e))?
        .as_nanos();
    let unique = format!("autoapply-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    tracing::info!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}
