use crate::cdp::CdpClient;
use crate::eval::{self, CLEAR_VALUE_FN, EvalError, TARGET_ATTR};
use async_trait::async_trait;
use autoapply_engine::backend::{Backend, BackendError, NavigationResult};
use autoapply_engine::selector::Selector;
use autoapply_engine::session::{Cookie, SessionState};
use chromiumoxide::Element;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, SetCookiesParams, TimeSinceEpoch};
use std::path::PathBuf;
use tracing::{debug, info};

/// [`Backend`] over a local Chromium driven through CDP.
pub struct HeadlessBackend {
    client: Option<CdpClient>,
    visible: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            client: None,
            visible: false,
        }
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
        }
    }

    fn client(&self) -> Result<&CdpClient, BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;
        if client.is_closed() {
            return Err(BackendError::SessionClosed(
                "browser has disconnected".into(),
            ));
        }
        Ok(client)
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, BackendError> {
        let client = self.client()?;
        eval::evaluate(&client.page, expression)
            .await
            .map_err(|e| match e {
                EvalError::Timeout => BackendError::Timeout {
                    operation: "script evaluation".into(),
                },
                EvalError::Failed(message) => classify(client, message, BackendError::Script),
            })
    }

    /// Fetch the first match as a CDP element.
    async fn resolve(&self, selector: &Selector) -> Result<Element, BackendError> {
        let marked = self.evaluate(&eval::mark_script(selector)).await?;
        if !marked.as_bool().unwrap_or(false) {
            return Err(BackendError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        let client = self.client()?;
        client
            .page
            .find_element(format!("[{}]", TARGET_ATTR))
            .await
            .map_err(|e| classify(client, e.to_string(), |_| BackendError::ElementNotFound {
                selector: selector.to_string(),
            }))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a driver error message: a dead connection always means a closed
/// session, otherwise the message decides, falling back to `fallback`.
fn classify(
    client: &CdpClient,
    message: String,
    fallback: impl FnOnce(String) -> BackendError,
) -> BackendError {
    if client.is_closed() {
        return BackendError::SessionClosed(message);
    }
    match BackendError::from_message(message) {
        BackendError::Other(message) => fallback(message),
        tagged => tagged,
    }
}

fn to_cookie_param(cookie: &Cookie) -> Option<CookieParam> {
    let domain = cookie.domain.clone()?;
    let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
    param.domain = Some(domain);
    param.path = cookie.path.clone();
    param.secure = cookie.secure;
    param.http_only = cookie.http_only;
    param.expires = cookie
        .expires
        .filter(|expires| *expires > 0.0)
        .map(TimeSinceEpoch::new);
    Some(param)
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching Headless Backend (Chromium)...");
        let client = CdpClient::launch(self.visible)
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client()?;

        info!("Navigating to: {}", url);
        client
            .page
            .goto(url)
            .await
            .map_err(|e| classify(client, e.to_string(), BackendError::Navigation))?;

        let title = client
            .page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = client
            .page
            .url()
            .await
            .map_err(|e| classify(client, e.to_string(), BackendError::Navigation))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let client = self.client()?;
        Ok(client
            .page
            .url()
            .await
            .map_err(|e| classify(client, e.to_string(), BackendError::Other))?
            .unwrap_or_default())
    }

    async fn exists(&mut self, selector: &Selector) -> Result<bool, BackendError> {
        let value = self.evaluate(&eval::exists_script(selector)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn text_content(&mut self, selector: &Selector) -> Result<Option<String>, BackendError> {
        let value = self.evaluate(&eval::text_script(selector)).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn click(&mut self, selector: &Selector) -> Result<(), BackendError> {
        let element = self.resolve(selector).await?;
        debug!("Clicking {}", selector);
        let client = self.client()?;
        element
            .click()
            .await
            .map_err(|e| classify(client, e.to_string(), BackendError::Other))?;
        Ok(())
    }

    async fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), BackendError> {
        let element = self.resolve(selector).await?;
        let client = self.client()?;
        element
            .click()
            .await
            .map_err(|e| classify(client, e.to_string(), BackendError::Other))?;
        element
            .call_js_fn(CLEAR_VALUE_FN, false)
            .await
            .map_err(|e| classify(client, e.to_string(), BackendError::Script))?;
        element
            .type_str(value)
            .await
            .map_err(|e| classify(client, e.to_string(), BackendError::Other))?;
        Ok(())
    }

    async fn set_input_files(
        &mut self,
        selector: &Selector,
        files: &[PathBuf],
    ) -> Result<(), BackendError> {
        let element = self.resolve(selector).await?;
        let files = files
            .iter()
            .map(|path| std::path::absolute(path).map(|p| p.to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut params = SetFileInputFilesParams::new(files);
        params.backend_node_id = Some(element.backend_node_id);

        let client = self.client()?;
        client
            .page
            .execute(params)
            .await
            .map_err(|e| classify(client, e.to_string(), BackendError::Other))?;
        Ok(())
    }

    async fn session_state(&mut self) -> Result<SessionState, BackendError> {
        let client = self.client()?;
        let cookies = client
            .page
            .get_cookies()
            .await
            .map_err(|e| classify(client, e.to_string(), |m| {
                BackendError::Other(format!("Get cookies failed: {}", m))
            }))?;

        Ok(SessionState {
            cookies: cookies
                .into_iter()
                .map(|c| Cookie {
                    name: c.name,
                    value: c.value,
                    domain: Some(c.domain),
                    path: Some(c.path),
                    expires: Some(c.expires),
                    http_only: Some(c.http_only),
                    secure: Some(c.secure),
                })
                .collect(),
            origins: Vec::new(),
        })
    }

    async fn restore_session(&mut self, state: &SessionState) -> Result<(), BackendError> {
        let params: Vec<CookieParam> = state.cookies.iter().filter_map(to_cookie_param).collect();
        if params.len() < state.cookies.len() {
            debug!(
                "Skipping {} cookie(s) without a domain",
                state.cookies.len() - params.len()
            );
        }
        if params.is_empty() {
            return Ok(());
        }

        let client = self.client()?;
        client
            .page
            .execute(SetCookiesParams::new(params))
            .await
            .map_err(|e| classify(client, e.to_string(), |m| {
                BackendError::Other(format!("Set cookies failed: {}", m))
            }))?;
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value, BackendError> {
        self.evaluate(script).await
    }
}
