use autoapply_engine::selector::Selector;
use chromiumoxide::Page;
use std::time::Duration;

/// Upper bound for one evaluation. A dialog blocking the JS thread would
/// otherwise hang the caller.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Attribute put on the element picked by [`mark_script`].
pub const TARGET_ATTR: &str = "data-autoapply-target";

pub enum EvalError {
    Timeout,
    Failed(String),
}

/// Check if an error indicates the page context is unavailable (e.g., during navigation).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Evaluate an expression and return its JSON value, retrying while the page
/// is between execution contexts.
pub async fn evaluate(page: &Page, expression: &str) -> Result<serde_json::Value, EvalError> {
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match tokio::time::timeout(EVAL_TIMEOUT, page.evaluate(expression)).await {
            Err(_) => return Err(EvalError::Timeout),
            Ok(Ok(remote_object)) => {
                return Ok(remote_object
                    .into_value::<serde_json::Value>()
                    .unwrap_or(serde_json::Value::Null));
            }
            Ok(Err(e)) => {
                let err_str = e.to_string();
                if !is_context_error(&err_str) {
                    return Err(EvalError::Failed(err_str));
                }
                tracing::debug!(
                    "Context error during evaluation (attempt {}/{}), retrying...",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
        }
    }

    Err(EvalError::Failed(last_error.unwrap_or_else(|| {
        "Evaluation failed after retries".to_string()
    })))
}

/// JS function returning every element the selector matches. Text selectors
/// match case-insensitively on whitespace-normalized visible text.
fn finder(selector: &Selector) -> String {
    let css = serde_json::Value::from(selector.css_part()).to_string();
    let text = match selector.text_part() {
        Some(text) => serde_json::Value::from(text).to_string(),
        None => "null".to_string(),
    };
    format!(
        r#"() => {{
    const nodes = Array.from(document.querySelectorAll({css}));
    const needle = {text};
    if (needle === null) return nodes;
    const norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
    return nodes.filter((el) => norm(el.innerText || el.textContent).includes(norm(needle)));
}}"#
    )
}

pub fn exists_script(selector: &Selector) -> String {
    format!("(({}))().length > 0", finder(selector))
}

pub fn text_script(selector: &Selector) -> String {
    format!(
        "(() => {{ const el = ({})()[0]; return el ? el.textContent : null; }})()",
        finder(selector)
    )
}

/// Tag the first match with [`TARGET_ATTR`] so it can be fetched as a CDP
/// element. Evaluates to whether anything matched.
pub fn mark_script(selector: &Selector) -> String {
    format!(
        r#"(() => {{
    document.querySelectorAll('[{attr}]').forEach((el) => el.removeAttribute('{attr}'));
    const el = ({finder})()[0];
    if (!el) return false;
    el.setAttribute('{attr}', '1');
    return true;
}})()"#,
        attr = TARGET_ATTR,
        finder = finder(selector)
    )
}

/// Clears an input in place, firing the events frameworks listen for.
pub const CLEAR_VALUE_FN: &str = "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }";
