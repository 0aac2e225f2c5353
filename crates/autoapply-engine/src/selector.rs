use serde::{Deserialize, Serialize};
use std::fmt;

/// A way of locating an element on the page.
///
/// Plain CSS cannot match on visible text, so `Text` pairs a CSS selector
/// with a substring the element's text must contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    Text { css: String, text: String },
    Css(String),
}

impl Selector {
    pub fn css(css: impl Into<String>) -> Self {
        Selector::Css(css.into())
    }

    pub fn with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Selector::Text {
            css: css.into(),
            text: text.into(),
        }
    }

    pub fn css_part(&self) -> &str {
        match self {
            Selector::Css(css) => css,
            Selector::Text { css, .. } => css,
        }
    }

    pub fn text_part(&self) -> Option<&str> {
        match self {
            Selector::Css(_) => None,
            Selector::Text { text, .. } => Some(text),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(css) => write!(f, "{}", css),
            Selector::Text { css, text } => write!(f, "{}:has-text('{}')", css, text),
        }
    }
}
