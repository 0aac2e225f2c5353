use crate::selector::Selector;
use std::collections::BTreeMap;

/// A form field the autofill step knows how to locate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: String,
    pub selector: Selector,
}

impl FormField {
    pub fn by_aria_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let selector = Selector::css(format!("input[aria-label='{}']", label));
        Self { label, selector }
    }
}

/// Produces the value to type into a form field.
pub trait AnswerStrategy: Send + Sync {
    fn answer(&self, field: &FormField) -> Option<String>;
}

/// Fixed answers keyed by field label, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticAnswers {
    answers: BTreeMap<String, String>,
}

impl StaticAnswers {
    pub fn new(answers: &BTreeMap<String, String>) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(label, value)| (label.trim().to_lowercase(), value.clone()))
                .collect(),
        }
    }
}

impl AnswerStrategy for StaticAnswers {
    fn answer(&self, field: &FormField) -> Option<String> {
        self.answers
            .get(&field.label.trim().to_lowercase())
            .filter(|value| !value.is_empty())
            .cloned()
    }
}
