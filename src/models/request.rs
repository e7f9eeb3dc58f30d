use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Structured hints accompanying the free-form request text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Category tags; a tag naming a planning rule recognizes that rule
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Planning input: request text plus optional hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub text: String,
    #[serde(default)]
    pub hints: RequestHints,
    /// Correlation id to reuse; a fresh one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl DispatchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hints: RequestHints::default(),
            context_id: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.hints.location = Some(location.into());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Location hint with surrounding whitespace removed, if non-blank
    pub fn location(&self) -> Option<&str> {
        self.hints
            .location
            .as_deref()
            .map(str::trim)
            .filter(|location| !location.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(DispatchError::validation("request text must not be empty"));
        }
        Ok(())
    }
}
