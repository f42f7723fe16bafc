use crate::errors::{ErrorKind, SandboxError};
use serde::{Deserialize, Serialize};

/// Outcome of one sandbox run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxResult {
    /// False only when no page could be reached at all
    pub success: bool,

    /// Steps performed, in order
    pub actions_taken: Vec<String>,

    /// Notable findings about the target
    pub observations: Vec<String>,

    /// Redirect chain in traversal order
    pub redirects: Vec<RedirectRecord>,

    /// Forms on the final resolved page
    pub forms_found: Vec<FormRecord>,

    /// Non-fatal issues, each prefixed with its error kind
    pub errors: Vec<String>,
}

/// One hop of the redirect chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRecord {
    pub from: String,
    pub to: String,
    pub status: Option<String>,
    pub reason: Option<String>,
}

/// A form discovered on the final page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub method: String,
    pub action: String,
    pub fields: Vec<FieldRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

impl SandboxResult {
    /// A fresh, successful result with empty trails
    pub(crate) fn started() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A result for a run that never reached a page
    pub(crate) fn failed(error: SandboxError) -> Self {
        let mut result = Self::default();
        result.record_error(error);
        result
    }

    pub(crate) fn record_action(&mut self, action: impl Into<String>) {
        self.actions_taken.push(action.into());
    }

    pub(crate) fn record_observation(&mut self, observation: impl Into<String>) {
        self.observations.push(observation.into());
    }

    pub(crate) fn record_error(&mut self, error: SandboxError) {
        ::log::warn!("Sandbox error: {}", error);
        self.errors.push(error.to_entry());
    }

    /// Whether any recorded error has the given kind
    pub fn has_error(&self, kind: ErrorKind) -> bool {
        let prefix = kind.prefix();
        self.errors.iter().any(|e| e.starts_with(&prefix))
    }

    /// Executed, but something along the way was recorded as an error
    pub fn is_partial(&self) -> bool {
        self.success && !self.errors.is_empty()
    }

    /// Label a report layer can show next to the result
    pub fn report_label(&self) -> &'static str {
        if !self.success {
            "could not execute target"
        } else if self.is_partial() {
            "executed with partial results"
        } else {
            "executed"
        }
    }
}
