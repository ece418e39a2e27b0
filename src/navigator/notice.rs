//! Notices: short, dismissible messages raised by the navigator.
//!
//! Failures never stop a review session. They become a [`Notice`] the front
//! end shows until the reviewer dismisses it.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    /// Diagnostic code of the underlying error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
            code: None,
            help: None,
        }
    }

    /// Build an error notice from a diagnostic, keeping its code and help.
    pub fn from_diagnostic(context: &str, err: &(dyn Diagnostic + 'static)) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: format!("{context}: {err}"),
            code: err.code().map(|c| c.to_string()),
            help: err.help().map(|h| h.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.level, &self.code) {
            (NoticeLevel::Error, Some(code)) => write!(f, "[error:{code}] {}", self.text),
            (NoticeLevel::Error, None) => write!(f, "[error] {}", self.text),
            (NoticeLevel::Info, _) => write!(f, "{}", self.text),
        }
    }
}
