use std::time::Duration;

use serde::Serialize;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient banner shown after an action. It dismisses itself after
/// `dismiss_after_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub dismiss_after_ms: u64,
}

impl Notice {
    pub fn success(message: impl Into<String>, dismiss_after_ms: u64) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            dismiss_after_ms,
        }
    }

    pub fn error(message: impl Into<String>, dismiss_after_ms: u64) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            dismiss_after_ms,
        }
    }

    pub fn from_error(error: &Error, dismiss_after_ms: u64) -> Self {
        let message = match error {
            Error::Validation(_) => "Please correct the errors in the form",
            Error::NotFound { .. } => "Employee not found",
            _ => "Something went wrong. Please try again.",
        };
        Self::error(message, dismiss_after_ms)
    }

    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }
}
