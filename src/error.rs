use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GradebookError>;

/// Errors surfaced by the grade book core. Every variant is recoverable by the
/// caller correcting input or acting under a different role.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradebookError {
    /// Missing required field, bad grade value, dangling reference.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Advisory role gate rejected the action; nothing was changed.
    #[error("role {role} may not {action}")]
    RoleDenied { role: String, action: String },

    #[error("log in first")]
    NotLoggedIn,
}

impl GradebookError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::validation(field, format!("{field} is required"))
    }

    /// Stable code used in IPC error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_failed",
            Self::RoleDenied { .. } => "role_denied",
            Self::NotLoggedIn => "not_logged_in",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation { field, .. } => Some(json!({ "field": field })),
            Self::RoleDenied { role, action } => Some(json!({ "role": role, "action": action })),
            Self::NotLoggedIn => None,
        }
    }
}
