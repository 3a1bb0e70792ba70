use serde::Serialize;
use thiserror::Error;

/// One offending input, identified by its logical path (e.g. `["input", "eventId"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentIssue {
    pub argument_path: Vec<String>,
    pub message: Option<String>,
}

impl ArgumentIssue {
    #[must_use]
    pub fn at(path: &[&str]) -> Self {
        Self {
            argument_path: path.iter().map(ToString::to_string).collect(),
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Malformed or contradictory input, detected before any lookup.
    #[error("Invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        issues: Vec<ArgumentIssue>,
    },

    /// A referenced template, rule, instance, attendee or user does not exist.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        issues: Vec<ArgumentIssue>,
    },

    /// The caller lacks the relationship the operation requires.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        issues: Vec<ArgumentIssue>,
    },

    /// The operation is not valid for the target's current state.
    #[error("{message}")]
    StateConflict {
        message: String,
        issues: Vec<ArgumentIssue>,
    },

    /// A write that should have affected a row affected none.
    #[error("Unexpected: {0}")]
    Unexpected(String),

    #[error("Casbin error: {0}")]
    CasbinError(#[from] casbin::Error),

    #[error(transparent)]
    DatabaseError(#[from] cadence_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] cadence_core::error::CoreError),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),
}

impl ServiceError {
    #[must_use]
    pub fn invalid_arguments(path: &[&str], message: impl Into<String>) -> Self {
        let message = message.into();
        Self::InvalidArguments {
            issues: vec![ArgumentIssue::at(path).with_message(message.clone())],
            message,
        }
    }

    #[must_use]
    pub fn not_found(path: &[&str], message: impl Into<String>) -> Self {
        let message = message.into();
        Self::NotFound {
            issues: vec![ArgumentIssue::at(path).with_message(message.clone())],
            message,
        }
    }

    #[must_use]
    pub fn unauthorized(path: &[&str], message: impl Into<String>) -> Self {
        Self::Unauthorized {
            issues: if path.is_empty() {
                Vec::new()
            } else {
                vec![ArgumentIssue::at(path)]
            },
            message: message.into(),
        }
    }

    #[must_use]
    pub fn state_conflict(path: &[&str], message: impl Into<String>) -> Self {
        let message = message.into();
        Self::StateConflict {
            issues: vec![ArgumentIssue::at(path).with_message(message.clone())],
            message,
        }
    }

    /// ## Summary
    /// Returns the stable machine-readable code for this error.
    ///
    /// State conflicts share the `invalid_arguments` code; callers that need
    /// to tell them apart match on the variant.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArguments { .. } | Self::StateConflict { .. } => "invalid_arguments",
            Self::NotFound { .. } => "arguments_associated_resources_not_found",
            Self::Unauthorized { issues, .. } if issues.is_empty() => "unauthorized_action",
            Self::Unauthorized { .. } => "unauthorized_action_on_arguments_associated_resources",
            Self::Unexpected(_)
            | Self::CasbinError(_)
            | Self::DatabaseError(_)
            | Self::CoreError(_)
            | Self::DieselError(_) => "unexpected",
        }
    }

    /// ## Summary
    /// Returns the argument paths this error points at, if any.
    #[must_use]
    pub fn issues(&self) -> &[ArgumentIssue] {
        match self {
            Self::InvalidArguments { issues, .. }
            | Self::NotFound { issues, .. }
            | Self::Unauthorized { issues, .. }
            | Self::StateConflict { issues, .. } => issues,
            _ => &[],
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
