use salvo::http::StatusCode;
use salvo::writing::{Json, Writer};
use salvo::{Depot, Request, Response, async_trait};
use serde::Serialize;
use thiserror::Error;

use cadence_db::error::DbError;
use cadence_service::error::{ArgumentIssue, ServiceError};

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    CoreError(#[from] cadence_core::error::CoreError),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// JSON body rendered for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub issues: Vec<ArgumentIssue>,
}

impl AppError {
    /// ## Summary
    /// Maps the error onto an HTTP status and response body.
    ///
    /// Internal failures are reported with a generic message; the detail is
    /// only logged.
    #[must_use]
    pub fn to_response(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::ServiceError(err) => {
                let status = match err {
                    ServiceError::InvalidArguments { .. } => StatusCode::BAD_REQUEST,
                    ServiceError::StateConflict { .. } => StatusCode::CONFLICT,
                    ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                    ServiceError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                    ServiceError::DatabaseError(DbError::PoolError(_)) => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = if status.is_server_error() {
                    "Internal server error".to_string()
                } else {
                    err.to_string()
                };
                (
                    status,
                    ErrorBody {
                        code: err.code(),
                        message,
                        issues: err.issues().to_vec(),
                    },
                )
            }
            Self::DatabaseError(DbError::PoolError(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "unexpected",
                    message: "Database unavailable".to_string(),
                    issues: Vec::new(),
                },
            ),
            Self::DatabaseError(_) | Self::CoreError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "unexpected",
                    message: "Internal server error".to_string(),
                    issues: Vec::new(),
                },
            ),
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "unauthenticated",
                    message: self.to_string(),
                    issues: Vec::new(),
                },
            ),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "invalid_arguments",
                    message: message.clone(),
                    issues: Vec::new(),
                },
            ),
        }
    }
}

#[async_trait]
impl Writer for AppError {
    async fn write(self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let (status, body) = self.to_response();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, code = body.code, "Request rejected");
        }
        res.status_code(status);
        res.render(Json(body));
    }
}
