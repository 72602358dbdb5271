//! Application error type shared by the services, the stores and the HTTP layer.
//!
//! Business-rule failures carry a caller-facing message. Store and internal
//! failures are logged here, at the response boundary, and rendered with a
//! generic message so no backend detail leaks to the client.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::model::attendance::AttendanceRecord;

#[derive(Debug, Display)]
pub enum AppError {
    /// Missing or malformed input
    #[display(fmt = "{}", _0)]
    Validation(String),

    /// Duplicate active session or duplicate account.
    #[display(fmt = "{}", message)]
    Conflict {
        message: String,
        record: Option<Box<AttendanceRecord>>,
    },

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    Unauthenticated(String),

    #[display(fmt = "Invalid credentials")]
    InvalidCredentials,

    /// Any persistence failure, not further classified
    #[display(fmt = "Store error: {}", _0)]
    Store(String),

    #[display(fmt = "Internal error: {}", _0)]
    Internal(String),
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict {
            message: msg.into(),
            record: None,
        }
    }

    pub fn already_clocked_in(record: Option<AttendanceRecord>) -> Self {
        AppError::Conflict {
            message: "You have already clocked in today. Please clock out first.".to_string(),
            record: record.map(Box::new),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        AppError::Unauthenticated(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict { .. })
    }

    /// Message safe to show to the client
    pub fn user_message(&self) -> String {
        match self {
            AppError::Store(detail) => {
                tracing::error!(error = %detail, "Store failure");
                "A database error occurred".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal failure");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Store(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "success": false,
            "message": self.user_message(),
        });

        if let AppError::Conflict {
            record: Some(record),
            ..
        } = self
        {
            body["data"] = json!(record);
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
