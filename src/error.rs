//! Error handling for the application

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::labels::LabelError;
use crate::quoting::calculators::QuoteError;
use crate::quoting::responses::ErrorResponse;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Label error: {0}")]
    Label(#[from] LabelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Quote(QuoteError::Overflow) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Quote(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Label(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::Quote(QuoteError::InvalidInput { .. }) => "invalid_input",
            AppError::Quote(_) => "quote_error",
            AppError::Database(_) => "database_error",
            AppError::Label(_) => "label_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server side failures are logged and not echoed back
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Label(e) => {
                tracing::error!("Label error: {}", e);
                "Label error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let details = match &self {
            AppError::Quote(QuoteError::InvalidInput { errors }) => {
                Some(serde_json::json!({ "errors": errors }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::NotFound("Locker".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Quote(QuoteError::ZeroDivisor { factor_id: 1 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(AppError::NotFound("Locker".into()).to_string(), "Locker not found");
        let err = AppError::from(QuoteError::InvalidInput {
            errors: vec!["weight must be positive".into(), "width must be positive".into()],
        });
        assert_eq!(
            err.to_string(),
            "Invalid quote input: weight must be positive; width must be positive"
        );
        assert_eq!(err.error_type(), "invalid_input");
    }
}
