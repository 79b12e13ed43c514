use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Selected time slot is no longer available")]
    SlotUnavailable,
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("Booking has no linked calendar event")]
    NoLinkedEvent,
    #[error("Calendar is not connected")]
    NotConnected,
    #[error("Upstream calendar unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

/// Failures of the external calendar adapter. Kept apart from `AppError` so
/// adapters never have to know about HTTP semantics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("calendar not connected")]
    NotConnected,
    #[error("calendar event not found")]
    NotFound,
    #[error("calendar upstream failure: {0}")]
    Upstream(String),
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::NotConnected => AppError::NotConnected,
            CalendarError::NotFound => AppError::NotFound("Linked calendar event not found".into()),
            CalendarError::Upstream(msg) => AppError::UpstreamUnavailable(msg),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::SlotUnavailable => "SLOT_UNAVAILABLE",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::NoLinkedEvent => "NO_LINKED_EVENT",
            AppError::NotConnected => "CALENDAR_NOT_CONNECTED",
            AppError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AppError::Internal | AppError::InternalWithMsg(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)", "code": "CONFLICT" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::SlotUnavailable => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidTransition(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::NoLinkedEvent => (StatusCode::CONFLICT, self.to_string()),
            AppError::NotConnected => (StatusCode::CONFLICT, self.to_string()),
            AppError::UpstreamUnavailable(msg) => {
                warn!("Upstream calendar failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "Calendar provider unavailable".to_string())
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
