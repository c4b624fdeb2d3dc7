use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the date card core.
#[derive(Error, Debug)]
pub enum DateCardError {
    #[error("Invalid participants: {0}")]
    InvalidParticipants(String),

    #[error("Match {0} not found")]
    MatchNotFound(String),

    #[error("Match {0} is not active")]
    MatchInactive(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("User {user_id} is not a participant of date card {card_id}")]
    NotAuthorized { card_id: String, user_id: String },

    #[error("Date card {0} has already been resolved")]
    AlreadyResolved(String),

    #[error("Date card {0} already has a pending reschedule request")]
    AppealPending(String),

    #[error("Invalid reschedule request: {0}")]
    InvalidAppeal(String),

    #[error("Date card {0} was modified concurrently")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type Result<T> = std::result::Result<T, DateCardError>;

impl DateCardError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            DateCardError::InvalidParticipants(_) => "InvalidParticipants",
            DateCardError::MatchNotFound(_) => "MatchNotFound",
            DateCardError::MatchInactive(_) => "MatchInactive",
            DateCardError::NotFound(_) => "NotFound",
            DateCardError::InvalidSchedule(_) => "InvalidSchedule",
            DateCardError::NotAuthorized { .. } => "NotAuthorized",
            DateCardError::AlreadyResolved(_) => "AlreadyResolved",
            DateCardError::AppealPending(_) => "AppealPending",
            DateCardError::InvalidAppeal(_) => "InvalidAppeal",
            DateCardError::Conflict(_) => "Conflict",
            DateCardError::StoreUnavailable(_) => "StoreUnavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DateCardError::InvalidParticipants(_)
            | DateCardError::InvalidSchedule(_)
            | DateCardError::InvalidAppeal(_) => StatusCode::BAD_REQUEST,
            DateCardError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
            DateCardError::MatchNotFound(_) | DateCardError::NotFound(_) => StatusCode::NOT_FOUND,
            DateCardError::AlreadyResolved(_)
            | DateCardError::MatchInactive(_)
            | DateCardError::AppealPending(_)
            | DateCardError::Conflict(_) => StatusCode::CONFLICT,
            DateCardError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<sqlx::Error> for DateCardError {
    fn from(err: sqlx::Error) -> Self {
        DateCardError::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for DateCardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("Store failure: {}", self);
        }

        (
            status,
            Json(json!({
                "error": self.code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
