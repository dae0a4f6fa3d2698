use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::usecases::{
    attendee_requests::AttendeeError, billing::BillingError, events::EventError,
    notifications::NotificationError, profile::AccountError, song_queue::SongRequestError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A use-case failure that already knows its status and error code.
    #[error("{message}")]
    UseCase {
        status: StatusCode,
        error: &'static str,
        message: String,
    },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::UseCase {
                status,
                error,
                message,
            } if !status.is_server_error() => (status, error, message),
            AppError::UseCase { status, error, .. } => {
                (status, error, "Internal server error".to_string())
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            error,
            message,
        });

        (status, body).into_response()
    }
}

macro_rules! impl_from_usecase_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for AppError {
                fn from(err: $error) -> Self {
                    AppError::UseCase {
                        status: err.status_code(),
                        error: err.error_code(),
                        message: err.to_string(),
                    }
                }
            }
        )+
    };
}

impl_from_usecase_error!(
    AttendeeError,
    BillingError,
    EventError,
    NotificationError,
    AccountError,
    SongRequestError,
);
