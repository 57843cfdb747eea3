use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    NotFound(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("ServiceNow error: {0}")]
    Upstream(String),
    /// ServiceNow answered 401 or 403.
    #[error("ServiceNow rejected credentials: {0}")]
    UpstreamAuthentication(String),
    /// Incident fetch failure surfaced to callers without upstream detail.
    #[error("Failed to fetch incidents from ServiceNow")]
    FetchFailed(#[source] Box<AppError>),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_)
            | AppError::Upstream(_)
            | AppError::UpstreamAuthentication(_)
            | AppError::FetchFailed(_)
            | AppError::Internal(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error name reported to callers, matching the catalog backend's error kinds.
    pub fn name(&self) -> &'static str {
        match self {
            AppError::Input(_) => "InputError",
            AppError::Authentication(_) => "AuthenticationError",
            AppError::NotFound(_) => "NotFoundError",
            _ => "Error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Configuration(_) | AppError::Io(_) => "Internal server error".to_string(),
            AppError::Upstream(_) | AppError::UpstreamAuthentication(_) => {
                "Upstream service error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::FetchFailed(cause) => tracing::error!(error = %cause, "{}", self),
            _ if status.is_server_error() => tracing::error!(error = %self, "request failed"),
            _ => {}
        }

        let body = json!({
            "error": {
                "name": self.name(),
                "message": self.public_message(),
            }
        });

        (status, Json(body)).into_response()
    }
}
