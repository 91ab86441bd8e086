//! Handler Errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use consolidation_advisor::AdvisorError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Advisor(#[from] AdvisorError),

    #[error("Worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ServerError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Advisor(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Advisor(e) if e.is_input_error() => "INVALID_INPUT",
            Self::Advisor(_) => "RENDER_ERROR",
            Self::Worker(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Advisor(e) => e.user_message(),
            Self::Worker(_) => "Something went wrong while crunching the numbers.".into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.user_message(),
                code: self.code().into(),
            }),
        )
            .into_response()
    }
}
