// bases/download_server/src/error.rs
//! HTTP-facing errors
//!
//! Every failure leaves the server as a JSON object with an `error` field;
//! pipeline failures add `details` carrying the underlying cause.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use media_downloader::{PipelineError, PipelineFailure, ValidationError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid request body: {0}")]
    BadBody(#[from] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

/// Client-facing headline for a pipeline failure
fn pipeline_headline(failure: &PipelineFailure) -> &'static str {
    match failure.cause {
        PipelineError::EmptyArtifact(_) => "File not created. Please try again.",
        _ => "Download failed",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, ErrorBody::message(err.to_string())),
            AppError::BadBody(err) => {
                tracing::debug!("Rejected request body: {}", err);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: "Invalid request body".to_string(),
                        details: Some(err.to_string()),
                    },
                )
            }
            AppError::Pipeline(failure) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: pipeline_headline(&failure).to_string(),
                    details: Some(failure.cause.to_string()),
                },
            ),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody::message("Method not allowed"),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
