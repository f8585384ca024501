//! Request-level errors for `/analyze`.
//!
//! Both failure kinds render as HTTP 500 with a `{"detail": ...}` body.
//! Validation failures are not errors here: they are answered with a
//! 200 `{"error": ...}` body, see [`crate::handlers::analyze`].

use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The external scorer or text provider failed.
    #[error("{0}")]
    Upstream(#[from] ProviderError),

    /// The generative model answered without the expected tokens.
    #[error("Unexpected model output format: {0}")]
    Format(String),
}

impl AnalyzeError {
    pub fn outcome(&self) -> &'static str {
        match self {
            AnalyzeError::Upstream(_) => "upstream_error",
            AnalyzeError::Format(_) => "format_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorDetail {
    detail: String,
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorDetail {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
