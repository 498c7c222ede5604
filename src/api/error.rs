use crate::engine::EngineError;
use crate::llm::GenerationError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures that leave the HTTP layer as `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Provider(#[from] GenerationError),
    /// Malformed or incomplete request body.
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let client = match self {
            ApiError::Engine(e) => e.is_client_error(),
            ApiError::Provider(e) => e.is_client_error(),
            ApiError::Body(rejection) => return rejection.status(),
        };
        if client {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::Engine(EngineError::InvalidMethodology(e)) => e.to_string(),
            _ if self.status().is_client_error() => {
                format!("Erro de validação: {}", self)
            }
            _ => format!("Erro interno do servidor: {}", self),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
