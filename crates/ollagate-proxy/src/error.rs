//! HTTP error type for the Ollama surface.
//!
//! Every error body uses Ollama's shape: `{"error": "message"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use ollagate_core::GatewayError;

use crate::ollama_models::ollama_error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        (status, Json(ollama_error(&self.to_string()))).into_response()
    }
}

impl From<GatewayError> for HttpError {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::InvalidRequest(_) => Self::BadRequest(message),
            GatewayError::NotFound(_) => Self::NotFound(message),
            GatewayError::UpstreamUnavailable(_) | GatewayError::StreamAborted(_) => {
                Self::Internal(message)
            }
        }
    }
}
