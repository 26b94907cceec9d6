//! Gateway error taxonomy.
//!
//! Adapters map these to their own representation (HTTP status codes,
//! in-band error lines). Nothing here is retried.

use thiserror::Error;

use crate::ports::BackendError;

/// Errors surfaced by the gateway service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Malformed or missing client input; detected before any upstream call.
    #[error("{0}")]
    InvalidRequest(String),

    /// The catalog fetch or the chat call failed.
    #[error("{0}")]
    UpstreamUnavailable(String),

    /// An alias could not be mapped to a descriptor.
    #[error("model '{0}' not found")]
    NotFound(String),

    /// The backend failed after streaming had started.
    #[error("Stream error: {0}")]
    StreamAborted(String),
}

impl GatewayError {
    /// Returns a suggested HTTP status code for this error.
    #[must_use]
    pub const fn suggested_status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::UpstreamUnavailable(_) | Self::StreamAborted(_) => 500,
        }
    }
}

impl From<BackendError> for GatewayError {
    fn from(err: BackendError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}
