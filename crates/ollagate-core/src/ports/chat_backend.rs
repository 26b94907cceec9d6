//! Chat backend port for the upstream OpenAI-compatible provider.
//!
//! The gateway never talks HTTP itself. It asks this port for the model
//! list, a single completion, or an incremental event stream.

use std::fmt;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::domain::{ChatRequest, Completion, ModelIdentifier, StreamEvent};

/// Incremental events from the backend.
///
/// The stream ends (`None`) on the backend's end-of-stream signal. An `Err`
/// item is a mid-stream failure; callers stop polling after the first one.
/// Dropping the stream releases the underlying connection.
pub type BackendStream = BoxStream<'static, Result<StreamEvent, BackendError>>;

/// Errors reported by a chat backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached or the connection broke.
    #[error("Failed to reach backend: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend reported an error inside an otherwise healthy stream.
    #[error("{0}")]
    Upstream(String),

    /// The backend sent something that is not a valid completion payload.
    #[error("Malformed backend payload: {0}")]
    Decode(String),
}

/// Port for the remote chat-completion provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackendPort: Send + Sync + fmt::Debug {
    /// List model identifiers in the backend's order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the backend cannot be queried.
    async fn list_models(&self) -> Result<Vec<ModelIdentifier>, BackendError>;

    /// Run a non-streaming completion.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the call fails or the response is malformed.
    async fn complete(&self, request: ChatRequest) -> Result<Completion, BackendError>;

    /// Open an incremental completion stream.
    ///
    /// Errors before the first event are returned here; later failures
    /// arrive as `Err` items on the stream.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the stream cannot be opened.
    async fn stream(&self, request: ChatRequest) -> Result<BackendStream, BackendError>;
}
