//! Streaming translation core for the ollagate gateway.
//!
//! Resolves Ollama-style model aliases against an OpenAI-compatible
//! backend's catalog, synthesizes Ollama model metadata, translates
//! requests into chat messages, and reframes the backend's incremental
//! completion stream into Ollama's one-object-per-line event stream.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{
    ChatMessage, ChatRequest, Completion, MessageRole, ModelAlias, ModelDescriptor,
    ModelIdentifier, ReframedEvent, SamplingOptions, StreamEvent, Usage,
};
pub use error::GatewayError;
pub use ports::{BackendError, BackendStream, ChatBackendPort, EventSink, SinkClosed};
pub use services::{
    CatalogSnapshot, Gateway, InboundRequest, MessagesRequest, ModelCatalog, PreparedStream,
    PromptRequest, ReframerState, StreamOutcome, StreamReframer, TranslatedRequest,
};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
