//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core expects from infrastructure.
//! They contain no implementation details and use only domain types.

pub mod chat_backend;
pub mod event_sink;

pub use chat_backend::{BackendError, BackendStream, ChatBackendPort};
pub use event_sink::{EventSink, SinkClosed};

#[cfg(test)]
pub use chat_backend::MockChatBackendPort;
