//! Domain types for the gateway.
//!
//! These types describe models, chat requests and stream events
//! independent of any wire format. The proxy layer maps them to and
//! from the Ollama and OpenAI representations.

mod chat;
mod model;
mod stream;

pub use chat::{ChatMessage, ChatRequest, Completion, MessageRole, SamplingOptions};
pub use model::{ModelAlias, ModelDescriptor, ModelIdentifier};
pub use stream::{ReframedEvent, StreamEvent, Usage};
