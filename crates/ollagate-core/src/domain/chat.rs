//! Chat domain types.
//!
//! These are the backend-facing shapes produced by the request translator.

use serde::{Deserialize, Serialize};

use super::model::ModelIdentifier;

/// The role of a message sender.
///
/// Only used when the gateway builds messages itself. Client-supplied
/// messages keep their role string verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Convert role to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat message in backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role string, passed through unvalidated.
    pub role: String,
    /// Message text.
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    /// Create a message with a well-known role.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
        }
    }
}

/// Sampling parameters forwarded to the backend.
///
/// Every field is optional; absent fields are left to the backend's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplingOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub seed: Option<i64>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
    /// Ask the backend for a JSON object response.
    pub json_mode: bool,
}

/// A fully resolved request for the chat-completion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Concrete upstream identifier (already alias-resolved).
    pub model: ModelIdentifier,
    /// Ordered message list.
    pub messages: Vec<ChatMessage>,
    /// Whether the backend should stream incremental events.
    pub stream: bool,
    pub options: SamplingOptions,
}

/// Result of a non-streaming completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Identifier the backend was called with.
    pub model: ModelIdentifier,
    /// Assistant text of the first choice.
    pub content: String,
    /// Backend finish reason, `"stop"` when the backend omitted it.
    pub finish_reason: String,
}
