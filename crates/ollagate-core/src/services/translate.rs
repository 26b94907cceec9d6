//! Request translation into the backend's chat-message list.
//!
//! Two inbound shapes are accepted: a single prompt with an optional
//! system prompt (`/api/generate`), and a client-supplied message list
//! (`/api/chat`). Validation happens here, before any upstream call.

use crate::domain::{ChatMessage, ChatRequest, MessageRole, ModelIdentifier, SamplingOptions};
use crate::error::GatewayError;

/// Prompt-style request.
#[derive(Debug, Clone, Default)]
pub struct PromptRequest {
    pub model: Option<String>,
    pub prompt: String,
    pub system: Option<String>,
    pub options: SamplingOptions,
}

/// Message-list request.
#[derive(Debug, Clone, Default)]
pub struct MessagesRequest {
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub options: SamplingOptions,
}

/// Either inbound request shape.
#[derive(Debug, Clone)]
pub enum InboundRequest {
    Prompt(PromptRequest),
    Messages(MessagesRequest),
}

impl From<PromptRequest> for InboundRequest {
    fn from(req: PromptRequest) -> Self {
        Self::Prompt(req)
    }
}

impl From<MessagesRequest> for InboundRequest {
    fn from(req: MessagesRequest) -> Self {
        Self::Messages(req)
    }
}

/// A validated request whose model is still a client alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedRequest {
    pub alias: String,
    pub messages: Vec<ChatMessage>,
    pub options: SamplingOptions,
}

impl TranslatedRequest {
    /// Attach the resolved identifier and streaming flag.
    #[must_use]
    pub fn into_chat_request(self, model: ModelIdentifier, stream: bool) -> ChatRequest {
        ChatRequest {
            model,
            messages: self.messages,
            stream,
            options: self.options,
        }
    }
}

/// Validate and convert an inbound request.
///
/// # Errors
///
/// Returns `GatewayError::InvalidRequest` when the model is missing or blank.
pub fn translate(request: InboundRequest) -> Result<TranslatedRequest, GatewayError> {
    match request {
        InboundRequest::Prompt(req) => {
            let alias = require_model(req.model)?;
            let mut messages = Vec::with_capacity(2);
            if let Some(system) = req.system.filter(|s| !s.is_empty()) {
                messages.push(ChatMessage::new(MessageRole::System, system));
            }
            messages.push(ChatMessage::new(MessageRole::User, req.prompt));
            Ok(TranslatedRequest {
                alias,
                messages,
                options: req.options,
            })
        }
        InboundRequest::Messages(req) => Ok(TranslatedRequest {
            alias: require_model(req.model)?,
            messages: req.messages,
            options: req.options,
        }),
    }
}

fn require_model(model: Option<String>) -> Result<String, GatewayError> {
    match model {
        Some(m) if !m.trim().is_empty() => Ok(m),
        _ => Err(GatewayError::InvalidRequest(
            "Model name is required".to_string(),
        )),
    }
}
