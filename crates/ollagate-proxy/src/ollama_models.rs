//! Ollama API wire types.
//!
//! Request and response shapes for the `/api/*` routes. Domain types live
//! in `ollagate-core`; this module handles the mapping in both directions.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ollagate_core::{
    ChatMessage, Completion, MessagesRequest, ModelDescriptor, PromptRequest, SamplingOptions,
    Usage,
};

/// Plain-text body of `GET /`.
pub const OLLAMA_ROOT_RESPONSE: &str = "Ollama is running";

/// Version reported by `GET /api/version`.
pub const OLLAMA_VERSION: &str = "0.1.0";

/// Placeholder `context` returned by `/api/generate` final objects.
pub const STUB_CONTEXT: [u32; 3] = [1, 2, 3];

// ── Requests ───────────────────────────────────────────────────────────

/// Ollama `options` object. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub seed: Option<i64>,
    pub num_predict: Option<i64>,
    pub stop: Option<Vec<String>>,
}

impl OllamaOptions {
    /// Map onto backend sampling parameters.
    ///
    /// `num_predict` only becomes `max_tokens` when positive: `-1` means
    /// "unlimited" and `-2` ("fill context") has no backend equivalent, so
    /// both simply omit the limit. `format: "json"` enables JSON mode; any
    /// other format value is ignored.
    pub fn to_sampling(&self, format: Option<&serde_json::Value>) -> SamplingOptions {
        let max_tokens = match self.num_predict {
            Some(n) if n > 0 => u32::try_from(n).ok(),
            Some(n) => {
                debug!(num_predict = n, "Non-positive num_predict; omitting max_tokens");
                None
            }
            None => None,
        };

        let json_mode = match format {
            Some(serde_json::Value::String(s)) if s == "json" => true,
            Some(other) if !other.is_null() => {
                debug!("Unsupported Ollama format value: {other}; ignoring");
                false
            }
            _ => false,
        };

        SamplingOptions {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            seed: self.seed,
            max_tokens,
            stop: self.stop.clone(),
            json_mode,
        }
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaGenerateRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub format: Option<serde_json::Value>,
    #[serde(default)]
    pub options: OllamaOptions,
}

impl OllamaGenerateRequest {
    /// Ollama streams unless told otherwise.
    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(true)
    }

    pub fn into_prompt_request(self) -> PromptRequest {
        let options = self.options.to_sampling(self.format.as_ref());
        PromptRequest {
            model: self.model,
            prompt: self.prompt,
            system: self.system,
            options,
        }
    }
}

/// A chat message as Ollama clients send and receive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl OllamaChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            images: None,
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<OllamaChatMessage>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub format: Option<serde_json::Value>,
    #[serde(default)]
    pub options: OllamaOptions,
    #[serde(default)]
    pub tools: Option<Vec<serde_json::Value>>,
}

impl OllamaChatRequest {
    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(true)
    }

    pub fn into_messages_request(self) -> MessagesRequest {
        let options = self.options.to_sampling(self.format.as_ref());
        MessagesRequest {
            model: self.model,
            messages: self
                .messages
                .into_iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: m.content,
                })
                .collect(),
            options,
        }
    }
}

/// Body of requests that only name a model (`/api/show`, `/api/pull`,
/// `/api/delete`). Older clients send `name` instead of `model`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaModelRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
}

impl OllamaModelRequest {
    /// `model`, falling back to `name`; blank values count as absent.
    pub fn effective_model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| self.name.as_deref().filter(|n| !n.is_empty()))
    }
}

/// Body of `POST /api/copy`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OllamaCopyRequest {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

// ── Responses ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct OllamaVersionResponse {
    pub version: String,
}

/// Timing and token counters on final objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OllamaStats {
    pub total_duration: u64,
    pub load_duration: u64,
    pub prompt_eval_count: u32,
    pub prompt_eval_duration: u64,
    pub eval_count: u32,
    pub eval_duration: u64,
}

impl From<Usage> for OllamaStats {
    fn from(u: Usage) -> Self {
        Self {
            total_duration: u.total_duration,
            load_duration: u.load_duration,
            prompt_eval_count: u.prompt_eval_count,
            prompt_eval_duration: u.prompt_eval_duration,
            eval_count: u.eval_count,
            eval_duration: u.eval_duration,
        }
    }
}

/// One `/api/chat` object, streamed or final.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatChunk {
    pub model: String,
    pub created_at: String,
    pub message: OllamaChatMessage,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(flatten)]
    pub stats: Option<OllamaStats>,
}

impl OllamaChatChunk {
    pub fn from_completion(completion: Completion) -> Self {
        Self {
            model: completion.model,
            created_at: now_rfc3339(),
            message: OllamaChatMessage::assistant(completion.content),
            done: true,
            done_reason: Some(completion.finish_reason),
            stats: Some(OllamaStats::default()),
        }
    }

    /// Reply to a chat request with no messages (a model "load" probe).
    pub fn load(model: String) -> Self {
        Self {
            model,
            created_at: now_rfc3339(),
            message: OllamaChatMessage::assistant(""),
            done: true,
            done_reason: Some("load".to_string()),
            stats: None,
        }
    }
}

/// One `/api/generate` object, streamed or final.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaGenerateChunk {
    pub model: String,
    pub created_at: String,
    pub response: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<u32>>,
    #[serde(flatten)]
    pub stats: Option<OllamaStats>,
}

impl OllamaGenerateChunk {
    pub fn from_completion(completion: Completion) -> Self {
        Self {
            model: completion.model,
            created_at: now_rfc3339(),
            response: completion.content,
            done: true,
            done_reason: Some(completion.finish_reason),
            context: Some(STUB_CONTEXT.to_vec()),
            stats: Some(OllamaStats::default()),
        }
    }
}

/// `details` block shared by `/api/tags` and `/api/show`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaModelDetails {
    pub parent_model: String,
    pub format: String,
    pub family: String,
    pub families: Vec<String>,
    pub parameter_size: String,
    pub quantization_level: String,
}

impl From<&ModelDescriptor> for OllamaModelDetails {
    fn from(d: &ModelDescriptor) -> Self {
        Self {
            parent_model: String::new(),
            format: d.format.clone(),
            family: d.family.clone(),
            families: vec![d.family.clone()],
            parameter_size: d.parameter_size.clone(),
            quantization_level: d.quantization_level.clone(),
        }
    }
}

/// One entry of `/api/tags`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaModelEntry {
    pub name: String,
    pub model: String,
    pub modified_at: String,
    pub size: u64,
    pub digest: String,
    pub details: OllamaModelDetails,
}

impl OllamaModelEntry {
    pub fn from_descriptor(d: &ModelDescriptor, modified_at: &str) -> Self {
        Self {
            name: d.display_name.clone(),
            model: d.display_name.clone(),
            modified_at: modified_at.to_string(),
            size: d.size,
            digest: d.digest.clone(),
            details: OllamaModelDetails::from(d),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OllamaTagsResponse {
    pub models: Vec<OllamaModelEntry>,
}

/// Body of `/api/show`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaShowResponse {
    pub modelfile: String,
    pub parameters: String,
    pub template: String,
    pub system: String,
    pub details: OllamaModelDetails,
    pub model_info: BTreeMap<String, serde_json::Value>,
    pub modified_at: String,
}

impl OllamaShowResponse {
    /// Build a show response. `requested` is the name the client asked for.
    pub fn from_descriptor(requested: &str, d: &ModelDescriptor) -> Self {
        let model_info = BTreeMap::from([
            (
                "general.architecture".to_string(),
                serde_json::json!(d.family),
            ),
            ("general.file_type".to_string(), serde_json::json!(1)),
            (
                "general.parameter_count".to_string(),
                serde_json::json!(d.parameter_count),
            ),
            (
                "general.quantization_version".to_string(),
                serde_json::json!(2),
            ),
            (
                "llama.context_length".to_string(),
                serde_json::json!(d.context_length),
            ),
            ("llama.embedding_length".to_string(), serde_json::json!(4096)),
            ("llama.block_count".to_string(), serde_json::json!(32)),
        ]);

        Self {
            modelfile: format!(
                "# Modelfile generated for {requested}\nFROM {}",
                d.identifier
            ),
            parameters: String::new(),
            template: "{{ if .System }}{{ .System }}\n{{ end }}{{ if .Prompt }}{{ .Prompt }}{{ end }}"
                .to_string(),
            system: String::new(),
            details: OllamaModelDetails::from(d),
            model_info,
            modified_at: now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OllamaPsResponse {
    pub models: Vec<serde_json::Value>,
}

/// One line of the simulated `/api/pull` progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OllamaPullProgress {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
}

impl OllamaPullProgress {
    pub fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            digest: None,
            total: None,
            completed: None,
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Current time in RFC 3339 (UTC, second precision).
pub fn now_rfc3339() -> String {
    rfc3339(Utc::now())
}

pub fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build an Ollama-style error JSON object: `{"error": "message"}`.
pub fn ollama_error(msg: &str) -> serde_json::Value {
    serde_json::json!({ "error": msg })
}
