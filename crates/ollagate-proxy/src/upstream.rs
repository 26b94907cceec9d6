//! OpenAI-compatible backend adapter.
//!
//! Implements [`ChatBackendPort`] over HTTP: `GET {base}/models` for the
//! catalog and `POST {base}/chat/completions` for completions. Streaming
//! responses arrive as Server-Sent Events and are parsed incrementally
//! into [`StreamEvent`]s.

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use ollagate_core::{
    BackendError, BackendStream, ChatBackendPort, ChatMessage, ChatRequest, Completion,
    ModelIdentifier, StreamEvent,
};
use ollagate_core::services::DEFAULT_FINISH_REASON;

/// Default upstream base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/";

const DEFAULT_REFERER: &str = "http://localhost:11434";
const DEFAULT_TITLE: &str = "Ollama Proxy";

/// Connection settings for the upstream service.
#[derive(Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    /// Sent as `HTTP-Referer`; some aggregators use it for attribution.
    pub referer: String,
    /// Sent as `X-Title`.
    pub title: String,
}

impl UpstreamConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `path` joined onto the base URL with exactly one `/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

/// HTTP client for an OpenAI-compatible chat completion service.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    config: UpstreamConfig,
}

impl fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Build the backend and its connection pool.
    pub fn new(config: UpstreamConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .context("API key contains characters not allowed in a header")?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }
        headers.insert(
            "http-referer",
            HeaderValue::from_str(&config.referer).context("invalid referer header")?,
        );
        headers.insert(
            "x-title",
            HeaderValue::from_str(&config.title).context("invalid title header")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(10)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<reqwest::Response, BackendError> {
        let url = self.config.endpoint("chat/completions");
        debug!(%url, model = %request.model, stream = request.stream, "POST chat completion");

        let response = self
            .client
            .post(&url)
            .json(&ChatCompletionBody::from_request(request))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach upstream: {e}");
                BackendError::Transport(e.to_string())
            })?;

        check_status(response).await
    }
}

#[async_trait]
impl ChatBackendPort for OpenAiBackend {
    async fn list_models(&self) -> Result<Vec<ModelIdentifier>, BackendError> {
        let url = self.config.endpoint("models");
        debug!(%url, "GET model list");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let list: ModelList = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(list.data.into_iter().map(|entry| entry.id).collect())
    }

    async fn complete(&self, request: ChatRequest) -> Result<Completion, BackendError> {
        let response = self.post_chat(&request).await?;
        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(BackendError::Upstream(upstream_error_message(&err)));
        }

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            BackendError::Decode("completion response has no choices".to_string())
        })?;

        Ok(Completion {
            model: request.model,
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice
                .finish_reason
                .unwrap_or_else(|| DEFAULT_FINISH_REASON.to_string()),
        })
    }

    async fn stream(&self, request: ChatRequest) -> Result<BackendStream, BackendError> {
        let response = self.post_chat(&request).await?;
        Ok(sse_events(response.bytes_stream()).boxed())
    }
}

/// Turn a non-2xx response into `BackendError::Status` with its body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "Upstream returned error status");
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

// ── Wire types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl<'a> ChatCompletionBody<'a> {
    fn from_request(request: &'a ChatRequest) -> Self {
        let opts = &request.options;
        Self {
            model: &request.model,
            messages: &request.messages,
            stream: request.stream,
            temperature: opts.temperature,
            top_p: opts.top_p,
            top_k: opts.top_k,
            seed: opts.seed,
            max_tokens: opts.max_tokens,
            stop: opts.stop.as_deref().filter(|s| !s.is_empty()),
            response_format: opts.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract a readable message from an in-band `error` value, which may be
/// a bare string or an object with a `message` field.
fn upstream_error_message(err: &serde_json::Value) -> String {
    match err {
        serde_json::Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| other.to_string(), str::to_string),
    }
}

/// Parse one SSE `data:` payload.
///
/// Returns `Ok(None)` for chunks with no choices (keep-alives, usage-only
/// chunks).
fn parse_chunk(data: &str) -> Result<Option<StreamEvent>, BackendError> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| BackendError::Decode(format!("malformed stream chunk: {e}")))?;

    if let Some(err) = chunk.error {
        return Err(BackendError::Upstream(upstream_error_message(&err)));
    }

    Ok(chunk.choices.into_iter().next().map(|choice| StreamEvent {
        delta: choice.delta.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
    }))
}

// ── SSE parsing ────────────────────────────────────────────────────────

struct SseState<S> {
    stream: S,
    buf: BytesMut,
    eof: bool,
    done: bool,
}

/// Parse an SSE byte stream into backend stream events.
///
/// Ends after `data: [DONE]` or when the body ends. Transport errors, in-band
/// error objects and malformed chunks are yielded once, then the stream
/// ends.
pub fn sse_events<S, E>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent, BackendError>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = SseState {
        stream: Box::pin(byte_stream),
        buf: BytesMut::new(),
        eof: false,
        done: false,
    };

    futures_util::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            if let Some(line_end) = find_newline(&st.buf) {
                let line = st.buf.split_to(line_end);
                let line = String::from_utf8_lossy(&line);
                let trimmed = line.trim();

                if trimmed.is_empty() || trimmed.starts_with(':') {
                    continue;
                }

                // `event:`, `id:` and `retry:` fields carry nothing we use.
                let Some(data) = trimmed.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();

                if data == "[DONE]" {
                    st.done = true;
                    return None;
                }

                match parse_chunk(data) {
                    Ok(Some(event)) => return Some((Ok(event), st)),
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("Upstream stream failed: {e}");
                        st.done = true;
                        return Some((Err(e), st));
                    }
                }
            }

            if st.eof {
                return None;
            }

            match st.stream.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    warn!("Upstream stream error: {e}");
                    st.done = true;
                    return Some((Err(BackendError::Transport(e.to_string())), st));
                }
                None => {
                    // Flush a final line that lacks its newline.
                    st.eof = true;
                    if !st.buf.is_empty() {
                        st.buf.extend_from_slice(b"\n");
                    }
                }
            }
        }
    })
}

/// Find the next newline in the buffer, returning the position after it.
fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}
