//! Ollama-native API route handlers.
//!
//! These handlers accept Ollama-format requests, hand them to the gateway
//! and render the results back in Ollama format, making the proxy a
//! drop-in replacement for Ollama on port 11434.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use ollagate_core::Gateway;
use ollagate_core::services::metadata;

use crate::config::ProxyConfig;
use crate::error::HttpError;
use crate::ollama_models::*;
use crate::ollama_pull;
use crate::ollama_stream::{self, StreamKind, ndjson_line};

const MODEL_REQUIRED: &str = "Model name is required";

// ── Shared State ───────────────────────────────────────────────────────

/// Shared proxy state, injected via Axum `State`.
#[derive(Clone)]
pub(crate) struct ProxyState {
    pub gateway: Arc<Gateway>,
    pub config: Arc<ProxyConfig>,
}

/// Decode a JSON body, answering malformed input with Ollama's 400.
fn parse_body<T: DeserializeOwned>(body: &Bytes, route: &str) -> Result<T, HttpError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Invalid {route} request: {e}");
        HttpError::BadRequest("Invalid JSON payload".to_string())
    })
}

// ── GET / ──────────────────────────────────────────────────────────────

/// Ollama root probe: `"Ollama is running"` as plain text.
pub(crate) async fn ollama_root() -> impl IntoResponse {
    OLLAMA_ROOT_RESPONSE
}

/// `HEAD` on any Ollama route.
pub(crate) async fn head_ok() -> StatusCode {
    StatusCode::OK
}

// ── GET /api/version ───────────────────────────────────────────────────

pub(crate) async fn ollama_version() -> impl IntoResponse {
    Json(OllamaVersionResponse {
        version: OLLAMA_VERSION.to_string(),
    })
}

// ── GET /api/tags ──────────────────────────────────────────────────────

pub(crate) async fn ollama_tags(State(state): State<ProxyState>) -> Result<Response, HttpError> {
    debug!("GET /api/tags");
    let descriptors = state.gateway.list_descriptors().await?;
    let modified_at = now_rfc3339();

    let models: Vec<_> = descriptors
        .iter()
        .filter(|d| state.config.model_filter.allows(&d.display_name))
        .map(|d| OllamaModelEntry::from_descriptor(d, &modified_at))
        .collect();

    debug!(
        listed = models.len(),
        total = descriptors.len(),
        "Listing models"
    );
    Ok(Json(OllamaTagsResponse { models }).into_response())
}

// ── POST /api/show ─────────────────────────────────────────────────────

pub(crate) async fn ollama_show(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Response, HttpError> {
    let req: OllamaModelRequest = parse_body(&body, "/api/show")?;
    let name = req
        .effective_model()
        .ok_or_else(|| HttpError::BadRequest(MODEL_REQUIRED.to_string()))?;
    debug!(model = %name, "POST /api/show");

    let descriptor = state.gateway.describe_model(name).await?;
    Ok(Json(OllamaShowResponse::from_descriptor(name, &descriptor)).into_response())
}

// ── GET /api/ps ────────────────────────────────────────────────────────

/// Nothing is ever loaded locally.
pub(crate) async fn ollama_ps() -> impl IntoResponse {
    Json(OllamaPsResponse { models: vec![] })
}

// ── POST /api/generate ─────────────────────────────────────────────────

pub(crate) async fn ollama_generate(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Response, HttpError> {
    let req: OllamaGenerateRequest = parse_body(&body, "/api/generate")?;
    let streaming = req.is_streaming();
    info!(
        model = req.model.as_deref().unwrap_or_default(),
        streaming, "POST /api/generate"
    );

    let request = req.into_prompt_request().into();
    if streaming {
        let prepared = state.gateway.open_stream(request).await?;
        return Ok(ollama_stream::stream_response(prepared, StreamKind::Generate));
    }

    let completion = state.gateway.complete(request).await?;
    Ok(Json(OllamaGenerateChunk::from_completion(completion)).into_response())
}

// ── POST /api/chat ─────────────────────────────────────────────────────

pub(crate) async fn ollama_chat(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Response, HttpError> {
    let req: OllamaChatRequest = parse_body(&body, "/api/chat")?;
    let model = match req.model.as_deref() {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ => return Err(HttpError::BadRequest(MODEL_REQUIRED.to_string())),
    };

    // An empty message list is how clients ask Ollama to load a model.
    if req.messages.is_empty() {
        debug!(%model, "Chat load probe");
        return Ok(Json(OllamaChatChunk::load(model)).into_response());
    }

    if req.tools.as_ref().is_some_and(|t| !t.is_empty()) {
        debug!(%model, "Ignoring tool definitions on chat request");
    }

    let streaming = req.is_streaming();
    info!(%model, streaming, messages = req.messages.len(), "POST /api/chat");

    let request = req.into_messages_request().into();
    if streaming {
        let prepared = state.gateway.open_stream(request).await?;
        return Ok(ollama_stream::stream_response(prepared, StreamKind::Chat));
    }

    let completion = state.gateway.complete(request).await?;
    Ok(Json(OllamaChatChunk::from_completion(completion)).into_response())
}

// ── POST /api/pull ─────────────────────────────────────────────────────

pub(crate) async fn ollama_pull(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Response, HttpError> {
    let req: OllamaModelRequest = parse_body(&body, "/api/pull")?;
    let name = req
        .effective_model()
        .ok_or_else(|| HttpError::BadRequest(MODEL_REQUIRED.to_string()))?;

    let descriptor = state.gateway.describe_model(name).await?;
    info!(model = %name, identifier = %descriptor.identifier, "POST /api/pull");

    if !req.stream.unwrap_or(true) {
        return Ok(Json(OllamaPullProgress::status("success")).into_response());
    }

    let lines = ollama_pull::pull_progress(name.to_string(), state.config.pull_step_delay)
        .map(|step| Ok::<_, Infallible>(ndjson_line(&step)));
    Ok(ollama_stream::ndjson_response(lines))
}

// ── POST /api/copy ─────────────────────────────────────────────────────

/// Accepted and ignored; remote models cannot be copied.
pub(crate) async fn ollama_copy(body: Bytes) -> Result<StatusCode, HttpError> {
    let req: OllamaCopyRequest = parse_body(&body, "/api/copy")?;
    match (req.source.as_deref(), req.destination.as_deref()) {
        (Some(src), Some(dst)) if !src.is_empty() && !dst.is_empty() => {
            debug!(source = src, destination = dst, "POST /api/copy (no-op)");
            Ok(StatusCode::OK)
        }
        _ => Err(HttpError::BadRequest(
            "Source and destination are required".to_string(),
        )),
    }
}

// ── DELETE /api/delete ─────────────────────────────────────────────────

/// Accepted and ignored; remote models cannot be deleted.
pub(crate) async fn ollama_delete(body: Bytes) -> Result<StatusCode, HttpError> {
    let req: OllamaModelRequest = parse_body(&body, "/api/delete")?;
    let name = req
        .effective_model()
        .ok_or_else(|| HttpError::BadRequest(MODEL_REQUIRED.to_string()))?;
    debug!(model = %name, display_name = metadata::display_name(name), "DELETE /api/delete (no-op)");
    Ok(StatusCode::OK)
}
