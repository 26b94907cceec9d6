//! NDJSON response framing for Ollama compatibility.
//!
//! Ollama streams newline-delimited JSON: one object per line, flushed as
//! produced. The reframer runs in its own task and hands events over a
//! bounded channel, so a slow client applies backpressure all the way to
//! the upstream read and a disconnected client stops the pump.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use ollagate_core::{PreparedStream, ReframedEvent, StreamOutcome};

use crate::ollama_models::{
    OllamaChatChunk, OllamaChatMessage, OllamaGenerateChunk, OllamaStats, STUB_CONTEXT,
    ollama_error, rfc3339,
};

/// NDJSON content type used by Ollama streaming endpoints.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Which Ollama endpoint a stream is answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Chat,
    Generate,
}

/// Render one reframed event as a single NDJSON line.
pub fn render_event(event: &ReframedEvent, kind: StreamKind) -> String {
    let json = match (event, kind) {
        (ReframedEvent::Error { message }, _) => serde_json::to_string(&ollama_error(message)),
        (
            ReframedEvent::Delta {
                model,
                created_at,
                content,
            },
            StreamKind::Chat,
        ) => serde_json::to_string(&OllamaChatChunk {
            model: model.clone(),
            created_at: rfc3339(*created_at),
            message: OllamaChatMessage::assistant(content.clone()),
            done: false,
            done_reason: None,
            stats: None,
        }),
        (
            ReframedEvent::Delta {
                model,
                created_at,
                content,
            },
            StreamKind::Generate,
        ) => serde_json::to_string(&OllamaGenerateChunk {
            model: model.clone(),
            created_at: rfc3339(*created_at),
            response: content.clone(),
            done: false,
            done_reason: None,
            context: None,
            stats: None,
        }),
        (
            ReframedEvent::Terminal {
                model,
                created_at,
                finish_reason,
                usage,
            },
            StreamKind::Chat,
        ) => serde_json::to_string(&OllamaChatChunk {
            model: model.clone(),
            created_at: rfc3339(*created_at),
            message: OllamaChatMessage::assistant(""),
            done: true,
            done_reason: Some(finish_reason.clone()),
            stats: Some(OllamaStats::from(*usage)),
        }),
        (
            ReframedEvent::Terminal {
                model,
                created_at,
                finish_reason,
                usage,
            },
            StreamKind::Generate,
        ) => serde_json::to_string(&OllamaGenerateChunk {
            model: model.clone(),
            created_at: rfc3339(*created_at),
            response: String::new(),
            done: true,
            done_reason: Some(finish_reason.clone()),
            context: Some(STUB_CONTEXT.to_vec()),
            stats: Some(OllamaStats::from(*usage)),
        }),
    };

    let mut out = json.unwrap_or_default();
    out.push('\n');
    out
}

/// Serialize any value as one NDJSON line.
pub fn ndjson_line<T: Serialize>(value: &T) -> Bytes {
    let mut out = serde_json::to_vec(value).unwrap_or_default();
    out.push(b'\n');
    Bytes::from(out)
}

/// Wrap a byte stream in a 200 NDJSON response.
pub fn ndjson_response<S>(body: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Stream a prepared backend stream to the client as NDJSON.
///
/// The status line is already committed when this is called, so failures
/// from here on are reported in-band.
pub fn stream_response(prepared: PreparedStream, kind: StreamKind) -> Response {
    let (mut tx, rx) = mpsc::channel::<ReframedEvent>(1);
    let model = prepared.model().to_string();

    tokio::spawn(async move {
        match prepared.pump(&mut tx).await {
            StreamOutcome::Completed {
                finish_reason,
                deltas,
            } => info!(%model, %finish_reason, deltas, "Stream completed"),
            StreamOutcome::BackendFailed { message, deltas } => {
                warn!(%model, deltas, "Stream aborted: {message}");
            }
            StreamOutcome::ClientDisconnected { deltas } => {
                debug!(%model, deltas, "Client disconnected mid-stream");
            }
        }
    });

    let lines = ReceiverStream::new(rx)
        .map(move |event| Ok::<_, Infallible>(Bytes::from(render_event(&event, kind))));
    ndjson_response(lines)
}
