//! Axum HTTP server for the Ollama-compatible gateway.
//!
//! This module provides the `serve()` function that runs the gateway
//! using a pre-bound `TcpListener`.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use ollagate_core::Gateway;

use crate::config::ProxyConfig;
use crate::ollama_handlers::{
    ProxyState, head_ok, ollama_chat, ollama_copy, ollama_delete, ollama_generate, ollama_ps,
    ollama_pull, ollama_root, ollama_show, ollama_tags, ollama_version,
};

/// CORS policy Ollama clients expect: any origin, the usual methods and
/// the headers browser-based clients send.
pub fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            header::AUTHORIZATION,
        ])
}

/// Build the router with every Ollama route.
///
/// Every route gets an explicit `HEAD` handler so `HEAD` never reaches a
/// handler that talks to the backend.
pub fn create_router(gateway: Arc<Gateway>, config: Arc<ProxyConfig>) -> Router {
    let state = ProxyState { gateway, config };

    Router::new()
        .route("/", get(ollama_root).head(head_ok))
        .route("/api/version", get(ollama_version).head(head_ok))
        .route("/api/tags", get(ollama_tags).head(head_ok))
        .route("/api/ps", get(ollama_ps).head(head_ok))
        .route("/api/show", post(ollama_show).head(head_ok))
        .route("/api/generate", post(ollama_generate).head(head_ok))
        .route("/api/chat", post(ollama_chat).head(head_ok))
        .route("/api/pull", post(ollama_pull).head(head_ok))
        .route("/api/copy", post(ollama_copy).head(head_ok))
        .route("/api/delete", delete(ollama_delete).head(head_ok))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .with_state(state)
}

/// Run the gateway on a pre-bound listener until `cancel` fires.
///
/// In-flight streams are allowed to finish before this returns.
pub async fn serve(
    listener: TcpListener,
    gateway: Arc<Gateway>,
    config: ProxyConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let app = create_router(gateway, Arc::new(config));

    info!("Ollama-compatible gateway listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Gateway shut down");
    Ok(())
}
