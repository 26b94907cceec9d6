//! Shared fixtures for ollagate-proxy integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, Response, header};
use futures_util::{StreamExt, stream};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ollagate_core::{
    BackendError, BackendStream, ChatBackendPort, ChatRequest, Completion, Gateway,
    ModelIdentifier, StreamEvent,
};
use ollagate_proxy::{ModelFilter, ProxyConfig, create_router};

/// Scripted in-process backend.
#[derive(Debug, Default)]
pub struct FakeBackend {
    models: Vec<ModelIdentifier>,
    script: Vec<Result<StreamEvent, BackendError>>,
    completion: Option<String>,
    open_error: Option<BackendError>,
    catalog_error: Option<BackendError>,
    requests: Mutex<Vec<ChatRequest>>,
}

// Not every test binary uses every builder.
#[allow(dead_code)]
impl FakeBackend {
    pub fn with_models(names: &[&str]) -> Self {
        Self {
            models: names.iter().map(|s| (*s).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn script(mut self, events: Vec<Result<StreamEvent, BackendError>>) -> Self {
        self.script = events;
        self
    }

    pub fn completion(mut self, content: &str) -> Self {
        self.completion = Some(content.to_string());
        self
    }

    pub fn failing_open(mut self, err: BackendError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub fn failing_catalog(mut self, err: BackendError) -> Self {
        self.catalog_error = Some(err);
        self
    }

    /// Chat requests the gateway sent, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: ChatRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl ChatBackendPort for FakeBackend {
    async fn list_models(&self) -> Result<Vec<ModelIdentifier>, BackendError> {
        match &self.catalog_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.models.clone()),
        }
    }

    async fn complete(&self, request: ChatRequest) -> Result<Completion, BackendError> {
        let model = request.model.clone();
        self.record(request);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(Completion {
            model,
            content: self.completion.clone().unwrap_or_default(),
            finish_reason: "stop".to_string(),
        })
    }

    async fn stream(&self, request: ChatRequest) -> Result<BackendStream, BackendError> {
        self.record(request);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(stream::iter(self.script.clone()).boxed())
    }
}

/// Router over `backend` with pull pacing disabled.
#[allow(dead_code)]
pub fn router(backend: Arc<FakeBackend>) -> Router {
    router_with_filter(backend, ModelFilter::default())
}

pub fn router_with_filter(backend: Arc<FakeBackend>, filter: ModelFilter) -> Router {
    let gateway = Arc::new(Gateway::new(backend));
    let config = ProxyConfig::default()
        .with_model_filter(filter)
        .with_pull_step_delay(Duration::ZERO);
    create_router(gateway, Arc::new(config))
}

#[allow(dead_code)]
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send_raw(app, method, uri, body.to_string()).await
}

pub async fn send_raw(app: Router, method: Method, uri: &str, body: String) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Split an NDJSON body into parsed lines.
#[allow(dead_code)]
pub async fn ndjson_lines(response: Response<Body>) -> Vec<serde_json::Value> {
    let bytes = body_bytes(response).await;
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.is_empty() || text.ends_with('\n'), "unterminated line: {text:?}");
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
