//! Route-level tests for the Ollama surface.
//!
//! These drive the router in-process against a scripted backend.

mod common;

use std::sync::Arc;

use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

use common::{
    FakeBackend, body_bytes, body_json, get, ndjson_lines, router, router_with_filter, send_json,
    send_raw,
};
use ollagate_core::{BackendError, StreamEvent};
use ollagate_proxy::ModelFilter;

const CATALOG: &[&str] = &[
    "meta-llama/llama-3-70b-instruct",
    "acme/nano-1b",
    "vendor/tiny-3b",
];

fn backend() -> FakeBackend {
    FakeBackend::with_models(CATALOG)
}

// ── Probes ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn version_and_ps_are_static() {
    let app = router(Arc::new(backend()));
    let v = body_json(get(app.clone(), "/api/version").await).await;
    assert_eq!(v, json!({"version": "0.1.0"}));

    let v = body_json(get(app, "/api/ps").await).await;
    assert_eq!(v, json!({"models": []}));
}

#[tokio::test]
async fn head_is_accepted_on_post_routes() {
    let app = router(Arc::new(backend()));
    for uri in ["/api/chat", "/api/generate", "/api/pull", "/api/delete", "/api/tags"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri(uri)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "HEAD {uri}");
    }
}

#[tokio::test]
async fn head_does_not_touch_the_backend() {
    let app = router(Arc::new(
        backend().failing_catalog(BackendError::Transport("down".into())),
    ));
    for uri in ["/", "/api/version", "/api/tags", "/api/ps", "/api/show"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri(uri)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "HEAD {uri}");
    }
}

// ── Catalog ────────────────────────────────────────────────────────────

#[tokio::test]
async fn tags_lists_display_names_with_details() {
    let app = router(Arc::new(backend()));
    let response = get(app, "/api/tags").await;
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    let models = v["models"].as_array().unwrap();
    assert_eq!(models.len(), 3);
    assert_eq!(models[0]["name"], "llama-3-70b-instruct");
    assert_eq!(models[0]["details"]["family"], "llama");
    assert_eq!(models[0]["details"]["parameter_size"], "70B");
    assert_eq!(models[1]["name"], "nano-1b");
    assert_eq!(models[1]["details"]["family"], "transformer");
    assert_eq!(models[1]["size"], 270_898_672);
    assert_eq!(models[2]["details"]["format"], "gguf");
    assert_eq!(models[2]["digest"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn tags_honors_model_filter() {
    let app = router_with_filter(Arc::new(backend()), ModelFilter::new(["tiny-3b"]));
    let v = body_json(get(app, "/api/tags").await).await;
    let names: Vec<_> = v["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["tiny-3b"]);
}

#[tokio::test]
async fn tags_reports_upstream_failure() {
    let app = router(Arc::new(
        backend().failing_catalog(BackendError::Transport("connection refused".into())),
    ));
    let response = get(app, "/api/tags").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let v = body_json(response).await;
    assert!(v["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn show_describes_model_by_display_name() {
    let app = router(Arc::new(backend()));
    let response = send_json(app, Method::POST, "/api/show", json!({"model": "nano-1b"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    assert_eq!(
        v["modelfile"],
        "# Modelfile generated for nano-1b\nFROM acme/nano-1b"
    );
    assert_eq!(v["model_info"]["general.parameter_count"], 1_000_000_000_u64);
    assert_eq!(v["model_info"]["llama.context_length"], 200_000);
    assert_eq!(v["details"]["quantization_level"], "Q4_K_M");
}

#[tokio::test]
async fn show_accepts_legacy_name_field() {
    let app = router(Arc::new(backend()));
    let response = send_json(
        app,
        Method::POST,
        "/api/show",
        json!({"name": "meta-llama/llama-3-70b-instruct"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn show_unknown_model_is_404() {
    let app = router(Arc::new(backend()));
    let response = send_json(app, Method::POST, "/api/show", json!({"model": "ghost"})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "model 'ghost' not found"})
    );
}

#[tokio::test]
async fn show_without_model_is_400() {
    let app = router(Arc::new(backend()));
    let response = send_json(app, Method::POST, "/api/show", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Model name is required"})
    );
}

// ── Streaming ──────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_streams_deltas_then_one_terminal() {
    let fake = Arc::new(backend().script(vec![
        Ok(StreamEvent::delta("Hel")),
        Ok(StreamEvent::delta("lo")),
        Ok(StreamEvent::delta("!")),
        Ok(StreamEvent::finish("stop")),
    ]));
    let app = router(Arc::clone(&fake));

    let response = send_json(
        app,
        Method::POST,
        "/api/generate",
        json!({"model": "tiny-3b", "prompt": "hi", "system": "be brief"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-ndjson"
    );

    let lines = ndjson_lines(response).await;
    assert_eq!(lines.len(), 4);
    let text: String = lines[..3]
        .iter()
        .map(|l| {
            assert_eq!(l["done"], false);
            assert_eq!(l["model"], "vendor/tiny-3b");
            l["response"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(text, "Hello!");

    let last = &lines[3];
    assert_eq!(last["done"], true);
    assert_eq!(last["done_reason"], "stop");
    assert_eq!(last["context"], json!([1, 2, 3]));
    assert_eq!(last["eval_count"], 0);

    let sent = fake.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].model, "vendor/tiny-3b");
    assert!(sent[0].stream);
    assert_eq!(sent[0].messages[0].role, "system");
    assert_eq!(sent[0].messages[1].role, "user");
    assert_eq!(sent[0].messages[1].content, "hi");
}

#[tokio::test]
async fn chat_stream_reports_last_finish_reason() {
    let fake = Arc::new(backend().script(vec![
        Ok(StreamEvent::delta("a")),
        Ok(StreamEvent::finish("length")),
    ]));
    let app = router(fake);

    let response = send_json(
        app,
        Method::POST,
        "/api/chat",
        json!({"model": "nano-1b", "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;
    let lines = ndjson_lines(response).await;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["message"], json!({"role": "assistant", "content": "a"}));
    assert_eq!(lines[1]["done"], true);
    assert_eq!(lines[1]["done_reason"], "length");
    assert!(lines[1].get("context").is_none());
}

#[tokio::test]
async fn chat_stream_without_finish_reason_defaults_to_stop() {
    let fake = Arc::new(backend().script(vec![Ok(StreamEvent::delta("x"))]));
    let response = send_json(
        router(fake),
        Method::POST,
        "/api/chat",
        json!({"model": "nano-1b", "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;
    let lines = ndjson_lines(response).await;
    assert_eq!(lines.last().unwrap()["done_reason"], "stop");
}

#[tokio::test]
async fn mid_stream_failure_ends_with_error_line_and_no_terminal() {
    let fake = Arc::new(backend().script(vec![
        Ok(StreamEvent::delta("one")),
        Ok(StreamEvent::delta("two")),
        Err(BackendError::Transport("connection reset".into())),
        Ok(StreamEvent::delta("never")),
    ]));
    let response = send_json(
        router(fake),
        Method::POST,
        "/api/chat",
        json!({"model": "nano-1b", "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let lines = ndjson_lines(response).await;
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.get("done") != Some(&json!(true))));
    let error = lines[2]["error"].as_str().unwrap();
    assert!(error.starts_with("Stream error: "));
    assert!(error.contains("connection reset"));
}

#[tokio::test]
async fn stream_open_failure_is_500_before_any_line() {
    let fake = Arc::new(backend().failing_open(BackendError::Status {
        status: 401,
        body: "bad key".into(),
    }));
    let response = send_json(
        router(fake),
        Method::POST,
        "/api/generate",
        json!({"model": "nano-1b", "prompt": "hi"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let v = body_json(response).await;
    assert!(v["error"].as_str().unwrap().contains("401"));
}

// ── Validation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_model_is_400_without_upstream_call() {
    let fake = Arc::new(backend());
    let response = send_json(
        router(Arc::clone(&fake)),
        Method::POST,
        "/api/generate",
        json!({"prompt": "hi"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send_json(
        router(Arc::clone(&fake)),
        Method::POST,
        "/api/chat",
        json!({"model": "", "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn malformed_json_is_400() {
    let response = send_raw(
        router(Arc::new(backend())),
        Method::POST,
        "/api/chat",
        "{\"model\":".to_string(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_bytes(response).await,
        json!({"error": "Invalid JSON payload"}).to_string()
    );
}

#[tokio::test]
async fn chat_without_messages_is_load_probe() {
    let fake = Arc::new(backend());
    let response = send_json(
        router(Arc::clone(&fake)),
        Method::POST,
        "/api/chat",
        json!({"model": "nano-1b", "messages": []}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    assert_eq!(v["done"], true);
    assert_eq!(v["done_reason"], "load");
    assert_eq!(v["model"], "nano-1b");
    assert!(fake.requests().is_empty());
}

// ── Non-streaming ──────────────────────────────────────────────────────

#[tokio::test]
async fn chat_non_streaming_returns_single_object() {
    let fake = Arc::new(backend().completion("pong"));
    let response = send_json(
        router(Arc::clone(&fake)),
        Method::POST,
        "/api/chat",
        json!({
            "model": "nano-1b",
            "stream": false,
            "options": {"temperature": 0.1, "num_predict": 32},
            "messages": [{"role": "user", "content": "ping"}]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let v = body_json(response).await;
    assert_eq!(v["message"]["content"], "pong");
    assert_eq!(v["done"], true);
    assert_eq!(v["done_reason"], "stop");
    assert_eq!(v["model"], "acme/nano-1b");

    let sent = fake.requests();
    assert!(!sent[0].stream);
    assert_eq!(sent[0].options.max_tokens, Some(32));
    assert_eq!(sent[0].options.temperature, Some(0.1));
}

#[tokio::test]
async fn generate_non_streaming_includes_context() {
    let fake = Arc::new(backend().completion("42"));
    let v = body_json(
        send_json(
            router(fake),
            Method::POST,
            "/api/generate",
            json!({"model": "tiny-3b", "prompt": "answer", "stream": false}),
        )
        .await,
    )
    .await;
    assert_eq!(v["response"], "42");
    assert_eq!(v["context"], json!([1, 2, 3]));
    assert_eq!(v["total_duration"], 0);
}

// ── Model management stubs ─────────────────────────────────────────────

#[tokio::test]
async fn pull_without_stream_reports_success() {
    let response = send_json(
        router(Arc::new(backend())),
        Method::POST,
        "/api/pull",
        json!({"model": "nano-1b", "stream": false}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "success"}));
}

#[tokio::test]
async fn pull_streams_progress_to_success() {
    let response = send_json(
        router(Arc::new(backend())),
        Method::POST,
        "/api/pull",
        json!({"model": "tiny-3b"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let lines = ndjson_lines(response).await;
    assert_eq!(lines.first().unwrap()["status"], "pulling manifest");
    assert_eq!(lines.last().unwrap()["status"], "success");
    assert!(
        lines
            .iter()
            .any(|l| l["status"] == "downloading" && l["completed"] == l["total"])
    );
}

#[tokio::test]
async fn pull_unknown_model_is_404() {
    let response = send_json(
        router(Arc::new(backend())),
        Method::POST,
        "/api/pull",
        json!({"model": "ghost"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn copy_and_delete_are_accepted() {
    let app = router(Arc::new(backend()));
    let response = send_json(
        app.clone(),
        Method::POST,
        "/api/copy",
        json!({"source": "nano-1b", "destination": "mine"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(app.clone(), Method::POST, "/api/copy", json!({"source": "x"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send_json(
        app.clone(),
        Method::DELETE,
        "/api/delete",
        json!({"model": "nano-1b"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(app, Method::DELETE, "/api/delete", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
