//! Test utilities for pluto-core
//!
//! Provides a mock generative-text server that speaks both the Gemini
//! `generateContent` API and the OpenAI chat completions API, replying with a
//! scripted string.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::oneshot;

#[derive(Clone)]
struct MockState {
    /// `None` makes every generation call return 500
    reply: Arc<Mutex<Option<String>>>,
    requests: Arc<AtomicUsize>,
}

impl MockState {
    fn next_reply(&self) -> Option<String> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.reply.lock().unwrap().clone()
    }
}

/// Mock generative-text server for tests
pub struct MockGenerativeServer {
    addr: SocketAddr,
    state: MockState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGenerativeServer {
    /// Start a server that answers every generation call with `reply`
    pub async fn start(reply: &str) -> Self {
        Self::spawn(Some(reply.to_string())).await
    }

    /// Start a server whose generation endpoints return HTTP 500
    pub async fn failing() -> Self {
        Self::spawn(None).await
    }

    async fn spawn(reply: Option<String>) -> Self {
        let state = MockState {
            reply: Arc::new(Mutex::new(reply)),
            requests: Arc::new(AtomicUsize::new(0)),
        };

        let app = Router::new()
            .route(
                "/v1beta/models/:model",
                get(handle_model_info).post(handle_generate_content),
            )
            .route("/v1/chat/completions", post(handle_chat_completions))
            .route("/v1/models", get(handle_models))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace the scripted reply (`None` switches to HTTP 500)
    pub fn set_reply(&self, reply: Option<&str>) {
        *self.state.reply.lock().unwrap() = reply.map(String::from);
    }

    /// Number of generation requests served
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGenerativeServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": {"code": 500, "message": "mock failure"}})),
    )
        .into_response()
}

/// Gemini model metadata (health check)
async fn handle_model_info() -> Json<serde_json::Value> {
    Json(json!({"name": "models/mock", "displayName": "Mock"}))
}

/// Gemini generateContent endpoint
async fn handle_generate_content(State(state): State<MockState>) -> Response {
    match state.next_reply() {
        Some(text) => Json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        None => server_error(),
    }
}

/// OpenAI chat completions endpoint
async fn handle_chat_completions(State(state): State<MockState>) -> Response {
    match state.next_reply() {
        Some(text) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        None => server_error(),
    }
}

/// OpenAI models list (health check)
async fn handle_models() -> Json<serde_json::Value> {
    Json(json!({"object": "list", "data": [{"id": "mock", "object": "model"}]}))
}
