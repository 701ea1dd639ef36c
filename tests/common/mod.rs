//! Fake LLM backend shared by the integration tests.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{ get, post },
    Json,
    Router,
};
use serde_json::{ json, Value };
use std::net::SocketAddr;
use std::sync::{ Arc, Mutex };
use std::time::Duration;

use persona_chat::server::build_app;
use persona_chat::server::relay::{ RelayConfig, RelayState };

pub const MODELS_BODY: &str = r#"{"data":[{"id":"m1"}]}"#;

#[derive(Clone, Default)]
pub struct Upstream {
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl Upstream {
    pub fn last_request(&self) -> Value {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn record(&self, body: Value) {
        self.requests.lock().unwrap().push(body);
    }
}

async fn ollama_chat(State(up): State<Upstream>, Json(body): Json<Value>) -> impl IntoResponse {
    up.record(body);
    Json(json!({
        "model": "gemma3",
        "created_at": "2025-01-01T00:00:00Z",
        "message": { "role": "assistant", "content": "哈哈哈" },
        "done": true
    }))
}

async fn completions(State(up): State<Upstream>, Json(body): Json<Value>) -> impl IntoResponse {
    up.record(body);
    Json(json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": "真的吗" } }]
    }))
}

async fn models() -> impl IntoResponse {
    ([(axum::http::header::CONTENT_TYPE, "application/json")], MODELS_BODY)
}

async fn missing_reply(State(up): State<Upstream>, Json(body): Json<Value>) -> impl IntoResponse {
    up.record(body);
    Json(json!({ "done": true, "choices": [] }))
}

async fn overloaded(State(up): State<Upstream>, Json(body): Json<Value>) -> impl IntoResponse {
    up.record(body);
    (StatusCode::SERVICE_UNAVAILABLE, "model is loading")
}

async fn plain_text(State(up): State<Upstream>, Json(body): Json<Value>) -> impl IntoResponse {
    up.record(body);
    "ok, but not json"
}

async fn slow(State(up): State<Upstream>, Json(body): Json<Value>) -> impl IntoResponse {
    up.record(body);
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "message": { "role": "assistant", "content": "too late" } }))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Starts the fake backend. Healthy routes live under `/api` (Ollama) and `/v1`
/// (OpenAI-compatible); `/bad`, `/busy`, `/text` and `/slow` mirror both
/// dialects with a reply missing its content, a 503, a 200 plain-text body and a
/// five second stall.
pub async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/api/chat", post(ollama_chat))
        .route("/v1/chat/completions", post(completions))
        .route("/v1/models", get(models))
        .route("/bad/chat", post(missing_reply))
        .route("/bad/chat/completions", post(missing_reply))
        .route("/busy/chat", post(overloaded))
        .route("/busy/chat/completions", post(overloaded))
        .route("/text/chat", post(plain_text))
        .route("/text/chat/completions", post(plain_text))
        .route("/slow/chat", post(slow))
        .route("/slow/chat/completions", post(slow))
        .with_state(upstream.clone());

    let addr = serve(app).await;
    (format!("http://{}", addr), upstream)
}

/// Starts the relay in front of `config` and returns its base URL.
pub async fn spawn_relay(config: RelayConfig) -> String {
    let dir = std::env::temp_dir();
    let app = build_app(RelayState::new(config), dir.to_str().unwrap());
    let addr = serve(app).await;
    format!("http://{}", addr)
}

pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
