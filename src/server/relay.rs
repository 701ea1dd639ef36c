//! Server-side relay for browser chat requests.
//!
//! Mirrors the two backend dialects under `/api/llm` so the browser never needs
//! to reach the LLM host itself. Bodies are forwarded as posted, with the model
//! and sampling defaults filled in from server configuration, and upstream JSON
//! is returned byte for byte.

use axum::{
    extract::{ rejection::JsonRejection, State },
    http::{ header, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use log::{ debug, error };
use reqwest::Client as HttpClient;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::config::{ BackendConfig, SamplingConfig };
use crate::llm::{ self, LlmError };
use crate::models::wire::{ CompletionRelayBody, ErrorBody, OllamaRelayBody };

/// Upstream targets and defaults for the relay routes.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub ollama: BackendConfig,
    pub vllm: BackendConfig,
    pub defaults: SamplingConfig,
}

#[derive(Clone)]
pub struct RelayState {
    http: HttpClient,
    config: Arc<RelayConfig>,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            http: HttpClient::new(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Routes relative to the `/api/llm` mount point.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/ollama/chat", post(ollama_chat_handler))
        .route("/vllm/chat/completions", post(vllm_completions_handler))
        .route("/vllm/models", get(vllm_models_handler))
        .with_state(state)
}

async fn ollama_chat_handler(
    State(state): State<RelayState>,
    body: Result<Json<JsonValue>, JsonRejection>
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return unreadable_body(rejection, "Ollama proxy error"),
    };
    let upstream = &state.config.ollama;
    let body = OllamaRelayBody::from_client(&req, &upstream.model);

    let request = llm::post(&state.http, upstream, "chat", &body);
    relay(llm::read_raw_json(request, upstream).await, "Ollama proxy error")
}

async fn vllm_completions_handler(
    State(state): State<RelayState>,
    body: Result<Json<JsonValue>, JsonRejection>
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return unreadable_body(rejection, "vLLM proxy error"),
    };
    let upstream = &state.config.vllm;
    let defaults = state.config.defaults;
    let body = CompletionRelayBody::from_client(
        &req,
        &upstream.model,
        defaults.temperature,
        defaults.max_tokens
    );

    let request = llm::post(&state.http, upstream, "chat/completions", &body);
    relay(llm::read_raw_json(request, upstream).await, "vLLM proxy error")
}

async fn vllm_models_handler(State(state): State<RelayState>) -> Response {
    let upstream = &state.config.vllm;
    let request = llm::get(&state.http, upstream, "models");
    relay(llm::read_raw_json(request, upstream).await, "Error fetching vLLM models")
}

fn error_response(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: message })).into_response()
}

fn unreadable_body(rejection: JsonRejection, context: &str) -> Response {
    error!("{}: unreadable request body: {}", context, rejection.body_text());
    error_response(format!("请求体无法解析: {}", rejection.body_text()))
}

fn relay(result: Result<Vec<u8>, LlmError>, context: &str) -> Response {
    match result {
        Ok(bytes) => {
            debug!("Relayed {} bytes from upstream", bytes.len());
            ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
        }
        Err(e) => {
            error!("{}: {}", context, e);
            error_response(e.to_string())
        }
    }
}
