pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, RequestBuilder };
use serde::de::{ DeserializeOwned, IgnoredAny };
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ BackendConfig, BackendKind, Persona, SamplingConfig };
use crate::models::chat::{ Message, WireMessage };
use self::ollama::OllamaClient;
use self::openai::OpenAiCompatClient;

/// Every way a backend call can fail. The `Display` text is shown to the user
/// as-is, so it stays short and readable.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("无法连接到{backend}服务。请确保{backend}正在运行在{authority}")]
    ConnectionRefused {
        backend: &'static str,
        authority: String,
    },
    #[error("{backend}服务响应超时（{timeout_secs}秒）")]
    Timeout {
        backend: &'static str,
        timeout_secs: u64,
    },
    #[error("API调用失败: {detail}")]
    Backend {
        status: Option<u16>,
        detail: String,
    },
    #[error("{backend}返回了无法识别的响应: {detail}")]
    MalformedResponse {
        backend: &'static str,
        detail: String,
    },
}

impl LlmError {
    pub fn malformed(config: &BackendConfig, detail: impl Into<String>) -> Self {
        LlmError::MalformedResponse {
            backend: config.kind.display_name(),
            detail: detail.into(),
        }
    }

    /// Whole seconds for the message, rounded up so sub-second limits never read as 0.
    pub fn timeout(config: &BackendConfig) -> Self {
        LlmError::Timeout {
            backend: config.kind.display_name(),
            timeout_secs: config.timeout.as_millis().div_ceil(1000) as u64,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Backend { status, .. } => *status,
            _ => None,
        }
    }
}

/// Maps a reqwest transport error onto the four user-facing kinds.
pub fn classify(err: reqwest::Error, config: &BackendConfig) -> LlmError {
    let backend = config.kind.display_name();
    if err.is_timeout() {
        LlmError::timeout(config)
    } else if err.is_connect() {
        LlmError::ConnectionRefused {
            backend,
            authority: config.authority(),
        }
    } else if err.is_decode() {
        LlmError::malformed(config, err.to_string())
    } else {
        LlmError::Backend {
            status: err.status().map(|s| s.as_u16()),
            detail: err.to_string(),
        }
    }
}

/// Produces the assistant's next line for a conversation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// One attempt, no retries. `conversation` is forwarded untouched after the
    /// persona prompt.
    async fn generate_reply(&self, conversation: &[Message]) -> Result<String, LlmError>;

    fn config(&self) -> &BackendConfig;
}

/// `[system, ...conversation]` in chronological order.
pub fn format_messages(persona: &Persona, conversation: &[Message]) -> Vec<WireMessage> {
    let mut formatted = Vec::with_capacity(conversation.len() + 1);
    formatted.push(WireMessage::system(persona.system_prompt.clone()));
    formatted.extend(conversation.iter().map(WireMessage::from));
    formatted
}

pub fn new_client(
    config: BackendConfig,
    persona: Persona,
    sampling: SamplingConfig
) -> Arc<dyn ChatBackend> {
    match config.kind {
        BackendKind::Ollama => Arc::new(OllamaClient::new(config, persona)),
        BackendKind::Vllm => Arc::new(OpenAiCompatClient::new(config, persona, sampling)),
    }
}

pub(crate) fn post<B: Serialize + ?Sized>(
    http: &HttpClient,
    config: &BackendConfig,
    route: &str,
    body: &B
) -> RequestBuilder {
    let url = config.endpoint(route);
    debug!("POST {} (timeout {:?})", url, config.timeout);
    http.post(&url).timeout(config.timeout).json(body)
}

pub(crate) fn get(http: &HttpClient, config: &BackendConfig, route: &str) -> RequestBuilder {
    let url = config.endpoint(route);
    debug!("GET {} (timeout {:?})", url, config.timeout);
    http.get(&url).timeout(config.timeout)
}

pub(crate) async fn post_json<B, R>(
    http: &HttpClient,
    config: &BackendConfig,
    route: &str,
    body: &B
) -> Result<R, LlmError>
    where B: Serialize + ?Sized, R: DeserializeOwned
{
    read_json(post(http, config, route, body), config).await
}

pub(crate) async fn get_json<R: DeserializeOwned>(
    http: &HttpClient,
    config: &BackendConfig,
    route: &str
) -> Result<R, LlmError> {
    read_json(get(http, config, route), config).await
}

pub(crate) async fn read_json<R: DeserializeOwned>(
    request: RequestBuilder,
    config: &BackendConfig
) -> Result<R, LlmError> {
    let bytes = read_body(request, config).await?;
    serde_json::from_slice(&bytes).map_err(|e| LlmError::malformed(config, e.to_string()))
}

/// Like [`read_json`] but hands back the body bytes untouched once they are
/// known to be valid JSON.
pub(crate) async fn read_raw_json(
    request: RequestBuilder,
    config: &BackendConfig
) -> Result<Vec<u8>, LlmError> {
    let bytes = read_body(request, config).await?;
    serde_json
        ::from_slice::<IgnoredAny>(&bytes)
        .map_err(|e| LlmError::malformed(config, e.to_string()))?;
    Ok(bytes)
}

async fn read_body(request: RequestBuilder, config: &BackendConfig) -> Result<Vec<u8>, LlmError> {
    let response = request.send().await.map_err(|e| classify(e, config))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body.trim())
        };
        return Err(LlmError::Backend {
            status: Some(status.as_u16()),
            detail,
        });
    }

    let bytes = response.bytes().await.map_err(|e| classify(e, config))?;
    Ok(bytes.to_vec())
}
