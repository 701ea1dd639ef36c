use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api";
pub const DEFAULT_OLLAMA_MODEL: &str = "gemma3";
pub const DEFAULT_VLLM_URL: &str = "http://localhost:8000/v1";
pub const DEFAULT_VLLM_MODEL: &str = "default";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_RELAY_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_CHAT_MAX_TOKENS: u32 = 100;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Wire dialect spoken by an LLM backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `POST {base}/chat` with `{model, messages, stream: false}`.
    Ollama,
    /// OpenAI-compatible `POST {base}/chat/completions`, as served by vLLM.
    Vllm,
}

impl BackendKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "Ollama",
            BackendKind::Vllm => "vLLM",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ollama => write!(f, "ollama"),
            BackendKind::Vllm => write!(f, "vllm"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseBackendKindError {
    message: String,
}

impl fmt::Display for ParseBackendKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseBackendKindError {}

impl FromStr for BackendKind {
    type Err = ParseBackendKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "vllm" | "openai" => Ok(BackendKind::Vllm),
            _ =>
                Err(ParseBackendKindError {
                    message: format!("Invalid backend type: '{}'", s),
                }),
        }
    }
}

/// Where and how to reach one backend. Built once at start-up and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(kind: BackendKind, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: base_url.into(),
            model: model.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins `route` onto the base URL without doubling slashes.
    pub fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), route.trim_start_matches('/'))
    }

    /// `host:port` of the backend, used in user-facing connection errors.
    pub fn authority(&self) -> String {
        match url::Url::parse(&self.base_url) {
            Ok(parsed) => {
                let host = parsed.host_str().unwrap_or_default();
                match parsed.port_or_known_default() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                }
            }
            Err(_) => self.base_url.clone(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(BackendKind::Ollama, DEFAULT_OLLAMA_URL, DEFAULT_OLLAMA_MODEL)
    }
}

/// Sampling knobs sent to OpenAI-compatible backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_CHAT_MAX_TOKENS,
        }
    }
}
