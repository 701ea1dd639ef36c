use clap::{ Args, Parser, Subcommand };
use std::time::Duration;

use crate::config::backend::{
    BackendConfig,
    BackendKind,
    SamplingConfig,
    DEFAULT_CHAT_MAX_TOKENS,
    DEFAULT_HOST,
    DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL,
    DEFAULT_PORT,
    DEFAULT_RELAY_MAX_TOKENS,
    DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_MS,
    DEFAULT_VLLM_MODEL,
    DEFAULT_VLLM_URL,
};
use crate::server::relay::RelayConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the web UI and relay its requests to the LLM backends
    Serve(ServeArgs),

    /// Chat with the persona from the terminal
    Chat(ChatArgs),

    /// List models offered by the OpenAI-compatible backend
    Models(ModelsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Base URL of the Ollama API (the relay posts to `{url}/chat`)
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    /// Model used for every Ollama request
    #[arg(long, env = "OLLAMA_MODEL", default_value = DEFAULT_OLLAMA_MODEL)]
    pub ollama_model: String,

    /// Base URL of the OpenAI-compatible (vLLM) API
    #[arg(long, env = "VLLM_URL", default_value = DEFAULT_VLLM_URL)]
    pub vllm_url: String,

    /// Model used when a vLLM request does not name one
    #[arg(long, env = "VLLM_MODEL", default_value = DEFAULT_VLLM_MODEL)]
    pub vllm_model: String,

    /// Upper bound on each backend call, in milliseconds
    #[arg(long, env = "LLM_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Sampling temperature for OpenAI-compatible requests
    #[arg(long, env = "LLM_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,
}

impl BackendArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn ollama(&self) -> BackendConfig {
        BackendConfig::new(BackendKind::Ollama, &self.ollama_url, &self.ollama_model)
            .with_timeout(self.timeout())
    }

    pub fn vllm(&self) -> BackendConfig {
        BackendConfig::new(BackendKind::Vllm, &self.vllm_url, &self.vllm_model)
            .with_timeout(self.timeout())
    }

    pub fn for_kind(&self, kind: BackendKind) -> BackendConfig {
        match kind {
            BackendKind::Ollama => self.ollama(),
            BackendKind::Vllm => self.vllm(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding the built web UI; unknown paths fall back to its index.html
    #[arg(long, env = "STATIC_DIR", default_value = "build")]
    pub static_dir: String,

    /// `max_tokens` used when a relayed vLLM request omits it
    #[arg(long, env = "RELAY_MAX_TOKENS", default_value_t = DEFAULT_RELAY_MAX_TOKENS)]
    pub relay_max_tokens: u32,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl ServeArgs {
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            ollama: self.backend.ollama(),
            vllm: self.backend.vllm(),
            defaults: SamplingConfig {
                temperature: self.backend.temperature,
                max_tokens: self.relay_max_tokens,
            },
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Backend dialect to talk to (ollama, vllm)
    #[arg(long, env = "CHAT_BACKEND", default_value = "ollama")]
    pub backend_kind: BackendKind,

    /// Overrides the backend URL, e.g. http://localhost:3000/api/llm/ollama to go through a relay
    #[arg(long, env = "CHAT_BASE_URL")]
    pub base_url: Option<String>,

    /// Text file with a custom persona prompt. Uses the built-in persona if unset.
    #[arg(long, env = "PERSONA_PATH")]
    pub persona_path: Option<String>,

    /// `max_tokens` for OpenAI-compatible replies
    #[arg(long, env = "LLM_MAX_TOKENS", default_value_t = DEFAULT_CHAT_MAX_TOKENS)]
    pub max_tokens: u32,

    #[command(flatten)]
    pub backend: BackendArgs,
}

impl ChatArgs {
    pub fn backend_config(&self) -> BackendConfig {
        let mut config = self.backend.for_kind(self.backend_kind);
        if let Some(url) = self.base_url.as_ref().filter(|u| !u.trim().is_empty()) {
            config.base_url = url.clone();
        }
        config
    }

    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            temperature: self.backend.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ModelsArgs {
    /// Overrides the vLLM URL, e.g. http://localhost:3000/api/llm/vllm to go through a relay
    #[arg(long, env = "MODELS_BASE_URL")]
    pub base_url: Option<String>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

impl ModelsArgs {
    pub fn backend_config(&self) -> BackendConfig {
        let mut config = self.backend.vllm();
        if let Some(url) = self.base_url.as_ref().filter(|u| !u.trim().is_empty()) {
            config.base_url = url.clone();
        }
        config
    }
}
