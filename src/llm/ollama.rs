use async_trait::async_trait;
use log::error;
use reqwest::Client as HttpClient;

use super::{ format_messages, post_json, ChatBackend, LlmError };
use crate::config::{ BackendConfig, Persona };
use crate::models::chat::Message;
use crate::models::wire::{ OllamaChatRequest, OllamaChatResponse };

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    config: BackendConfig,
    persona: Persona,
}

impl OllamaClient {
    pub fn new(config: BackendConfig, persona: Persona) -> Self {
        Self {
            http: HttpClient::new(),
            config,
            persona,
        }
    }

    pub async fn chat(&self, conversation: &[Message]) -> Result<String, LlmError> {
        let messages = format_messages(&self.persona, conversation);
        let req = OllamaChatRequest {
            model: &self.config.model,
            messages: &messages,
            stream: false,
        };

        let resp: OllamaChatResponse = post_json(&self.http, &self.config, "chat", &req).await?;
        resp.message
            .and_then(|m| m.content)
            .ok_or_else(|| LlmError::malformed(&self.config, "missing message.content"))
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn generate_reply(&self, conversation: &[Message]) -> Result<String, LlmError> {
        self.chat(conversation).await.map_err(|e| {
            error!("Error calling Ollama API: {}", e);
            e
        })
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }
}
