use async_trait::async_trait;
use log::error;
use reqwest::Client as HttpClient;

use super::{ format_messages, get_json, post_json, ChatBackend, LlmError };
use crate::config::{ BackendConfig, Persona, SamplingConfig };
use crate::models::chat::Message;
use crate::models::wire::{ ChatCompletionRequest, ChatCompletionResponse, ModelInfo, ModelList };

/// Client for OpenAI-compatible servers such as vLLM.
#[derive(Debug)]
pub struct OpenAiCompatClient {
    http: HttpClient,
    config: BackendConfig,
    persona: Persona,
    sampling: SamplingConfig,
}

impl OpenAiCompatClient {
    pub fn new(config: BackendConfig, persona: Persona, sampling: SamplingConfig) -> Self {
        Self {
            http: HttpClient::new(),
            config,
            persona,
            sampling,
        }
    }

    pub async fn chat_completion(&self, conversation: &[Message]) -> Result<String, LlmError> {
        let messages = format_messages(&self.persona, conversation);
        let req = ChatCompletionRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.sampling.temperature,
            max_tokens: self.sampling.max_tokens,
        };

        let resp: ChatCompletionResponse = post_json(
            &self.http,
            &self.config,
            "chat/completions",
            &req
        ).await?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|m| m.content)
            .ok_or_else(|| LlmError::malformed(&self.config, "missing choices[0].message.content"))
    }

    /// `GET {base}/models`, returning its `data` array.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let list: ModelList = get_json(&self.http, &self.config, "models").await?;
        Ok(list.data)
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatClient {
    async fn generate_reply(&self, conversation: &[Message]) -> Result<String, LlmError> {
        self.chat_completion(conversation).await.map_err(|e| {
            error!("Error calling vLLM API: {}", e);
            e
        })
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }
}
