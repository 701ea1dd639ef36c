//! JSON bodies exchanged with LLM backends and with the relay proxy.
//!
//! Request types are generic over the message type so the adapters can send
//! typed [`WireMessage`](super::chat::WireMessage)s while the proxy forwards
//! whatever the browser posted without reshaping it.

use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;

#[derive(Serialize, Debug)]
pub struct OllamaChatRequest<'a, M: Serialize> {
    pub model: &'a str,
    pub messages: &'a [M],
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct OllamaChatResponse {
    pub message: Option<ReplyMessage>,
}

#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest<'a, M: Serialize> {
    pub model: &'a str,
    pub messages: &'a [M],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
pub struct CompletionChoice {
    pub message: Option<ReplyMessage>,
}

#[derive(Deserialize, Debug)]
pub struct ReplyMessage {
    pub content: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ModelList {
    pub data: Vec<ModelInfo>,
}

/// A field taken from the client's body as-is, or the server default when the
/// client left it out or sent `null`. No type checks on the client value.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum Supplied<'a, T: Serialize> {
    Given(&'a JsonValue),
    Default(T),
}

impl<'a, T: Serialize> Supplied<'a, T> {
    pub fn from_field(body: &'a JsonValue, key: &str, default: T) -> Self {
        match body.get(key) {
            Some(value) if !value.is_null() => Supplied::Given(value),
            _ => Supplied::Default(default),
        }
    }
}

/// Upstream body for the Ollama relay route. The model is fixed server-side and
/// `messages` is whatever the client posted.
#[derive(Serialize, Debug)]
pub struct OllamaRelayBody<'a> {
    pub model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<&'a JsonValue>,
    pub stream: bool,
}

impl<'a> OllamaRelayBody<'a> {
    pub fn from_client(body: &'a JsonValue, model: &'a str) -> Self {
        Self {
            model,
            messages: body.get("messages"),
            stream: false,
        }
    }
}

/// Upstream body for the OpenAI-compatible relay route.
#[derive(Serialize, Debug)]
pub struct CompletionRelayBody<'a> {
    pub model: Supplied<'a, &'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<&'a JsonValue>,
    pub temperature: Supplied<'a, f32>,
    pub max_tokens: Supplied<'a, u32>,
}

impl<'a> CompletionRelayBody<'a> {
    pub fn from_client(
        body: &'a JsonValue,
        model: &'a str,
        temperature: f32,
        max_tokens: u32
    ) -> Self {
        Self {
            model: Supplied::from_field(body, "model", model),
            messages: body.get("messages"),
            temperature: Supplied::from_field(body, "temperature", temperature),
            max_tokens: Supplied::from_field(body, "max_tokens", max_tokens),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}
