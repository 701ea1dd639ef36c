//! Relay proxy end to end: client -> relay -> fake backend.

mod common;

use serde_json::{ json, Value };
use std::time::Duration;

use persona_chat::config::{ BackendConfig, BackendKind, Persona, SamplingConfig };
use persona_chat::llm::ollama::OllamaClient;
use persona_chat::llm::openai::OpenAiCompatClient;
use persona_chat::llm::ChatBackend;
use persona_chat::models::chat::Message;
use persona_chat::server::relay::RelayConfig;

fn relay_config(ollama_base: String, vllm_base: String) -> RelayConfig {
    RelayConfig {
        ollama: BackendConfig::new(BackendKind::Ollama, ollama_base, "gemma3"),
        vllm: BackendConfig::new(BackendKind::Vllm, vllm_base, "served-model"),
        defaults: SamplingConfig { temperature: 0.5, max_tokens: 1000 },
    }
}

async fn relay_to(base: &str, prefix: &str) -> String {
    common::spawn_relay(
        relay_config(format!("{}/{}", base, prefix), format!("{}/{}", base, prefix))
    ).await
}

#[tokio::test]
async fn models_listing_is_returned_byte_for_byte() {
    let (base, _) = common::spawn_upstream().await;
    let relay = common::spawn_relay(relay_config(format!("{}/api", base), format!("{}/v1", base))).await;

    let response = reqwest::get(format!("{}/api/llm/vllm/models", relay)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), common::MODELS_BODY);
}

#[tokio::test]
async fn ollama_route_fixes_model_and_disables_streaming() {
    let (base, upstream) = common::spawn_upstream().await;
    let relay = common::spawn_relay(relay_config(format!("{}/api", base), format!("{}/v1", base))).await;

    let messages = json!([{ "role": "system", "content": "s" }, { "role": "user", "content": "hi" }]);
    let response = reqwest::Client
        ::new()
        .post(format!("{}/api/llm/ollama/chat", relay))
        .json(&json!({ "model": "ignored", "messages": messages }))
        .send().await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"]["content"], "哈哈哈");
    assert_eq!(body["done"], true);

    assert_eq!(upstream.last_request(), json!({ "model": "gemma3", "messages": messages, "stream": false }));
}

#[tokio::test]
async fn completions_route_fills_in_omitted_fields() {
    let (base, upstream) = common::spawn_upstream().await;
    let relay = common::spawn_relay(relay_config(format!("{}/api", base), format!("{}/v1", base))).await;
    let http = reqwest::Client::new();
    let url = format!("{}/api/llm/vllm/chat/completions", relay);

    let response = http
        .post(&url)
        .json(&json!({ "messages": [{ "role": "user", "content": "hi" }] }))
        .send().await
        .unwrap();
    assert_eq!(response.status(), 200);

    let sent = upstream.last_request();
    assert_eq!(sent["model"], "served-model");
    assert_eq!(sent["temperature"], 0.5);
    assert_eq!(sent["max_tokens"], 1000);

    http.post(&url)
        .json(
            &json!({
            "model": "custom",
            "messages": [{ "role": "user", "content": "hi" }],
            "temperature": 0.25,
            "max_tokens": 100
        })
        )
        .send().await
        .unwrap();

    let sent = upstream.last_request();
    assert_eq!(sent["model"], "custom");
    assert_eq!(sent["temperature"], 0.25);
    assert_eq!(sent["max_tokens"], 100);
}

#[tokio::test]
async fn upstream_failures_become_500_with_error_field() {
    let (base, _) = common::spawn_upstream().await;
    let http = reqwest::Client::new();

    let busy = relay_to(&base, "busy").await;
    let response = http
        .post(format!("{}/api/llm/vllm/chat/completions", busy))
        .json(&json!({ "messages": [] }))
        .send().await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("503"));

    let port = common::closed_port();
    let down = relay_to(&format!("http://127.0.0.1:{}", port), "api").await;
    let response = http
        .post(format!("{}/api/llm/ollama/chat", down))
        .json(&json!({ "messages": [] }))
        .send().await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("无法连接到Ollama服务"));
}

#[tokio::test]
async fn client_fields_are_forwarded_without_validation() {
    let (base, upstream) = common::spawn_upstream().await;
    let relay = common::spawn_relay(relay_config(format!("{}/api", base), format!("{}/v1", base))).await;
    let http = reqwest::Client::new();
    let url = format!("{}/api/llm/vllm/chat/completions", relay);

    // An empty object still reaches the backend, with only the defaults filled in.
    let response = http.post(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        upstream.last_request(),
        json!({ "model": "served-model", "temperature": 0.5, "max_tokens": 1000 })
    );

    // Odd types are the backend's problem, not the relay's.
    let response = http
        .post(&url)
        .json(&json!({ "messages": "hi", "temperature": "0.5", "max_tokens": null }))
        .send().await
        .unwrap();
    assert_eq!(response.status(), 200);
    let sent = upstream.last_request();
    assert_eq!(sent["messages"], "hi");
    assert_eq!(sent["temperature"], "0.5");
    assert_eq!(sent["max_tokens"], 1000);

    let response = http
        .post(format!("{}/api/llm/ollama/chat", relay))
        .json(&json!({ "messages": { "not": "a list" } }))
        .send().await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(upstream.last_request()["messages"], json!({ "not": "a list" }));
}

#[tokio::test]
async fn unparseable_body_is_answered_with_json_500() {
    let (base, upstream) = common::spawn_upstream().await;
    let relay = common::spawn_relay(relay_config(format!("{}/api", base), format!("{}/v1", base))).await;

    let response = reqwest::Client
        ::new()
        .post(format!("{}/api/llm/ollama/chat", relay))
        .header("content-type", "application/json")
        .body("{ not json")
        .send().await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn slow_upstream_is_reported_as_timeout() {
    let (base, upstream) = common::spawn_upstream().await;
    let mut config = relay_config(format!("{}/slow", base), format!("{}/slow", base));
    config.ollama = config.ollama.with_timeout(Duration::from_millis(200));
    config.vllm = config.vllm.with_timeout(Duration::from_millis(200));
    let relay = common::spawn_relay(config).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/llm/ollama/chat", relay))
        .json(&json!({ "messages": [{ "role": "user", "content": "hi" }] }))
        .send().await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Ollama服务响应超时（1秒）");

    let response = http
        .post(format!("{}/api/llm/vllm/chat/completions", relay))
        .json(&json!({ "messages": [] }))
        .send().await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "vLLM服务响应超时（1秒）");

    // Single attempt each.
    assert_eq!(upstream.request_count(), 2);
}

#[tokio::test]
async fn non_json_upstream_reply_is_a_500() {
    let (base, _) = common::spawn_upstream().await;
    let relay = relay_to(&base, "text").await;
    let http = reqwest::Client::new();

    for (route, backend) in [
        ("ollama/chat", "Ollama"),
        ("vllm/chat/completions", "vLLM"),
    ] {
        let response = http
            .post(format!("{}/api/llm/{}", relay, route))
            .json(&json!({ "messages": [] }))
            .send().await
            .unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body: Value = response.json().await.unwrap();
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with(&format!("{}返回了无法识别的响应", backend)), "{}", error);
    }
}

#[tokio::test]
async fn adapters_work_through_the_relay() {
    let (base, upstream) = common::spawn_upstream().await;
    let relay = common::spawn_relay(relay_config(format!("{}/api", base), format!("{}/v1", base))).await;
    let persona = Persona::new("tester", "be brief");

    let ollama = OllamaClient::new(
        BackendConfig::new(BackendKind::Ollama, format!("{}/api/llm/ollama", relay), "client-side"),
        persona.clone()
    );
    assert_eq!(ollama.generate_reply(&[Message::user("hi")]).await.unwrap(), "哈哈哈");
    // The relay decides the model.
    assert_eq!(upstream.last_request()["model"], "gemma3");

    let vllm = OpenAiCompatClient::new(
        BackendConfig::new(BackendKind::Vllm, format!("{}/api/llm/vllm", relay), "default"),
        persona,
        SamplingConfig::default()
    );
    assert_eq!(vllm.generate_reply(&[Message::user("hi")]).await.unwrap(), "真的吗");

    let models = vllm.list_models().await.unwrap();
    assert_eq!(models[0].id, "m1");
}
