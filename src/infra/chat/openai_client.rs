use crate::core::chat::{AiMessage, ChatError, ChatProvider, ChatRequestConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn build_payload(messages: &[AiMessage], config: &ChatRequestConfig) -> serde_json::Value {
    let mut payload = json!({
        "model": config.model,
        "messages": messages,
        "temperature": config.temperature,
    });
    if let Some(max_tokens) = config.max_tokens {
        payload["max_tokens"] = json!(max_tokens);
    }
    payload
}

fn extract_content(body: CompletionResponse) -> Result<String, ChatError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(ChatError::EmptyResponse)
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &ChatRequestConfig,
    ) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&build_payload(messages, config))
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Api { status, body });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        extract_content(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_tokens: Option<u32>) -> ChatRequestConfig {
        ChatRequestConfig {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            max_tokens,
        }
    }

    #[test]
    fn test_payload_shape() {
        let messages = vec![AiMessage::system("sys"), AiMessage::user("bob: hi")];
        let payload = build_payload(&messages, &config(None));

        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "bob: hi");
        assert!(payload.get("max_tokens").is_none());

        let payload = build_payload(&messages, &config(Some(256)));
        assert_eq!(payload["max_tokens"], 256);
    }

    #[test]
    fn test_extract_content() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hello!"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(body).unwrap(), "Hello!");
    }

    #[test]
    fn test_missing_content_is_empty_response() {
        let body: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_content(body), Err(ChatError::EmptyResponse)));

        let body: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(extract_content(body), Err(ChatError::EmptyResponse)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            OpenAiClient::new("key".to_string(), "https://api.openai.com/v1/".to_string())
                .unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }
}
