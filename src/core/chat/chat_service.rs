use super::models::{AiMessage, ChatRequestConfig, ChatResponse};
use crate::core::settings::EffectiveChatSettings;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No chat provider is configured")]
    NotConfigured,

    #[error("Chat API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("The model returned an empty response")]
    EmptyResponse,
}

impl ChatError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ChatError::NotConfigured => "AI chat isn't set up on this bot.",
            ChatError::Api { status: 429, .. } => {
                "I'm being rate limited right now, try again in a bit."
            }
            ChatError::Api { .. } | ChatError::EmptyResponse => {
                "Sorry, I encountered an error processing your request."
            }
            ChatError::Transport(_) => "I couldn't reach the AI service, try again later.",
        }
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends a chat completion request and returns the raw assistant content.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &ChatRequestConfig,
    ) -> Result<String, ChatError>;
}

pub struct ChatService<P: ChatProvider> {
    provider: P,
}

impl<P: ChatProvider> ChatService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn request_config(settings: &EffectiveChatSettings) -> ChatRequestConfig {
        ChatRequestConfig {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    /// Answers an already-assembled history (see `build_history`).
    pub async fn reply(
        &self,
        messages: &[AiMessage],
        settings: &EffectiveChatSettings,
    ) -> Result<ChatResponse, ChatError> {
        let raw = self
            .provider
            .chat_complete(messages, &Self::request_config(settings))
            .await?;

        let (answer, reasoning) = parse_response(&raw);
        if answer.is_empty() {
            return Err(ChatError::EmptyResponse);
        }

        Ok(ChatResponse { answer, reasoning })
    }

    /// One-shot question with its own instructions, used by utilities such as
    /// emoji reactions that don't want channel history.
    pub async fn ask(
        &self,
        instructions: &str,
        content: &str,
        settings: &EffectiveChatSettings,
    ) -> Result<String, ChatError> {
        let messages = [AiMessage::system(instructions), AiMessage::user(content)];
        Ok(self.reply(&messages, settings).await?.answer)
    }
}

/// Splits `<think>…</think>` reasoning out of the model output.
fn parse_response(content: &str) -> (String, Option<String>) {
    let (Some(start), Some(end)) = (content.find("<think>"), content.find("</think>")) else {
        return (content.trim().to_string(), None);
    };
    if end < start {
        return (content.trim().to_string(), None);
    }

    let reasoning = content[start + 7..end].trim().to_string();
    let answer = format!("{}{}", &content[..start], &content[end + 8..])
        .trim()
        .to_string();

    let reasoning = if reasoning.is_empty() {
        None
    } else {
        Some(reasoning)
    };
    (answer, reasoning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedProvider {
        reply: String,
        seen: Mutex<Vec<(Vec<AiMessage>, String)>>,
    }

    impl ScriptedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn chat_complete(
            &self,
            messages: &[AiMessage],
            config: &ChatRequestConfig,
        ) -> Result<String, ChatError> {
            self.seen
                .lock()
                .unwrap()
                .push((messages.to_vec(), config.model.clone()));
            Ok(self.reply.clone())
        }
    }

    fn settings() -> EffectiveChatSettings {
        EffectiveChatSettings {
            model: "test-model".to_string(),
            system_prompt: "sys".to_string(),
            temperature: 0.5,
            max_tokens: Some(100),
            history_limit: 10,
            reply_on_mention: true,
        }
    }

    #[test]
    fn test_parse_plain() {
        let (answer, reasoning) = parse_response("  hello  ");
        assert_eq!(answer, "hello");
        assert!(reasoning.is_none());
    }

    #[test]
    fn test_parse_think_block() {
        let (answer, reasoning) = parse_response("<think>hmm, ok</think>\nThe answer is 4.");
        assert_eq!(answer, "The answer is 4.");
        assert_eq!(reasoning.as_deref(), Some("hmm, ok"));
    }

    #[tokio::test]
    async fn test_reply_passes_model() {
        let service = ChatService::new(ScriptedProvider::new("hi there"));
        let response = service
            .reply(&[AiMessage::user("a: hello")], &settings())
            .await
            .unwrap();
        assert_eq!(response.answer, "hi there");

        let seen = service.provider.seen.lock().unwrap();
        assert_eq!(seen[0].1, "test-model");
    }

    #[tokio::test]
    async fn test_empty_answer_is_error() {
        let service = ChatService::new(ScriptedProvider::new("<think>only thoughts</think>"));
        let err = service.ask("pick", "text", &settings()).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_ask_sends_system_then_user() {
        let service = ChatService::new(ScriptedProvider::new("👍"));
        service.ask("choose", "nice work", &settings()).await.unwrap();

        let seen = service.provider.seen.lock().unwrap();
        let messages = &seen[0].0;
        assert_eq!(messages[0], AiMessage::system("choose"));
        assert_eq!(messages[1], AiMessage::user("nice work"));
    }
}
