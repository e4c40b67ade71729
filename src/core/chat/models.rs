use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Per-request knobs sent to the completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatRequestConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Final response after processing by ChatService.
/// `reasoning` holds any `<think>` block the model emitted.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub answer: String,
    pub reasoning: Option<String>,
}

/// A Discord message reduced to what history assembly needs.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub message_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Written by this bot (becomes an `assistant` turn).
    pub from_bot_self: bool,
}

impl HistoryEntry {
    pub fn to_ai_message(&self) -> AiMessage {
        if self.from_bot_self {
            AiMessage::assistant(self.content.clone())
        } else {
            AiMessage::user(format!("{}: {}", self.author_name, self.content))
        }
    }
}
