pub mod chat_service;
pub mod formatting;
pub mod history;
pub mod models;

pub use chat_service::{ChatError, ChatProvider, ChatService};
pub use history::build_history;
pub use models::{AiMessage, ChatRequestConfig, HistoryEntry};
