// Environment configuration.
//
// Only DISCORD_TOKEN is required. Every optional integration is `None` when its
// key is missing, and the matching commands answer "not configured" instead of
// the bot refusing to start.

use anyhow::{Context as _, Result};
use std::path::PathBuf;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a friendly Discord bot. Keep answers short and conversational.";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub data_dir: PathBuf,
    pub sounds_dir: PathBuf,
    pub openai: Option<OpenAiConfig>,
    pub chat_model: String,
    pub system_prompt: String,
    pub a1111_endpoint: Option<String>,
    pub a1111_auth: Option<(String, String)>,
    pub horde_api_key: Option<String>,
    pub bittensor_endpoint: Option<String>,
    pub bittensor_api_key: Option<String>,
    pub lifx_token: Option<String>,
    /// Register commands in this guild only (instant updates while developing).
    pub dev_guild_id: Option<u64>,
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let discord_token = optional("DISCORD_TOKEN").context(
            "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
        )?;

        let openai = optional("OPENAI_API_KEY").map(|api_key| OpenAiConfig {
            api_key,
            base_url: optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        });

        let dev_guild_id = match optional("DEV_GUILD_ID") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("DEV_GUILD_ID is not a guild id: {}", raw))?,
            ),
            None => None,
        };

        let a1111_auth = optional("A1111_AUTH").and_then(|raw| {
            raw.split_once(':')
                .map(|(user, pass)| (user.to_string(), pass.to_string()))
        });

        Ok(Self {
            discord_token,
            data_dir: optional("DATA_DIR").unwrap_or_else(|| "data".to_string()).into(),
            sounds_dir: optional("SOUNDS_DIR")
                .unwrap_or_else(|| "sounds".to_string())
                .into(),
            openai,
            chat_model: optional("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            system_prompt: load_system_prompt(),
            a1111_endpoint: optional("A1111_ENDPOINT"),
            a1111_auth,
            horde_api_key: optional("HORDE_API_KEY"),
            bittensor_endpoint: optional("BITTENSOR_ENDPOINT"),
            bittensor_api_key: optional("BITTENSOR_API_KEY"),
            lifx_token: optional("LIFX_TOKEN"),
            dev_guild_id,
        })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}

/// SYSTEM_PROMPT_FILE wins over SYSTEM_PROMPT; an unreadable file falls back to
/// the default with a warning.
fn load_system_prompt() -> String {
    if let Some(path) = optional("SYSTEM_PROMPT_FILE") {
        return std::fs::read_to_string(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to read system prompt file at {}: {}", path, e);
            DEFAULT_SYSTEM_PROMPT.to_string()
        });
    }
    optional("SYSTEM_PROMPT").unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
}
