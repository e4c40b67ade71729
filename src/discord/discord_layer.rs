// Discord layer - commands, event handlers and button handlers.
//
// Everything here translates between serenity types and the core services.
// No business rules live in this layer.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "events/event_router.rs"]
pub mod events;

#[path = "image/image_layer.rs"]
pub mod image;

#[path = "voice/voice_session.rs"]
pub mod voice;

use crate::core::audio::{SoundLibrary, TtsService};
use crate::core::chat::{ChatError, ChatService};
use crate::core::image::ImageService;
use crate::core::lights::LightService;
use crate::core::settings::SettingsService;
use crate::infra::audio::GoogleTts;
use crate::infra::chat::OpenAiClient;
use crate::infra::lights::LifxClient;
use crate::infra::settings::JsonSettingsStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event.
pub struct Data {
    pub settings: Arc<SettingsService<JsonSettingsStore>>,
    /// `None` when no OpenAI key is configured.
    pub chat: Option<Arc<ChatService<OpenAiClient>>>,
    pub images: Arc<ImageService>,
    /// `None` when no LIFX token is configured.
    pub lights: Option<Arc<LightService<LifxClient>>>,
    pub tts: Arc<TtsService<GoogleTts>>,
    pub sounds: Arc<SoundLibrary>,
}

impl Data {
    pub fn chat(&self) -> Result<&ChatService<OpenAiClient>, ChatError> {
        self.chat.as_deref().ok_or(ChatError::NotConfigured)
    }
}
