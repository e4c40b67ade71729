pub mod settings_models;
pub mod settings_service;

pub use settings_models::{
    ChatDefaults, ChatSettings, EffectiveChatSettings, EffectiveImageSettings,
    EffectiveReplySettings, GuildSettings, ImageSettings, ReplySettings, SettingsDocument,
};
pub use settings_service::{SettingsError, SettingsService, SettingsStore};
