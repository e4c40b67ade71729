// Settings domain models.
//
// Every tunable is stored as an `Option` so that a guild can override only the
// fields it cares about. Resolution happens in two layers: the guild's own value,
// then the global value, then the built-in default baked into the `Effective*`
// structs below.

use crate::core::image::ImageBackend;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Emoji offered to the model when no guild list is configured.
pub const DEFAULT_EMOTE_CHOICES: &[&str] = &["😂", "👍", "👀", "🔥", "💀", "🤔", "😭", "❤️"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub backend: Option<ImageBackend>,
    pub negative_prompt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f32>,
    pub sampler: Option<String>,
    pub model: Option<String>,
    pub nsfw: Option<bool>,
    pub denoising_strength: Option<f32>,
    pub upscaler: Option<String>,
    pub upscale_factor: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub history_limit: Option<u8>,
    pub reply_on_mention: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplySettings {
    pub one_letter_enabled: Option<bool>,
    pub one_letter_length: Option<usize>,
    pub where_reply_enabled: Option<bool>,
    pub sarcastic_chance: Option<f64>,
    pub emote_chance: Option<f64>,
    pub emote_choices: Option<Vec<String>>,
}

/// One layer of settings. The global layer and each guild layer share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    pub image: ImageSettings,
    pub chat: ChatSettings,
    pub replies: ReplySettings,
    /// Users whose messages never enter AI context in this guild.
    pub opted_out: BTreeSet<u64>,
    /// Users who always get the sarcastic treatment.
    pub sarcastic_targets: BTreeSet<u64>,
}

/// Everything persisted by a settings store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDocument {
    pub global: GuildSettings,
    pub guilds: HashMap<u64, GuildSettings>,
}

// ============================================================================
// RESOLVED VIEWS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveImageSettings {
    pub backend: ImageBackend,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    pub sampler: String,
    pub model: Option<String>,
    pub nsfw: bool,
    pub denoising_strength: f32,
    pub upscaler: String,
    pub upscale_factor: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveChatSettings {
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub history_limit: u8,
    pub reply_on_mention: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveReplySettings {
    pub one_letter_enabled: bool,
    pub one_letter_length: usize,
    pub where_reply_enabled: bool,
    pub sarcastic_chance: f64,
    pub sarcastic_targets: BTreeSet<u64>,
    pub emote_chance: f64,
    pub emote_choices: Vec<String>,
}

/// Values used when neither layer sets a chat field.
#[derive(Debug, Clone)]
pub struct ChatDefaults {
    pub model: String,
    pub system_prompt: String,
}

fn layer<T: Clone>(guild: &Option<T>, global: &Option<T>) -> Option<T> {
    guild.clone().or_else(|| global.clone())
}

impl EffectiveImageSettings {
    pub fn resolve(guild: &ImageSettings, global: &ImageSettings) -> Self {
        Self {
            backend: layer(&guild.backend, &global.backend).unwrap_or_default(),
            negative_prompt: layer(&guild.negative_prompt, &global.negative_prompt)
                .unwrap_or_default(),
            width: layer(&guild.width, &global.width).unwrap_or(512),
            height: layer(&guild.height, &global.height).unwrap_or(512),
            steps: layer(&guild.steps, &global.steps).unwrap_or(20),
            cfg_scale: layer(&guild.cfg_scale, &global.cfg_scale).unwrap_or(7.0),
            sampler: layer(&guild.sampler, &global.sampler)
                .unwrap_or_else(|| "Euler a".to_string()),
            model: layer(&guild.model, &global.model),
            nsfw: layer(&guild.nsfw, &global.nsfw).unwrap_or(false),
            denoising_strength: layer(&guild.denoising_strength, &global.denoising_strength)
                .unwrap_or(0.6),
            upscaler: layer(&guild.upscaler, &global.upscaler)
                .unwrap_or_else(|| "R-ESRGAN 4x+".to_string()),
            upscale_factor: layer(&guild.upscale_factor, &global.upscale_factor).unwrap_or(2.0),
        }
    }
}

impl EffectiveChatSettings {
    pub fn resolve(guild: &ChatSettings, global: &ChatSettings, defaults: &ChatDefaults) -> Self {
        Self {
            model: layer(&guild.model, &global.model).unwrap_or_else(|| defaults.model.clone()),
            system_prompt: layer(&guild.system_prompt, &global.system_prompt)
                .unwrap_or_else(|| defaults.system_prompt.clone()),
            temperature: layer(&guild.temperature, &global.temperature).unwrap_or(0.7),
            max_tokens: layer(&guild.max_tokens, &global.max_tokens),
            history_limit: layer(&guild.history_limit, &global.history_limit).unwrap_or(20),
            reply_on_mention: layer(&guild.reply_on_mention, &global.reply_on_mention)
                .unwrap_or(true),
        }
    }
}

impl EffectiveReplySettings {
    pub fn resolve(guild: &GuildSettings, global: &GuildSettings) -> Self {
        let (g, d) = (&guild.replies, &global.replies);
        Self {
            one_letter_enabled: layer(&g.one_letter_enabled, &d.one_letter_enabled)
                .unwrap_or(false),
            one_letter_length: layer(&g.one_letter_length, &d.one_letter_length)
                .unwrap_or(1)
                .max(1),
            where_reply_enabled: layer(&g.where_reply_enabled, &d.where_reply_enabled)
                .unwrap_or(false),
            sarcastic_chance: layer(&g.sarcastic_chance, &d.sarcastic_chance)
                .unwrap_or(0.0)
                .clamp(0.0, 1.0),
            sarcastic_targets: guild.sarcastic_targets.clone(),
            emote_chance: layer(&g.emote_chance, &d.emote_chance)
                .unwrap_or(0.0)
                .clamp(0.0, 1.0),
            emote_choices: layer(&g.emote_choices, &d.emote_choices)
                .filter(|choices| !choices.is_empty())
                .unwrap_or_else(|| DEFAULT_EMOTE_CHOICES.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_override_wins() {
        let global = ImageSettings {
            width: Some(768),
            steps: Some(30),
            ..Default::default()
        };
        let guild = ImageSettings {
            width: Some(1024),
            ..Default::default()
        };

        let effective = EffectiveImageSettings::resolve(&guild, &global);
        assert_eq!(effective.width, 1024);
        assert_eq!(effective.steps, 30);
        // Neither layer set height
        assert_eq!(effective.height, 512);
    }

    #[test]
    fn test_chat_defaults_fill_gaps() {
        let defaults = ChatDefaults {
            model: "gpt-4o-mini".to_string(),
            system_prompt: "Be nice.".to_string(),
        };
        let global = ChatSettings {
            temperature: Some(0.2),
            ..Default::default()
        };
        let effective =
            EffectiveChatSettings::resolve(&ChatSettings::default(), &global, &defaults);
        assert_eq!(effective.model, "gpt-4o-mini");
        assert_eq!(effective.system_prompt, "Be nice.");
        assert_eq!(effective.temperature, 0.2);
        assert!(effective.reply_on_mention);
    }

    #[test]
    fn test_reply_settings_clamp_and_fallback() {
        let mut guild = GuildSettings::default();
        guild.replies.sarcastic_chance = Some(3.0);
        guild.replies.emote_choices = Some(vec![]);
        guild.replies.one_letter_length = Some(0);

        let effective = EffectiveReplySettings::resolve(&guild, &GuildSettings::default());
        assert_eq!(effective.sarcastic_chance, 1.0);
        assert_eq!(effective.one_letter_length, 1);
        assert_eq!(effective.emote_choices.len(), DEFAULT_EMOTE_CHOICES.len());
    }

    #[test]
    fn test_document_tolerates_missing_fields() {
        let doc: SettingsDocument =
            serde_json::from_str(r#"{"guilds": {"42": {"opted_out": [7]}}}"#).unwrap();
        assert!(doc.guilds[&42].opted_out.contains(&7));
        assert_eq!(doc.global, GuildSettings::default());
    }
}
