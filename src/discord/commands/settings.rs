// `/settings` - per-server configuration, with a bot-owner-only global layer.
//
// Every option is optional: only the options given are written, the rest keep
// falling through to the global value and then the built-in default.

use crate::core::chat::formatting::truncate;
use crate::core::settings::{ChatSettings, GuildSettings, ImageSettings, ReplySettings};
use crate::discord::image::imagine::BackendChoice;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Scope {
    #[name = "This server"]
    Server,
    #[name = "Global default (bot owners)"]
    Global,
}

async fn say_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(text.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Writes `f` into the chosen layer. Returns `false` (after telling the user)
/// when they may not touch that layer.
async fn apply<F>(ctx: Context<'_>, scope: Scope, f: F) -> Result<bool, Error>
where
    F: FnOnce(&mut GuildSettings) + Send,
{
    let settings = &ctx.data().settings;
    match scope {
        Scope::Server => {
            let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
            settings.update_guild(guild_id.get(), f).await?;
            tracing::info!(
                guild_id = guild_id.get(),
                user_id = ctx.author().id.get(),
                "Updated server settings"
            );
        }
        Scope::Global => {
            if !ctx.framework().options().owners.contains(&ctx.author().id) {
                say_ephemeral(ctx, "🚫 Only bot owners can change global defaults.").await?;
                return Ok(false);
            }
            settings.update_global(f).await?;
            tracing::info!(user_id = ctx.author().id.get(), "Updated global settings");
        }
    }
    Ok(true)
}

fn scope_label(scope: Scope) -> &'static str {
    match scope {
        Scope::Server => "this server",
        Scope::Global => "the global defaults",
    }
}

/// Bot configuration.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("show", "image", "chat", "replies", "sarcastic_target")
)]
pub async fn settings(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the settings in effect here.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();
    let data = ctx.data();
    let image = data.settings.image(Some(guild_id)).await?;
    let chat = data.settings.chat(Some(guild_id)).await?;
    let replies = data.settings.replies(guild_id).await?;

    let image_text = format!(
        "Backend: {}\nSize: {}x{} · {} steps · CFG {}\nSampler: {}\nModel: {}\nNSFW: {}\nNegative: {}\nUpscaler: {} ×{}",
        image.backend,
        image.width,
        image.height,
        image.steps,
        image.cfg_scale,
        image.sampler,
        image.model.as_deref().unwrap_or("backend default"),
        image.nsfw,
        if image.negative_prompt.is_empty() {
            "none"
        } else {
            image.negative_prompt.as_str()
        },
        image.upscaler,
        image.upscale_factor,
    );
    let chat_text = format!(
        "Model: {}\nTemperature: {}\nHistory: {} messages\nReply on mention: {}\nPrompt: {}",
        chat.model,
        chat.temperature,
        chat.history_limit,
        chat.reply_on_mention,
        truncate(&chat.system_prompt, 200),
    );
    let targets: Vec<String> = replies
        .sarcastic_targets
        .iter()
        .map(|id| format!("<@{}>", id))
        .collect();
    let replies_text = format!(
        "One-letter names: {} ({} chars)\nWhere-reply: {}\nSarcasm chance: {:.0}%{}\nEmoji chance: {:.0}% · {}",
        replies.one_letter_enabled,
        replies.one_letter_length,
        replies.where_reply_enabled,
        replies.sarcastic_chance * 100.0,
        if targets.is_empty() {
            String::new()
        } else {
            format!(" · always: {}", targets.join(" "))
        },
        replies.emote_chance * 100.0,
        replies.emote_choices.join(" "),
    );

    let embed = serenity::CreateEmbed::new()
        .title("⚙️ Settings")
        .color(0x5865F2)
        .field("🎨 Images", truncate(&image_text, 1024), false)
        .field("💬 Chat", truncate(&chat_text, 1024), false)
        .field("🙃 Replies", truncate(&replies_text, 1024), false);
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Image generation defaults.
#[allow(clippy::too_many_arguments)]
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn image(
    ctx: Context<'_>,
    #[description = "Where to write (default: this server)"] scope: Option<Scope>,
    #[description = "Default backend"] backend: Option<BackendChoice>,
    #[description = "Default negative prompt"] negative_prompt: Option<String>,
    #[description = "Default width"] width: Option<u32>,
    #[description = "Default height"] height: Option<u32>,
    #[description = "Default steps"] steps: Option<u32>,
    #[description = "Default CFG scale"] cfg_scale: Option<f32>,
    #[description = "Default sampler"] sampler: Option<String>,
    #[description = "Checkpoint / model name"] model: Option<String>,
    #[description = "Allow NSFW output"] nsfw: Option<bool>,
    #[description = "Variation strength (0-1)"] denoising_strength: Option<f32>,
    #[description = "Upscaler name"] upscaler: Option<String>,
    #[description = "Upscale factor (1-4)"] upscale_factor: Option<f32>,
    #[description = "Clear all image overrides first"] reset: Option<bool>,
) -> Result<(), Error> {
    let scope = scope.unwrap_or(Scope::Server);
    let applied = apply(ctx, scope, move |s| {
        if reset.unwrap_or(false) {
            s.image = ImageSettings::default();
        }
        let i = &mut s.image;
        if let Some(v) = backend {
            i.backend = Some(v.into());
        }
        if negative_prompt.is_some() {
            i.negative_prompt = negative_prompt;
        }
        if width.is_some() {
            i.width = width;
        }
        if height.is_some() {
            i.height = height;
        }
        if steps.is_some() {
            i.steps = steps;
        }
        if cfg_scale.is_some() {
            i.cfg_scale = cfg_scale;
        }
        if sampler.is_some() {
            i.sampler = sampler;
        }
        if model.is_some() {
            i.model = model;
        }
        if nsfw.is_some() {
            i.nsfw = nsfw;
        }
        if denoising_strength.is_some() {
            i.denoising_strength = denoising_strength;
        }
        if upscaler.is_some() {
            i.upscaler = upscaler;
        }
        if upscale_factor.is_some() {
            i.upscale_factor = upscale_factor;
        }
    })
    .await?;

    if applied {
        say_ephemeral(ctx, format!("✅ Image settings saved for {}.", scope_label(scope))).await?;
    }
    Ok(())
}

/// AI chat defaults.
#[allow(clippy::too_many_arguments)]
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn chat(
    ctx: Context<'_>,
    #[description = "Where to write (default: this server)"] scope: Option<Scope>,
    #[description = "Model name"] model: Option<String>,
    #[description = "System prompt / persona"] system_prompt: Option<String>,
    #[description = "Sampling temperature (0-2)"] temperature: Option<f32>,
    #[description = "Maximum answer tokens"] max_tokens: Option<u32>,
    #[description = "Earlier messages sent as context"]
    #[max = 100]
    history_limit: Option<u8>,
    #[description = "Answer when mentioned"] reply_on_mention: Option<bool>,
    #[description = "Clear all chat overrides first"] reset: Option<bool>,
) -> Result<(), Error> {
    let scope = scope.unwrap_or(Scope::Server);
    let applied = apply(ctx, scope, move |s| {
        if reset.unwrap_or(false) {
            s.chat = ChatSettings::default();
        }
        let c = &mut s.chat;
        if model.is_some() {
            c.model = model;
        }
        if system_prompt.is_some() {
            c.system_prompt = system_prompt;
        }
        if let Some(t) = temperature {
            c.temperature = Some(t.clamp(0.0, 2.0));
        }
        if max_tokens.is_some() {
            c.max_tokens = max_tokens;
        }
        if history_limit.is_some() {
            c.history_limit = history_limit;
        }
        if reply_on_mention.is_some() {
            c.reply_on_mention = reply_on_mention;
        }
    })
    .await?;

    if applied {
        say_ephemeral(ctx, format!("✅ Chat settings saved for {}.", scope_label(scope))).await?;
    }
    Ok(())
}

/// Auto-reply and moderation utilities.
#[allow(clippy::too_many_arguments)]
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn replies(
    ctx: Context<'_>,
    #[description = "Where to write (default: this server)"] scope: Option<Scope>,
    #[description = "Trim nicknames to a few characters"] one_letter: Option<bool>,
    #[description = "Nickname length kept"]
    #[min = 1]
    #[max = 32]
    one_letter_length: Option<u8>,
    #[description = "Answer \"where\" with a jump link"] where_reply: Option<bool>,
    #[description = "Chance (0-100%) of a sarcastic echo"]
    #[max = 100]
    sarcastic_percent: Option<u8>,
    #[description = "Chance (0-100%) of an AI emoji reaction"]
    #[max = 100]
    emote_percent: Option<u8>,
    #[description = "Allowed reaction emoji, space separated"] emotes: Option<String>,
    #[description = "Clear all reply overrides first"] reset: Option<bool>,
) -> Result<(), Error> {
    let scope = scope.unwrap_or(Scope::Server);
    let applied = apply(ctx, scope, move |s| {
        if reset.unwrap_or(false) {
            s.replies = ReplySettings::default();
        }
        let r = &mut s.replies;
        if one_letter.is_some() {
            r.one_letter_enabled = one_letter;
        }
        if let Some(len) = one_letter_length {
            r.one_letter_length = Some(len as usize);
        }
        if where_reply.is_some() {
            r.where_reply_enabled = where_reply;
        }
        if let Some(p) = sarcastic_percent {
            r.sarcastic_chance = Some(f64::from(p.min(100)) / 100.0);
        }
        if let Some(p) = emote_percent {
            r.emote_chance = Some(f64::from(p.min(100)) / 100.0);
        }
        if let Some(list) = emotes {
            r.emote_choices = Some(list.split_whitespace().map(str::to_string).collect());
        }
    })
    .await?;

    if applied {
        say_ephemeral(ctx, format!("✅ Reply settings saved for {}.", scope_label(scope))).await?;
    }
    Ok(())
}

/// Always answer a user with sarcasm (or stop).
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn sarcastic_target(
    ctx: Context<'_>,
    #[description = "User"] user: serenity::User,
    #[description = "Always reply to them"] enabled: bool,
) -> Result<(), Error> {
    let user_id = user.id.get();
    apply(ctx, Scope::Server, move |s| {
        if enabled {
            s.sarcastic_targets.insert(user_id);
        } else {
            s.sarcastic_targets.remove(&user_id);
        }
    })
    .await?;

    let text = if enabled {
        format!("🙃 I'll always answer {} now.", user.name)
    } else {
        format!("🙂 {} is off the list.", user.name)
    };
    say_ephemeral(ctx, text).await
}
