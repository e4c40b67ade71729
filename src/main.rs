// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (HTTP clients, JSON store)
// - `discord/` = Discord-specific adapters (commands, events, buttons)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::audio::{SoundLibrary, TtsService};
use crate::core::chat::ChatService;
use crate::core::image::{ImageBackend, ImageService};
use crate::core::lights::LightService;
use crate::core::settings::{ChatDefaults, SettingsService};
use crate::discord::{Data, Error};
use crate::infra::audio::GoogleTts;
use crate::infra::chat::OpenAiClient;
use crate::infra::image::{A1111Client, BittensorClient, HordeClient};
use crate::infra::lights::LifxClient;
use crate::infra::settings::JsonSettingsStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// One provider per configured backend. AI Horde works anonymously, so it is
/// always available.
fn build_image_service(config: &BotConfig) -> anyhow::Result<ImageService> {
    let mut service = ImageService::new().with_provider(
        ImageBackend::Horde,
        Box::new(HordeClient::new(config.horde_api_key.clone())?),
    );

    if let Some(endpoint) = &config.a1111_endpoint {
        service = service.with_provider(
            ImageBackend::A1111,
            Box::new(A1111Client::new(endpoint, config.a1111_auth.clone())?),
        );
    }

    match (&config.bittensor_endpoint, &config.bittensor_api_key) {
        (Some(endpoint), Some(key)) => {
            service = service.with_provider(
                ImageBackend::Bittensor,
                Box::new(BittensorClient::new(endpoint, key.clone())?),
            );
        }
        (Some(_), None) => {
            tracing::warn!("BITTENSOR_ENDPOINT is set without BITTENSOR_API_KEY")
        }
        _ => {}
    }

    tracing::info!(backends = ?service.backends(), "Image backends ready");
    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;

    // Keep runtime state in a dedicated folder so the repo root stays tidy.
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let settings_store =
        JsonSettingsStore::new(config.settings_path()).context("Failed to load settings")?;
    let settings = Arc::new(SettingsService::new(
        settings_store,
        ChatDefaults {
            model: config.chat_model.clone(),
            system_prompt: config.system_prompt.clone(),
        },
    ));

    let chat = match &config.openai {
        Some(openai) => {
            let client = OpenAiClient::new(openai.api_key.clone(), openai.base_url.clone())?;
            Some(Arc::new(ChatService::new(client)))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, AI chat is disabled");
            None
        }
    };

    let lights = match &config.lifx_token {
        Some(token) => Some(Arc::new(LightService::new(LifxClient::new(token)?))),
        None => {
            tracing::info!("LIFX_TOKEN not set, light control is disabled");
            None
        }
    };

    let images = Arc::new(build_image_service(&config)?);
    let tts = Arc::new(TtsService::new(GoogleTts::new()?));
    let sounds = Arc::new(SoundLibrary::new(config.sounds_dir.clone()));

    let data = Data {
        settings,
        chat,
        images,
        lights,
        tts,
        sounds,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES
        | serenity::GatewayIntents::DIRECT_MESSAGES;

    let dev_guild_id = config.dev_guild_id;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(discord::events::event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    if let poise::FrameworkError::Command { error, ctx, .. } = &error {
                        tracing::error!(
                            command = %ctx.command().qualified_name,
                            "Command failed: {}",
                            error
                        );
                    }
                    if let Err(e) = poise::builtins::on_error(error).await {
                        tracing::error!("Error while handling error: {}", e);
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                match dev_guild_id {
                    // Guild registration is instant, global can take up to an hour
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                        tracing::info!(guild_id, "Commands registered in dev guild");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, commands).await?;
                        tracing::info!("Commands registered globally");
                    }
                }
                Ok::<Data, Error>(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .register_songbird()
        .await
        .context("Error creating client")?;

    tracing::info!("Bot is starting up");
    client.start().await.context("Error running bot")?;
    Ok(())
}
