// Voice connection helpers shared by the audio commands.

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use songbird::Call;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Voice support was not initialised")]
    NoManager,

    #[error("You need to be in a voice channel first")]
    UserNotInVoiceChannel,

    #[error("I'm not in a voice channel here")]
    NotConnected,

    #[error("Failed to join the voice channel: {0}")]
    Join(#[from] songbird::error::JoinError),
}

async fn manager(ctx: Context<'_>) -> Result<Arc<songbird::Songbird>, VoiceError> {
    songbird::get(ctx.serenity_context())
        .await
        .ok_or(VoiceError::NoManager)
}

/// The voice channel the command author is sitting in, read from the cache.
fn author_channel(ctx: Context<'_>) -> Option<(serenity::GuildId, serenity::ChannelId)> {
    let guild = ctx.guild()?;
    let channel_id = guild
        .voice_states
        .get(&ctx.author().id)
        .and_then(|voice_state| voice_state.channel_id)?;
    Some((guild.id, channel_id))
}

/// Joins the author's channel, or reuses the existing connection.
pub async fn join_author_channel(ctx: Context<'_>) -> Result<Arc<Mutex<Call>>, VoiceError> {
    let (guild_id, channel_id) = author_channel(ctx).ok_or(VoiceError::UserNotInVoiceChannel)?;
    let manager = manager(ctx).await?;

    if let Some(call) = manager.get(guild_id) {
        let same_channel = call
            .lock()
            .await
            .current_channel()
            .is_some_and(|c| c.0.get() == channel_id.get());
        if same_channel {
            return Ok(call);
        }
    }

    let call = manager.join(guild_id, channel_id).await?;
    tracing::info!(
        guild_id = guild_id.get(),
        channel_id = channel_id.get(),
        "Joined voice channel"
    );
    Ok(call)
}

pub async fn leave(ctx: Context<'_>) -> Result<(), VoiceError> {
    let guild_id = ctx.guild_id().ok_or(VoiceError::NotConnected)?;
    let manager = manager(ctx).await?;
    if manager.get(guild_id).is_none() {
        return Err(VoiceError::NotConnected);
    }
    manager.remove(guild_id).await?;
    tracing::info!(guild_id = guild_id.get(), "Left voice channel");
    Ok(())
}

/// Joins the author's channel if needed and plays a file on it.
pub async fn play_file(ctx: Context<'_>, path: &Path) -> Result<(), Error> {
    let call = join_author_channel(ctx).await?;
    let mut handler = call.lock().await;
    let input = songbird::input::File::new(path.to_path_buf());
    handler.play_input(input.into());
    Ok(())
}
