// Voice commands: join / leave, text-to-speech and the sound-effect board.
//
// Speech is synthesized to an MP3 in the temp dir and handed to songbird like
// any other file; the file is removed again once playback has had time to run.

use crate::discord::voice::{self, VoiceError};
use crate::discord::{Context, Error};
use std::time::Duration;

const TTS_FILE_TTL: Duration = Duration::from_secs(600);

async fn say_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(text.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Join your voice channel.
#[poise::command(slash_command, guild_only)]
pub async fn join(ctx: Context<'_>) -> Result<(), Error> {
    match voice::join_author_channel(ctx).await {
        Ok(_) => ctx.say("🔊 Joined your channel.").await?,
        Err(e @ VoiceError::UserNotInVoiceChannel) => {
            return say_ephemeral(ctx, format!("⚠️ {}", e)).await
        }
        Err(e) => return Err(e.into()),
    };
    Ok(())
}

/// Leave the voice channel.
#[poise::command(slash_command, guild_only)]
pub async fn leave(ctx: Context<'_>) -> Result<(), Error> {
    match voice::leave(ctx).await {
        Ok(()) => ctx.say("👋 Left the voice channel.").await?,
        Err(e @ VoiceError::NotConnected) => return say_ephemeral(ctx, format!("⚠️ {}", e)).await,
        Err(e) => return Err(e.into()),
    };
    Ok(())
}

/// Speak text in your voice channel.
#[poise::command(slash_command, guild_only)]
pub async fn tts(
    ctx: Context<'_>,
    #[description = "What to say"] text: String,
    #[description = "Language code, e.g. en, de, pt-BR"] lang: Option<String>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let lang = lang.unwrap_or_else(|| "en".to_string());
    let audio = match ctx.data().tts.speak(&text, &lang).await {
        Ok(audio) => audio,
        Err(e) => {
            tracing::warn!(user_id = ctx.author().id.get(), "TTS failed: {}", e);
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
    };

    let path = std::env::temp_dir().join(format!("cogbot-tts-{}.mp3", ctx.id()));
    tokio::fs::write(&path, &audio).await?;

    if let Err(e) = voice::play_file(ctx, &path).await {
        let _ = tokio::fs::remove_file(&path).await;
        ctx.say(format!("⚠️ {}", e)).await?;
        return Ok(());
    }

    let cleanup = path.clone();
    tokio::spawn(async move {
        tokio::time::sleep(TTS_FILE_TTL).await;
        let _ = tokio::fs::remove_file(cleanup).await;
    });

    ctx.say(format!("🗣️ {}", crate::core::chat::formatting::truncate(&text, 200)))
        .await?;
    Ok(())
}

/// Sound effects.
#[poise::command(slash_command, guild_only, subcommands("list", "play"))]
pub async fn sfx(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// List the available sound effects.
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let sounds = ctx.data().sounds.list().await?;
    let text = if sounds.is_empty() {
        "No sound effects installed.".to_string()
    } else {
        let names: Vec<String> = sounds.iter().map(|s| format!("`{}`", s)).collect();
        crate::core::chat::formatting::truncate(
            &format!("🎵 **Sound effects:** {}", names.join(", ")),
            crate::core::chat::formatting::DISCORD_MESSAGE_LIMIT,
        )
    };
    say_ephemeral(ctx, text).await
}

/// Play a sound effect in your voice channel.
#[poise::command(slash_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Sound name (see /sfx list)"] name: String,
) -> Result<(), Error> {
    let path = match ctx.data().sounds.resolve(&name).await {
        Ok(path) => path,
        Err(e) => return say_ephemeral(ctx, e.user_message()).await,
    };

    if let Err(e) = voice::play_file(ctx, &path).await {
        return say_ephemeral(ctx, format!("⚠️ {}", e)).await;
    }

    tracing::info!(user_id = ctx.author().id.get(), sound = %name, "Playing sound effect");
    ctx.say(format!("🔊 Playing `{}`", name)).await?;
    Ok(())
}
