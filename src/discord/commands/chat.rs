// AI chat commands.
//
// Mentions are handled in the message event (see events/message_events.rs);
// these commands cover the direct `/chat` entry point and the per-user opt-out
// from history collection.

use crate::core::chat::formatting::{split_for_discord, DISCORD_MESSAGE_LIMIT};
use crate::core::chat::AiMessage;
use crate::discord::{Context, Error};

/// Ask the AI something directly.
#[poise::command(slash_command)]
pub async fn chat(
    ctx: Context<'_>,
    #[description = "What do you want to ask?"] message: String,
) -> Result<(), Error> {
    let chat = match ctx.data().chat() {
        Ok(chat) => chat,
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(e.user_message())
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    ctx.defer().await?;

    let guild_id = ctx.guild_id().map(|g| g.get());
    let settings = ctx.data().settings.chat(guild_id).await?;
    let messages = [
        AiMessage::system(settings.system_prompt.clone()),
        AiMessage::user(format!("{}: {}", ctx.author().name, message)),
    ];

    match chat.reply(&messages, &settings).await {
        Ok(response) => {
            for chunk in split_for_discord(&response.answer, DISCORD_MESSAGE_LIMIT) {
                ctx.say(chunk).await?;
            }
        }
        Err(e) => {
            tracing::error!(user_id = ctx.author().id.get(), "Chat command failed: {}", e);
            ctx.say(e.user_message()).await?;
        }
    }
    Ok(())
}

/// AI privacy controls.
#[poise::command(
    slash_command,
    guild_only,
    subcommands("optout", "optin", "status")
)]
pub async fn ai(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Stop your messages from being sent to the AI as conversation context.
#[poise::command(slash_command, guild_only)]
pub async fn optout(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let changed = ctx
        .data()
        .settings
        .opt_out(guild_id.get(), ctx.author().id.get())
        .await?;

    tracing::info!(
        guild_id = guild_id.get(),
        user_id = ctx.author().id.get(),
        "User opted out of AI context"
    );

    let text = if changed {
        "🔒 Your messages will no longer be used as AI context in this server."
    } else {
        "You're already opted out."
    };
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

/// Allow your messages to be used as AI context again.
#[poise::command(slash_command, guild_only)]
pub async fn optin(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let changed = ctx
        .data()
        .settings
        .opt_in(guild_id.get(), ctx.author().id.get())
        .await?;

    let text = if changed {
        "🔓 Your messages can be used as AI context again."
    } else {
        "You weren't opted out."
    };
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

/// Show whether your messages are used as AI context.
#[poise::command(slash_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().map(|g| g.get());
    let opted_out = ctx.data().settings.opted_out(guild_id).await?;

    let text = if opted_out.contains(&ctx.author().id.get()) {
        "🔒 You are opted out. Only messages where you ping me are sent to the AI."
    } else {
        "🔓 Your recent messages may be included as context when someone pings me."
    };
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}
