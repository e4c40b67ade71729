// Message listeners: AI answers on mention, the "where?" finder, sarcastic
// echoes and AI emoji reactions.
//
// Each listener pulls primitives out of the serenity message, asks the core
// for a decision, then acts on it. Failures are logged and never bubble up to
// the user unless they asked for something (a mention).

use crate::core::chat::formatting::{split_for_discord, DISCORD_MESSAGE_LIMIT};
use crate::core::chat::{build_history, HistoryEntry};
use crate::core::replies::{
    emote_instructions, find_reply_target, is_where_question, pick_emoji, sarcastify,
    should_reply, RecentMessage,
};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// How far back the "where?" finder looks.
const WHERE_WINDOW: u8 = 50;

/// Milliseconds since 2015-01-01, the epoch of Discord snowflakes.
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Creation time with millisecond precision, read from the snowflake.
/// `Timestamp::unix_timestamp` would round to whole seconds.
fn timestamp_ms(message: &serenity::Message) -> i64 {
    snowflake_ms(message.id.get())
}

fn snowflake_ms(id: u64) -> i64 {
    ((id >> 22) + DISCORD_EPOCH_MS) as i64
}

fn to_history_entry(message: &serenity::Message, bot_id: serenity::UserId) -> HistoryEntry {
    HistoryEntry {
        message_id: message.id.get(),
        author_id: message.author.id.get(),
        author_name: message
            .author
            .global_name
            .clone()
            .unwrap_or_else(|| message.author.name.clone()),
        content: strip_bot_mention(&message.content, bot_id),
        timestamp_ms: timestamp_ms(message),
        from_bot_self: message.author.id == bot_id,
    }
}

fn strip_bot_mention(content: &str, bot_id: serenity::UserId) -> String {
    content
        .replace(&format!("<@{}>", bot_id.get()), "")
        .replace(&format!("<@!{}>", bot_id.get()), "")
        .trim()
        .to_string()
}

/// Custom server emoji (`<:name:id>`, `<a:name:id>`) or a plain unicode one.
fn reaction_for(emoji: String) -> serenity::ReactionType {
    serenity::ReactionType::try_from(emoji.as_str())
        .unwrap_or(serenity::ReactionType::Unicode(emoji))
}

fn to_recent(message: &serenity::Message) -> RecentMessage {
    RecentMessage {
        message_id: message.id.get(),
        author_id: message.author.id.get(),
        replied_to_author: message
            .referenced_message
            .as_ref()
            .map(|r| r.author.id.get()),
        mentioned: message.mentions.iter().map(|u| u.id.get()).collect(),
        timestamp_ms: timestamp_ms(message),
    }
}

pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<(), Error> {
    if message.author.bot {
        return Ok(());
    }

    let bot_id = ctx.cache.current_user().id;
    if message.mentions_user_id(bot_id) {
        // A mention is a request for the AI; the passive listeners stay quiet
        return answer_mention(ctx, data, message, bot_id).await;
    }

    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };
    let replies = data.settings.replies(guild_id.get()).await?;

    if replies.where_reply_enabled && is_where_question(&message.content) {
        if let Err(e) = answer_where(ctx, message).await {
            tracing::warn!(channel_id = message.channel_id.get(), "Where-reply failed: {}", e);
        }
        return Ok(());
    }

    let roll: f64 = rand::random();
    if !message.content.trim().is_empty()
        && should_reply(
            message.author.id.get(),
            &replies.sarcastic_targets,
            replies.sarcastic_chance,
            roll,
        )
    {
        let reply = sarcastify(&message.content);
        if let Err(e) = message.reply(&ctx.http, reply).await {
            tracing::warn!("Failed to send sarcastic reply: {}", e);
        }
    }

    let roll: f64 = rand::random();
    if roll < replies.emote_chance && !message.content.trim().is_empty() {
        if let Err(e) = react_with_emoji(ctx, data, message, &replies.emote_choices).await {
            tracing::warn!(message_id = message.id.get(), "AI emoji reaction failed: {}", e);
        }
    }

    Ok(())
}

async fn answer_mention(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
    bot_id: serenity::UserId,
) -> Result<(), Error> {
    let guild_id = message.guild_id.map(|g| g.get());
    let settings = data.settings.chat(guild_id).await?;
    if !settings.reply_on_mention {
        return Ok(());
    }

    let chat = match data.chat() {
        Ok(chat) => chat,
        Err(e) => {
            message.reply(&ctx.http, e.user_message()).await?;
            return Ok(());
        }
    };

    let _ = message.channel_id.broadcast_typing(&ctx.http).await;

    let earlier = if settings.history_limit == 0 {
        Vec::new()
    } else {
        message
            .channel_id
            .messages(
                &ctx.http,
                serenity::GetMessages::new()
                    .before(message.id)
                    .limit(settings.history_limit.min(100)),
            )
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to fetch channel history: {}", e);
                Vec::new()
            })
    };

    let entries: Vec<HistoryEntry> = earlier
        .iter()
        .map(|m| to_history_entry(m, bot_id))
        .collect();
    let trigger = to_history_entry(message, bot_id);
    let opted_out = data.settings.opted_out(guild_id).await?;

    let history = build_history(
        &entries,
        &trigger,
        &settings.system_prompt,
        &opted_out,
        settings.history_limit as usize,
    );

    tracing::debug!(
        user_id = message.author.id.get(),
        context_messages = history.len(),
        "Answering mention"
    );

    match chat.reply(&history, &settings).await {
        Ok(response) => {
            let chunks = split_for_discord(&response.answer, DISCORD_MESSAGE_LIMIT);
            for (i, chunk) in chunks.into_iter().enumerate() {
                let sent = if i == 0 {
                    message.reply(&ctx.http, chunk).await
                } else {
                    message.channel_id.say(&ctx.http, chunk).await
                };
                if let Err(e) = sent {
                    tracing::error!("Failed to send AI response: {}", e);
                }
            }
        }
        Err(e) => {
            tracing::error!(user_id = message.author.id.get(), "AI error: {}", e);
            let _ = message.reply(&ctx.http, e.user_message()).await;
        }
    }
    Ok(())
}

async fn answer_where(ctx: &serenity::Context, message: &serenity::Message) -> Result<(), Error> {
    let recent = message
        .channel_id
        .messages(
            &ctx.http,
            serenity::GetMessages::new()
                .before(message.id)
                .limit(WHERE_WINDOW),
        )
        .await?;

    let summaries: Vec<RecentMessage> = recent.iter().map(to_recent).collect();
    let target = find_reply_target(message.author.id.get(), &summaries)
        .and_then(|t| recent.iter().find(|m| m.id.get() == t.message_id));

    let text = match target {
        Some(found) => format!("👉 {}", found.link()),
        None => "🤷 Nobody replied to or mentioned you recently.".to_string(),
    };
    message.reply(&ctx.http, text).await?;
    Ok(())
}

async fn react_with_emoji(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
    choices: &[String],
) -> Result<(), Error> {
    // Without a chat provider there is nobody to pick the emoji
    let Ok(chat) = data.chat() else {
        return Ok(());
    };
    let settings = data.settings.chat(message.guild_id.map(|g| g.get())).await?;
    let answer = chat
        .ask(&emote_instructions(choices), &message.content, &settings)
        .await?;

    if let Some(emoji) = pick_emoji(&answer, choices) {
        message.react(&ctx.http, reaction_for(emoji)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bot_mention() {
        let bot = serenity::UserId::new(42);
        assert_eq!(strip_bot_mention("<@42> hello", bot), "hello");
        assert_eq!(strip_bot_mention("hey <@!42>", bot), "hey");
        assert_eq!(strip_bot_mention("<@7> hi", bot), "<@7> hi");
    }

    #[test]
    fn test_reaction_for_custom_and_unicode() {
        match reaction_for("<:cogs:123456789012345678>".to_string()) {
            serenity::ReactionType::Custom { id, name, animated } => {
                assert_eq!(id.get(), 123456789012345678);
                assert_eq!(name.as_deref(), Some("cogs"));
                assert!(!animated);
            }
            other => panic!("expected a custom emoji, got {:?}", other),
        }
        assert!(matches!(
            reaction_for("<a:spin:42>".to_string()),
            serenity::ReactionType::Custom { animated: true, .. }
        ));
        assert_eq!(
            reaction_for("👍".to_string()),
            serenity::ReactionType::Unicode("👍".to_string())
        );
    }

    #[test]
    fn test_snowflake_ms() {
        // Example id from the Discord developer docs, created 2016-04-30 11:18:25.796 UTC
        assert_eq!(snowflake_ms(175928847299117063), 1_462_015_105_796);
        assert!(snowflake_ms(175928847299117063 + (1 << 22)) > snowflake_ms(175928847299117063));
    }
}
