// Manual sweep for one-letter nicknames, for members who joined before the
// setting was switched on.

use crate::discord::events::member_events::enforce_nickname;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const PAGE_SIZE: u64 = 1000;

/// One-letter nickname tools.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_NICKNAMES",
    subcommands("apply")
)]
pub async fn oneletter(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Trim every member's nickname to the configured length now.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_NICKNAMES")]
pub async fn apply(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let replies = ctx.data().settings.replies(guild_id.get()).await?;
    let max_len = replies.one_letter_length;

    ctx.defer().await?;

    let (mut changed, mut failed) = (0usize, 0usize);
    let mut after: Option<serenity::UserId> = None;
    loop {
        let members = guild_id
            .members(ctx.http(), Some(PAGE_SIZE), after)
            .await?;
        let page_len = members.len();

        for member in &members {
            match enforce_nickname(ctx.serenity_context(), member, max_len).await {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => {
                    // Usually the owner or someone above the bot's role
                    tracing::debug!(
                        user_id = member.user.id.get(),
                        "Could not trim nickname: {}",
                        e
                    );
                    failed += 1;
                }
            }
        }

        after = members.last().map(|m| m.user.id);
        if (page_len as u64) < PAGE_SIZE || after.is_none() {
            break;
        }
    }

    let mut text = format!("✂️ Trimmed {} nickname(s) to {} character(s).", changed, max_len);
    if failed > 0 {
        text.push_str(&format!(" {} member(s) could not be renamed.", failed));
    }
    ctx.say(text).await?;
    Ok(())
}
