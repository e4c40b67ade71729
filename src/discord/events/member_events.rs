// One-letter nicknames: members whose display name is longer than the guild's
// limit get it trimmed on join and whenever they change it.

use crate::core::replies::trim_nickname;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Trims one member's nickname if needed. Returns whether it was changed.
pub async fn enforce_nickname(
    ctx: &serenity::Context,
    member: &serenity::Member,
    max_len: usize,
) -> Result<bool, Error> {
    if member.user.bot {
        return Ok(false);
    }
    let Some(trimmed) = trim_nickname(member.display_name(), max_len) else {
        return Ok(false);
    };

    member
        .guild_id
        .edit_member(
            ctx,
            member.user.id,
            serenity::EditMember::new().nickname(trimmed.clone()),
        )
        .await?;

    tracing::info!(
        guild_id = member.guild_id.get(),
        user_id = member.user.id.get(),
        nickname = %trimmed,
        "Trimmed nickname"
    );
    Ok(true)
}

async fn enforce_if_enabled(
    ctx: &serenity::Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<(), Error> {
    let replies = data.settings.replies(member.guild_id.get()).await?;
    if !replies.one_letter_enabled {
        return Ok(());
    }
    enforce_nickname(ctx, member, replies.one_letter_length).await?;
    Ok(())
}

pub async fn handle_member_join(
    ctx: &serenity::Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<(), Error> {
    enforce_if_enabled(ctx, data, member).await
}

/// Our own nickname edit fires another update; it is a no-op the second time
/// because the name is already short enough.
pub async fn handle_member_update(
    ctx: &serenity::Context,
    data: &Data,
    member: Option<&serenity::Member>,
) -> Result<(), Error> {
    match member {
        Some(member) => enforce_if_enabled(ctx, data, member).await,
        None => Ok(()),
    }
}
