// Bot presence.
//
// Discord-layer glue only: we work with serenity types (Context, ActivityData,
// OnlineStatus) and keep it short.

use poise::serenity_prelude as serenity;

const DEFAULT_ACTIVITY: &str = "/imagine · ping me to chat";

/// Resets the bot's status to the default message.
pub fn reset_status(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::custom(DEFAULT_ACTIVITY);
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the bot is connected.
pub fn on_ready(ctx: &serenity::Context) {
    reset_status(ctx);
}
