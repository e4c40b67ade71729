// Routes gateway events to the listener modules.

pub mod member_events;
pub mod message_events;

use crate::discord::commands::presence;
use crate::discord::image::components;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Event handler for non-command Discord events.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(user = %data_about_bot.user.name, "Connected to Discord");
            presence::on_ready(ctx);
        }
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = message_events::handle_message(ctx, data, new_message).await {
                tracing::error!(
                    message_id = new_message.id.get(),
                    "Error handling message: {}",
                    e
                );
            }
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            if let Err(e) = components::handle_component(ctx, data, component).await {
                tracing::error!(
                    custom_id = %component.data.custom_id,
                    "Error handling button: {}",
                    e
                );
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = member_events::handle_member_join(ctx, data, new_member).await {
                tracing::warn!("Error handling member join: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberUpdate { new, .. } => {
            if let Err(e) = member_events::handle_member_update(ctx, data, new.as_ref()).await {
                tracing::warn!("Error handling member update: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}
