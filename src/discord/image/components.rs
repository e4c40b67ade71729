// Button handler for generated images.
//
// Buttons are routed from the InteractionCreate event rather than a collector
// so they keep working after a restart; the custom ids are stable. What a
// button acts on comes from the generation cache, keyed by the message id.

use super::{action_row, attachment, caption, log_failure};
use crate::core::image::{CachedGeneration, ImageAction};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

async fn respond_ephemeral(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    text: impl Into<String>,
) -> Result<(), Error> {
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(text.into())
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

fn can_delete(interaction: &serenity::ComponentInteraction, cached: &CachedGeneration) -> bool {
    if interaction.user.id.get() == cached.requester_id {
        return true;
    }
    interaction
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .is_some_and(|p| p.manage_messages())
}

/// Entry point from the event handler. Ignores components that aren't ours.
pub async fn handle_component(
    ctx: &serenity::Context,
    data: &Data,
    interaction: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(action) = ImageAction::from_custom_id(&interaction.data.custom_id) else {
        return Ok(());
    };

    let message_id = interaction.message.id.get();
    let user_id = interaction.user.id.get();

    let Some(cached) = data.images.recall(message_id) else {
        return respond_ephemeral(
            ctx,
            interaction,
            "⌛ I no longer remember this image. Run /imagine again.",
        )
        .await;
    };

    if action == ImageAction::Delete {
        if !can_delete(interaction, &cached) {
            return respond_ephemeral(
                ctx,
                interaction,
                "🚫 Only the person who asked for this image or a moderator can delete it.",
            )
            .await;
        }
        interaction
            .create_response(&ctx.http, serenity::CreateInteractionResponse::Acknowledge)
            .await?;
        interaction.message.delete(ctx).await?;
        data.images.forget(message_id);
        tracing::info!(user_id, message_id, "Deleted generated image");
        return Ok(());
    }

    let guard = match data.images.begin(user_id) {
        Ok(guard) => guard,
        Err(e) => return respond_ephemeral(ctx, interaction, e.user_message()).await,
    };

    interaction.defer(&ctx.http).await?;

    let outcome = match action {
        ImageAction::Regenerate => data.images.regenerate(&guard, &cached).await,
        ImageAction::Variation => data
            .images
            .variation(&guard, &cached)
            .await
            .map(|image| (cached.request.reseeded(), image)),
        ImageAction::Upscale => data
            .images
            .upscale(&guard, &cached)
            .await
            .map(|image| (cached.request.clone(), image)),
        // handled above
        ImageAction::Delete => return Ok(()),
    };

    let (request, image) = match outcome {
        Ok(result) => result,
        Err(e) => {
            log_failure(&e, user_id, action.custom_id());
            interaction
                .create_followup(
                    &ctx.http,
                    serenity::CreateInteractionResponseFollowup::new()
                        .content(e.user_message())
                        .ephemeral(true),
                )
                .await?;
            return Ok(());
        }
    };

    let followup = serenity::CreateInteractionResponseFollowup::new()
        .content(caption(&request, &image, user_id))
        .add_file(attachment(&image))
        .components(vec![action_row()]);
    let posted = interaction.create_followup(&ctx.http, followup).await?;

    tracing::info!(
        user_id,
        source_message = message_id,
        message_id = posted.id.get(),
        action = action.custom_id(),
        "Posted image follow-up"
    );

    data.images.remember(
        posted.id.get(),
        CachedGeneration {
            request,
            image,
            requester_id: user_id,
        },
    );
    drop(guard);
    Ok(())
}
