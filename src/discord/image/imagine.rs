use super::{action_row, attachment, caption, log_failure};
use crate::core::image::{CachedGeneration, GenerationRequest, ImageBackend, RequestOverrides};
use crate::discord::{Context, Error};

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum BackendChoice {
    #[name = "Automatic1111"]
    A1111,
    #[name = "AI Horde"]
    Horde,
    #[name = "BitTensor"]
    Bittensor,
}

impl From<BackendChoice> for ImageBackend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::A1111 => ImageBackend::A1111,
            BackendChoice::Horde => ImageBackend::Horde,
            BackendChoice::Bittensor => ImageBackend::Bittensor,
        }
    }
}

async fn say_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(text.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Generate an image with Stable Diffusion.
#[allow(clippy::too_many_arguments)]
#[poise::command(slash_command)]
pub async fn imagine(
    ctx: Context<'_>,
    #[description = "What to draw"] prompt: String,
    #[description = "Things to avoid"] negative_prompt: Option<String>,
    #[description = "Which backend to use"] backend: Option<BackendChoice>,
    #[description = "Width in pixels (64-2048)"] width: Option<u32>,
    #[description = "Height in pixels (64-2048)"] height: Option<u32>,
    #[description = "Sampling steps (1-150)"] steps: Option<u32>,
    #[description = "Prompt adherence (1-30)"] cfg_scale: Option<f32>,
    #[description = "Sampler name, e.g. Euler a"] sampler: Option<String>,
    #[description = "Seed for reproducible results"] seed: Option<i64>,
) -> Result<(), Error> {
    let data = ctx.data();
    let user_id = ctx.author().id.get();
    let guild_id = ctx.guild_id().map(|g| g.get());

    let settings = data.settings.image(guild_id).await?;
    let overrides = RequestOverrides {
        backend: backend.map(ImageBackend::from),
        negative_prompt,
        width,
        height,
        steps,
        cfg_scale,
        sampler,
        seed,
    };

    let request = match GenerationRequest::from_settings(&prompt, overrides, &settings) {
        Ok(request) => request,
        Err(e) => return say_ephemeral(ctx, e.user_message()).await,
    };

    // Held until the result is posted so a double submit is rejected, not queued
    let guard = match data.images.begin(user_id) {
        Ok(guard) => guard,
        Err(e) => return say_ephemeral(ctx, e.user_message()).await,
    };

    ctx.defer().await?;

    let image = match data.images.generate(&guard, &request).await {
        Ok(image) => image,
        Err(e) => {
            log_failure(&e, user_id, "imagine");
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
    };

    let reply = ctx
        .send(
            poise::CreateReply::default()
                .content(caption(&request, &image, user_id))
                .attachment(attachment(&image))
                .components(vec![action_row()]),
        )
        .await?;
    let message = reply.message().await?;

    tracing::info!(
        user_id,
        message_id = message.id.get(),
        backend = %request.backend,
        "Posted generated image"
    );

    data.images.remember(
        message.id.get(),
        CachedGeneration {
            request,
            image,
            requester_id: user_id,
        },
    );
    Ok(())
}
