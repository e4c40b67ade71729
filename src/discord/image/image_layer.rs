// Discord side of image generation: the `/imagine` command, the buttons under
// each result, and the presentation helpers both share.

pub mod components;
pub mod imagine;

use crate::core::chat::formatting::truncate;
use crate::core::image::{GeneratedImage, GenerationRequest, ImageAction, ImageError};
use poise::serenity_prelude as serenity;

const CAPTION_PROMPT_CHARS: usize = 300;

fn button_face(action: ImageAction) -> (&'static str, &'static str, serenity::ButtonStyle) {
    match action {
        ImageAction::Regenerate => ("🔄", "Regenerate", serenity::ButtonStyle::Secondary),
        ImageAction::Upscale => ("⬆️", "Upscale", serenity::ButtonStyle::Secondary),
        ImageAction::Variation => ("🎲", "Variation", serenity::ButtonStyle::Secondary),
        ImageAction::Delete => ("🗑️", "Delete", serenity::ButtonStyle::Danger),
    }
}

/// The 🔄 ⬆️ 🎲 🗑️ row attached to every result.
pub fn action_row() -> serenity::CreateActionRow {
    let buttons = ImageAction::ALL
        .into_iter()
        .map(|action| {
            let (emoji, label, style) = button_face(action);
            serenity::CreateButton::new(action.custom_id())
                .emoji(serenity::ReactionType::Unicode(emoji.to_string()))
                .label(label)
                .style(style)
        })
        .collect();
    serenity::CreateActionRow::Buttons(buttons)
}

pub fn caption(request: &GenerationRequest, image: &GeneratedImage, requester_id: u64) -> String {
    let seed = image
        .seed
        .or(request.seed)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "random".to_string());
    let (width, height) = image.dimensions().unwrap_or((request.width, request.height));
    format!(
        "**{}**\n-# <@{}> · {} · {}x{} · {} steps · seed {}",
        truncate(&request.prompt, CAPTION_PROMPT_CHARS),
        requester_id,
        request.backend,
        width,
        height,
        request.steps,
        seed
    )
}

pub fn attachment(image: &GeneratedImage) -> serenity::CreateAttachment {
    serenity::CreateAttachment::bytes(image.bytes.clone(), image.filename())
}

/// Logs a failed generation at the level it deserves.
pub fn log_failure(err: &ImageError, user_id: u64, action: &str) {
    if err.is_unexpected() {
        tracing::error!(user_id, action, "Image generation failed: {}", err);
    } else {
        tracing::warn!(user_id, action, "Image generation rejected: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::ImageFormat;

    fn request() -> GenerationRequest {
        let settings = crate::core::settings::EffectiveImageSettings::resolve(
            &Default::default(),
            &Default::default(),
        );
        GenerationRequest::from_settings("a lighthouse", Default::default(), &settings).unwrap()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(width, height)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_caption_shows_upscaled_size() {
        let request = request();
        let upscaled = GeneratedImage {
            bytes: png(request.width * 2, request.height * 2),
            format: ImageFormat::Png,
            seed: Some(7),
            info: None,
        };

        let text = caption(&request, &upscaled, 1);
        assert!(text.contains(&format!("{}x{}", request.width * 2, request.height * 2)));
        assert!(text.contains("seed 7"));
    }

    #[test]
    fn test_caption_falls_back_to_requested_size() {
        let request = request();
        let unreadable = GeneratedImage {
            bytes: b"not an image".to_vec(),
            format: ImageFormat::Png,
            seed: None,
            info: None,
        };

        let text = caption(&request, &unreadable, 1);
        assert!(text.contains(&format!("{}x{}", request.width, request.height)));
    }
}
