// Image generation domain models.
//
// These are pure domain types with no Discord dependencies. The infra layer turns
// a `GenerationRequest` into a backend-specific payload, the Discord layer turns a
// `GeneratedImage` into an attachment.

use super::image_service::ImageError;
use crate::core::settings::EffectiveImageSettings;
use serde::{Deserialize, Serialize};

pub const MAX_PROMPT_CHARS: usize = 1000;

/// Which Stable Diffusion backend handles a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackend {
    #[default]
    A1111,
    Horde,
    Bittensor,
}

impl std::fmt::Display for ImageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageBackend::A1111 => write!(f, "Automatic1111"),
            ImageBackend::Horde => write!(f, "AI Horde"),
            ImageBackend::Bittensor => write!(f, "BitTensor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Webp,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Follow-up actions offered under a generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAction {
    Regenerate,
    Upscale,
    Variation,
    Delete,
}

impl ImageAction {
    pub const ALL: [ImageAction; 4] = [
        ImageAction::Regenerate,
        ImageAction::Upscale,
        ImageAction::Variation,
        ImageAction::Delete,
    ];

    /// Component custom id. Stable across restarts so old buttons still route.
    pub fn custom_id(&self) -> &'static str {
        match self {
            ImageAction::Regenerate => "aimage:regenerate",
            ImageAction::Upscale => "aimage:upscale",
            ImageAction::Variation => "aimage:variation",
            ImageAction::Delete => "aimage:delete",
        }
    }

    pub fn from_custom_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.custom_id() == id)
    }
}

/// Optional per-command values that override guild settings.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub backend: Option<ImageBackend>,
    pub negative_prompt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f32>,
    pub sampler: Option<String>,
    pub seed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub backend: ImageBackend,
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    pub sampler: String,
    /// `None` lets the backend pick a random seed.
    pub seed: Option<i64>,
    pub model: Option<String>,
    pub nsfw: bool,
    pub denoising_strength: f32,
    pub upscaler: String,
    pub upscale_factor: f32,
}

impl GenerationRequest {
    /// Builds a validated request: command overrides win over the resolved settings.
    pub fn from_settings(
        prompt: &str,
        overrides: RequestOverrides,
        settings: &EffectiveImageSettings,
    ) -> Result<Self, ImageError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ImageError::InvalidParameters(
                "the prompt can't be empty".to_string(),
            ));
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(ImageError::InvalidParameters(format!(
                "the prompt is longer than {} characters",
                MAX_PROMPT_CHARS
            )));
        }

        let width = validate_dimension("width", overrides.width.unwrap_or(settings.width))?;
        let height = validate_dimension("height", overrides.height.unwrap_or(settings.height))?;

        let steps = overrides.steps.unwrap_or(settings.steps);
        if !(1..=150).contains(&steps) {
            return Err(ImageError::InvalidParameters(
                "steps must be between 1 and 150".to_string(),
            ));
        }

        let cfg_scale = overrides.cfg_scale.unwrap_or(settings.cfg_scale);
        if !(1.0..=30.0).contains(&cfg_scale) {
            return Err(ImageError::InvalidParameters(
                "cfg scale must be between 1 and 30".to_string(),
            ));
        }

        Ok(Self {
            backend: overrides.backend.unwrap_or(settings.backend),
            prompt: prompt.to_string(),
            negative_prompt: overrides
                .negative_prompt
                .unwrap_or_else(|| settings.negative_prompt.clone()),
            width,
            height,
            steps,
            cfg_scale,
            sampler: overrides.sampler.unwrap_or_else(|| settings.sampler.clone()),
            seed: overrides.seed.filter(|s| *s >= 0),
            model: settings.model.clone(),
            nsfw: settings.nsfw,
            denoising_strength: settings.denoising_strength.clamp(0.0, 1.0),
            upscaler: settings.upscaler.clone(),
            upscale_factor: settings.upscale_factor.clamp(1.0, 4.0),
        })
    }

    /// Same request with a fresh random seed.
    pub fn reseeded(&self) -> Self {
        Self {
            seed: None,
            ..self.clone()
        }
    }
}

/// Snaps to a multiple of 8 (what SD backends accept) and bounds the size.
fn validate_dimension(name: &str, value: u32) -> Result<u32, ImageError> {
    if !(64..=2048).contains(&value) {
        return Err(ImageError::InvalidParameters(format!(
            "{} must be between 64 and 2048",
            name
        )));
    }
    Ok(value - value % 8)
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub seed: Option<i64>,
    /// Backend-specific generation info (A1111 returns a JSON blob).
    pub info: Option<String>,
}

impl GeneratedImage {
    pub fn filename(&self) -> String {
        format!("image.{}", self.format.extension())
    }

    /// Actual pixel size. Differs from the request after an upscale, and on
    /// backends that snap dimensions.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        super::decode::image_dimensions(&self.bytes)
    }
}
