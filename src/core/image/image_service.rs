// Image generation service - the core of the image pipeline.
//
// The service owns:
// - one provider per configured backend
// - the per-user generation guard
// - the cache that backs the regenerate/upscale/variation/delete buttons
//
// Providers do the HTTP work (see infra/image); everything here is backend-agnostic.

use super::cache::{CachedGeneration, GenerationCache, DEFAULT_CACHE_CAPACITY};
use super::guard::{GenerationGuard, GenerationLocks};
use super::image_models::{GeneratedImage, GenerationRequest, ImageBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ImageError {
    /// The backend rejected the parameters (HTTP 422) or local validation failed.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Connection refused, DNS failure, timeout. The only retryable kind.
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Backend returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("{0} backend is not configured")]
    NotConfigured(ImageBackend),

    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),

    #[error("A generation is already running for this user")]
    Busy,

    /// The backend accepted the job but could not finish it.
    #[error("Generation failed: {0}")]
    Failed(String),
}

impl ImageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ImageError::Connection(_))
    }

    /// Text shown to the user. Unexpected failures stay generic.
    pub fn user_message(&self) -> String {
        match self {
            ImageError::InvalidParameters(detail) => format!("⚠️ Invalid parameters: {}", detail),
            ImageError::Connection(_) => {
                "⚠️ Couldn't connect to the image server, try again later.".to_string()
            }
            ImageError::NotConfigured(backend) => {
                format!("⚠️ The {} backend isn't set up on this bot.", backend)
            }
            ImageError::Unsupported(what) => {
                format!("⚠️ This backend doesn't support {}.", what)
            }
            ImageError::Busy => {
                "⏳ You already have an image generating, wait for it to finish.".to_string()
            }
            ImageError::Api { .. } | ImageError::Decode(_) | ImageError::Failed(_) => {
                "⚠️ Something went wrong while generating your image.".to_string()
            }
        }
    }

    /// Whether this is worth an `error!` log (as opposed to a user mistake).
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            ImageError::Api { .. } | ImageError::Decode(_) | ImageError::Failed(_)
        )
    }
}

// ============================================================================
// PROVIDER TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn txt2img(&self, request: &GenerationRequest) -> Result<GeneratedImage, ImageError>;

    /// Re-imagines `source` guided by the request prompt.
    async fn img2img(
        &self,
        _request: &GenerationRequest,
        _source: &GeneratedImage,
    ) -> Result<GeneratedImage, ImageError> {
        Err(ImageError::Unsupported("variations"))
    }

    async fn upscale(
        &self,
        _source: &GeneratedImage,
        _upscaler: &str,
        _factor: f32,
    ) -> Result<GeneratedImage, ImageError> {
        Err(ImageError::Unsupported("upscaling"))
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ImageService {
    providers: HashMap<ImageBackend, Box<dyn ImageProvider>>,
    locks: GenerationLocks,
    cache: GenerationCache,
}

impl Default for ImageService {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageService {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            locks: GenerationLocks::new(),
            cache: GenerationCache::new(DEFAULT_CACHE_CAPACITY),
        }
    }

    pub fn with_provider(
        mut self,
        backend: ImageBackend,
        provider: Box<dyn ImageProvider>,
    ) -> Self {
        self.providers.insert(backend, provider);
        self
    }

    pub fn backends(&self) -> Vec<ImageBackend> {
        let mut backends: Vec<ImageBackend> = self.providers.keys().copied().collect();
        backends.sort_by_key(|b| b.to_string());
        backends
    }

    fn provider(&self, backend: ImageBackend) -> Result<&dyn ImageProvider, ImageError> {
        self.providers
            .get(&backend)
            .map(|p| p.as_ref())
            .ok_or(ImageError::NotConfigured(backend))
    }

    /// Claims the user's generation slot. Hold the guard for the whole request,
    /// including sending the result, so a double click can't sneak in.
    pub fn begin(&self, user_id: u64) -> Result<GenerationGuard, ImageError> {
        self.locks.try_acquire(user_id).ok_or(ImageError::Busy)
    }

    pub async fn generate(
        &self,
        _guard: &GenerationGuard,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, ImageError> {
        let provider = self.provider(request.backend)?;
        tracing::info!(
            backend = %request.backend,
            width = request.width,
            height = request.height,
            steps = request.steps,
            "Generating image"
        );
        provider.txt2img(request).await
    }

    /// Same prompt and settings, new seed.
    pub async fn regenerate(
        &self,
        guard: &GenerationGuard,
        previous: &CachedGeneration,
    ) -> Result<(GenerationRequest, GeneratedImage), ImageError> {
        let request = previous.request.reseeded();
        let image = self.generate(guard, &request).await?;
        Ok((request, image))
    }

    pub async fn variation(
        &self,
        _guard: &GenerationGuard,
        previous: &CachedGeneration,
    ) -> Result<GeneratedImage, ImageError> {
        let provider = self.provider(previous.request.backend)?;
        let request = previous.request.reseeded();
        provider.img2img(&request, &previous.image).await
    }

    pub async fn upscale(
        &self,
        _guard: &GenerationGuard,
        previous: &CachedGeneration,
    ) -> Result<GeneratedImage, ImageError> {
        let provider = self.provider(previous.request.backend)?;
        provider
            .upscale(
                &previous.image,
                &previous.request.upscaler,
                previous.request.upscale_factor,
            )
            .await
    }

    pub fn remember(&self, message_id: u64, generation: CachedGeneration) {
        self.cache.insert(message_id, generation);
    }

    pub fn recall(&self, message_id: u64) -> Option<CachedGeneration> {
        self.cache.get(message_id)
    }

    pub fn forget(&self, message_id: u64) {
        self.cache.remove(message_id);
    }
}
