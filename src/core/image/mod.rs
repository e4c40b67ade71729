pub mod cache;
pub mod decode;
pub mod guard;
pub mod image_models;
pub mod image_service;
pub mod retry;

pub use cache::CachedGeneration;
pub use decode::{decode_base64_image, encode_base64_image};
pub use guard::GenerationGuard;
pub use image_models::{
    GeneratedImage, GenerationRequest, ImageAction, ImageBackend, ImageFormat, RequestOverrides,
};
pub use image_service::{ImageError, ImageProvider, ImageService};
pub use retry::RetryPolicy;
