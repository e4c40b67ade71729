// =============================================================================
// BITTENSOR CLIENT
// =============================================================================
//
// Text-to-image through a BitTensor subnet gateway (Corcel-style API):
// - POST {endpoint}/text-to-image with bearer auth
// - response carries either `signed_urls` to download or inline `images`
//
// The gateway has no img2img or upscale route, so those fall back to the
// provider defaults.

use super::http::{send_bytes, send_json};
use crate::core::image::{
    decode_base64_image, decode::sniff_format, GeneratedImage, GenerationRequest, ImageError,
    ImageProvider, RetryPolicy,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_ENGINE: &str = "proteus";

pub struct BittensorClient {
    client: Client,
    endpoint: String,
    api_key: String,
    retry: RetryPolicy,
}

#[derive(Debug, Default, Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    signed_urls: Vec<String>,
    #[serde(default)]
    images: Vec<String>,
}

impl BittensorClient {
    pub fn new(endpoint: &str, api_key: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(180))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    async fn download(&self, url: &str) -> Result<GeneratedImage, ImageError> {
        let bytes = send_bytes(&self.retry, "bittensor", || self.client.get(url)).await?;
        let format = sniff_format(&bytes)?;
        Ok(GeneratedImage {
            bytes,
            format,
            seed: None,
            info: None,
        })
    }
}

pub fn text_to_image_payload(request: &GenerationRequest) -> Value {
    let mut prompts = vec![json!({ "text": request.prompt, "weight": 1.0 })];
    if !request.negative_prompt.trim().is_empty() {
        prompts.push(json!({ "text": request.negative_prompt, "weight": -1.0 }));
    }

    let mut payload = json!({
        "text_prompts": prompts,
        "engine": request.model.as_deref().unwrap_or(DEFAULT_ENGINE),
        "width": request.width,
        "height": request.height,
        "steps": request.steps,
        "cfg_scale": request.cfg_scale,
    });
    if let Some(seed) = request.seed {
        payload["seed"] = json!(seed);
    }
    payload
}

#[async_trait]
impl ImageProvider for BittensorClient {
    async fn txt2img(&self, request: &GenerationRequest) -> Result<GeneratedImage, ImageError> {
        let url = format!("{}/text-to-image", self.endpoint);
        let payload = text_to_image_payload(request);
        let response: TextToImageResponse = send_json(&self.retry, "bittensor", || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&payload)
        })
        .await?;

        if let Some(url) = response.signed_urls.first() {
            let mut image = self.download(url).await?;
            image.seed = request.seed;
            return Ok(image);
        }

        let first = response
            .images
            .first()
            .ok_or_else(|| ImageError::Failed("the gateway returned no images".to_string()))?;
        let (bytes, format) = decode_base64_image(first)?;
        Ok(GeneratedImage {
            bytes,
            format,
            seed: request.seed,
            info: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::ImageBackend;

    fn request() -> GenerationRequest {
        GenerationRequest {
            backend: ImageBackend::Bittensor,
            prompt: "neon city".to_string(),
            negative_prompt: "low quality".to_string(),
            width: 1024,
            height: 1024,
            steps: 8,
            cfg_scale: 2.0,
            sampler: "Euler a".to_string(),
            seed: None,
            model: None,
            nsfw: false,
            denoising_strength: 0.6,
            upscaler: String::new(),
            upscale_factor: 2.0,
        }
    }

    #[test]
    fn test_payload_weights_negative_prompt() {
        let payload = text_to_image_payload(&request());
        assert_eq!(payload["text_prompts"][0]["text"], "neon city");
        assert_eq!(payload["text_prompts"][1]["weight"], -1.0);
        assert_eq!(payload["engine"], DEFAULT_ENGINE);
        assert!(payload.get("seed").is_none());
    }

    #[test]
    fn test_payload_model_and_seed() {
        let mut req = request();
        req.negative_prompt = "  ".to_string();
        req.model = Some("dreamshaper".to_string());
        req.seed = Some(5);
        let payload = text_to_image_payload(&req);
        assert_eq!(payload["text_prompts"].as_array().unwrap().len(), 1);
        assert_eq!(payload["engine"], "dreamshaper");
        assert_eq!(payload["seed"], 5);
    }

    #[test]
    fn test_response_shapes() {
        let urls: TextToImageResponse =
            serde_json::from_str(r#"{"signed_urls":["https://cdn/x.png"]}"#).unwrap();
        assert_eq!(urls.signed_urls.len(), 1);
        assert!(urls.images.is_empty());

        let inline: TextToImageResponse = serde_json::from_str(r#"{"images":["AAAA"]}"#).unwrap();
        assert!(inline.signed_urls.is_empty());
        assert_eq!(inline.images[0], "AAAA");
    }
}
