// =============================================================================
// AUTOMATIC1111 CLIENT
// =============================================================================
//
// Talks to the stable-diffusion-webui API (`--api` flag):
// - POST /sdapi/v1/txt2img             -> { images: [b64], info: "<json string>" }
// - POST /sdapi/v1/img2img             -> same shape, takes `init_images`
// - POST /sdapi/v1/extra-single-image  -> { image: b64 }
//
// Images come back as base64 PNG. `info` is itself a JSON document serialized
// into a string; we only read the seed out of it.

use super::http::send_json;
use crate::core::image::{
    decode_base64_image, encode_base64_image, GeneratedImage, GenerationRequest, ImageError,
    ImageProvider, RetryPolicy,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub struct A1111Client {
    client: Client,
    endpoint: String,
    /// Basic auth for webui instances started with `--api-auth`.
    auth: Option<(String, String)>,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpscaleResponse {
    image: String,
}

impl A1111Client {
    pub fn new(endpoint: &str, auth: Option<(String, String)>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth,
            retry: RetryPolicy::default(),
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &Value,
    ) -> Result<T, ImageError> {
        let url = format!("{}{}", self.endpoint, path);
        send_json(&self.retry, "a1111", || {
            let request = self.client.post(&url).json(payload);
            match &self.auth {
                Some((user, pass)) => request.basic_auth(user, Some(pass)),
                None => request,
            }
        })
        .await
    }
}

pub fn txt2img_payload(request: &GenerationRequest) -> Value {
    let mut payload = json!({
        "prompt": request.prompt,
        "negative_prompt": request.negative_prompt,
        "width": request.width,
        "height": request.height,
        "steps": request.steps,
        "cfg_scale": request.cfg_scale,
        "sampler_name": request.sampler,
        "seed": request.seed.unwrap_or(-1),
        "batch_size": 1,
        "n_iter": 1,
    });
    if let Some(model) = &request.model {
        payload["override_settings"] = json!({ "sd_model_checkpoint": model });
        payload["override_settings_restore_afterwards"] = json!(true);
    }
    payload
}

pub fn img2img_payload(request: &GenerationRequest, source: &GeneratedImage) -> Value {
    let mut payload = txt2img_payload(request);
    payload["init_images"] = json!([encode_base64_image(&source.bytes)]);
    payload["denoising_strength"] = json!(request.denoising_strength);
    payload
}

pub fn upscale_payload(source: &GeneratedImage, upscaler: &str, factor: f32) -> Value {
    json!({
        "image": encode_base64_image(&source.bytes),
        "upscaler_1": upscaler,
        "upscaling_resize": factor,
    })
}

/// The seed the webui actually used, read from the `info` string.
fn seed_from_info(info: Option<&str>) -> Option<i64> {
    let info: Value = serde_json::from_str(info?).ok()?;
    info["seed"].as_i64()
}

fn into_image(response: GenerationResponse) -> Result<GeneratedImage, ImageError> {
    let first = response
        .images
        .first()
        .ok_or_else(|| ImageError::Decode("response contained no images".to_string()))?;
    let (bytes, format) = decode_base64_image(first)?;
    Ok(GeneratedImage {
        bytes,
        format,
        seed: seed_from_info(response.info.as_deref()),
        info: response.info,
    })
}

#[async_trait]
impl ImageProvider for A1111Client {
    async fn txt2img(&self, request: &GenerationRequest) -> Result<GeneratedImage, ImageError> {
        let response: GenerationResponse = self
            .post("/sdapi/v1/txt2img", &txt2img_payload(request))
            .await?;
        into_image(response)
    }

    async fn img2img(
        &self,
        request: &GenerationRequest,
        source: &GeneratedImage,
    ) -> Result<GeneratedImage, ImageError> {
        let response: GenerationResponse = self
            .post("/sdapi/v1/img2img", &img2img_payload(request, source))
            .await?;
        into_image(response)
    }

    async fn upscale(
        &self,
        source: &GeneratedImage,
        upscaler: &str,
        factor: f32,
    ) -> Result<GeneratedImage, ImageError> {
        let response: UpscaleResponse = self
            .post(
                "/sdapi/v1/extra-single-image",
                &upscale_payload(source, upscaler, factor),
            )
            .await?;
        let (bytes, format) = decode_base64_image(&response.image)?;
        Ok(GeneratedImage {
            bytes,
            format,
            seed: source.seed,
            info: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::{ImageBackend, ImageFormat};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn request() -> GenerationRequest {
        GenerationRequest {
            backend: ImageBackend::A1111,
            prompt: "a lighthouse".to_string(),
            negative_prompt: "blurry".to_string(),
            width: 640,
            height: 512,
            steps: 25,
            cfg_scale: 6.5,
            sampler: "DPM++ 2M Karras".to_string(),
            seed: None,
            model: None,
            nsfw: false,
            denoising_strength: 0.55,
            upscaler: "R-ESRGAN 4x+".to_string(),
            upscale_factor: 2.0,
        }
    }

    #[test]
    fn test_txt2img_payload() {
        let payload = txt2img_payload(&request());
        assert_eq!(payload["prompt"], "a lighthouse");
        assert_eq!(payload["negative_prompt"], "blurry");
        assert_eq!(payload["width"], 640);
        assert_eq!(payload["sampler_name"], "DPM++ 2M Karras");
        assert_eq!(payload["seed"], -1);
        assert!(payload.get("override_settings").is_none());
    }

    #[test]
    fn test_model_override() {
        let mut req = request();
        req.model = Some("sdxl_base".to_string());
        req.seed = Some(42);
        let payload = txt2img_payload(&req);
        assert_eq!(payload["override_settings"]["sd_model_checkpoint"], "sdxl_base");
        assert_eq!(payload["seed"], 42);
    }

    #[test]
    fn test_img2img_payload_carries_source() {
        let source = GeneratedImage {
            bytes: PNG.to_vec(),
            format: ImageFormat::Png,
            seed: Some(1),
            info: None,
        };
        let payload = img2img_payload(&request(), &source);
        assert_eq!(payload["init_images"][0], encode_base64_image(PNG));
        assert!((payload["denoising_strength"].as_f64().unwrap() - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_response_decoding_reads_seed() {
        let response = GenerationResponse {
            images: vec![encode_base64_image(PNG)],
            info: Some(r#"{"seed": 1234, "prompt": "a lighthouse"}"#.to_string()),
        };
        let image = into_image(response).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.seed, Some(1234));
    }

    #[test]
    fn test_empty_images_is_decode_error() {
        let response = GenerationResponse {
            images: vec![],
            info: None,
        };
        assert!(matches!(into_image(response), Err(ImageError::Decode(_))));
    }
}
