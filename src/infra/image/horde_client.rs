// =============================================================================
// AI HORDE CLIENT
// =============================================================================
//
// The Horde is asynchronous: submit a job, poll until a worker finishes it,
// then fetch the result.
// - POST /generate/async        -> 202 { id }
// - GET  /generate/check/{id}   -> { done, faulted, is_possible, wait_time }
// - GET  /generate/status/{id}  -> { generations: [{ img, seed }] }
//
// With `r2: false` the image comes back inline as base64 WEBP. The negative
// prompt rides in the prompt after a `###` separator.

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

pub const HORDE_API: &str = "https://aihorde.net/api/v2";
/// Anonymous key; works with the lowest queue priority.
pub const ANONYMOUS_KEY: &str = "0000000000";

pub struct HordeClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
    poll_interval: Duration,
    max_wait: Duration,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    faulted: bool,
    #[serde(default = "default_true")]
    is_possible: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    img: String,
    #[serde(default)]
    seed: Option<String>,
    #[serde(default)]
    censored: bool,
}

impl HordeClient {
    pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: HORDE_API.to_string(),
            api_key: api_key.unwrap_or_else(|| ANONYMOUS_KEY.to_string()),
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(600),
        })
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Client-Agent", concat!("cogbot:", env!("CARGO_PKG_VERSION"), ":discord"))
    }

    async fn submit_and_wait(&self, payload: &Value) -> Result<GeneratedImage, ImageError> {
        let url = format!("{}/generate/async", self.base_url);
        let submitted: SubmitResponse = send_json(&self.retry, "horde", || {
            self.authed(self.client.post(&url).json(payload))
        })
        .await?;

        tracing::debug!(job_id = %submitted.id, "Submitted Horde job");

        let check_url = format!("{}/generate/check/{}", self.base_url, submitted.id);
        let started = tokio::time::Instant::now();
        loop {
            let check: CheckResponse = send_json(&self.retry, "horde", || {
                self.authed(self.client.get(&check_url))
            })
            .await?;

            if check.faulted {
                return Err(ImageError::Failed("the Horde job faulted".to_string()));
            }
            if !check.is_possible {
                return Err(ImageError::Failed(
                    "no Horde worker can serve this request".to_string(),
                ));
            }
            if check.done {
                break;
            }
            if started.elapsed() > self.max_wait {
                return Err(ImageError::Failed("timed out waiting for the Horde".to_string()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        let status_url = format!("{}/generate/status/{}", self.base_url, submitted.id);
        let status: StatusResponse = send_json(&self.retry, "horde", || {
            self.authed(self.client.get(&status_url))
        })
        .await?;

        into_image(status)
    }
}

/// Horde sampler names for the webui names users know.
pub fn horde_sampler(sampler: &str) -> &'static str {
    let normalized = sampler.to_lowercase().replace(" karras", "");
    match normalized.as_str() {
        "euler" => "k_euler",
        "lms" => "k_lms",
        "heun" => "k_heun",
        "dpm2" => "k_dpm_2",
        "dpm2 a" => "k_dpm_2_a",
        "dpm++ 2s a" => "k_dpmpp_2s_a",
        "dpm++ 2m" => "k_dpmpp_2m",
        "dpm++ sde" => "k_dpmpp_sde",
        "dpm fast" => "k_dpm_fast",
        "dpm adaptive" => "k_dpm_adaptive",
        "ddim" => "DDIM",
        "lcm" => "lcm",
        _ => "k_euler_a",
    }
}

fn horde_prompt(request: &GenerationRequest) -> String {
    if request.negative_prompt.trim().is_empty() {
        request.prompt.clone()
    } else {
        format!("{} ### {}", request.prompt, request.negative_prompt)
    }
}

pub fn generation_payload(request: &GenerationRequest) -> Value {
    let mut params = json!({
        "sampler_name": horde_sampler(&request.sampler),
        "karras": request.sampler.to_lowercase().contains("karras"),
        "cfg_scale": request.cfg_scale,
        "width": request.width - request.width % 64,
        "height": request.height - request.height % 64,
        "steps": request.steps,
        "n": 1,
    });
    if let Some(seed) = request.seed {
        params["seed"] = json!(seed.to_string());
    }

    let mut payload = json!({
        "prompt": horde_prompt(request),
        "params": params,
        "nsfw": request.nsfw,
        "censor_nsfw": !request.nsfw,
        "r2": false,
        "shared": false,
    });
    if let Some(model) = &request.model {
        payload["models"] = json!([model]);
    }
    payload
}

pub fn img2img_payload(request: &GenerationRequest, source: &GeneratedImage) -> Value {
    let mut payload = generation_payload(request);
    payload["source_image"] = json!(encode_base64_image(&source.bytes));
    payload["source_processing"] = json!("img2img");
    payload["params"]["denoising_strength"] = json!(request.denoising_strength);
    payload
}

fn into_image(status: StatusResponse) -> Result<GeneratedImage, ImageError> {
    let generation = status
        .generations
        .into_iter()
        .next()
        .ok_or_else(|| ImageError::Failed("the Horde returned no generations".to_string()))?;

    if generation.censored {
        tracing::info!("Horde censored a generation");
    }

    let (bytes, format) = decode_base64_image(&generation.img)?;
    Ok(GeneratedImage {
        bytes,
        format,
        seed: generation.seed.and_then(|s| s.parse().ok()),
        info: None,
    })
}

#[async_trait]
impl ImageProvider for HordeClient {
    async fn txt2img(&self, request: &GenerationRequest) -> Result<GeneratedImage, ImageError> {
        self.submit_and_wait(&generation_payload(request)).await
    }

    async fn img2img(
        &self,
        request: &GenerationRequest,
        source: &GeneratedImage,
    ) -> Result<GeneratedImage, ImageError> {
        self.submit_and_wait(&img2img_payload(request, source)).await
    }
}
