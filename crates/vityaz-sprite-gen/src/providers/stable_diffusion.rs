//! Stable Diffusion backend (AUTOMATIC1111-compatible web API)
//!
//! The web UI process owns the weights and the GPU. Loading a model switches
//! its active checkpoint; each sprite is one blocking `txt2img` call.
//!
//! Checkpoints are addressed by the titles the server lists, so a model id is
//! first resolved against `/sdapi/v1/sd-models`. The default hub id rarely
//! exists on a web UI under that name; when it does not, the server keeps
//! whatever checkpoint it already has active.

use crate::config::{VityazConfig, DEFAULT_MODEL_ID, DEFAULT_PROVIDER};
use crate::provider::*;
use base64::Engine;
use image::DynamicImage;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use vityaz_core::{Result, VityazError};

const DEFAULT_API_URL: &str = "http://127.0.0.1:7860";
const HEALTH_TIMEOUT_SECS: u64 = 10;
const LOAD_TIMEOUT_SECS: u64 = 300;
const GENERATE_TIMEOUT_SECS: u64 = 600;
const MAX_RETRIES: usize = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Backend driving a running Stable Diffusion web UI
pub struct StableDiffusionProvider {
    api_url: String,
    api_key: Option<String>,
    model_loaded: bool,
}

impl StableDiffusionProvider {
    pub fn new(api_url: &str, api_key: Option<String>) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model_loaded: false,
        }
    }

    /// Create a provider from config, falling back to the local web UI address
    pub fn from_config(config: &VityazConfig) -> Self {
        Self::new(
            config.api_url(DEFAULT_PROVIDER).unwrap_or(DEFAULT_API_URL),
            config.api_key(DEFAULT_PROVIDER).map(str::to_string),
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        timeout_secs: u64,
    ) -> std::result::Result<T, String> {
        let url = self.endpoint(path);
        let agent = build_agent(timeout_secs);
        let mut request = agent.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", &format!("Bearer {}", key));
        }

        match request.call() {
            Ok(mut ok) => ok
                .body_mut()
                .read_json::<T>()
                .map_err(|e| format!("invalid JSON from {}: {}", url, e)),
            Err(e) => Err(format!("request to {} failed: {}", url, e)),
        }
    }

    fn post_json(
        &self,
        path: &str,
        payload: &serde_json::Value,
        timeout_secs: u64,
        max_attempts: usize,
    ) -> std::result::Result<serde_json::Value, String> {
        let url = self.endpoint(path);
        for attempt in 0..max_attempts {
            let agent = build_agent(timeout_secs);
            let mut request = agent.post(&url).header("Content-Type", "application/json");
            if let Some(ref key) = self.api_key {
                request = request.header("Authorization", &format!("Bearer {}", key));
            }

            match request.send_json(payload) {
                Ok(mut ok) => {
                    return ok
                        .body_mut()
                        .read_json()
                        .map_err(|e| format!("invalid JSON from {}: {}", url, e));
                }
                Err(e) => {
                    if attempt + 1 < max_attempts && is_retryable_error(&e) {
                        tracing::debug!(%url, attempt, error = %e, "retrying request");
                        sleep_backoff(attempt);
                        continue;
                    }
                    return Err(format!("request to {} failed: {}", url, e));
                }
            }
        }

        Err(format!("request to {} failed after retries", url))
    }
}

fn build_agent(timeout_secs: u64) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .build();
    config.into()
}

fn is_retryable_error(e: &ureq::Error) -> bool {
    match e {
        ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => true,
        ureq::Error::StatusCode(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

fn sleep_backoff(attempt: usize) {
    let delay_ms = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << attempt);
    std::thread::sleep(Duration::from_millis(delay_ms));
}

/// One entry of `GET /sdapi/v1/sd-models`
#[derive(Debug, Clone, Deserialize)]
pub struct Checkpoint {
    /// e.g. `v1-5-pruned-emaonly.safetensors [6ce0161689]`
    pub title: String,
    #[serde(default)]
    pub model_name: String,
}

impl Checkpoint {
    fn matches(&self, model_id: &str) -> bool {
        let wanted = model_id.trim().to_lowercase();
        let short = wanted.rsplit('/').next().unwrap_or(&wanted);
        let title = self.title.to_lowercase();
        let file = title.split(" [").next().unwrap_or(&title);
        let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
        let name = self.model_name.to_lowercase();

        title == wanted || file == wanted || name == wanted || name == short || stem == short
    }
}

/// Pick the checkpoint title to activate for `model_id`.
///
/// `Ok(None)` means the server's active checkpoint is kept, which only
/// happens for the default model id.
pub fn checkpoint_to_load(model_id: &str, checkpoints: &[Checkpoint]) -> Result<Option<String>> {
    if let Some(found) = checkpoints.iter().find(|c| c.matches(model_id)) {
        return Ok(Some(found.title.clone()));
    }
    if model_id == DEFAULT_MODEL_ID {
        return Ok(None);
    }

    let available: Vec<&str> = checkpoints.iter().map(|c| c.title.as_str()).collect();
    Err(VityazError::ModelLoad(format!(
        "checkpoint '{}' not found. Available: {}",
        model_id,
        if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        }
    )))
}

/// Build the `txt2img` payload for one request
pub fn txt2img_payload(request: &ImageRequest) -> serde_json::Value {
    serde_json::json!({
        "prompt": request.prompt,
        "negative_prompt": request.negative_prompt,
        "steps": request.steps,
        "cfg_scale": request.guidance_scale,
        "width": request.width,
        "height": request.height,
        "batch_size": 1,
        "n_iter": 1,
        "seed": request.seed.map(|s| s as i64).unwrap_or(-1),
    })
}

/// Decode the first image of a `txt2img` response
pub fn decode_txt2img_response(response: &serde_json::Value) -> Result<DynamicImage> {
    let encoded = response
        .get("images")
        .and_then(|imgs| imgs.as_array())
        .and_then(|arr| arr.first())
        .and_then(|img| img.as_str())
        .ok_or_else(|| {
            VityazError::Generation("txt2img response contains no images".to_string())
        })?;

    // Some servers return data URLs
    let encoded = match encoded.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => encoded,
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| VityazError::Generation(format!("invalid base64 image: {}", e)))?;

    Ok(image::load_from_memory(&bytes)?)
}

impl ImageGenerator for StableDiffusionProvider {
    fn name(&self) -> &str {
        "stable-diffusion"
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        let agent = build_agent(HEALTH_TIMEOUT_SECS);
        let mut request = agent.get(&self.endpoint("/sdapi/v1/sd-models"));
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", &format!("Bearer {}", key));
        }

        match request.call() {
            Ok(_) => Ok(ProviderStatus::Available),
            Err(ureq::Error::StatusCode(401 | 403)) if self.api_key.is_none() => {
                Ok(ProviderStatus::NoApiKey)
            }
            Err(e) => Ok(ProviderStatus::Unavailable(format!(
                "{} is not reachable: {}",
                self.api_url, e
            ))),
        }
    }

    fn load_model(&mut self, options: &ModelOptions) -> Result<()> {
        tracing::info!(
            model = %options.model_id,
            device = %options.device,
            attention_slicing = options.attention_slicing,
            "switching web UI checkpoint"
        );

        let checkpoints: Vec<Checkpoint> = self
            .get_json("/sdapi/v1/sd-models", HEALTH_TIMEOUT_SECS)
            .map_err(VityazError::ModelLoad)?;

        match checkpoint_to_load(&options.model_id, &checkpoints)? {
            Some(title) => {
                let payload = serde_json::json!({ "sd_model_checkpoint": title });
                self.post_json("/sdapi/v1/options", &payload, LOAD_TIMEOUT_SECS, 1)
                    .map_err(VityazError::ModelLoad)?;
            }
            None => tracing::info!(
                model = %options.model_id,
                "no matching checkpoint on the web UI, keeping the active one"
            ),
        }

        self.model_loaded = true;
        Ok(())
    }

    fn generate(&self, request: &ImageRequest) -> Result<DynamicImage> {
        if !self.model_loaded {
            return Err(VityazError::ModelNotLoaded);
        }

        let response = self
            .post_json(
                "/sdapi/v1/txt2img",
                &txt2img_payload(request),
                GENERATE_TIMEOUT_SECS,
                MAX_RETRIES,
            )
            .map_err(VityazError::Generation)?;

        decode_txt2img_response(&response)
    }
}
