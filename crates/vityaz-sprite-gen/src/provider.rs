//! Image generator trait and request types
//!
//! The diffusion model is an opaque capability: text in, one image out. Batch
//! orchestration only ever talks to [`ImageGenerator`], so backends can be
//! swapped without touching it.

use crate::device::Device;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use vityaz_core::Result;

pub const DEFAULT_STEPS: u32 = 50;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;

/// Sampler settings shared by every sprite in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceParams {
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
    /// Fixed seed for reproducible runs; random when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_steps() -> u32 {
    DEFAULT_STEPS
}

fn default_guidance_scale() -> f32 {
    DEFAULT_GUIDANCE_SCALE
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            seed: None,
        }
    }
}

/// One text-to-image call
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub guidance_scale: f32,
    pub seed: Option<u64>,
}

/// Which pretrained pipeline to load and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOptions {
    pub model_id: String,
    pub device: Device,
    /// Trade speed for memory during attention
    pub attention_slicing: bool,
}

impl ModelOptions {
    /// Attention slicing is only worth it on the accelerated device
    pub fn new(model_id: &str, device: Device, allow_attention_slicing: bool) -> Self {
        Self {
            model_id: model_id.to_string(),
            device,
            attention_slicing: allow_attention_slicing && device.is_accelerated(),
        }
    }
}

/// Status returned by a backend health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Available,
    Unavailable(String),
    NoApiKey,
}

/// Trait implemented by each image backend (Stable Diffusion web API, Mock)
pub trait ImageGenerator {
    /// Backend name (e.g. "stable-diffusion", "mock")
    fn name(&self) -> &str;

    /// Check that the backend can be reached before any work starts
    fn health_check(&self) -> Result<ProviderStatus>;

    /// Load the pretrained pipeline; must succeed before `generate`
    fn load_model(&mut self, options: &ModelOptions) -> Result<()>;

    /// Run one inference and return the first image produced
    fn generate(&self, request: &ImageRequest) -> Result<DynamicImage>;
}

impl<G: ImageGenerator + ?Sized> ImageGenerator for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        (**self).health_check()
    }

    fn load_model(&mut self, options: &ModelOptions) -> Result<()> {
        (**self).load_model(options)
    }

    fn generate(&self, request: &ImageRequest) -> Result<DynamicImage> {
        (**self).generate(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attention_slicing_only_on_cuda() {
        let gpu = ModelOptions::new("sd15", Device::Cuda, true);
        assert!(gpu.attention_slicing);

        let cpu = ModelOptions::new("sd15", Device::Cpu, true);
        assert!(!cpu.attention_slicing);

        let disabled = ModelOptions::new("sd15", Device::Cuda, false);
        assert!(!disabled.attention_slicing);
    }

    #[test]
    fn test_inference_defaults() {
        let params = InferenceParams::default();
        assert_eq!(params.steps, 50);
        assert_eq!(params.guidance_scale, 7.5);
        assert_eq!(params.seed, None);
    }
}
