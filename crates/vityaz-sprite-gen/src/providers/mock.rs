//! Mock backend for dry runs and tests
//!
//! Renders a solid-color image of the requested size without any model or
//! network access.

use crate::provider::*;
use image::{DynamicImage, Rgba, RgbaImage};
use vityaz_core::{Result, VityazError};

/// A backend that paints placeholder sprites locally
#[derive(Debug, Default)]
pub struct MockGenerator {
    loaded: Option<ModelOptions>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options passed to the last `load_model` call
    pub fn loaded_model(&self) -> Option<&ModelOptions> {
        self.loaded.as_ref()
    }
}

impl ImageGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        Ok(ProviderStatus::Available)
    }

    fn load_model(&mut self, options: &ModelOptions) -> Result<()> {
        tracing::debug!(model = %options.model_id, device = %options.device, "mock model loaded");
        self.loaded = Some(options.clone());
        Ok(())
    }

    fn generate(&self, request: &ImageRequest) -> Result<DynamicImage> {
        if self.loaded.is_none() {
            return Err(VityazError::ModelNotLoaded);
        }
        if request.width == 0 || request.height == 0 {
            return Err(VityazError::Generation(format!(
                "cannot render a {}x{} image",
                request.width, request.height
            )));
        }

        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            request.width,
            request.height,
            prompt_color(&request.prompt),
        )))
    }
}

/// Stable color from the prompt so different sprites are told apart at a glance
fn prompt_color(prompt: &str) -> Rgba<u8> {
    let hash_val = prompt
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    let r = ((hash_val >> 16) & 0xFF) as u8;
    let g = ((hash_val >> 8) & 0xFF) as u8;
    let b = (hash_val & 0xFF) as u8;
    Rgba([r, g, b, 255])
}
