//! Backend registry
//!
//! Maps backend names to concrete implementations.

pub mod mock;
pub mod stable_diffusion;

use crate::config::VityazConfig;
use crate::provider::{ImageGenerator, ProviderStatus};
use vityaz_core::{Result, VityazError};

/// Create a backend by name with configuration
pub fn create_provider(name: &str, config: &VityazConfig) -> Result<Box<dyn ImageGenerator>> {
    if !config.is_enabled(name) {
        return Err(VityazError::Config(format!(
            "Backend '{}' is disabled in config",
            name
        )));
    }

    match name {
        "mock" => Ok(Box::new(mock::MockGenerator::new())),
        "stable-diffusion" => Ok(Box::new(
            stable_diffusion::StableDiffusionProvider::from_config(config),
        )),
        _ => Err(VityazError::Config(format!(
            "Unknown backend '{}'. Available: {}",
            name,
            available_providers().join(", ")
        ))),
    }
}

/// Fail with `ProviderUnavailable` unless the backend reports itself usable
pub fn ensure_available<G: ImageGenerator + ?Sized>(generator: &G) -> Result<()> {
    let reason = match generator.health_check()? {
        ProviderStatus::Available => return Ok(()),
        ProviderStatus::NoApiKey => "an API key is required".to_string(),
        ProviderStatus::Unavailable(reason) => reason,
    };
    Err(VityazError::ProviderUnavailable {
        provider: generator.name().to_string(),
        reason,
    })
}

/// List all backend names
pub fn available_providers() -> Vec<&'static str> {
    vec!["stable-diffusion", "mock"]
}
