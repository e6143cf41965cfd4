//! Vityaz Sprite Gen - diffusion-driven pixel-art sprite pipeline
//!
//! Renders each sprite of a catalog through a pluggable image generator
//! (a Stable Diffusion web API, or an offline mock), keeps the full-size
//! intermediate, downsamples to the final sprite size and writes
//! `sprites_index.json` for the game client.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod device;
pub mod layout;
pub mod manifest;
pub mod provider;
pub mod providers;
pub mod style;
pub mod validate;

pub use batch::{GenerationResult, RunReport, SpriteBatchGenerator, SpriteFailure, SpriteOutcome};
pub use catalog::{Size, SpriteCatalog, SpriteCategory, SpriteSpec};
pub use config::VityazConfig;
pub use device::{Device, DevicePreference};
pub use layout::OutputLayout;
pub use manifest::SpriteIndex;
pub use provider::{
    ImageGenerator, ImageRequest, InferenceParams, ModelOptions, ProviderStatus,
};
pub use style::StylePreset;
