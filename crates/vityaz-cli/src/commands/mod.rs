//! CLI command implementations

pub mod catalog;
pub mod generate;
pub mod index;
pub mod verify;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vityaz_sprite_gen::{OutputLayout, SpriteCatalog, VityazConfig};

/// Catalog and directory overrides shared by several commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SpriteArgs {
    /// Sprite catalog file (defaults to the built-in set)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Directory for final sprites and the index
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for full-size intermediates
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,
}

impl SpriteArgs {
    pub fn layout(&self, config: &VityazConfig) -> OutputLayout {
        OutputLayout::new(
            self.output_dir
                .clone()
                .unwrap_or_else(|| config.paths.output_dir.clone()),
            self.temp_dir
                .clone()
                .unwrap_or_else(|| config.paths.temp_dir.clone()),
        )
    }

    pub fn catalog(&self, config: &VityazConfig) -> Result<SpriteCatalog> {
        load_catalog(self.catalog.as_deref(), config)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<VityazConfig> {
    match path {
        Some(p) => VityazConfig::load_from_file(p)
            .with_context(|| format!("loading config {}", p.display())),
        None => Ok(VityazConfig::load()?),
    }
}

/// Catalog from the flag, then from config, then the built-in set
pub fn load_catalog(path: Option<&Path>, config: &VityazConfig) -> Result<SpriteCatalog> {
    match path.or(config.paths.catalog.as_deref()) {
        Some(p) => Ok(SpriteCatalog::load(p)?),
        None => Ok(SpriteCatalog::builtin()),
    }
}
