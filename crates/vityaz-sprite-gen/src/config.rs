//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `VITYAZ_SD_API_URL`, `VITYAZ_SD_API_KEY`, `VITYAZ_DEVICE`
//! 2. Project-local: `.vityaz/config.toml`
//! 3. Global: `~/.vityaz/config.toml`
//!
//! Files are merged table by table, so a project file only needs the keys it
//! changes.

use crate::device::DevicePreference;
use crate::provider::InferenceParams;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vityaz_core::{Result, VityazError};

pub const DEFAULT_OUTPUT_DIR: &str = "frontend/src/assets/graphics/sprites";
pub const DEFAULT_TEMP_DIR: &str = "frontend/src/assets/generated-temp";
pub const DEFAULT_MODEL_ID: &str = "runwayml/stable-diffusion-v1-5";
pub const DEFAULT_PROVIDER: &str = "stable-diffusion";

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Where sprites, intermediates and the catalog live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// External catalog file; the built-in catalog is used when unset
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
            catalog: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TEMP_DIR)
}

/// Which pretrained pipeline to load and how
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub device: DevicePreference,
    /// Attention slicing on accelerated devices
    #[serde(default = "default_true")]
    pub attention_slicing: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            device: DevicePreference::Auto,
            attention_slicing: true,
        }
    }
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

/// Generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
        }
    }
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

/// Resolved configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VityazConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub inference: InferenceParams,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl VityazConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut merged = toml::Table::new();

        // Layer 1: Global config (~/.vityaz/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                merge_tables(&mut merged, Self::load_table(&global_path)?);
            }
        }

        // Layer 2: Project-local config (.vityaz/config.toml)
        let local_path = PathBuf::from(".vityaz/config.toml");
        if local_path.exists() {
            merge_tables(&mut merged, Self::load_table(&local_path)?);
        }

        Self::finish(merged)
    }

    /// Load config from a specific file path only, then apply env overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::finish(Self::load_table(path)?)
    }

    /// Get API key for a provider
    pub fn api_key(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_key.as_deref())
    }

    /// Get API URL for a provider
    pub fn api_url(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_url.as_deref())
    }

    /// Check if a provider is enabled
    pub fn is_enabled(&self, provider_name: &str) -> bool {
        self.providers
            .get(provider_name)
            .map(|p| p.enabled)
            .unwrap_or(true)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".vityaz").join("config.toml"))
    }

    fn load_table(path: &Path) -> Result<toml::Table> {
        let content = std::fs::read_to_string(path)?;
        content.parse::<toml::Table>().map_err(|e| {
            VityazError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn finish(table: toml::Table) -> Result<Self> {
        let mut config: VityazConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| VityazError::Config(e.to_string()))?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env("VITYAZ_SD_API_URL") {
            let entry = self.providers.entry(DEFAULT_PROVIDER.to_string()).or_default();
            entry.api_url = Some(url);
        }
        if let Some(key) = env("VITYAZ_SD_API_KEY") {
            let entry = self.providers.entry(DEFAULT_PROVIDER.to_string()).or_default();
            entry.api_key = Some(key);
        }
        if let Some(device) = env("VITYAZ_DEVICE") {
            match device.trim().to_ascii_lowercase().as_str() {
                "auto" => self.model.device = DevicePreference::Auto,
                "cuda" | "gpu" => self.model.device = DevicePreference::Cuda,
                "cpu" => self.model.device = DevicePreference::Cpu,
                other => tracing::warn!("ignoring VITYAZ_DEVICE='{}'", other),
            }
        }
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, other values replace
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vityaz_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = VityazConfig::default();
        assert_eq!(config.paths.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.paths.temp_dir, PathBuf::from(DEFAULT_TEMP_DIR));
        assert_eq!(config.model.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.model.device, DevicePreference::Auto);
        assert!(config.model.attention_slicing);
        assert_eq!(config.inference.steps, 50);
        assert_eq!(config.inference.guidance_scale, 7.5);
        assert_eq!(config.generation.provider, "stable-diffusion");
    }

    #[test]
    fn test_load_config_from_file() {
        let config_str = r#"
[paths]
output_dir = "assets/sprites"
catalog = "sprites.catalog.toml"

[model]
device = "cpu"

[inference]
steps = 30
seed = 1234

[generation]
provider = "mock"

[providers.stable-diffusion]
api_url = "http://gpu-box:7860"
enabled = false
"#;
        let path = temp_config(config_str);
        let table = VityazConfig::load_table(&path).unwrap();
        let mut config: VityazConfig = toml::Value::Table(table).try_into().unwrap();
        config.apply_env_overrides(no_env);

        assert_eq!(config.paths.output_dir, PathBuf::from("assets/sprites"));
        assert_eq!(config.paths.temp_dir, PathBuf::from(DEFAULT_TEMP_DIR));
        assert_eq!(
            config.paths.catalog,
            Some(PathBuf::from("sprites.catalog.toml"))
        );
        assert_eq!(config.model.device, DevicePreference::Cpu);
        assert_eq!(config.model.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.inference.steps, 30);
        assert_eq!(config.inference.guidance_scale, 7.5);
        assert_eq!(config.inference.seed, Some(1234));
        assert_eq!(config.generation.provider, "mock");
        assert_eq!(config.api_url("stable-diffusion"), Some("http://gpu-box:7860"));
        assert!(!config.is_enabled("stable-diffusion"));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_merge_tables_overlays_nested_keys() {
        let mut base: toml::Table = r#"
[paths]
output_dir = "global/out"
temp_dir = "global/tmp"
"#
        .parse()
        .unwrap();
        let overlay: toml::Table = r#"
[paths]
output_dir = "project/out"
"#
        .parse()
        .unwrap();

        merge_tables(&mut base, overlay);
        let config: VityazConfig = toml::Value::Table(base).try_into().unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("project/out"));
        assert_eq!(config.paths.temp_dir, PathBuf::from("global/tmp"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = VityazConfig::default();
        config.apply_env_overrides(|key| match key {
            "VITYAZ_SD_API_URL" => Some("http://127.0.0.1:7861".to_string()),
            "VITYAZ_SD_API_KEY" => Some("secret".to_string()),
            "VITYAZ_DEVICE" => Some("cpu".to_string()),
            _ => None,
        });

        assert_eq!(config.api_url("stable-diffusion"), Some("http://127.0.0.1:7861"));
        assert_eq!(config.api_key("stable-diffusion"), Some("secret"));
        assert_eq!(config.model.device, DevicePreference::Cpu);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let path = temp_config("[paths\noutput_dir = 1");
        let err = VityazConfig::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_missing_provider_returns_none() {
        let config = VityazConfig::default();
        assert_eq!(config.api_key("nonexistent"), None);
        assert!(config.is_enabled("nonexistent"));
    }
}
