//! Error types for the sprite tooling

use thiserror::Error;

/// The main error type for Vityaz operations
#[derive(Debug, Error)]
pub enum VityazError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid sprite '{name}': {reason}")]
    InvalidSprite { name: String, reason: String },

    #[error("Generator '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Model not loaded; call initialize_model first")]
    ModelNotLoaded,

    #[error("Generation error: {0}")]
    Generation(String),
}

/// Result type alias for Vityaz operations
pub type Result<T> = std::result::Result<T, VityazError>;

impl From<toml::de::Error> for VityazError {
    fn from(err: toml::de::Error) -> Self {
        VityazError::TomlParse(err.to_string())
    }
}

impl From<toml::ser::Error> for VityazError {
    fn from(err: toml::ser::Error) -> Self {
        VityazError::TomlSer(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sprite_message() {
        let err = VityazError::InvalidSprite {
            name: "weapons/pmm".to_string(),
            reason: "output size must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid sprite 'weapons/pmm': output size must be positive"
        );
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("name = ");
        let err: VityazError = parse.unwrap_err().into();
        assert!(matches!(err, VityazError::TomlParse(_)));
    }
}
