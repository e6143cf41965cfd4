//! Catalog-wide style presets
//!
//! A preset adds shared wording to every sprite prompt in a catalog so the
//! whole set keeps one look (top-down view, pixel art, palette).

use serde::{Deserialize, Serialize};

/// Shared prompt wording applied to every sprite of a catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylePreset {
    /// Prepended to every prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_prefix: Option<String>,
    /// Appended to every prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_suffix: Option<String>,
    /// Joined onto each sprite's own negative prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Color palette as hex strings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<String>,
}

impl StylePreset {
    /// Enrich a sprite prompt with the preset wording
    pub fn enrich_prompt(&self, base_prompt: &str) -> String {
        let mut parts = Vec::new();

        if let Some(ref prefix) = self.prompt_prefix {
            parts.push(prefix.clone());
        }

        parts.push(base_prompt.to_string());

        if !self.palette.is_empty() {
            parts.push(format!("color palette {}", self.palette.join(" ")));
        }

        if let Some(ref suffix) = self.prompt_suffix {
            parts.push(suffix.clone());
        }

        parts.retain(|p| !p.trim().is_empty());
        parts.join(", ")
    }

    /// Combine a sprite's negative prompt with the preset's
    pub fn merge_negative(&self, sprite_negative: &str) -> String {
        match self.negative_prompt.as_deref() {
            Some(shared) if !shared.trim().is_empty() => {
                if sprite_negative.trim().is_empty() {
                    shared.to_string()
                } else {
                    format!("{}, {}", sprite_negative, shared)
                }
            }
            _ => sprite_negative.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_prompt() {
        let style = StylePreset {
            prompt_prefix: Some("16-bit".to_string()),
            prompt_suffix: Some("top-down pixel art game sprite".to_string()),
            negative_prompt: None,
            palette: vec!["#6B1E1E".to_string(), "#3B4A2F".to_string()],
        };

        let enriched = style.enrich_prompt("Makarov PMM pistol");
        assert_eq!(
            enriched,
            "16-bit, Makarov PMM pistol, color palette #6B1E1E #3B4A2F, top-down pixel art game sprite"
        );
    }

    #[test]
    fn test_empty_preset_is_identity() {
        let style = StylePreset::default();
        assert_eq!(style.enrich_prompt("SVD Dragunov"), "SVD Dragunov");
        assert_eq!(style.merge_negative("blurry"), "blurry");
    }

    #[test]
    fn test_merge_negative() {
        let style = StylePreset {
            negative_prompt: Some("realistic photo, 3d render".to_string()),
            ..Default::default()
        };
        assert_eq!(
            style.merge_negative("blurry"),
            "blurry, realistic photo, 3d render"
        );
        assert_eq!(style.merge_negative(""), "realistic photo, 3d render");
    }
}
