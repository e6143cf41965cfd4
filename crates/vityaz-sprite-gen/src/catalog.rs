//! Sprite catalog
//!
//! The catalog is the ordered list of sprites a run produces. It is either the
//! built-in VITYAZ set or a `*.catalog.toml` file:
//!
//! ```toml
//! [style]
//! prompt_suffix = "top-down pixel art game sprite"
//!
//! [[sprite]]
//! name = "weapons/pmm"
//! prompt = "Makarov PMM pistol, side profile view"
//! negative_prompt = "large, rifle, blurry"
//! size = [512, 128]
//! resize = [32, 10]
//! ```

use crate::style::StylePreset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use vityaz_core::{Result, VityazError};

/// Top-level sprite directory a sprite belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpriteCategory {
    Characters,
    Weapons,
    Effects,
    Ui,
}

impl SpriteCategory {
    pub const ALL: [SpriteCategory; 4] = [
        SpriteCategory::Characters,
        SpriteCategory::Weapons,
        SpriteCategory::Effects,
        SpriteCategory::Ui,
    ];

    /// Directory name under the output root
    pub fn dir_name(self) -> &'static str {
        match self {
            SpriteCategory::Characters => "characters",
            SpriteCategory::Weapons => "weapons",
            SpriteCategory::Effects => "effects",
            SpriteCategory::Ui => "ui",
        }
    }

    pub fn from_dir_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.dir_name() == s)
    }
}

impl fmt::Display for SpriteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Pixel dimensions, written as `[width, height]` in catalog files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// True when both dimensions are no larger than `other`'s
    pub fn fits_within(&self, other: Size) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Size> for [u32; 2] {
    fn from(size: Size) -> Self {
        [size.width, size.height]
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn default_output_size() -> Size {
    Size::new(64, 64)
}

/// One sprite to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSpec {
    /// Relative output path without extension, e.g. `characters/player_idle`
    pub name: String,
    /// Positive prompt
    pub prompt: String,
    /// Things the model should avoid
    #[serde(default, alias = "negative")]
    pub negative_prompt: String,
    /// Size the model renders at
    #[serde(rename = "size")]
    pub generation_size: Size,
    /// Size of the stored sprite
    #[serde(rename = "resize", default = "default_output_size")]
    pub output_size: Size,
}

impl SpriteSpec {
    pub fn new(
        name: &str,
        prompt: &str,
        negative_prompt: &str,
        generation_size: Size,
        output_size: Size,
    ) -> Self {
        Self {
            name: name.to_string(),
            prompt: prompt.to_string(),
            negative_prompt: negative_prompt.to_string(),
            generation_size,
            output_size,
        }
    }

    /// Category from the first path segment, if it names a known one
    pub fn category(&self) -> Option<SpriteCategory> {
        self.name
            .split_once('/')
            .and_then(|(dir, _)| SpriteCategory::from_dir_name(dir))
    }

    /// Final file name without the category directory (`pmm.png`)
    pub fn file_name(&self) -> String {
        let stem = self.name.rsplit('/').next().unwrap_or(&self.name);
        format!("{}.png", stem)
    }

    /// Name with path separators flattened, used for intermediate files
    pub fn flattened_name(&self) -> String {
        self.name.replace('/', "_")
    }

    /// Check the invariants of a single entry
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| VityazError::InvalidSprite {
            name: self.name.clone(),
            reason,
        };

        let Some((dir, stem)) = self.name.split_once('/') else {
            return Err(invalid(
                "name must be '<category>/<sprite>' (e.g. weapons/pmm)".to_string(),
            ));
        };

        if SpriteCategory::from_dir_name(dir).is_none() {
            return Err(invalid(format!(
                "unknown category '{}'; expected one of: characters, weapons, effects, ui",
                dir
            )));
        }

        if stem.is_empty()
            || stem.contains('/')
            || stem == ".."
            || !stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid(format!(
                "sprite name '{}' may only use ASCII letters, digits, '_' and '-'",
                stem
            )));
        }

        if self.prompt.trim().is_empty() {
            return Err(invalid("prompt is empty".to_string()));
        }

        if !self.generation_size.is_positive() {
            return Err(invalid(format!(
                "generation size {} must be positive",
                self.generation_size
            )));
        }

        if !self.output_size.is_positive() {
            return Err(invalid(format!(
                "output size {} must be positive",
                self.output_size
            )));
        }

        Ok(())
    }
}

/// TOML wrapper
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<StylePreset>,
    #[serde(default, rename = "sprite")]
    sprites: Vec<SpriteSpec>,
}

/// Ordered set of sprites plus an optional shared style
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteCatalog {
    pub style: Option<StylePreset>,
    sprites: Vec<SpriteSpec>,
}

impl SpriteCatalog {
    /// Build a catalog from specs, validating every entry
    pub fn new(sprites: Vec<SpriteSpec>, style: Option<StylePreset>) -> Result<Self> {
        let catalog = Self { style, sprites };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load and validate a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            VityazError::TomlParse(msg) => VityazError::Catalog(format!(
                "Failed to parse catalog {}: {}",
                path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let sprites = file
            .sprites
            .into_iter()
            .map(|mut spec| {
                spec.prompt = collapse_whitespace(&spec.prompt);
                spec.negative_prompt = collapse_whitespace(&spec.negative_prompt);
                spec
            })
            .collect();
        Self::new(sprites, file.style)
    }

    /// Serialize back to the catalog file format
    pub fn to_toml(&self) -> Result<String> {
        let file = CatalogFile {
            style: self.style.clone(),
            sprites: self.sprites.clone(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sprites.is_empty() {
            return Err(VityazError::Catalog(
                "catalog contains no sprites".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.sprites {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(VityazError::Catalog(format!(
                    "duplicate sprite name '{}'",
                    spec.name
                )));
            }
            if !spec.output_size.fits_within(spec.generation_size) {
                tracing::warn!(
                    sprite = %spec.name,
                    generation = %spec.generation_size,
                    output = %spec.output_size,
                    "output size is larger than generation size; sprite will be upscaled"
                );
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpriteSpec> {
        self.sprites.iter()
    }

    pub fn get(&self, name: &str) -> Option<&SpriteSpec> {
        self.sprites.iter().find(|s| s.name == name)
    }

    /// File names of every sprite in a category, in catalog order
    pub fn file_names(&self, category: SpriteCategory) -> Vec<String> {
        self.sprites
            .iter()
            .filter(|s| s.category() == Some(category))
            .map(|s| s.file_name())
            .collect()
    }

    /// Keep only the named sprites, preserving catalog order
    pub fn select(&self, names: &[String]) -> Result<Self> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(VityazError::Catalog(format!(
                "sprite '{}' is not in the catalog",
                unknown
            )));
        }
        let sprites = self
            .sprites
            .iter()
            .filter(|s| names.contains(&s.name))
            .cloned()
            .collect();
        Self::new(sprites, self.style.clone())
    }

    /// The VITYAZ: Special Operations sprite set
    pub fn builtin() -> Self {
        const CHARACTER: Size = Size::new(512, 512);
        const WEAPON: Size = Size::new(512, 128);

        let sprites = vec![
            SpriteSpec::new(
                "characters/player_idle",
                "Russian Vityaz special forces operator standing alert, maroon crimson beret on LEFT side of head, \
                 dark green tactical camouflage uniform, military vest with equipment, professional soldier, combat boots, \
                 top-down 2D game view, pixel art style, simple but detailed, clean edges, vibrant colors, game sprite",
                "blurry, low quality, distorted, realistic photo, 3d render",
                CHARACTER,
                Size::new(64, 64),
            ),
            SpriteSpec::new(
                "characters/player_walk_down",
                "Vityaz soldier walking forward motion, maroon beret left side, green tactical uniform, \
                 legs in walking pose, arms swinging, top-down view, pixel art game sprite, motion frame, clean design",
                "static, standing, blurry, low quality",
                CHARACTER,
                Size::new(64, 64),
            ),
            SpriteSpec::new(
                "characters/player_walk_up",
                "Vityaz soldier walking away upward, maroon beret visible, green uniform, \
                 walking motion from behind, top-down pixel art sprite",
                "blurry, low quality, facing forward",
                CHARACTER,
                Size::new(64, 64),
            ),
            SpriteSpec::new(
                "characters/enemy_basic",
                "Hostile red military soldier, aggressive stance, gray combat helmet, red crimson colored uniform, \
                 tactical gear, enemy character, top-down view, pixel art game sprite, clear distinct design",
                "friendly, green uniform, blurry, low quality",
                CHARACTER,
                Size::new(56, 56),
            ),
            SpriteSpec::new(
                "characters/enemy_armed",
                "Red soldier holding rifle weapon, combat pose, gray helmet, red military uniform, armed enemy, \
                 aggressive posture, top-down pixel art sprite, game enemy character",
                "unarmed, friendly, blurry",
                CHARACTER,
                Size::new(56, 56),
            ),
            SpriteSpec::new(
                "characters/enemy_heavy",
                "Heavy armored enemy soldier, thick metal body armor plating, large intimidating build, \
                 machine gun weapon, gray brown armor, menacing boss character, top-down pixel art, detailed armor",
                "small, weak, light armor, blurry",
                CHARACTER,
                Size::new(64, 64),
            ),
            SpriteSpec::new(
                "weapons/ak74m",
                "AK-74M assault rifle weapon sprite, wooden light brown stock, dark metal barrel and receiver, \
                 muzzle brake, military design, side view profile, pixel art weapon, clean edges, game asset",
                "blurry, distorted, modern rifle, AR-15",
                WEAPON,
                Size::new(48, 12),
            ),
            SpriteSpec::new(
                "weapons/svd",
                "SVD Dragunov sniper rifle, long precision barrel, wooden furniture, scope mounting rails, \
                 professional sniper weapon, side view, pixel art sprite, detailed but simple, military green brown",
                "short barrel, assault rifle, blurry",
                WEAPON,
                Size::new(56, 14),
            ),
            SpriteSpec::new(
                "weapons/rpk74",
                "RPK-74 light machine gun, heavy barrel, bipod legs, large ammunition capacity, light brown wood stock, \
                 side view weapon sprite, pixel art, military design",
                "pistol, small weapon, blurry",
                WEAPON,
                Size::new(56, 14),
            ),
            SpriteSpec::new(
                "weapons/pmm",
                "Makarov PMM pistol, compact Soviet handgun, dark metal slide, small sidearm, side profile view, \
                 pixel art weapon sprite, simple clean design, military sidearm",
                "large, rifle, blurry, modern pistol",
                WEAPON,
                Size::new(32, 10),
            ),
        ];

        Self {
            style: None,
            sprites,
        }
    }
}

impl<'a> IntoIterator for &'a SpriteCatalog {
    type Item = &'a SpriteSpec;
    type IntoIter = std::slice::Iter<'a, SpriteSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.sprites.iter()
    }
}

/// Collapse runs of whitespace (multi-line TOML strings) into single spaces
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
