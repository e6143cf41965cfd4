//! Sprite index (`sprites_index.json`)
//!
//! The index declares the sprite files the game should expect, grouped by
//! category. The category lists always describe the whole catalog, so the
//! document keeps the same shape whatever a run produced; only `generated`
//! changes. Per-sprite failures live in `RunReport`, not here.

use crate::batch::RunReport;
use crate::catalog::{SpriteCatalog, SpriteCategory};
use crate::layout::OutputLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vityaz_core::Result;

/// Contents of `sprites_index.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteIndex {
    /// Number of sprites written, as a decimal string
    pub generated: String,
    pub characters: Vec<String>,
    pub weapons: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ui: Vec<String>,
}

impl SpriteIndex {
    /// Index declaring every sprite of `catalog`
    pub fn from_catalog(catalog: &SpriteCatalog, generated: usize) -> Self {
        Self {
            generated: generated.to_string(),
            characters: catalog.file_names(SpriteCategory::Characters),
            weapons: catalog.file_names(SpriteCategory::Weapons),
            effects: catalog.file_names(SpriteCategory::Effects),
            ui: catalog.file_names(SpriteCategory::Ui),
        }
    }

    /// Index for a finished run. `catalog` is the full declared set, which
    /// may be larger than the sprites the run attempted.
    pub fn from_run(catalog: &SpriteCatalog, report: &RunReport) -> Self {
        Self::from_catalog(catalog, report.succeeded())
    }

    /// Index rebuilt from the sprites currently on disk
    pub fn from_disk(catalog: &SpriteCatalog, layout: &OutputLayout) -> Self {
        let present = catalog
            .iter()
            .filter(|spec| layout.final_path(spec).is_file())
            .count();
        Self::from_catalog(catalog, present)
    }

    /// Parsed `generated` count
    pub fn generated_count(&self) -> Option<usize> {
        self.generated.parse().ok()
    }

    /// Every file listed, with its category directory
    pub fn all_files(&self) -> Vec<String> {
        [
            (SpriteCategory::Characters, &self.characters),
            (SpriteCategory::Weapons, &self.weapons),
            (SpriteCategory::Effects, &self.effects),
            (SpriteCategory::Ui, &self.ui),
        ]
        .into_iter()
        .flat_map(|(category, files)| files.iter().map(move |f| format!("{}/{}", category, f)))
        .collect()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the index, replacing any previous one
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SpriteFailure;
    use crate::catalog::{Size, SpriteSpec};

    fn temp_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "vityaz_manifest_test_{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn two_sprite_catalog() -> SpriteCatalog {
        SpriteCatalog::new(
            vec![
                SpriteSpec::new("weapons/pmm", "pistol", "", Size::new(512, 128), Size::new(32, 10)),
                SpriteSpec::new(
                    "characters/enemy_basic",
                    "red soldier",
                    "",
                    Size::new(512, 512),
                    Size::new(56, 56),
                ),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_builtin_index_lists_full_catalog() {
        let index = SpriteIndex::from_catalog(&SpriteCatalog::builtin(), 0);
        assert_eq!(index.generated, "0");
        assert_eq!(
            index.characters,
            vec![
                "player_idle.png",
                "player_walk_down.png",
                "player_walk_up.png",
                "enemy_basic.png",
                "enemy_armed.png",
                "enemy_heavy.png"
            ]
        );
        assert_eq!(index.weapons, vec!["ak74m.png", "svd.png", "rpk74.png", "pmm.png"]);
        assert!(index.effects.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let index = SpriteIndex::from_catalog(&two_sprite_catalog(), 1);
        let value: serde_json::Value = serde_json::to_value(&index).unwrap();

        assert_eq!(value["generated"], "1");
        assert_eq!(value["characters"], serde_json::json!(["enemy_basic.png"]));
        assert_eq!(value["weapons"], serde_json::json!(["pmm.png"]));
        assert!(value.get("effects").is_none());
        assert!(value.get("ui").is_none());
    }

    fn keys(index: &SpriteIndex) -> Vec<String> {
        let value = serde_json::to_value(index).unwrap();
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_failures_do_not_change_index_shape() {
        let catalog = SpriteCatalog::builtin();
        let clean = RunReport {
            total: 10,
            ..Default::default()
        };
        let with_failure = RunReport {
            total: 10,
            results: vec![],
            failures: vec![SpriteFailure {
                name: "weapons/svd".to_string(),
                error: "CUDA out of memory".to_string(),
            }],
        };

        let ok = SpriteIndex::from_run(&catalog, &clean);
        let bad = SpriteIndex::from_run(&catalog, &with_failure);
        assert_eq!(keys(&ok), vec!["characters", "generated", "weapons"]);
        assert_eq!(keys(&ok), keys(&bad));
        assert_eq!(bad.weapons, vec!["ak74m.png", "svd.png", "rpk74.png", "pmm.png"]);
        assert_eq!(bad.characters.len(), 6);
    }

    #[test]
    fn test_save_overwrites_and_loads() {
        let dir = temp_dir();
        let path = dir.join("sprites_index.json");
        std::fs::write(&path, "stale").unwrap();

        let index = SpriteIndex::from_catalog(&two_sprite_catalog(), 2);
        index.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("  \"generated\": \"2\""));

        let loaded = SpriteIndex::load(&path).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded.generated_count(), Some(2));
        assert_eq!(
            loaded.all_files(),
            vec!["characters/enemy_basic.png", "weapons/pmm.png"]
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_from_disk() {
        let dir = temp_dir();
        let layout = OutputLayout::new(dir.join("sprites"), dir.join("tmp"));
        layout.ensure().unwrap();
        std::fs::write(dir.join("sprites/weapons/pmm.png"), b"png").unwrap();

        let index = SpriteIndex::from_disk(&two_sprite_catalog(), &layout);
        assert_eq!(index.generated, "1");
        assert_eq!(index.characters, vec!["enemy_basic.png"]);
        assert_eq!(index.weapons, vec!["pmm.png"]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
