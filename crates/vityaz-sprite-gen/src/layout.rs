//! On-disk layout of a sprite run

use crate::catalog::{SpriteCategory, SpriteSpec};
use std::path::{Path, PathBuf};
use vityaz_core::Result;

pub const INDEX_FILE_NAME: &str = "sprites_index.json";

/// Output root (final sprites + index) and the directory for full-size intermediates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_dir: PathBuf,
    temp_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(output_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Create every category directory and the temp directory. Idempotent.
    pub fn ensure(&self) -> Result<()> {
        for category in SpriteCategory::ALL {
            std::fs::create_dir_all(self.output_dir.join(category.dir_name()))?;
        }
        std::fs::create_dir_all(&self.temp_dir)?;
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// `<output>/<name>.png`
    pub fn final_path(&self, spec: &SpriteSpec) -> PathBuf {
        self.output_dir.join(format!("{}.png", spec.name))
    }

    /// `<temp>/<flattened name>_full.png`
    pub fn temp_path(&self, spec: &SpriteSpec) -> PathBuf {
        self.temp_dir
            .join(format!("{}_full.png", spec.flattened_name()))
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(INDEX_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Size;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("vityaz_layout_test_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("out/sprites", "out/tmp");
        let spec = SpriteSpec::new("weapons/pmm", "pistol", "", Size::new(512, 128), Size::new(32, 10));
        assert_eq!(layout.final_path(&spec), PathBuf::from("out/sprites/weapons/pmm.png"));
        assert_eq!(layout.temp_path(&spec), PathBuf::from("out/tmp/weapons_pmm_full.png"));
        assert_eq!(layout.index_path(), PathBuf::from("out/sprites/sprites_index.json"));
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let root = temp_dir();
        let layout = OutputLayout::new(root.join("sprites"), root.join("generated-temp"));

        layout.ensure().unwrap();
        layout.ensure().unwrap();

        for dir in ["characters", "weapons", "effects", "ui"] {
            assert!(root.join("sprites").join(dir).is_dir());
        }
        assert!(root.join("generated-temp").is_dir());
        let entries = std::fs::read_dir(root.join("sprites")).unwrap().count();
        assert_eq!(entries, 4);

        std::fs::remove_dir_all(&root).ok();
    }
}
