//! Sprite validation against the catalog
//!
//! Checks that each catalog entry has a final sprite at its configured output
//! size and a full-size intermediate at its generation size.

use crate::catalog::{SpriteCatalog, SpriteSpec};
use crate::layout::OutputLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vityaz_core::ContentHash;

/// A single validation check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

/// Status of a validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    fn label(self) -> &'static str {
        match self {
            CheckStatus::Pass => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        }
    }
}

/// Validation report for one sprite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub sprite: String,
    pub checks: Vec<ValidationCheck>,
    pub passed: bool,
}

impl ValidationReport {
    /// Count checks by status
    pub fn count_by_status(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Print a formatted summary
    pub fn print_summary(&self) {
        println!("{}", self.sprite);
        for check in &self.checks {
            println!("  {}: {}  {}", check.name, check.detail, check.status.label());
        }
    }
}

/// Validate one sprite's files on disk
pub fn validate_sprite(spec: &SpriteSpec, layout: &OutputLayout) -> ValidationReport {
    let mut checks = Vec::new();

    checks.push(check_image(
        "Sprite",
        &layout.final_path(spec),
        spec.output_size.width,
        spec.output_size.height,
        CheckStatus::Fail,
    ));

    // Intermediates are disposable, so their absence only warns
    checks.push(check_image(
        "Full size",
        &layout.temp_path(spec),
        spec.generation_size.width,
        spec.generation_size.height,
        CheckStatus::Warn,
    ));

    let passed = !checks.iter().any(|c| c.status == CheckStatus::Fail);
    ValidationReport {
        sprite: spec.name.clone(),
        checks,
        passed,
    }
}

/// Validate every sprite of a catalog, in catalog order
pub fn validate_catalog(catalog: &SpriteCatalog, layout: &OutputLayout) -> Vec<ValidationReport> {
    catalog
        .iter()
        .map(|spec| validate_sprite(spec, layout))
        .collect()
}

fn check_image(
    name: &str,
    path: &Path,
    width: u32,
    height: u32,
    missing_status: CheckStatus,
) -> ValidationCheck {
    let (status, detail) = if !path.is_file() {
        (missing_status, format!("{} missing", path.display()))
    } else {
        match image::image_dimensions(path) {
            Ok((w, h)) if (w, h) == (width, height) => match ContentHash::from_file(path) {
                Ok(hash) => (CheckStatus::Pass, format!("{}x{} sha256 {}", w, h, hash)),
                Err(_) => (CheckStatus::Pass, format!("{}x{}", w, h)),
            },
            Ok((w, h)) => (
                missing_status,
                format!("{}x{}, expected {}x{}", w, h, width, height),
            ),
            Err(e) => (missing_status, format!("unreadable: {}", e)),
        }
    };

    ValidationCheck {
        name: name.to_string(),
        status,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Size;
    use image::{Rgba, RgbaImage};

    fn temp_layout() -> (std::path::PathBuf, OutputLayout) {
        let root = std::env::temp_dir().join(format!("vityaz_validate_test_{}", uuid::Uuid::new_v4()));
        let layout = OutputLayout::new(root.join("sprites"), root.join("tmp"));
        layout.ensure().unwrap();
        (root, layout)
    }

    fn pmm() -> SpriteSpec {
        SpriteSpec::new("weapons/pmm", "pistol", "", Size::new(512, 128), Size::new(32, 10))
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_valid_sprite_passes() {
        let (root, layout) = temp_layout();
        let spec = pmm();
        write_png(&layout.final_path(&spec), 32, 10);
        write_png(&layout.temp_path(&spec), 512, 128);

        let report = validate_sprite(&spec, &layout);
        assert!(report.passed);
        assert_eq!(report.count_by_status(CheckStatus::Pass), 2);

        let hash = ContentHash::from_file(layout.final_path(&spec)).unwrap();
        assert_eq!(report.checks[0].detail, format!("32x10 sha256 {}", hash));

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_wrong_size_fails() {
        let (root, layout) = temp_layout();
        let spec = pmm();
        write_png(&layout.final_path(&spec), 64, 64);

        let report = validate_sprite(&spec, &layout);
        assert!(!report.passed);
        assert_eq!(report.count_by_status(CheckStatus::Fail), 1);
        assert!(report.checks[0].detail.contains("expected 32x10"));
        // Missing intermediate is only a warning
        assert_eq!(report.count_by_status(CheckStatus::Warn), 1);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_missing_sprite_fails() {
        let (root, layout) = temp_layout();
        let reports = validate_catalog(&SpriteCatalog::builtin(), &layout);
        assert_eq!(reports.len(), 10);
        assert!(reports.iter().all(|r| !r.passed));

        std::fs::remove_dir_all(&root).ok();
    }
}
