//! Batch sprite generation
//!
//! Runs every catalog entry through the image generator in catalog order:
//! render at generation size, keep the full-size intermediate, downsample with
//! Lanczos to the sprite size and write the final PNG. A failing sprite is
//! reported and skipped; it never stops the batch.

use crate::catalog::{Size, SpriteCatalog, SpriteSpec};
use crate::device::Device;
use crate::layout::OutputLayout;
use crate::manifest::SpriteIndex;
use crate::provider::{ImageGenerator, ImageRequest, InferenceParams, ModelOptions};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::PathBuf;
use std::time::Instant;
use vityaz_core::{ContentHash, Result, VityazError};

/// Outcome of one successfully written sprite
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub name: String,
    pub final_path: PathBuf,
    pub temp_path: PathBuf,
    pub output_size: Size,
    /// Size of the final PNG in bytes
    pub file_size: u64,
    pub content_hash: ContentHash,
    pub duration_secs: f64,
}

impl GenerationResult {
    pub fn size_kb(&self) -> f64 {
        self.file_size as f64 / 1024.0
    }
}

/// A sprite that could not be produced
#[derive(Debug, Clone)]
pub struct SpriteFailure {
    pub name: String,
    pub error: String,
}

/// What happened to one sprite
#[derive(Debug, Clone)]
pub enum SpriteOutcome {
    Generated(GenerationResult),
    Failed(SpriteFailure),
}

impl SpriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SpriteOutcome::Generated(_))
    }
}

/// Result of a whole batch
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub total: usize,
    pub results: Vec<GenerationResult>,
    pub failures: Vec<SpriteFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    /// The `Успешно: X/Y` line printed after a batch
    pub fn summary_line(&self) -> String {
        format!("Успешно: {}/{}", self.succeeded(), self.total)
    }
}

/// Drives one image generator over a sprite catalog
pub struct SpriteBatchGenerator<G: ImageGenerator> {
    generator: G,
    catalog: SpriteCatalog,
    /// Subset to render; the index still declares the whole catalog
    selection: Option<SpriteCatalog>,
    layout: OutputLayout,
    inference: InferenceParams,
    device: Device,
    model_ready: bool,
    generated_count: usize,
}

impl<G: ImageGenerator> SpriteBatchGenerator<G> {
    /// Create the output tree and pick a device. Directory creation is idempotent.
    pub fn new(generator: G, catalog: SpriteCatalog, layout: OutputLayout) -> Result<Self> {
        layout.ensure()?;
        Ok(Self {
            generator,
            catalog,
            selection: None,
            layout,
            inference: InferenceParams::default(),
            device: Device::detect(),
            model_ready: false,
            generated_count: 0,
        })
    }

    pub fn with_inference(mut self, inference: InferenceParams) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Render only `selection` (usually from `SpriteCatalog::select`)
    pub fn with_selection(mut self, selection: SpriteCatalog) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn catalog(&self) -> &SpriteCatalog {
        &self.catalog
    }

    /// The sprites `generate_all` renders
    pub fn pending(&self) -> &SpriteCatalog {
        self.selection.as_ref().unwrap_or(&self.catalog)
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Sprites written successfully since construction
    pub fn generated_count(&self) -> usize {
        self.generated_count
    }

    /// Load the pretrained pipeline on the selected device.
    ///
    /// Callers treat an error here as fatal: nothing can be generated
    /// without a model.
    pub fn initialize_model(&mut self, model_id: &str, attention_slicing: bool) -> Result<()> {
        let options = ModelOptions::new(model_id, self.device, attention_slicing);
        println!("Загрузка модели {} ({})...", options.model_id, options.device);

        self.generator
            .load_model(&options)
            .map_err(|e| match e {
                VityazError::ModelLoad(_) => e,
                other => VityazError::ModelLoad(other.to_string()),
            })?;

        self.model_ready = true;
        println!("Модель загружена");
        Ok(())
    }

    /// The request sent to the generator for a sprite, with the catalog style applied
    pub fn request_for(&self, spec: &SpriteSpec) -> ImageRequest {
        let (prompt, negative_prompt) = match self.catalog.style {
            Some(ref style) => (
                style.enrich_prompt(&spec.prompt),
                style.merge_negative(&spec.negative_prompt),
            ),
            None => (spec.prompt.clone(), spec.negative_prompt.clone()),
        };

        ImageRequest {
            prompt,
            negative_prompt,
            width: spec.generation_size.width,
            height: spec.generation_size.height,
            steps: self.inference.steps,
            guidance_scale: self.inference.guidance_scale,
            seed: self.inference.seed,
        }
    }

    /// Generate one sprite. Errors are logged and returned as a failure.
    pub fn generate_sprite(&mut self, spec: &SpriteSpec) -> SpriteOutcome {
        println!("Генерирую: {}...", spec.name);

        match self.render_sprite(spec) {
            Ok(result) => {
                println!(
                    "   Готово: {}.png ({}, {:.1}KB, sha256 {})",
                    spec.name,
                    result.output_size,
                    result.size_kb(),
                    result.content_hash
                );
                self.generated_count += 1;
                SpriteOutcome::Generated(result)
            }
            Err(e) => {
                println!("   Ошибка: {}", e);
                tracing::debug!(sprite = %spec.name, error = ?e, "sprite generation failed");
                SpriteOutcome::Failed(SpriteFailure {
                    name: spec.name.clone(),
                    error: e.to_string(),
                })
            }
        }
    }

    fn render_sprite(&self, spec: &SpriteSpec) -> Result<GenerationResult> {
        if !self.model_ready {
            return Err(VityazError::ModelNotLoaded);
        }

        let start = Instant::now();
        let request = self.request_for(spec);
        let image = self.generator.generate(&request)?;

        let (width, height) = image.dimensions();
        if (width, height) != (request.width, request.height) {
            tracing::warn!(
                sprite = %spec.name,
                requested = %spec.generation_size,
                got = %Size::new(width, height),
                "generator returned an unexpected size"
            );
        }

        let temp_path = self.layout.temp_path(spec);
        if let Some(parent) = temp_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image.save_with_format(&temp_path, ImageFormat::Png)?;
        println!("   Полный размер: {}", temp_path.display());

        let resized = image.resize_exact(
            spec.output_size.width,
            spec.output_size.height,
            FilterType::Lanczos3,
        );

        let final_path = self.layout.final_path(spec);
        if let Some(parent) = final_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = encode_optimized_png(&resized)?;
        std::fs::write(&final_path, &bytes)?;

        Ok(GenerationResult {
            name: spec.name.clone(),
            final_path,
            temp_path,
            output_size: spec.output_size,
            file_size: bytes.len() as u64,
            content_hash: ContentHash::from_bytes(&bytes),
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Generate every sprite in catalog order and print a summary
    pub fn generate_all(&mut self) -> RunReport {
        let specs: Vec<SpriteSpec> = self.pending().iter().cloned().collect();
        let total = specs.len();
        let mut report = RunReport {
            total,
            ..Default::default()
        };

        println!("\nНачинаю генерацию {} спрайтов...\n", total);

        for (i, spec) in specs.iter().enumerate() {
            print!("[{}/{}] ", i + 1, total);
            match self.generate_sprite(spec) {
                SpriteOutcome::Generated(result) => report.results.push(result),
                SpriteOutcome::Failed(failure) => report.failures.push(failure),
            }
            println!();
        }

        println!("\nГенерация завершена!");
        println!("   {}", report.summary_line());
        println!("   Спрайты: {}", self.layout.output_dir().display());
        println!("   Полные: {}", self.layout.temp_dir().display());

        report
    }

    /// Write `sprites_index.json` for a finished run, replacing any previous one.
    /// The index lists the full catalog even when a selection was rendered.
    pub fn create_index(&self, report: &RunReport) -> Result<PathBuf> {
        let path = self.layout.index_path();
        SpriteIndex::from_run(&self.catalog, report).save(&path)?;
        println!("\nИндекс создан: {}", path.display());
        Ok(path)
    }
}

/// PNG with maximum compression, for the smallest shipped sprite
fn encode_optimized_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, PngFilter::Adaptive);
    image.write_with_encoder(encoder)?;
    Ok(bytes)
}
