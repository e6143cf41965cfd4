//! Full sprite generation run

use super::SpriteArgs;
use anyhow::{bail, Result};
use vityaz_sprite_gen::providers::{create_provider, ensure_available};
use vityaz_sprite_gen::{ImageGenerator, RunReport, SpriteBatchGenerator, VityazConfig};

#[derive(Debug, Default)]
pub struct GenerateArgs {
    pub sprites: SpriteArgs,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub only: Vec<String>,
    pub seed: Option<u64>,
    pub steps: Option<u32>,
}

pub fn run(args: GenerateArgs, config: &VityazConfig) -> Result<()> {
    println!("{}", "=".repeat(60));
    println!("  VITYAZ: Special Operations - Sprite Generator");
    println!("{}", "=".repeat(60));

    let provider_name = args
        .provider
        .as_deref()
        .unwrap_or(&config.generation.provider);
    let generator = create_provider(provider_name, config)?;

    let report = run_with(generator, &args, config)?;

    println!("\n{}", "=".repeat(60));
    println!("  Готово: {}/{} спрайтов", report.succeeded(), report.total);
    println!("{}", "=".repeat(60));
    Ok(())
}

/// Run the pipeline on an already created backend.
///
/// Only an unusable backend or a failed model load is an error; sprites
/// that fail are recorded in the returned report.
pub fn run_with<G: ImageGenerator>(
    generator: G,
    args: &GenerateArgs,
    config: &VityazConfig,
) -> Result<RunReport> {
    // Nothing touches the disk until the backend is known to be usable
    if let Err(e) = ensure_available(&generator) {
        bail!(
            "{}\n\
             Start a Stable Diffusion web UI with the API enabled (--api), point \
             VITYAZ_SD_API_URL at it (and VITYAZ_SD_API_KEY if it needs one), \
             or use --provider mock for a dry run.",
            e
        );
    }

    let catalog = args.sprites.catalog(config)?;
    let selection = if args.only.is_empty() {
        None
    } else {
        Some(catalog.select(&args.only)?)
    };

    let mut inference = config.inference.clone();
    if let Some(seed) = args.seed {
        inference.seed = Some(seed);
    }
    if let Some(steps) = args.steps {
        inference.steps = steps;
    }

    let layout = args.sprites.layout(config);
    let mut batch = SpriteBatchGenerator::new(generator, catalog, layout)?
        .with_inference(inference)
        .with_device(config.model.device.resolve());
    if let Some(selection) = selection {
        batch = batch.with_selection(selection);
    }

    println!("Output: {}", batch.layout().output_dir().display());
    println!("Device: {}", batch.device());
    println!("Backend: {}", batch.generator().name());

    let model_id = args.model.as_deref().unwrap_or(&config.model.model_id);
    if let Err(e) = batch.initialize_model(model_id, config.model.attention_slicing) {
        bail!("Ошибка загрузки модели: {}", e);
    }

    let report = batch.generate_all();
    tracing::debug!(
        succeeded = report.succeeded(),
        failed = report.failures.len(),
        "batch finished"
    );

    batch.create_index(&report)?;
    Ok(report)
}
