//! Vityaz CLI - batch sprite generation for VITYAZ: Special Operations

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{catalog, generate, index, verify, SpriteArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "vityaz-sprites")]
#[command(about = "Generate pixel-art game sprites with a diffusion model", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug diagnostics on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.vityaz and .vityaz layers
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every sprite, then write the index (default)
    Generate {
        #[command(flatten)]
        sprites: SpriteArgs,

        /// Backend to use (stable-diffusion, mock)
        #[arg(long)]
        provider: Option<String>,

        /// Pretrained model to load
        #[arg(long)]
        model: Option<String>,

        /// Only generate these sprites (repeatable, e.g. --only weapons/pmm)
        #[arg(long)]
        only: Vec<String>,

        /// Fixed seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Inference steps
        #[arg(long)]
        steps: Option<u32>,
    },

    /// List the sprites of a catalog
    Catalog {
        /// Sprite catalog file (defaults to the built-in set)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format (text, json or toml)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check generated sprites against their configured sizes
    Verify {
        #[command(flatten)]
        sprites: SpriteArgs,
    },

    /// Rewrite sprites_index.json from the sprites on disk
    Index {
        #[command(flatten)]
        sprites: SpriteArgs,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        None => generate::run(generate::GenerateArgs::default(), &config),
        Some(Commands::Generate {
            sprites,
            provider,
            model,
            only,
            seed,
            steps,
        }) => generate::run(
            generate::GenerateArgs {
                sprites,
                provider,
                model,
                only,
                seed,
                steps,
            },
            &config,
        ),
        Some(Commands::Catalog { catalog, format }) => {
            catalog::run(catalog.as_deref(), &format, &config)
        }
        Some(Commands::Verify { sprites }) => verify::run(&sprites, &config),
        Some(Commands::Index { sprites }) => index::run(&sprites, &config),
    }
}
