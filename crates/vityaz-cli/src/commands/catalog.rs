//! Catalog listing command

use anyhow::{bail, Result};
use std::path::Path;
use vityaz_sprite_gen::VityazConfig;

pub fn run(catalog_path: Option<&Path>, format: &str, config: &VityazConfig) -> Result<()> {
    let catalog = super::load_catalog(catalog_path, config)?;

    match format {
        "text" => {
            println!("{} sprite(s):\n", catalog.len());
            for spec in &catalog {
                println!(
                    "  {:<28} {:>9} -> {:<7} {}",
                    spec.name,
                    spec.generation_size.to_string(),
                    spec.output_size.to_string(),
                    truncate(&spec.prompt, 60)
                );
            }
            if let Some(ref style) = catalog.style {
                if let Some(ref suffix) = style.prompt_suffix {
                    println!("\n  Style suffix: {}", suffix);
                }
            }
        }
        "json" => {
            let specs: Vec<_> = catalog.iter().collect();
            println!("{}", serde_json::to_string_pretty(&specs)?);
        }
        "toml" => print!("{}", catalog.to_toml()?),
        _ => bail!("Unknown format '{}'. Use: text, json, toml", format),
    }
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("pistol", 10), "pistol");
        assert_eq!(truncate("Makarov PMM pistol", 7), "Makarov...");
    }

    #[test]
    fn test_unknown_format() {
        assert!(run(None, "yaml", &VityazConfig::default()).is_err());
    }
}
