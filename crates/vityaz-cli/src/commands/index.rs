//! Index rebuild command

use super::SpriteArgs;
use anyhow::Result;
use vityaz_sprite_gen::{SpriteIndex, VityazConfig};

pub fn run(args: &SpriteArgs, config: &VityazConfig) -> Result<()> {
    let catalog = args.catalog(config)?;
    let layout = args.layout(config);

    let index = SpriteIndex::from_disk(&catalog, &layout);
    let path = layout.index_path();
    index.save(&path)?;

    println!(
        "Index: {} of {} sprite(s) present -> {}",
        index.generated,
        catalog.len(),
        path.display()
    );
    for spec in catalog.iter().filter(|spec| !layout.final_path(spec).is_file()) {
        println!("  missing: {}", spec.name);
    }
    Ok(())
}
