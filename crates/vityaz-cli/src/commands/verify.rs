//! Output verification command

use super::SpriteArgs;
use anyhow::{bail, Result};
use vityaz_sprite_gen::validate::validate_catalog;
use vityaz_sprite_gen::VityazConfig;

pub fn run(args: &SpriteArgs, config: &VityazConfig) -> Result<()> {
    let catalog = args.catalog(config)?;
    let layout = args.layout(config);

    let reports = validate_catalog(&catalog, &layout);
    for report in &reports {
        report.print_summary();
    }

    let failed = reports.iter().filter(|r| !r.passed).count();
    println!(
        "\nVerified {} sprite(s): {} passed, {} failed",
        reports.len(),
        reports.len() - failed,
        failed
    );

    if failed > 0 {
        bail!("{} sprite(s) failed verification", failed);
    }
    Ok(())
}
