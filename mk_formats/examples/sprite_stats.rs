use std::env;

use anyhow::{Result, anyhow};
use mk_formats::{ExecImage, GraFile};

fn main() -> Result<()> {
    env_logger::init();
    let mut args = env::args().skip(1);
    let usage = "usage: cargo run -p mk_formats --example sprite_stats -- <exec> <gra>";
    let exec_path = args.next().ok_or_else(|| anyhow!(usage))?;
    let gra_path = args.next().ok_or_else(|| anyhow!(usage))?;

    let exec = ExecImage::open(&exec_path)?;
    let gra = GraFile::load(&exec, &gra_path)?;

    let sprites = gra.sprites();
    println!(
        "{}: {} sprites under file id {:?}",
        gra.path().display(),
        sprites.len(),
        gra.file_id()
    );
    if sprites.is_empty() {
        return Ok(());
    }

    let mut min_dims = (u16::MAX, u16::MAX);
    let mut max_dims = (0u16, 0u16);
    let mut total_pixels = 0usize;
    let mut background_pixels = 0usize;
    for sprite in sprites.values() {
        let d = &sprite.descriptor;
        min_dims = (min_dims.0.min(d.width), min_dims.1.min(d.height));
        max_dims = (max_dims.0.max(d.width), max_dims.1.max(d.height));
        total_pixels += sprite.pixels.len();
        background_pixels += sprite.pixels.iter().filter(|&&p| p == 0).count();
    }

    println!(
        "dimensions: {}x{} .. {}x{}",
        min_dims.0, min_dims.1, max_dims.0, max_dims.1
    );
    println!(
        "pixels: {total_pixels} ({background_pixels} background/transparent)"
    );
    println!(
        "deepest palette reference: {} (suitable palettes in executable: {})",
        gra.min_palette_colors(),
        exec.suitable_palettes(gra.min_palette_colors()).len()
    );

    Ok(())
}
