use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mk_formats::{ExecImage, GraFile, SpriteLayout};
use serde::Serialize;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(about = "Resolve GRA sprite assets against an executable image", version)]
struct Args {
    /// Executable image holding the structure tables
    exec: PathBuf,

    /// Asset files to resolve
    #[arg(value_name = "GRA", conflicts_with = "root")]
    assets: Vec<PathBuf>,

    /// Directory scanned recursively for *.gra assets instead of naming them
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Emit a JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct AssetReport {
    path: String,
    file_size: u32,
    file_id: Option<u32>,
    sprites: Vec<SpriteReport>,
    min_palette_colors: usize,
    suitable_palette_offsets: Vec<usize>,
}

#[derive(Serialize)]
struct SpriteReport {
    offset: u32,
    width: u16,
    height: u16,
    x: i16,
    y: i16,
    layout: &'static str,
    colors: u8,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let assets = resolve_asset_paths(&args)?;
    if assets.is_empty() {
        bail!("no asset files to resolve");
    }

    let exec = ExecImage::open(&args.exec)?;

    let mut reports = Vec::with_capacity(assets.len());
    for path in &assets {
        let gra = GraFile::load(&exec, path)
            .with_context(|| format!("resolving {}", path.display()))?;
        reports.push(build_report(&exec, &gra));
    }

    if args.json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &reports)?;
        println!();
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }
    Ok(())
}

fn resolve_asset_paths(args: &Args) -> Result<Vec<PathBuf>> {
    let mut assets = Vec::new();

    if !args.assets.is_empty() {
        assets.extend(args.assets.iter().cloned());
    } else if let Some(root) = args.root.as_ref() {
        for entry in WalkDir::new(root).into_iter().filter_map(|res| res.ok()) {
            let is_gra = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("gra"));
            if entry.file_type().is_file() && is_gra {
                assets.push(entry.into_path());
            }
        }
    }

    assets.sort();
    assets.dedup();

    Ok(assets)
}

fn build_report(exec: &ExecImage, gra: &GraFile) -> AssetReport {
    let sprites = gra
        .sprites()
        .iter()
        .map(|(&offset, sprite)| SpriteReport {
            offset,
            width: sprite.descriptor.width,
            height: sprite.descriptor.height,
            x: sprite.descriptor.x,
            y: sprite.descriptor.y,
            layout: match sprite.descriptor.layout {
                SpriteLayout::Extended => "extended",
                SpriteLayout::Compact => "compact",
            },
            colors: sprite.number_of_colors,
        })
        .collect();

    let min_palette_colors = gra.min_palette_colors();
    AssetReport {
        path: gra.path().display().to_string(),
        file_size: gra.file_size(),
        file_id: gra.file_id(),
        sprites,
        min_palette_colors,
        suitable_palette_offsets: exec
            .suitable_palettes(min_palette_colors)
            .keys()
            .copied()
            .collect(),
    }
}

fn print_report(report: &AssetReport) {
    match report.file_id {
        Some(file_id) => println!(
            "{path}: file id {file_id}, {count} sprites in {size} bytes",
            path = report.path,
            count = report.sprites.len(),
            size = report.file_size
        ),
        None => {
            println!(
                "{path}: no sprite table corroborates this file ({size} bytes)",
                path = report.path,
                size = report.file_size
            );
            return;
        }
    }

    println!("{:>10} {:>9} {:>12} {:>8} {:>6}", "offset", "size", "pos", "layout", "colors");
    for sprite in &report.sprites {
        println!(
            "{offset:>#10x} {width:>4}x{height:<4} ({x:>4},{y:>4}) {layout:>8} {colors:>6}",
            offset = sprite.offset,
            width = sprite.width,
            height = sprite.height,
            x = sprite.x,
            y = sprite.y,
            layout = sprite.layout,
            colors = sprite.colors
        );
    }
    println!(
        "palettes with >= {min} colors: {count}",
        min = report.min_palette_colors,
        count = report.suitable_palette_offsets.len()
    );
}
