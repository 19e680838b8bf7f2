use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mk_formats::{ExecImage, SpriteLayout};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Scan an executable image for embedded palettes and sprite tables", version)]
struct Args {
    /// Executable image to scan
    exec: PathBuf,

    /// Only list palettes with at least this many colors
    #[arg(long, value_name = "N", default_value_t = 0)]
    min_colors: usize,

    /// Emit a JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ScanReport {
    exec: String,
    palettes: Vec<PaletteReport>,
    sprite_files: Vec<SpriteFileReport>,
}

#[derive(Serialize)]
struct PaletteReport {
    offset: usize,
    colors: usize,
    on_disk_size: usize,
}

#[derive(Serialize)]
struct SpriteFileReport {
    file_id: u8,
    records: usize,
    extended: usize,
    compact: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let exec = ExecImage::open(&args.exec)?;

    let palettes: Vec<PaletteReport> = exec
        .suitable_palettes(args.min_colors)
        .into_iter()
        .map(|(offset, palette)| PaletteReport {
            offset,
            colors: palette.colors.len(),
            on_disk_size: palette.on_disk_size,
        })
        .collect();

    let mut sprite_files: Vec<SpriteFileReport> = exec
        .sprite_files()
        .iter()
        .map(|(&file_id, records)| {
            let extended = records
                .iter()
                .filter(|record| record.layout == SpriteLayout::Extended)
                .count();
            SpriteFileReport {
                file_id,
                records: records.len(),
                extended,
                compact: records.len() - extended,
            }
        })
        .collect();
    sprite_files.sort_by_key(|report| report.file_id);

    if args.json {
        let report = ScanReport {
            exec: exec.path().display().to_string(),
            palettes,
            sprite_files,
        };
        serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
        println!();
        return Ok(());
    }

    println!(
        "{} palette candidates in {}",
        palettes.len(),
        exec.path().display()
    );
    for palette in &palettes {
        println!(
            "{offset:>#10x} {colors:>4} colors {size:>5} bytes",
            offset = palette.offset,
            colors = palette.colors,
            size = palette.on_disk_size
        );
    }
    println!();
    println!("{} file ids with sprite records", sprite_files.len());
    for report in &sprite_files {
        println!(
            "file {id:>3}: {records:>7} records ({extended} extended, {compact} compact)",
            id = report.file_id,
            records = report.records,
            extended = report.extended,
            compact = report.compact
        );
    }

    Ok(())
}
