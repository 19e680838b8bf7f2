use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memmap2::{Mmap, MmapOptions};

use crate::file_table::{self, FileIdMatches};
use crate::palette::{self, Palette};
use crate::sprite::{self, SpriteDescriptor};

/// A memory-mapped executable image together with the structure tables
/// recovered from it. Both brute-force scans run once at open; the mapping
/// stays read-only for the lifetime of every derived candidate.
#[derive(Debug)]
pub struct ExecImage {
    path: PathBuf,
    mmap: Mmap,
    palettes: BTreeMap<usize, Palette>,
    sprite_files: HashMap<u8, Vec<SpriteDescriptor>>,
}

impl ExecImage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)
            .with_context(|| format!("opening executable at {}", path_buf.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping executable {}", path_buf.display()))?;

        let palettes = palette::scan_palettes(&mmap);
        let sprite_files = sprite::scan_sprites(&mmap);
        log::debug!(
            "{}: {} palette candidates, {} sprite records under {} file ids",
            path_buf.display(),
            palettes.len(),
            sprite_files.values().map(Vec::len).sum::<usize>(),
            sprite_files.len()
        );

        Ok(ExecImage {
            path: path_buf,
            mmap,
            palettes,
            sprite_files,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &[u8] {
        &self.mmap
    }

    /// Palette candidates keyed by the offset they were recognized at.
    pub fn palettes(&self) -> &BTreeMap<usize, Palette> {
        &self.palettes
    }

    /// Sprite descriptor candidates bucketed by the file id their id/offset
    /// word claims.
    pub fn sprite_files(&self) -> &HashMap<u8, Vec<SpriteDescriptor>> {
        &self.sprite_files
    }

    /// Palettes with at least `min_colors` entries, the synthesized black
    /// entry included.
    pub fn suitable_palettes(&self, min_colors: usize) -> BTreeMap<usize, &Palette> {
        self.palettes
            .iter()
            .filter(|(_, palette)| palette.colors.len() >= min_colors)
            .map(|(&offset, palette)| (offset, palette))
            .collect()
    }

    /// Descriptors filed under `file_id` whose pixel stream would start
    /// inside an asset of `file_size` bytes.
    pub fn suitable_sprites(&self, file_id: u8, file_size: u32) -> Vec<SpriteDescriptor> {
        self.sprite_files
            .get(&file_id)
            .map(|records| {
                records
                    .iter()
                    .copied()
                    .filter(|record| record.file_offset < file_size)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Candidate file ids for the asset at `path`, derived from its size.
    /// An unreadable or unsizable file yields an empty candidate list and
    /// resolution simply recovers nothing.
    pub fn find_file_ids<P: AsRef<Path>>(&self, path: P) -> FileIdMatches {
        let file_size = match fs::metadata(path.as_ref()) {
            Ok(metadata) => metadata.len() as u32,
            Err(error) => {
                log::warn!("sizing {}: {error}", path.as_ref().display());
                return FileIdMatches::default();
            }
        };
        self.match_file_size(file_size)
    }

    /// Candidate file ids for an asset of a known size.
    pub fn match_file_size(&self, file_size: u32) -> FileIdMatches {
        FileIdMatches {
            file_size,
            file_ids: file_table::find_file_ids(&self.mmap, file_size),
        }
    }
}
