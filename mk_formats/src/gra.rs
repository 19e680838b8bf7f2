use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::exec::ExecImage;
use crate::rle;
use crate::sprite::SpriteDescriptor;

/// A sprite descriptor that survived decoding.
#[derive(Debug, Clone)]
pub struct DecodedSprite {
    pub descriptor: SpriteDescriptor,
    /// Palette indices, row-major, `width * height` long.
    pub pixels: Vec<u8>,
    /// See [`rle::number_of_colors`].
    pub number_of_colors: u8,
}

/// One asset file resolved against an executable image.
///
/// Asset files carry no header, so nothing in the file itself names the
/// sprite table describing it; the link is recovered by correlating the
/// file's size against the executable's file table and keeping whichever
/// candidate id decodes best.
#[derive(Debug)]
pub struct GraFile {
    path: PathBuf,
    file_size: u32,
    file_id: Option<u32>,
    sprites: BTreeMap<u32, DecodedSprite>,
}

impl GraFile {
    pub fn load<P: AsRef<Path>>(exec: &ExecImage, path: P) -> Result<GraFile> {
        let path_buf = path.as_ref().to_path_buf();
        let data = fs::read(&path_buf)
            .with_context(|| format!("reading asset file {}", path_buf.display()))?;
        let file_size = data.len() as u32;

        let matches = exec.match_file_size(file_size);
        let (file_id, sprites) = resolve_sprites(exec.sprite_files(), &matches.file_ids, &data);
        log::debug!(
            "{}: {} candidate ids for {} bytes, kept id {:?} with {} sprites",
            path_buf.display(),
            matches.file_ids.len(),
            file_size,
            file_id,
            sprites.len()
        );

        Ok(GraFile {
            path: path_buf,
            file_size,
            file_id,
            sprites,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    /// The winning candidate id, or `None` when nothing decoded.
    pub fn file_id(&self) -> Option<u32> {
        self.file_id
    }

    /// Decoded sprites keyed by their byte offset inside the asset.
    pub fn sprites(&self) -> &BTreeMap<u32, DecodedSprite> {
        &self.sprites
    }

    /// Smallest palette able to display every decoded sprite.
    pub fn min_palette_colors(&self) -> usize {
        self.sprites
            .values()
            .map(|sprite| sprite.number_of_colors as usize)
            .max()
            .unwrap_or(0)
    }
}

/// Decode every plausible descriptor under each candidate id and keep the
/// id whose records decode at the most distinct offsets.
///
/// Structural recognition has no ground truth, so corroboration is the
/// selection rule: the id whose sprite bucket most often survives the codec
/// is taken to be the asset's real identifier. Duplicate candidates are
/// collapsed by value in discovery order, and a tie keeps the earlier
/// candidate. Written as a fold so the scoring stays a pure reduction.
pub fn resolve_sprites(
    sprite_files: &HashMap<u8, Vec<SpriteDescriptor>>,
    candidate_ids: &[u32],
    data: &[u8],
) -> (Option<u32>, BTreeMap<u32, DecodedSprite>) {
    let mut unique: Vec<u32> = Vec::new();
    for &id in candidate_ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }

    unique
        .into_iter()
        .fold((None, BTreeMap::new()), |best, id| {
            let decoded = decode_bucket(sprite_files, id, data);
            if decoded.len() > best.1.len() {
                (Some(id), decoded)
            } else {
                best
            }
        })
}

fn decode_bucket(
    sprite_files: &HashMap<u8, Vec<SpriteDescriptor>>,
    file_id: u32,
    data: &[u8],
) -> BTreeMap<u32, DecodedSprite> {
    let Ok(file_id) = u8::try_from(file_id) else {
        // Backward walks can count past 255, but id/offset words only
        // carry an 8-bit id; such candidates can never match a bucket.
        return BTreeMap::new();
    };
    let Some(records) = sprite_files.get(&file_id) else {
        return BTreeMap::new();
    };

    let mut decoded = BTreeMap::new();
    for &descriptor in records {
        let offset = descriptor.file_offset as usize;
        if offset >= data.len() {
            continue;
        }
        if let Ok(pixels) =
            rle::decode_pixels(&data[offset..], descriptor.width, descriptor.height, None, 0)
        {
            let number_of_colors = rle::number_of_colors(&pixels);
            // A later success at the same offset replaces the earlier one.
            decoded.insert(
                descriptor.file_offset,
                DecodedSprite {
                    descriptor,
                    pixels,
                    number_of_colors,
                },
            );
        }
    }
    decoded
}
