use std::collections::HashMap;

use crate::raw::{read_i16_le, read_u16_le, read_u32_le};

/// Sprite dimensions are bounded by the 320x240 video mode; anything at or
/// past the bound is noise.
pub const MAX_WIDTH: u16 = 320;
pub const MAX_HEIGHT: u16 = 240;

/// Window the x/y adjustment words of the extended layout must fall in.
const MAX_ADJUST: i16 = 256;

/// Which structural hypothesis produced a descriptor.
///
/// The executable stores sprite records in two competing fixed layouts and
/// nothing at the record marks which one is in use. Both readings are kept
/// as candidates; decode corroboration settles it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteLayout {
    /// 12-byte record with explicit x/y adjustments.
    Extended,
    /// 8-byte record without them.
    Compact,
}

/// One sprite descriptor candidate.
///
/// `file_id` and `file_offset` come from a single 32-bit word: the top byte
/// names the asset file, the low 24 bits locate the pixel stream inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteDescriptor {
    pub file_id: u8,
    pub file_offset: u32,
    pub width: u16,
    pub height: u16,
    pub x: i16,
    pub y: i16,
    pub layout: SpriteLayout,
}

impl SpriteDescriptor {
    pub const MIN_SIZE: usize = 8;
    pub const SIZE: usize = 12;

    /// Both readings of the bytes at one scan position. Either slot may be
    /// empty: dimensions out of bounds reject the position outright, and
    /// the extended reading is only kept when its x/y words stay inside the
    /// adjustment window.
    pub fn parse(window: &[u8]) -> [Option<SpriteDescriptor>; 2] {
        let mut candidates = [None, None];

        let Some(width) = read_u16_le(window, 0) else {
            return candidates;
        };
        if width == 0 || width >= MAX_WIDTH {
            return candidates;
        }
        let Some(height) = read_u16_le(window, 2) else {
            return candidates;
        };
        if height == 0 || height >= MAX_HEIGHT {
            return candidates;
        }
        let Some(compact_word) = read_u32_le(window, 4) else {
            return candidates;
        };

        if let (Some(x), Some(y)) = (read_i16_le(window, 4), read_i16_le(window, 6)) {
            let in_window =
                (-MAX_ADJUST..=MAX_ADJUST).contains(&x) && (-MAX_ADJUST..=MAX_ADJUST).contains(&y);
            if in_window {
                if let Some(word) = read_u32_le(window, 8) {
                    let (file_id, file_offset) = split_id_offset(word);
                    candidates[0] = Some(SpriteDescriptor {
                        file_id,
                        file_offset,
                        width,
                        height,
                        x,
                        y,
                        layout: SpriteLayout::Extended,
                    });
                }
            }
        }

        let (file_id, file_offset) = split_id_offset(compact_word);
        candidates[1] = Some(SpriteDescriptor {
            file_id,
            file_offset,
            width,
            height,
            x: 0,
            y: 0,
            layout: SpriteLayout::Compact,
        });

        candidates
    }
}

fn split_id_offset(word: u32) -> (u8, u32) {
    ((word >> 24) as u8, word & 0x00FF_FFFF)
}

/// Stride-1 sweep of the whole buffer, bucketing candidates by claimed
/// file id.
///
/// Unlike the palette scan this never skips bytes: sprite records
/// legitimately overlap under the two layout hypotheses, and bogus
/// candidates are cheap to carry until decode corroboration discards them.
pub fn scan_sprites(data: &[u8]) -> HashMap<u8, Vec<SpriteDescriptor>> {
    let mut files: HashMap<u8, Vec<SpriteDescriptor>> = HashMap::new();
    collect_sprites(data, 0, data.len(), &mut files);
    files
}

fn collect_sprites(
    data: &[u8],
    start: usize,
    end: usize,
    files: &mut HashMap<u8, Vec<SpriteDescriptor>>,
) {
    for pos in start..end {
        let window_end = data.len().min(pos + SpriteDescriptor::SIZE);
        for descriptor in SpriteDescriptor::parse(&data[pos..window_end])
            .into_iter()
            .flatten()
        {
            files.entry(descriptor.file_id).or_default().push(descriptor);
        }
    }
}

/// Range-parallel variant of [`scan_sprites`]. Offsets are partitioned into
/// chunks scanned independently; windows near a chunk boundary read into
/// the neighbouring bytes, so no straddling record is missed. The merge is
/// performed in chunk order, which keeps the per-id record order identical
/// to the sequential scan.
#[cfg(feature = "parallel")]
pub fn scan_sprites_par(data: &[u8]) -> HashMap<u8, Vec<SpriteDescriptor>> {
    use rayon::prelude::*;

    const CHUNK: usize = 1 << 20;
    if data.len() <= CHUNK {
        return scan_sprites(data);
    }

    let starts: Vec<usize> = (0..data.len()).step_by(CHUNK).collect();
    let partials: Vec<HashMap<u8, Vec<SpriteDescriptor>>> = starts
        .par_iter()
        .map(|&start| {
            let mut files = HashMap::new();
            collect_sprites(data, start, data.len().min(start + CHUNK), &mut files);
            files
        })
        .collect();

    let mut files: HashMap<u8, Vec<SpriteDescriptor>> = HashMap::new();
    for partial in partials {
        for (file_id, mut records) in partial {
            files.entry(file_id).or_default().append(&mut records);
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(width: u16, height: u16, x: i16, y: i16, word: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&x.to_le_bytes());
        data.extend_from_slice(&y.to_le_bytes());
        data.extend_from_slice(&word.to_le_bytes());
        data
    }

    #[test]
    fn parses_both_layouts_at_one_position() {
        let data = record(100, 50, 10, -20, 0x0500_0123);
        let [extended, compact] = SpriteDescriptor::parse(&data);

        let extended = extended.expect("extended candidate");
        assert_eq!(extended.layout, SpriteLayout::Extended);
        assert_eq!(extended.file_id, 5);
        assert_eq!(extended.file_offset, 0x123);
        assert_eq!((extended.x, extended.y), (10, -20));

        // The compact reading reinterprets the x/y bytes as its id word.
        let compact = compact.expect("compact candidate");
        assert_eq!(compact.layout, SpriteLayout::Compact);
        assert_eq!(compact.file_id, 0xFF);
        assert_eq!(compact.file_offset, 0xEC000A);
        assert_eq!((compact.x, compact.y), (0, 0));
    }

    #[test]
    fn rejects_out_of_bound_dimensions() {
        assert_eq!(SpriteDescriptor::parse(&record(0, 50, 0, 0, 0)), [None, None]);
        assert_eq!(SpriteDescriptor::parse(&record(320, 50, 0, 0, 0)), [None, None]);
        assert_eq!(SpriteDescriptor::parse(&record(100, 0, 0, 0, 0)), [None, None]);
        assert_eq!(SpriteDescriptor::parse(&record(100, 240, 0, 0, 0)), [None, None]);
    }

    #[test]
    fn adjustment_window_gates_the_extended_layout() {
        let [extended, compact] = SpriteDescriptor::parse(&record(100, 50, 257, 0, 0));
        assert!(extended.is_none());
        assert!(compact.is_some());

        let [extended, _] = SpriteDescriptor::parse(&record(100, 50, -256, 256, 0));
        assert!(extended.is_some());
    }

    #[test]
    fn short_window_only_yields_the_compact_layout() {
        let data = record(100, 50, 1, 2, 0xAA00_0010);
        let [extended, compact] = SpriteDescriptor::parse(&data[..8]);
        assert!(extended.is_none());
        let compact = compact.expect("compact candidate");
        assert_eq!(compact.file_id, 0);
        assert_eq!(compact.file_offset, 0x0002_0001);

        assert_eq!(SpriteDescriptor::parse(&data[..7]), [None, None]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_scan_matches_sequential() {
        // Big enough to force several chunks, with records straddling the
        // chunk boundaries.
        let mut data = Vec::new();
        let mut index = 0u32;
        while data.len() < (1 << 21) + 13 {
            data.extend_from_slice(&record(16, 8, 0, 0, index));
            data.push(index as u8);
            index += 1;
        }
        assert_eq!(scan_sprites_par(&data), scan_sprites(&data));
    }

    #[test]
    fn scan_buckets_by_file_id() {
        let mut data = vec![0u8; 3];
        data.extend_from_slice(&record(16, 8, 0, 0, 0x0700_0040));
        data.extend_from_slice(&[0u8; 5]);

        let files = scan_sprites(&data);
        let bucket = files.get(&7).expect("bucket for file id 7");
        assert!(bucket.iter().any(|s| {
            s.layout == SpriteLayout::Extended
                && s.file_offset == 0x40
                && (s.width, s.height) == (16, 8)
        }));
    }
}
