//! Run-length pixel codec.
//!
//! Sprite pixel data is a stream of 32-bit little-endian codewords. Bit 0
//! selects a transparent run (length in the remaining bits); otherwise bit 1
//! selects a solid run (pixel in bits 2-9, length in the bits above) or a
//! literal run (byte count in the remaining bits, payload stored
//! word-aligned). Rows must be consumed exactly: a run that overshoots the
//! row width leaves the decoder desynchronized and the decode can only end
//! in failure.
//!
//! Besides materializing sprites, the decoder is the validity oracle for the
//! blind structure scan: a descriptor whose stream does not decode to
//! exactly `width * height` pixels is a false positive.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Palette index emitted for transparent runs when the caller does not
/// supply one. Index 0 is the synthesized black entry every recovered
/// palette reserves, so it never skews the color-count estimate.
pub const DEFAULT_TRANSPARENT: u8 = 0;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("pixel stream exhausted with {rows_left} rows outstanding")]
    Truncated { rows_left: u16 },
    #[error("transparent run of {run} pixels exceeds the remaining image area")]
    RunTooLong { run: u32 },
    #[error("emitted {emitted} pixels for a {expected}-pixel image")]
    SizeMismatch { emitted: usize, expected: usize },
}

/// Decode a `width` x `height` sprite from `data`, returning palette
/// indices in row-major order.
///
/// `palette_shift` is added (mod 256) to every solid and literal pixel.
/// Failure here is routine rather than exceptional: the resolver calls this
/// on every candidate descriptor and discards the ones that do not decode.
pub fn decode_pixels(
    data: &[u8],
    width: u16,
    height: u16,
    transparent_index: Option<u8>,
    palette_shift: u8,
) -> Result<Vec<u8>, DecodeError> {
    let transparent = transparent_index.unwrap_or(DEFAULT_TRANSPARENT);
    let expected = width as usize * height as usize;
    let mut pixels = Vec::with_capacity(expected);
    let mut row_left = width as i64;
    let mut rows_left = height;
    let mut pos = 0usize;

    while rows_left != 0 {
        if pos + 4 > data.len() {
            return Err(DecodeError::Truncated { rows_left });
        }
        let code = LittleEndian::read_u32(&data[pos..pos + 4]);
        pos += 4;

        let run: i64;
        if code & 1 != 0 {
            run = (code >> 1) as i64;
            if run > row_left * rows_left as i64 {
                return Err(DecodeError::RunTooLong { run: run as u32 });
            }
            pixels.resize(pixels.len() + run as usize, transparent);
        } else if code & 2 != 0 {
            let pixel = ((code >> 2) & 0xFF) as u8;
            run = (code >> 10) as i64;
            pixels.resize(pixels.len() + run as usize, pixel.wrapping_add(palette_shift));
        } else {
            let count = (code >> 2) as usize;
            let Some(payload) = data.get(pos..pos + count) else {
                return Err(DecodeError::Truncated { rows_left });
            };
            pixels.extend(payload.iter().map(|&byte| byte.wrapping_add(palette_shift)));
            // Literal payloads are stored word-aligned.
            pos += (count + 3) & !3;
            run = count as i64;
        }

        // A desynchronized stream can declare arbitrarily long solid runs;
        // once the output exceeds the image area the decode cannot succeed.
        if pixels.len() > expected {
            return Err(DecodeError::SizeMismatch {
                emitted: pixels.len(),
                expected,
            });
        }

        row_left -= run;
        if row_left == 0 {
            row_left = width as i64;
            rows_left -= 1;
        }
    }

    if pixels.len() != expected {
        return Err(DecodeError::SizeMismatch {
            emitted: pixels.len(),
            expected,
        });
    }
    Ok(pixels)
}

/// Upper-bound estimate of how deep into a palette the pixels reach,
/// assuming indices 0 and 1 are reserved. Used to rank palette candidates
/// against a decoded sprite set; not claimed to be exact.
pub fn number_of_colors(pixels: &[u8]) -> u8 {
    pixels
        .iter()
        .copied()
        .max()
        .map_or(0, |max| max.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(pixel: u8, run: u32) -> [u8; 4] {
        ((pixel as u32) << 2 | run << 10 | 0b10).to_le_bytes()
    }

    fn transparent(run: u32) -> [u8; 4] {
        (run << 1 | 1).to_le_bytes()
    }

    fn literal(payload: &[u8]) -> Vec<u8> {
        let mut data = ((payload.len() as u32) << 2).to_le_bytes().to_vec();
        data.extend_from_slice(payload);
        while data.len() % 4 != 0 {
            data.push(0xEE); // alignment padding, must never be emitted
        }
        data
    }

    #[test]
    fn decodes_single_solid_run() {
        let pixels = decode_pixels(&solid(7, 2), 2, 1, None, 0).unwrap();
        assert_eq!(pixels, vec![7, 7]);
    }

    #[test]
    fn solid_runs_fill_whole_rows() {
        let mut data = solid(3, 2).to_vec();
        data.extend_from_slice(&solid(5, 2));
        let pixels = decode_pixels(&data, 2, 2, None, 0).unwrap();
        assert_eq!(pixels, vec![3, 3, 5, 5]);
    }

    #[test]
    fn run_crossing_a_row_boundary_fails() {
        // 4 pixels for a 2x2 sprite, but in one run: the row counter goes
        // negative, never hits zero, and the decode cannot complete.
        let result = decode_pixels(&solid(3, 4), 2, 2, None, 0);
        assert!(matches!(result, Err(DecodeError::Truncated { rows_left: 2 })));
    }

    #[test]
    fn transparent_run_emits_the_configured_index() {
        let pixels = decode_pixels(&transparent(2), 2, 1, None, 0).unwrap();
        assert_eq!(pixels, vec![DEFAULT_TRANSPARENT, DEFAULT_TRANSPARENT]);

        let pixels = decode_pixels(&transparent(2), 2, 1, Some(9), 0).unwrap();
        assert_eq!(pixels, vec![9, 9]);
    }

    #[test]
    fn oversized_transparent_run_trips_the_guard() {
        let result = decode_pixels(&transparent(5), 2, 1, None, 0);
        assert_eq!(result, Err(DecodeError::RunTooLong { run: 5 }));
    }

    #[test]
    fn literal_run_emits_payload_bytes() {
        let data = literal(&[1, 2, 3, 4, 5]);
        let pixels = decode_pixels(&data, 5, 1, None, 0).unwrap();
        assert_eq!(pixels, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn literal_cursor_advances_by_whole_words() {
        // Two literal rows of 5 bytes each: the second codeword is only
        // found if the cursor skips the 3 padding bytes after the first
        // payload.
        let mut data = literal(&[1, 2, 3, 4, 5]);
        data.extend_from_slice(&literal(&[6, 7, 8, 9, 10]));
        let pixels = decode_pixels(&data, 5, 2, None, 0).unwrap();
        assert_eq!(pixels, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn truncated_literal_payload_fails() {
        let mut data = literal(&[1, 2, 3, 4, 5]);
        data.truncate(7);
        let result = decode_pixels(&data, 5, 1, None, 0);
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn empty_stream_fails_with_rows_outstanding() {
        let result = decode_pixels(&[], 2, 3, None, 0);
        assert_eq!(result, Err(DecodeError::Truncated { rows_left: 3 }));
    }

    #[test]
    fn palette_shift_wraps_solid_and_literal_pixels() {
        let pixels = decode_pixels(&solid(250, 2), 2, 1, None, 10).unwrap();
        assert_eq!(pixels, vec![4, 4]);

        let data = literal(&[200, 201, 202, 203]);
        let pixels = decode_pixels(&data, 4, 1, None, 100).unwrap();
        assert_eq!(pixels, vec![44, 45, 46, 47]);
    }

    #[test]
    fn transparent_pixels_ignore_palette_shift() {
        let pixels = decode_pixels(&transparent(2), 2, 1, Some(9), 50).unwrap();
        assert_eq!(pixels, vec![9, 9]);
    }

    #[test]
    fn estimates_color_count() {
        assert_eq!(number_of_colors(&[0, 1, 5, 3]), 4);
        assert_eq!(number_of_colors(&[0, 0]), 0);
        assert_eq!(number_of_colors(&[]), 0);
    }
}
