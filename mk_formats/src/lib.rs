pub mod exec;
pub mod file_table;
pub mod gra;
pub mod palette;
pub mod raw;
pub mod rle;
pub mod sprite;

pub use exec::ExecImage;
pub use file_table::{FileEntry, FileIdMatches, find_file_ids};
pub use gra::{DecodedSprite, GraFile, resolve_sprites};
pub use palette::{Palette, Rgb, scan_palettes};
pub use rle::{DecodeError, decode_pixels, number_of_colors};
pub use sprite::{SpriteDescriptor, SpriteLayout, scan_sprites};
