use crate::raw::read_u32_le;

/// Flags word every in-table entry carries before the game patches it at
/// load time.
const ENTRY_FLAGS: u32 = 0x12;

/// One 24-byte entry of the executable's resident file table: six 32-bit
/// little-endian words. `buffer_ref` and the reserved words are only
/// populated at runtime, so on disk they must read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileEntry {
    pub name_ref: u32,
    pub size: u32,
    pub flags: u32,
    pub reserved0: u32,
    pub buffer_ref: u32,
    pub reserved1: u32,
}

impl FileEntry {
    pub const SIZE: usize = 24;
    pub const PARTIAL_SIZE: usize = 16;

    pub fn from_bytes(data: &[u8]) -> Option<FileEntry> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(FileEntry {
            name_ref: read_u32_le(data, 0)?,
            size: read_u32_le(data, 4)?,
            flags: read_u32_le(data, 8)?,
            reserved0: read_u32_le(data, 12)?,
            buffer_ref: read_u32_le(data, 16)?,
            reserved1: read_u32_le(data, 20)?,
        })
    }

    /// Reading that starts past the name/size words, for probing the tail
    /// of an entry whose size field already matched.
    pub fn from_bytes_partial(data: &[u8]) -> Option<FileEntry> {
        if data.len() < Self::PARTIAL_SIZE {
            return None;
        }
        Some(FileEntry {
            name_ref: 0,
            size: 0,
            flags: read_u32_le(data, 0)?,
            reserved0: read_u32_le(data, 4)?,
            buffer_ref: read_u32_le(data, 8)?,
            reserved1: read_u32_le(data, 12)?,
        })
    }

    pub fn is_valid_partial(&self) -> bool {
        self.flags == ENTRY_FLAGS
            && self.reserved0 == 0
            && self.buffer_ref == 0
            && self.reserved1 == 0
    }

    pub fn is_valid(&self) -> bool {
        self.name_ref != 0 && self.size != 0 && self.is_valid_partial()
    }
}

/// Candidate file ids recovered for one asset size. Duplicates are kept in
/// discovery order; selection happens during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIdMatches {
    pub file_size: u32,
    pub file_ids: Vec<u32>,
}

/// Search the buffer for `file_size` stored where a file table entry would
/// keep it, and derive a candidate id from each hit.
///
/// The size word sits at +4 of its entry, so a hit is confirmed by checking
/// the entry tail behind it (the partial predicate) and then walking
/// backward one full record at a time, counting consecutive fully-valid
/// sibling entries. The count at the first invalid stride is the 0-based
/// index of the hit entry within its table. A walk that runs off the front
/// of the buffer without meeting an invalid stride contributes nothing.
pub fn find_file_ids(data: &[u8], file_size: u32) -> Vec<u32> {
    let limit = data.len().saturating_sub(4);
    (0..limit)
        .filter_map(|pos| file_id_at(data, pos, file_size))
        .collect()
}

/// Range-parallel variant of [`find_file_ids`]. Each candidate position is
/// independent, and the indexed collect keeps discovery order.
#[cfg(feature = "parallel")]
pub fn find_file_ids_par(data: &[u8], file_size: u32) -> Vec<u32> {
    use rayon::prelude::*;

    let limit = data.len().saturating_sub(4);
    (0..limit)
        .into_par_iter()
        .filter_map(|pos| file_id_at(data, pos, file_size))
        .collect()
}

fn file_id_at(data: &[u8], pos: usize, file_size: u32) -> Option<u32> {
    if read_u32_le(data, pos)? != file_size {
        return None;
    }
    let tail = FileEntry::from_bytes_partial(data.get(pos + 4..)?)?;
    if !tail.is_valid_partial() {
        return None;
    }

    let mut file_id = 0u32;
    let mut table_pos = pos as i64 - 4 - FileEntry::SIZE as i64;
    while table_pos >= 0 {
        match FileEntry::from_bytes(&data[table_pos as usize..]) {
            Some(entry) if entry.is_valid() => {
                file_id += 1;
                table_pos -= FileEntry::SIZE as i64;
            }
            _ => return Some(file_id),
        }
    }
    None
}
