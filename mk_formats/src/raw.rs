//! Offset-addressed reads over untrusted byte buffers.
//!
//! The scanners probe candidate structures at arbitrary positions, so every
//! accessor returns `None` past the end of the buffer instead of panicking.

pub fn read_u16_le(data: &[u8], pos: usize) -> Option<u16> {
    let bytes = data.get(pos..pos.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub fn read_i16_le(data: &[u8], pos: usize) -> Option<i16> {
    read_u16_le(data, pos).map(|value| value as i16)
}

pub fn read_u32_le(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().unwrap()))
}
