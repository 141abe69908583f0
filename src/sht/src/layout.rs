//! Fixed-offset geometry of a TH15 `.sht` file.
//!
//! The file is a `0x30`-byte header, an option-position table, three
//! contiguous sections whose starts are stored in the header as 16-byte
//! units, and a 64-byte trailer. Everything here is a pure function over the
//! input buffer.

use thiserror::Error;

/// Header length in bytes.
pub const HEADER_SIZE: usize = 0x30;
/// Offset of the three section-start indices inside the header.
pub const SECTION_INDEX_OFFSET: usize = 0x20;
/// Section starts are stored in units of this many bytes and stay aligned to it.
pub const SECTION_ALIGN: usize = 16;
/// Offset where the file body (option table, then sections) begins.
pub const BODY_ORIGIN: usize = 0x40;
/// Opaque trailer length at the end of the file.
pub const TRAILER_SIZE: usize = 64;

/// Option-position table: 20 `(x, y)` float pairs.
pub const OPTION_TABLE_START: usize = 0x40;
pub const OPTION_TABLE_END: usize = 0xE0;
pub const OPTION_PAIR_COUNT: usize = 20;

/// Address of the first observed 88-byte record in real files.
pub const RECORD_START_ADDR: usize = 0x108;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("input too small for TH15 header: {len} bytes, need {HEADER_SIZE:#x}")]
    TooSmall { len: usize },
}

/// Decoded fixed header fields (section indices are read separately).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub unknown1: u16,
    pub level_count: u16,
    pub floats: [f32; 7],
}

/// Read the fixed `0x30`-byte header.
pub fn read_header(data: &[u8]) -> Result<Header, LayoutError> {
    if data.len() < HEADER_SIZE {
        return Err(LayoutError::TooSmall { len: data.len() });
    }
    let unknown1 = read_u16(data, 0);
    let level_count = read_u16(data, 2);
    let mut floats = [0f32; 7];
    for (i, f) in floats.iter_mut().enumerate() {
        *f = read_f32(data, 4 + i * 4);
    }
    Ok(Header {
        unknown1,
        level_count,
        floats,
    })
}

/// Read the three section-start indices stored at `0x20` (16-byte units).
pub fn section_indices(data: &[u8]) -> Result<[u32; 3], LayoutError> {
    if data.len() < HEADER_SIZE {
        return Err(LayoutError::TooSmall { len: data.len() });
    }
    Ok([
        read_u32(data, SECTION_INDEX_OFFSET),
        read_u32(data, SECTION_INDEX_OFFSET + 4),
        read_u32(data, SECTION_INDEX_OFFSET + 8),
    ])
}

/// Expand the header indices into the three `(start, end)` byte ranges.
///
/// Section 2 ends where the trailer begins, `file_len - 64`.
pub fn compute_sections(file_len: usize, idx: [u32; 3]) -> [(usize, usize); 3] {
    let s0 = idx[0] as usize * SECTION_ALIGN;
    let s1 = idx[1] as usize * SECTION_ALIGN;
    let s2 = idx[2] as usize * SECTION_ALIGN;
    let end2 = file_len.saturating_sub(TRAILER_SIZE);
    [(s0, s1), (s1, s2), (s2, end2)]
}

pub(crate) fn read_u16(data: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([data[off], data[off + 1]])
}

pub(crate) fn read_u32(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

pub(crate) fn read_f32(data: &[u8], off: usize) -> f32 {
    f32::from_bits(read_u32(data, off))
}
