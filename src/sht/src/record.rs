//! 88-byte shot-record codec and sentinel-delimited level parsing.
//!
//! A record is `interval`/`delay`, a six-float core, a 24-byte tail packed as
//! `<H B B H H I I I I>`, and 36 opaque extra bytes. Levels are runs of
//! records closed by a 4-byte `0xFFFFFFFF` sentinel; the sentinel belongs to
//! no record.

use thiserror::Error;

use crate::layout::{read_f32, read_u16, read_u32};

/// Fixed record size in bytes.
pub const RECORD_SIZE: usize = 88;
/// Level delimiter immediately following the last record of a level.
pub const LEVEL_SENTINEL: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

const F6_OFFSET: usize = 4;
const TAIL_OFFSET: usize = 28;
const EXTRA_OFFSET: usize = 52;
/// Tail span length (`EXTRA_OFFSET - TAIL_OFFSET`).
pub const TAIL_SIZE: usize = 24;
/// Opaque extra span length.
pub const EXTRA_SIZE: usize = 36;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record window out of bounds: addr {addr:#x} + {RECORD_SIZE} > len {len:#x}")]
    OutOfBounds { addr: usize, len: usize },
}

/// Tail of a record, nine integer slots of mixed width.
///
/// Only two slots have known meaning; the rest are carried verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordTail {
    pub lead: u16,
    pub flag_a: u8,
    pub flag_b: u8,
    pub option_num: u16,
    pub bullet_ai: u16,
    pub words: [u32; 4],
}

impl RecordTail {
    /// Decode the 24 tail bytes starting at `off`.
    fn decode(data: &[u8], off: usize) -> Self {
        Self {
            lead: read_u16(data, off),
            flag_a: data[off + 2],
            flag_b: data[off + 3],
            option_num: read_u16(data, off + 4),
            bullet_ai: read_u16(data, off + 6),
            words: [
                read_u32(data, off + 8),
                read_u32(data, off + 12),
                read_u32(data, off + 16),
                read_u32(data, off + 20),
            ],
        }
    }

    /// Encode into 24 bytes.
    pub fn encode(&self) -> [u8; TAIL_SIZE] {
        let mut out = [0u8; TAIL_SIZE];
        out[0..2].copy_from_slice(&self.lead.to_le_bytes());
        out[2] = self.flag_a;
        out[3] = self.flag_b;
        out[4..6].copy_from_slice(&self.option_num.to_le_bytes());
        out[6..8].copy_from_slice(&self.bullet_ai.to_le_bytes());
        for (i, w) in self.words.iter().enumerate() {
            out[8 + i * 4..12 + i * 4].copy_from_slice(&w.to_le_bytes());
        }
        out
    }

    /// The nine slots in wire order, widened for JSON.
    pub fn to_list(self) -> [u64; 9] {
        [
            u64::from(self.lead),
            u64::from(self.flag_a),
            u64::from(self.flag_b),
            u64::from(self.option_num),
            u64::from(self.bullet_ai),
            u64::from(self.words[0]),
            u64::from(self.words[1]),
            u64::from(self.words[2]),
            u64::from(self.words[3]),
        ]
    }

    /// Rebuild from a nine-slot list. Returns `None` when the list has the
    /// wrong length or a value does not fit its slot width; callers treat
    /// that as "keep the existing tail".
    pub fn from_list(values: &[u64]) -> Option<Self> {
        if values.len() != 9 {
            return None;
        }
        Some(Self {
            lead: u16::try_from(values[0]).ok()?,
            flag_a: u8::try_from(values[1]).ok()?,
            flag_b: u8::try_from(values[2]).ok()?,
            option_num: u16::try_from(values[3]).ok()?,
            bullet_ai: u16::try_from(values[4]).ok()?,
            words: [
                u32::try_from(values[5]).ok()?,
                u32::try_from(values[6]).ok()?,
                u32::try_from(values[7]).ok()?,
                u32::try_from(values[8]).ok()?,
            ],
        })
    }
}

/// One decoded 88-byte shot record.
///
/// `f6` slots 1..6 have observed meanings: `y_off`, `x_sp`, `size`, `ang`
/// (radians), `spd`. Slot 0 is unnamed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRecord {
    pub interval: u16,
    pub delay: u16,
    pub f6: [f32; 6],
    pub tail: RecordTail,
    pub extra: [u8; EXTRA_SIZE],
}

impl ShotRecord {
    /// Decode the record at `addr`. The whole 88-byte window must be in
    /// bounds.
    pub fn decode(data: &[u8], addr: usize) -> Result<Self, RecordError> {
        if addr + RECORD_SIZE > data.len() {
            return Err(RecordError::OutOfBounds {
                addr,
                len: data.len(),
            });
        }
        let mut f6 = [0f32; 6];
        for (i, f) in f6.iter_mut().enumerate() {
            *f = read_f32(data, addr + F6_OFFSET + i * 4);
        }
        let mut extra = [0u8; EXTRA_SIZE];
        extra.copy_from_slice(&data[addr + EXTRA_OFFSET..addr + RECORD_SIZE]);
        Ok(Self {
            interval: read_u16(data, addr),
            delay: read_u16(data, addr + 2),
            f6,
            tail: RecordTail::decode(data, addr + TAIL_OFFSET),
            extra,
        })
    }

    /// Encode back to the exact 88-byte wire form.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..2].copy_from_slice(&self.interval.to_le_bytes());
        out[2..4].copy_from_slice(&self.delay.to_le_bytes());
        for (i, f) in self.f6.iter().enumerate() {
            out[F6_OFFSET + i * 4..F6_OFFSET + (i + 1) * 4].copy_from_slice(&f.to_le_bytes());
        }
        out[TAIL_OFFSET..EXTRA_OFFSET].copy_from_slice(&self.tail.encode());
        out[EXTRA_OFFSET..RECORD_SIZE].copy_from_slice(&self.extra);
        out
    }

    pub fn y_off(&self) -> f32 {
        self.f6[1]
    }
    pub fn x_sp(&self) -> f32 {
        self.f6[2]
    }
    pub fn size(&self) -> f32 {
        self.f6[3]
    }
    pub fn ang(&self) -> f32 {
        self.f6[4]
    }
    pub fn spd(&self) -> f32 {
        self.f6[5]
    }
}

/// A record together with its file address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordAt {
    pub addr: usize,
    pub rec: ShotRecord,
}

/// An ordered run of records closed by a sentinel (or by end of buffer).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    pub records: Vec<RecordAt>,
}

/// Scan forward from `start` in 88-byte strides, splitting levels on the
/// sentinel. A trailing run with no sentinel still becomes a level; records
/// are never silently dropped. Linear, no backtracking.
pub fn parse_levels(data: &[u8], start: usize) -> Vec<Level> {
    let mut levels = Vec::new();
    let mut cur = Level::default();
    let mut p = start;
    while p + RECORD_SIZE <= data.len() {
        // In bounds by the loop condition.
        let Ok(rec) = ShotRecord::decode(data, p) else {
            break;
        };
        cur.records.push(RecordAt { addr: p, rec });
        p += RECORD_SIZE;
        if p + 4 <= data.len() && data[p..p + 4] == LEVEL_SENTINEL {
            levels.push(std::mem::take(&mut cur));
            p += 4;
        }
    }
    if !cur.records.is_empty() {
        levels.push(cur);
    }
    levels
}
