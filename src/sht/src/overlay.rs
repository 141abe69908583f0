//! Semantic patches applied on top of an already byte-exact buffer.
//!
//! Order is header, option positions, records; later writes win. Every patch
//! merges onto the bytes already present, and a malformed or out-of-range
//! item is a silent per-item skip, never an abort. Round-trip tooling has to
//! tolerate hand-edited specs with holes in them.

use crate::layout::{read_u16, OPTION_TABLE_END, OPTION_TABLE_START};
use crate::options;
use crate::record::{RecordTail, ShotRecord, EXTRA_SIZE, RECORD_SIZE, TAIL_SIZE};
use crate::spec::{HeaderOverlay, OptionPositions, RecordSpec, ShotsBlock};

/// Apply all supplied overlays to the buffer.
pub fn apply(
    buf: &mut [u8],
    header: Option<&HeaderOverlay>,
    option_positions: Option<&OptionPositions>,
    shots: Option<&ShotsBlock>,
) {
    if let Some(hdr) = header {
        apply_header(buf, hdr);
    }
    if let Some(opt) = option_positions {
        apply_option_positions(buf, opt);
    }
    if let Some(shots) = shots {
        apply_records(buf, shots);
    }
}

fn apply_header(buf: &mut [u8], hdr: &HeaderOverlay) {
    if buf.len() < 0x20 {
        return;
    }
    let unknown1 = hdr.unknown1.unwrap_or_else(|| read_u16(buf, 0));
    let level_count = hdr.level_count.unwrap_or_else(|| read_u16(buf, 2));
    buf[0..2].copy_from_slice(&unknown1.to_le_bytes());
    buf[2..4].copy_from_slice(&level_count.to_le_bytes());
    if let Some(floats) = hdr.header_floats.as_deref() {
        if floats.len() == 7 {
            for (i, f) in floats.iter().enumerate() {
                buf[4 + i * 4..8 + i * 4].copy_from_slice(&f.to_le_bytes());
            }
        }
    }
}

fn apply_option_positions(buf: &mut [u8], opt: &OptionPositions) {
    let Some(pairs) = options::flatten(opt) else {
        return;
    };
    if buf.len() < OPTION_TABLE_END {
        return;
    }
    for (i, [x, y]) in pairs.iter().enumerate() {
        let off = OPTION_TABLE_START + i * 8;
        buf[off..off + 4].copy_from_slice(&x.to_le_bytes());
        buf[off + 4..off + 8].copy_from_slice(&y.to_le_bytes());
    }
}

fn apply_records(buf: &mut [u8], shots: &ShotsBlock) {
    for level in &shots.levels {
        for rec in &level.records {
            apply_record(buf, rec);
        }
    }
}

/// Merge one record patch over the existing 88-byte window at its address.
fn apply_record(buf: &mut [u8], patch: &RecordSpec) {
    let Ok(addr) = usize::try_from(patch.addr.unwrap_or(-1)) else {
        return;
    };
    match addr.checked_add(RECORD_SIZE) {
        Some(end) if end <= buf.len() => {}
        _ => return,
    }

    if patch.interval.is_some() || patch.delay.is_some() {
        let interval = patch.interval.unwrap_or_else(|| read_u16(buf, addr));
        let delay = patch.delay.unwrap_or_else(|| read_u16(buf, addr + 2));
        buf[addr..addr + 2].copy_from_slice(&interval.to_le_bytes());
        buf[addr + 2..addr + 4].copy_from_slice(&delay.to_le_bytes());
    }

    // Window is in bounds, checked above.
    let Ok(current) = ShotRecord::decode(buf, addr) else {
        return;
    };

    let mut f6 = current.f6;
    if let Some(patch_f6) = patch.f6.as_deref() {
        if patch_f6.len() == 6 {
            f6.copy_from_slice(patch_f6);
        }
    }
    // Named fields beat the f6 replacement.
    for (slot, value) in [
        (1, patch.y_off),
        (2, patch.x_sp),
        (3, patch.size),
        (4, patch.ang),
        (5, patch.spd),
    ] {
        if let Some(v) = value {
            f6[slot] = v;
        }
    }
    for (i, f) in f6.iter().enumerate() {
        buf[addr + 4 + i * 4..addr + 8 + i * 4].copy_from_slice(&f.to_le_bytes());
    }

    // Tail precedence: tail_raw > tail list > individual fields over current.
    // A present tail_raw claims the tail even when it fails to decode.
    if let Some(raw) = patch.tail_raw.as_deref() {
        if let Some(bytes) = decode_hex_exact(raw, TAIL_SIZE) {
            buf[addr + 28..addr + 52].copy_from_slice(&bytes);
        }
    } else {
        let mut tail = current.tail;
        if let Some(list) = patch.tail.as_deref() {
            if let Some(replacement) = RecordTail::from_list(list) {
                tail = replacement;
            }
        }
        if let Some(option_num) = patch.option_num {
            tail.option_num = option_num;
        }
        if let Some(bullet_ai) = patch.bullet_ai {
            tail.bullet_ai = bullet_ai;
        }
        buf[addr + 28..addr + 52].copy_from_slice(&tail.encode());
    }

    if let Some(raw) = patch.extra_raw.as_deref() {
        if let Some(bytes) = decode_hex_exact(raw, EXTRA_SIZE) {
            buf[addr + 52..addr + 88].copy_from_slice(&bytes);
        }
    }
}

/// Hex-decode expecting an exact byte length; anything else is `None`.
fn decode_hex_exact(s: &str, len: usize) -> Option<Vec<u8>> {
    let bytes = hex::decode(s).ok()?;
    (bytes.len() == len).then_some(bytes)
}
