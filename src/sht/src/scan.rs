//! Pattern-based discovery of candidate 88-byte template chunks.
//!
//! Searches for the 20-byte little-endian signature of five known floats
//! from the record core, `[-8.0, 48.0, 18.0, -1.5707964, 24.0]` (the angle
//! given as its exact bit pattern). Those five floats sit at offset +8 of a
//! record, so each hit at `p` names a candidate window at `p - 8`. Uses
//! memmem for the search, same as the rest of the chunk tooling.

use std::fmt::Write as _;

use memchr::memmem;

use crate::record::{RecordAt, ShotRecord};

/// Offset of the signature inside the 88-byte window.
const PATTERN_OFFSET: usize = 8;

/// The 20-byte signature: f6 slots 1..6 of the known template record.
pub fn template_pattern() -> [u8; 20] {
    let mut pattern = [0u8; 20];
    for (i, f) in [-8.0f32, 48.0, 18.0].iter().enumerate() {
        pattern[i * 4..(i + 1) * 4].copy_from_slice(&f.to_le_bytes());
    }
    // -1.5707963705062866, bit-exact
    pattern[12..16].copy_from_slice(&[0xDB, 0x0F, 0xC9, 0xBF]);
    pattern[16..20].copy_from_slice(&24.0f32.to_le_bytes());
    pattern
}

/// Absolute offsets of every signature occurrence.
pub fn pattern_hits(data: &[u8]) -> Vec<usize> {
    memmem::find_iter(data, &template_pattern()).collect()
}

/// Decode the in-bounds 88-byte windows starting 8 bytes before each hit.
pub fn find_template_chunks(data: &[u8]) -> Vec<RecordAt> {
    let mut starts: Vec<usize> = pattern_hits(data)
        .into_iter()
        .filter(|&p| p >= PATTERN_OFFSET)
        .map(|p| p - PATTERN_OFFSET)
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
        .into_iter()
        .filter_map(|addr| {
            let rec = ShotRecord::decode(data, addr).ok()?;
            Some(RecordAt { addr, rec })
        })
        .collect()
}

/// Markdown table of the candidate chunks for one file.
pub fn chunks_report(file_name: &str, hits: usize, chunks: &[RecordAt]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {file_name} — 88-byte Template Chunks (pattern-based)");
    let _ = writeln!(out, "- Pattern hits: {hits}");
    let _ = writeln!(out, "- Chunk starts: {}", chunks.len());
    let _ = writeln!(
        out,
        "- Pattern floats (last 5 of f6): [-8.0, 48.0, 18.0, -1.570796, 24.0]"
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| # | Start | iv | dl | f6 (6 floats) | tail (H,B,B,H,H,4I) | extra [+52..+88) |"
    );
    let _ = writeln!(
        out,
        "|---|-------|----|----|----------------|---------------------|------------------|"
    );
    for (i, at) in chunks.iter().enumerate() {
        let rec = &at.rec;
        let f6 = rec
            .f6
            .iter()
            .map(|x| format!("{x:.6}"))
            .collect::<Vec<_>>()
            .join(", ");
        let t = rec.tail;
        let tail = format!(
            "{},{},{},{},{},{:#010x},{:#010x},{:#010x},{:#010x}",
            t.lead,
            t.flag_a,
            t.flag_b,
            t.option_num,
            t.bullet_ai,
            t.words[0],
            t.words[1],
            t.words[2],
            t.words[3],
        );
        let _ = writeln!(
            out,
            "| {i:02} | {:#06X} | {} | {} | {f6} | {tail} | {} |",
            at.addr,
            rec.interval,
            rec.delay,
            hex::encode(rec.extra),
        );
    }
    out
}
