//! Lossless dump/build engine.
//!
//! `dump` captures every byte of the input in exactly one span: three raw
//! section blobs plus the 64-byte trailer, with the header fields decoded
//! alongside. `build` reassembles from those spans and patches the header in
//! last, so `build(dump(file)) == file` whenever no overlay is applied.
//! Section 0 is additionally decorated with per-level sub-lists when the
//! ascending-offsets heuristic finds the table; the decoration never affects
//! the rebuild.

use base64::prelude::*;
use thiserror::Error;

use crate::layout::{
    self, read_u32, LayoutError, BODY_ORIGIN, HEADER_SIZE, SECTION_ALIGN, SECTION_INDEX_OFFSET,
    TRAILER_SIZE,
};
use crate::options;
use crate::overlay;
use crate::record::{parse_levels, LEVEL_SENTINEL};
use crate::spec::{SectionSpec, ShotsBlock, ShtSpec, FORMAT_TAG};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unsupported format {0:?}: only TH15 specs can be built")]
    UnsupportedFormat(String),

    #[error("TH15 build expects exactly 3 sections in spec, got {0}")]
    SectionCount(usize),

    #[error("section {0} missing raw_b64 for lossless build")]
    MissingSectionBytes(usize),

    #[error("trailer_b64 must decode to 64 bytes, got {0}")]
    BadTrailer(usize),

    #[error("invalid base64 in spec: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Heuristic location of the section-0 offset table: the first 4-aligned run
/// of `level_count` ascending u32 values, first value 0, all multiples of 4.
/// Speculative by nature, so absence is never an error.
pub fn find_section0_table(
    data: &[u8],
    start: usize,
    end: usize,
    level_count: u16,
) -> Option<(usize, Vec<u32>)> {
    let count = level_count as usize;
    let need = count.checked_mul(4)?;
    if count == 0 || end > data.len() || end < start + need {
        return None;
    }
    for p in (start..end - need).step_by(4) {
        let vals: Vec<u32> = (0..count).map(|i| read_u32(data, p + 4 * i)).collect();
        if vals[0] != 0 {
            continue;
        }
        if vals.windows(2).any(|w| w[0] > w[1]) {
            continue;
        }
        if vals.iter().any(|v| v % 4 != 0) {
            continue;
        }
        return Some((p, vals));
    }
    None
}

/// Produce the lossless spec for a file.
pub fn dump(data: &[u8]) -> Result<ShtSpec, LayoutError> {
    let header = layout::read_header(data)?;
    let idx = layout::section_indices(data)?;
    let sections = layout::compute_sections(data.len(), idx);

    let mut spec = ShtSpec {
        format: FORMAT_TAG.to_string(),
        unknown1: header.unknown1,
        level_count: header.level_count,
        header_floats: header.floats.to_vec(),
        sections: Vec::with_capacity(3),
        trailer_b64: Some(BASE64_STANDARD.encode(&data[data.len().saturating_sub(TRAILER_SIZE)..])),
        option_positions: None,
        shots_88: None,
        overlays: None,
    };

    for (si, &(start, end)) in sections.iter().enumerate() {
        // Corrupt geometry gets clamped; round-trip identity only holds for
        // well-formed files anyway.
        let st = start.min(data.len());
        let en = end.min(data.len()).max(st);
        let mut entry = SectionSpec {
            start,
            end,
            raw_b64: Some(BASE64_STANDARD.encode(&data[st..en])),
            raw_lists_b64: None,
        };
        if si == 0 {
            if let Some((pos, offsets)) = find_section0_table(data, st, en, header.level_count) {
                entry.raw_lists_b64 = Some(split_sub_lists(data, en, pos, &offsets));
            }
        }
        spec.sections.push(entry);
    }
    Ok(spec)
}

/// Slice the sub-lists the offset table describes. The list base sits right
/// after the table; the last sub-list runs to the section end.
fn split_sub_lists(data: &[u8], section_end: usize, table_pos: usize, offsets: &[u32]) -> Vec<String> {
    let base = table_pos + 4 * offsets.len();
    let mut lists = Vec::with_capacity(offsets.len());
    for (i, &off) in offsets.iter().enumerate() {
        let a = (base + off as usize).min(section_end);
        let b = match offsets.get(i + 1) {
            Some(&next) => (base + next as usize).min(section_end).max(a),
            None => section_end.max(a),
        };
        lists.push(BASE64_STANDARD.encode(&data[a..b]));
    }
    lists
}

/// Rebuild a file from a spec, then apply any overlays it carries.
pub fn build(spec: &ShtSpec) -> Result<Vec<u8>, BuildError> {
    if !spec.format.eq_ignore_ascii_case(FORMAT_TAG) {
        return Err(BuildError::UnsupportedFormat(spec.format.clone()));
    }
    if spec.sections.len() != 3 {
        return Err(BuildError::SectionCount(spec.sections.len()));
    }

    let mut header_floats = spec.header_floats.clone();
    header_floats.resize(7, 0.0);

    // Assemble sections after the zero-filled body origin, 16-aligning the
    // cursor before each one so the recorded offsets stay index-exact.
    let mut out = vec![0u8; BODY_ORIGIN];
    let mut offsets = [0usize; 3];
    for (si, section) in spec.sections.iter().enumerate() {
        let raw_b64 = section
            .raw_b64
            .as_deref()
            .ok_or(BuildError::MissingSectionBytes(si))?;
        let raw = BASE64_STANDARD.decode(raw_b64)?;
        let pad = out.len().next_multiple_of(SECTION_ALIGN) - out.len();
        out.extend(std::iter::repeat(0u8).take(pad));
        offsets[si] = out.len();
        out.extend_from_slice(&raw);
    }

    match spec.trailer_b64.as_deref() {
        Some(b64) => {
            let trailer = BASE64_STANDARD.decode(b64)?;
            if trailer.len() != TRAILER_SIZE {
                return Err(BuildError::BadTrailer(trailer.len()));
            }
            out.extend_from_slice(&trailer);
        }
        None => {
            // Fallback guess at a minimal trailer: a no-level single run.
            out.extend_from_slice(&[0u8; TRAILER_SIZE - 4]);
            out.extend_from_slice(&LEVEL_SENTINEL);
        }
    }

    write_header(&mut out, spec.unknown1, spec.level_count, &header_floats, offsets);

    // Effective overlay per slot: the overlays block wins over the top-level
    // semantic blocks of the same shape.
    let explicit = spec.overlays.as_ref();
    let header_ov = explicit.and_then(|o| o.header.as_ref());
    let option_ov = explicit
        .and_then(|o| o.option_positions.as_ref())
        .or(spec.option_positions.as_ref());
    let shots_ov = explicit
        .and_then(|o| o.shots_88.as_ref())
        .or(spec.shots_88.as_ref());
    overlay::apply(&mut out, header_ov, option_ov, shots_ov);

    Ok(out)
}

fn write_header(out: &mut [u8], unknown1: u16, level_count: u16, floats: &[f32], offsets: [usize; 3]) {
    out[0..2].copy_from_slice(&unknown1.to_le_bytes());
    out[2..4].copy_from_slice(&level_count.to_le_bytes());
    for (i, f) in floats.iter().take(7).enumerate() {
        out[4 + i * 4..8 + i * 4].copy_from_slice(&f.to_le_bytes());
    }
    for (i, off) in offsets.iter().enumerate() {
        let idx = (off / SECTION_ALIGN) as u32;
        let at = SECTION_INDEX_OFFSET + i * 4;
        out[at..at + 4].copy_from_slice(&idx.to_le_bytes());
    }
    debug_assert!(out.len() >= HEADER_SIZE);
}

/// `dump`, then `build`, yielding an identical copy of a well-formed input.
pub fn repack(data: &[u8]) -> Result<Vec<u8>, BuildError> {
    build(&dump(data)?)
}

/// Lossless spec enriched with the semantic top-level blocks
/// (`option_positions` and `shots_88`), records stripped to one
/// authoritative representation per value.
pub fn dump_enriched(data: &[u8]) -> Result<ShtSpec, LayoutError> {
    let mut spec = dump(data)?;
    spec.option_positions = Some(options::extract(data));
    let levels = parse_levels(data, layout::RECORD_START_ADDR);
    spec.shots_88 = Some(ShotsBlock::authoritative(&levels));
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RECORD_START_ADDR;
    use crate::record::{RecordAt, ShotRecord, RECORD_SIZE};
    use crate::spec::{LevelSpec, Overlays, RecordSpec};

    /// Synthetic well-formed file: header, option table inside section 0,
    /// records in section 2, default trailer.
    fn synthetic_file(level_count: u16) -> Vec<u8> {
        // Section bounds in 16-byte units: 0x40.., 0x100.., 0x100.., trailer
        // after two records plus sentinel, padded to keep bounds aligned.
        let s0 = 0x40usize;
        let s1 = 0x100usize;
        let s2 = 0x100usize;
        let body_end = s2 + 0x100;

        let mut data = vec![0u8; body_end + 64];
        data[0..2].copy_from_slice(&4u16.to_le_bytes());
        data[2..4].copy_from_slice(&level_count.to_le_bytes());
        for i in 0..7 {
            data[4 + i * 4..8 + i * 4].copy_from_slice(&(i as f32 * 0.5).to_le_bytes());
        }
        for (i, sec) in [s0, s1, s2].iter().enumerate() {
            let at = SECTION_INDEX_OFFSET + i * 4;
            data[at..at + 4].copy_from_slice(&((sec / 16) as u32).to_le_bytes());
        }
        // Option table content.
        for i in 0..40 {
            let off = 0x40 + i * 4;
            data[off..off + 4].copy_from_slice(&(i as f32).to_le_bytes());
        }
        // Two records then a sentinel at the canonical start address.
        for r in 0..2usize {
            let addr = RECORD_START_ADDR + r * RECORD_SIZE;
            data[addr..addr + 2].copy_from_slice(&((r as u16) + 1).to_le_bytes());
            data[addr + 4..addr + 8].copy_from_slice(&(-8.0f32).to_le_bytes());
        }
        let sentinel_at = RECORD_START_ADDR + 2 * RECORD_SIZE;
        data[sentinel_at..sentinel_at + 4].copy_from_slice(&LEVEL_SENTINEL);
        // Default trailer form.
        let len = data.len();
        data[len - 4..].copy_from_slice(&LEVEL_SENTINEL);
        data
    }

    #[test]
    fn round_trip_identity() {
        let file = synthetic_file(10);
        let rebuilt = build(&dump(&file).unwrap()).unwrap();
        assert_eq!(rebuilt, file);
    }

    #[test]
    fn repack_is_idempotent() {
        let file = synthetic_file(10);
        let once = repack(&file).unwrap();
        let twice = repack(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn header_indices_match_section_starts() {
        let file = synthetic_file(10);
        let spec = dump(&file).unwrap();
        let rebuilt = build(&spec).unwrap();
        for (i, section) in spec.sections.iter().enumerate() {
            let at = SECTION_INDEX_OFFSET + i * 4;
            let idx = read_u32(&rebuilt, at) as usize;
            assert_eq!(idx, section.start / SECTION_ALIGN);
        }
    }

    #[test]
    fn default_trailer_is_sixty_zeros_and_sentinel() {
        let file = synthetic_file(10);
        let mut spec = dump(&file).unwrap();
        spec.trailer_b64 = None;
        let rebuilt = build(&spec).unwrap();
        let trailer = &rebuilt[rebuilt.len() - TRAILER_SIZE..];
        assert_eq!(&trailer[..60], &[0u8; 60]);
        assert_eq!(&trailer[60..], &LEVEL_SENTINEL);
    }

    #[test]
    fn build_rejects_structural_problems() {
        let file = synthetic_file(10);
        let good = dump(&file).unwrap();

        let mut spec = good.clone();
        spec.sections.pop();
        assert!(matches!(build(&spec), Err(BuildError::SectionCount(2))));

        let mut spec = good.clone();
        spec.sections[1].raw_b64 = None;
        assert!(matches!(
            build(&spec),
            Err(BuildError::MissingSectionBytes(1))
        ));

        let mut spec = good.clone();
        spec.trailer_b64 = Some(BASE64_STANDARD.encode([0u8; 63]));
        assert!(matches!(build(&spec), Err(BuildError::BadTrailer(63))));

        let mut spec = good;
        spec.format = "TH16".to_string();
        assert!(matches!(build(&spec), Err(BuildError::UnsupportedFormat(_))));
    }

    #[test]
    fn format_tag_check_is_case_insensitive() {
        let file = synthetic_file(10);
        let mut spec = dump(&file).unwrap();
        spec.format = "th15".to_string();
        assert_eq!(build(&spec).unwrap(), file);
    }

    #[test]
    fn dump_rejects_short_input() {
        assert!(matches!(
            dump(&[0u8; HEADER_SIZE - 1]),
            Err(LayoutError::TooSmall { .. })
        ));
    }

    #[test]
    fn section0_table_detection() {
        let mut file = synthetic_file(4);
        // Plant an ascending offset table at the start of section 0.
        let table = [0u32, 8, 16, 28];
        for (i, v) in table.iter().enumerate() {
            let at = 0x40 + i * 4;
            file[at..at + 4].copy_from_slice(&v.to_le_bytes());
        }
        let (pos, vals) = find_section0_table(&file, 0x40, 0x100, 4).unwrap();
        assert_eq!(pos, 0x40);
        assert_eq!(vals, table);

        let spec = dump(&file).unwrap();
        let lists = spec.sections[0].raw_lists_b64.as_ref().unwrap();
        assert_eq!(lists.len(), 4);
        let first = BASE64_STANDARD.decode(&lists[0]).unwrap();
        assert_eq!(first.len(), 8);
        // Last sub-list runs to the section end.
        let last = BASE64_STANDARD.decode(&lists[3]).unwrap();
        assert_eq!(0x40 + 16 + 28 + last.len(), 0x100);

        // Decoration never breaks the round trip.
        assert_eq!(build(&spec).unwrap(), file);
    }

    #[test]
    fn section0_table_absent_cases() {
        let file = synthetic_file(10);
        // Zero level_count never matches, nor does a range too small to
        // hold the table.
        assert!(find_section0_table(&file, 0x40, 0x100, 0).is_none());
        assert!(find_section0_table(&file, 0x40, 0x44, 2).is_none());
        // A descending run is rejected.
        let mut noise = vec![1u8; 0x40];
        noise[0..4].copy_from_slice(&0u32.to_le_bytes());
        noise[4..8].copy_from_slice(&16u32.to_le_bytes());
        noise[8..12].copy_from_slice(&8u32.to_le_bytes());
        assert!(find_section0_table(&noise, 0, 0x20, 3).is_none());
    }

    #[test]
    fn overlays_block_wins_over_top_level() {
        let file = synthetic_file(10);
        let mut spec = dump(&file).unwrap();
        let patch = |interval| {
            Some(ShotsBlock {
                start: RECORD_START_ADDR,
                record_size: RECORD_SIZE,
                levels: vec![LevelSpec {
                    records: vec![RecordSpec {
                        addr: Some(RECORD_START_ADDR as i64),
                        interval: Some(interval),
                        ..Default::default()
                    }],
                }],
            })
        };
        spec.shots_88 = patch(100);
        spec.overlays = Some(Overlays {
            shots_88: patch(200),
            ..Default::default()
        });

        let rebuilt = build(&spec).unwrap();
        let rec = ShotRecord::decode(&rebuilt, RECORD_START_ADDR).unwrap();
        assert_eq!(rec.interval, 200);
    }

    #[test]
    fn enriched_dump_still_builds_identically() {
        let file = synthetic_file(10);
        let spec = dump_enriched(&file).unwrap();
        let shots = spec.shots_88.as_ref().unwrap();
        assert_eq!(shots.start, RECORD_START_ADDR);
        // One sentinel-closed level, plus the partial run the scan keeps
        // picking up past it (zeros in section 2 and the trailer).
        assert_eq!(shots.levels.len(), 2);
        assert_eq!(shots.levels[0].records.len(), 2);
        let first = &shots.levels[0].records[0];
        assert!(first.f6.is_none());
        assert!(first.tail.is_some());

        // The semantic blocks replay the decoded values onto identical bytes.
        assert_eq!(build(&spec).unwrap(), file);
    }

    #[test]
    fn concrete_scenario_round_trips() {
        // unknown1=4, level_count=10, known sections, default-form trailer.
        let file = synthetic_file(10);
        let spec = dump(&file).unwrap();
        assert_eq!(spec.unknown1, 4);
        assert_eq!(spec.level_count, 10);
        assert_eq!(spec.sections[0].start, 0x40);
        let rebuilt = build(&spec).unwrap();
        assert_eq!(rebuilt, file);
        let _ = RecordAt {
            addr: RECORD_START_ADDR,
            rec: ShotRecord::decode(&rebuilt, RECORD_START_ADDR).unwrap(),
        };
    }
}
