//! JSON model for the lossless spec and its semantic overlay blocks.
//!
//! The spec is the round-trip intermediate: raw base64 spans per section plus
//! the trailer are sufficient to rebuild the file byte-for-byte. Semantic
//! blocks (`header`, `option_positions`, `shots_88`) are overlay input of the
//! same shape the extraction views produce. Every field a hand-edited spec
//! may omit is `Option` or defaulted, so partially specified JSON still
//! parses.

use serde::{Deserialize, Serialize};

use crate::layout::RECORD_START_ADDR;
use crate::record::{Level, RecordAt, RECORD_SIZE};

/// The only format tag this crate builds.
pub const FORMAT_TAG: &str = "TH15";

fn default_format() -> String {
    FORMAT_TAG.to_string()
}

// Header defaults for specs written from scratch, matching observed files.
fn default_unknown1() -> u16 {
    4
}

fn default_level_count() -> u16 {
    10
}

fn default_record_start() -> usize {
    RECORD_START_ADDR
}

fn default_record_size() -> usize {
    RECORD_SIZE
}

/// Top-level lossless spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShtSpec {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_unknown1")]
    pub unknown1: u16,
    #[serde(default = "default_level_count")]
    pub level_count: u16,
    #[serde(default)]
    pub header_floats: Vec<f32>,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_b64: Option<String>,
    /// Top-level semantic block, overlay input (written by `dumpu`/`dumpx`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_positions: Option<OptionPositions>,
    /// Top-level semantic block, overlay input (written by `dumpu`/`dumpx`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots_88: Option<ShotsBlock>,
    /// Explicit overlay block; wins over the top-level semantic blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlays: Option<Overlays>,
}

/// One captured section: absolute bounds plus the raw byte span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSpec {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_b64: Option<String>,
    /// Sub-lists of section 0 when the offset table heuristic matched.
    /// Informational decoration; `raw_b64` stays authoritative for the build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_lists_b64: Option<Vec<String>>,
}

/// Semantic patch container. Missing members leave the built bytes untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overlays {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderOverlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_positions: Option<OptionPositions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots_88: Option<ShotsBlock>,
}

/// Header field edits; absent fields keep the current buffer values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown1: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_count: Option<u16>,
    /// Applied only when exactly 7 floats are supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_floats: Option<Vec<f32>>,
}

/// The 20-pair option-position table, flat and/or grouped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionPositions {
    #[serde(default)]
    pub raw_pairs: Vec<[f32; 2]>,
    #[serde(default)]
    pub high: OptionGroup,
    #[serde(default)]
    pub low: OptionGroup,
}

/// One power group split into the fixed L1..L4 sub-groups (sizes 1,2,3,4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionGroup {
    #[serde(rename = "L1", default, skip_serializing_if = "Vec::is_empty")]
    pub l1: Vec<[f32; 2]>,
    #[serde(rename = "L2", default, skip_serializing_if = "Vec::is_empty")]
    pub l2: Vec<[f32; 2]>,
    #[serde(rename = "L3", default, skip_serializing_if = "Vec::is_empty")]
    pub l3: Vec<[f32; 2]>,
    #[serde(rename = "L4", default, skip_serializing_if = "Vec::is_empty")]
    pub l4: Vec<[f32; 2]>,
}

/// 88-byte record view: `start`/`record_size` describe the scan, `levels`
/// hold the sentinel-delimited runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotsBlock {
    #[serde(default = "default_record_start")]
    pub start: usize,
    #[serde(default = "default_record_size")]
    pub record_size: usize,
    #[serde(default)]
    pub levels: Vec<LevelSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelSpec {
    #[serde(default)]
    pub records: Vec<RecordSpec>,
}

/// One record, as extraction output and as overlay input.
///
/// As overlay input every field is optional; missing fields merge over the
/// existing bytes at `addr`. Precedence within the tail: `tail_raw` beats the
/// `tail` list, which beats the current bytes; `option_num`/`bullet_ai`
/// apply after the list. Named floats apply after `f6`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f6: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_num: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_ai: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_off: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_sp: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ang: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spd: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_raw: Option<String>,
}

impl RecordSpec {
    /// Full extraction view: every decoded field, including the redundant
    /// derived ones (`f6`, `tail_raw`, `option_num`, `bullet_ai`).
    pub fn full(at: &RecordAt) -> Self {
        let rec = &at.rec;
        Self {
            addr: Some(at.addr as i64),
            interval: Some(rec.interval),
            delay: Some(rec.delay),
            f6: Some(rec.f6.to_vec()),
            tail: Some(rec.tail.to_list().to_vec()),
            option_num: Some(rec.tail.option_num),
            bullet_ai: Some(rec.tail.bullet_ai),
            y_off: Some(rec.y_off()),
            x_sp: Some(rec.x_sp()),
            size: Some(rec.size()),
            ang: Some(rec.ang()),
            spd: Some(rec.spd()),
            tail_raw: Some(hex::encode(rec.tail.encode())),
            extra_raw: Some(hex::encode(rec.extra)),
        }
    }

    /// Enriched-dump view: one authoritative representation per value. The
    /// convenience duplicates are stripped so edits cannot disagree.
    pub fn authoritative(at: &RecordAt) -> Self {
        let mut spec = Self::full(at);
        spec.f6 = None;
        spec.tail_raw = None;
        spec.option_num = None;
        spec.bullet_ai = None;
        spec
    }
}

impl ShotsBlock {
    pub fn full(levels: &[Level]) -> Self {
        Self::from_levels(levels, RecordSpec::full)
    }

    pub fn authoritative(levels: &[Level]) -> Self {
        Self::from_levels(levels, RecordSpec::authoritative)
    }

    fn from_levels(levels: &[Level], convert: fn(&RecordAt) -> RecordSpec) -> Self {
        Self {
            start: RECORD_START_ADDR,
            record_size: RECORD_SIZE,
            levels: levels
                .iter()
                .map(|level| LevelSpec {
                    records: level.records.iter().map(convert).collect(),
                })
                .collect(),
        }
    }
}

/// Per-file analytical JSON produced by the `extract` view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractDoc {
    pub file: String,
    pub option_positions: OptionPositions,
    pub shots_88: ShotsBlock,
}
