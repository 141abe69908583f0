//! Human-readable per-level text reports.
//!
//! Read-only consumer of already-parsed levels; no format parsing happens
//! here.

use std::fmt::Write as _;

use crate::record::{Level, RecordAt, RECORD_SIZE};

/// Render the per-level record dump for one file.
pub fn levels_report(file_name: &str, start: usize, levels: &[Level]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {file_name}");
    let _ = writeln!(
        out,
        "Start: {start:#X}, record_size={RECORD_SIZE}, sentinel=0xFFFFFFFF"
    );
    let _ = writeln!(out, "Levels detected: {}", levels.len());
    let _ = writeln!(out);

    for (li, level) in levels.iter().enumerate() {
        let _ = writeln!(out, "Level {li}: {} records", level.records.len());
        for (ri, at) in level.records.iter().enumerate() {
            let rec = &at.rec;
            let _ = writeln!(
                out,
                "  [{ri:02}] iv={} dl={} y_off={:.3} x_sp={:.3} size={:.3} ang={:.6} spd={:.3} tail=({}) extra={}",
                rec.interval,
                rec.delay,
                rec.y_off(),
                rec.x_sp(),
                rec.size(),
                rec.ang(),
                rec.spd(),
                tail_values(at),
                hex::encode(rec.extra),
            );
        }
        let _ = writeln!(out);
    }
    out
}

fn tail_values(at: &RecordAt) -> String {
    at.rec
        .tail
        .to_list()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
