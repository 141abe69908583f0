//! Handlers for the derived analytical views: extract, levels, chunks.

use anyhow::Result;
use std::path::{Path, PathBuf};

use sht::layout::RECORD_START_ADDR;
use sht::{ExtractDoc, ShotsBlock};

use crate::cli::Style;
use crate::file_io;

/// Handle `sht extract`
pub fn extract(files: &[PathBuf], style: Style) -> Result<()> {
    let inputs = file_io::resolve_sht_inputs(files, Path::new("."))?;
    if inputs.is_empty() {
        println!("No .sht files found.");
        return Ok(());
    }
    for input in inputs {
        let data = file_io::read_bytes(&input)?;
        let doc = ExtractDoc {
            file: file_name(&input),
            option_positions: sht::options::extract(&data),
            shots_88: ShotsBlock::full(&sht::parse_levels(&data, RECORD_START_ADDR)),
        };
        let output = input.with_extension("json");
        file_io::write_text(&output, &render(&doc, style)?)?;
        println!("Wrote {}", output.display());
    }
    Ok(())
}

fn render(doc: &ExtractDoc, style: Style) -> Result<String> {
    let text = match style {
        Style::Pretty => serde_json::to_string_pretty(doc)?,
        Style::Compact => serde_json::to_string(doc)?,
        Style::Records => render_per_record(doc)?,
    };
    Ok(text)
}

/// Compact overall, but each level's records printed one per line so diffs
/// and hand edits stay readable.
fn render_per_record(doc: &ExtractDoc) -> Result<String> {
    let file = serde_json::to_string(&doc.file)?;
    let opts = serde_json::to_string(&doc.option_positions)?;
    let mut levels = Vec::with_capacity(doc.shots_88.levels.len());
    for level in &doc.shots_88.levels {
        let recs = level
            .records
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?
            .join(",\n  ");
        let records = if recs.is_empty() {
            "[]".to_string()
        } else {
            format!("[\n  {recs}\n]")
        };
        levels.push(format!("{{\"records\":{records}}}"));
    }
    Ok(format!(
        "{{\"file\":{file},\"option_positions\":{opts},\"shots_88\":{{\"start\":{},\"record_size\":{},\"levels\":[\n {}\n]}}}}",
        doc.shots_88.start,
        doc.shots_88.record_size,
        levels.join(",\n "),
    ))
}

/// Handle `sht levels`
pub fn levels(files: &[PathBuf]) -> Result<()> {
    let inputs = file_io::resolve_sht_inputs(files, Path::new("."))?;
    if inputs.is_empty() {
        println!("No .sht files found.");
        return Ok(());
    }
    for input in inputs {
        let data = file_io::read_bytes(&input)?;
        let parsed = sht::parse_levels(&data, RECORD_START_ADDR);
        let report = sht::report::levels_report(&file_name(&input), RECORD_START_ADDR, &parsed);
        let output = file_io::sibling_with_suffix(&input, "_88levels.txt");
        file_io::write_text(&output, &report)?;
        println!("Wrote {}", output.display());
    }
    Ok(())
}

/// Handle `sht chunks`
pub fn chunks(input: &Path, output: Option<&Path>) -> Result<()> {
    let data = file_io::read_bytes(input)?;
    let hits = sht::scan::pattern_hits(&data).len();
    let found = sht::scan::find_template_chunks(&data);
    let report = sht::scan::chunks_report(&file_name(input), hits, &found);
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| file_io::sibling_with_suffix(input, "_88byte_templates.md"));
    file_io::write_text(&output, &report)?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sht::record::{LEVEL_SENTINEL, RECORD_SIZE};

    fn file_with_records() -> Vec<u8> {
        let mut data = vec![0u8; RECORD_START_ADDR];
        data.extend_from_slice(&[0u8; RECORD_SIZE]);
        data.extend_from_slice(&LEVEL_SENTINEL);
        data.extend_from_slice(&[0u8; RECORD_SIZE]);
        data.extend_from_slice(&LEVEL_SENTINEL);
        data
    }

    #[test]
    fn extract_writes_json_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pl01.sht");
        std::fs::write(&input, file_with_records()).unwrap();

        extract(&[input.clone()], Style::Compact).unwrap();

        let text = std::fs::read_to_string(dir.path().join("pl01.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["file"], "pl01.sht");
        assert_eq!(doc["shots_88"]["record_size"], 88);
        assert_eq!(doc["shots_88"]["levels"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn per_record_style_is_valid_json() {
        let data = file_with_records();
        let doc = ExtractDoc {
            file: "pl01.sht".to_string(),
            option_positions: sht::options::extract(&data),
            shots_88: ShotsBlock::full(&sht::parse_levels(&data, RECORD_START_ADDR)),
        };
        let text = render_per_record(&doc).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["shots_88"]["levels"].as_array().unwrap().len(), 2);
        // One record per line inside a level.
        assert!(text.contains(",\n "));
    }

    #[test]
    fn levels_report_lands_in_suffixed_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pl02.sht");
        std::fs::write(&input, file_with_records()).unwrap();

        levels(&[input]).unwrap();

        let text = std::fs::read_to_string(dir.path().join("pl02_88levels.txt")).unwrap();
        assert!(text.contains("Levels detected: 2"));
    }

    #[test]
    fn chunks_report_default_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pl03.sht");
        let mut data = file_with_records();
        let addr = RECORD_START_ADDR + 8;
        data[addr..addr + 20].copy_from_slice(&sht::scan::template_pattern());
        std::fs::write(&input, data).unwrap();

        chunks(&input, None).unwrap();

        let text =
            std::fs::read_to_string(dir.path().join("pl03_88byte_templates.md")).unwrap();
        assert!(text.contains("Pattern hits: 1"));
        assert!(text.contains("Chunk starts: 1"));
    }
}
