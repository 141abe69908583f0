//! Handlers for the lossless dump/build/repack commands.

use anyhow::{Context, Result};
use std::path::Path;

use crate::file_io;

/// Handle `sht dump`
pub fn dump(input: &Path, output: &Path) -> Result<()> {
    let data = file_io::read_bytes(input)?;
    let spec = sht::dump(&data)
        .with_context(|| format!("Failed to dump {}", input.display()))?;
    write_spec(output, &spec)
}

/// Handle `sht dumpx` / `sht dumpu`
pub fn dump_enriched(input: &Path, output: &Path) -> Result<()> {
    let data = file_io::read_bytes(input)?;
    let spec = sht::dump_enriched(&data)
        .with_context(|| format!("Failed to dump {}", input.display()))?;
    write_spec(output, &spec)
}

fn write_spec(output: &Path, spec: &sht::ShtSpec) -> Result<()> {
    let json = serde_json::to_string_pretty(spec).context("Failed to serialize spec")?;
    file_io::write_text(output, &json)?;
    println!("Wrote {}", output.display());
    Ok(())
}

/// Handle `sht build`
pub fn build(input: &Path, output: &Path) -> Result<()> {
    let text = file_io::read_bytes(input)?;
    let spec: sht::ShtSpec = serde_json::from_slice(&text)
        .with_context(|| format!("Failed to parse spec {}", input.display()))?;
    let data = sht::build(&spec).context("Failed to build .sht from spec")?;
    file_io::write_bytes(output, &data)?;
    println!("Wrote {} ({} bytes).", output.display(), data.len());
    Ok(())
}

/// Handle `sht repack`
pub fn repack(input: &Path, output: &Path) -> Result<()> {
    let data = file_io::read_bytes(input)?;
    let out = sht::repack(&data)
        .with_context(|| format!("Failed to repack {}", input.display()))?;
    file_io::write_bytes(output, &out)?;
    println!(
        "Repacked {} -> {} ({} bytes).",
        input.display(),
        output.display(),
        out.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sht::layout::{SECTION_INDEX_OFFSET, TRAILER_SIZE};

    fn minimal_file() -> Vec<u8> {
        let mut data = vec![0u8; 0x100 + TRAILER_SIZE];
        data[0..2].copy_from_slice(&4u16.to_le_bytes());
        data[2..4].copy_from_slice(&10u16.to_le_bytes());
        for (i, idx) in [4u32, 8, 12].iter().enumerate() {
            let at = SECTION_INDEX_OFFSET + i * 4;
            data[at..at + 4].copy_from_slice(&idx.to_le_bytes());
        }
        data
    }

    #[test]
    fn dump_then_build_reproduces_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let sht_path = dir.path().join("pl00.sht");
        let json_path = dir.path().join("pl00.json");
        let out_path = dir.path().join("out.sht");
        let original = minimal_file();
        std::fs::write(&sht_path, &original).unwrap();

        dump(&sht_path, &json_path).unwrap();
        build(&json_path, &out_path).unwrap();

        assert_eq!(std::fs::read(&out_path).unwrap(), original);
    }

    #[test]
    fn repack_writes_identical_copy() {
        let dir = tempfile::tempdir().unwrap();
        let sht_path = dir.path().join("pl00.sht");
        let out_path = dir.path().join("copy.sht");
        let original = minimal_file();
        std::fs::write(&sht_path, &original).unwrap();

        repack(&sht_path, &out_path).unwrap();
        assert_eq!(std::fs::read(&out_path).unwrap(), original);
    }

    #[test]
    fn build_rejects_foreign_format_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("spec.json");
        let out_path = dir.path().join("out.sht");
        std::fs::write(&json_path, r#"{"format": "TH10", "sections": []}"#).unwrap();

        assert!(build(&json_path, &out_path).is_err());
        assert!(!out_path.exists());
    }
}
