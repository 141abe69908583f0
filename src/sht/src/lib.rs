//! # sht
//!
//! Lossless TH15 `.sht` shot-data library - dump, build, and record parsing.
//!
//! This library provides functionality to:
//! - Dump a `.sht` file to a JSON spec that rebuilds byte-for-byte
//! - Build a `.sht` from a spec, applying semantic overlays (header fields,
//!   option positions, per-record edits) on top of the raw bytes
//! - Parse the 88-byte shot records and their sentinel-delimited levels
//! - Produce derived views: option-position grouping, per-level text
//!   reports, and pattern-based chunk discovery
//!
//! ## Example
//!
//! ```no_run
//! use std::fs;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = fs::read("pl01.sht")?;
//!
//! // Lossless round trip
//! let spec = sht::dump(&data)?;
//! let rebuilt = sht::build(&spec)?;
//! assert_eq!(rebuilt, data);
//!
//! // Derived view: sentinel-delimited levels of 88-byte records
//! let levels = sht::parse_levels(&data, sht::layout::RECORD_START_ADDR);
//! for level in &levels {
//!     println!("{} records", level.records.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod layout;
pub mod lossless;
pub mod options;
pub mod overlay;
pub mod record;
pub mod report;
pub mod scan;
pub mod spec;

// Re-export commonly used items
#[doc(inline)]
pub use layout::{compute_sections, read_header, Header, LayoutError};
#[doc(inline)]
pub use lossless::{build, dump, dump_enriched, find_section0_table, repack, BuildError};
#[doc(inline)]
pub use record::{
    parse_levels, Level, RecordAt, RecordError, RecordTail, ShotRecord, LEVEL_SENTINEL,
    RECORD_SIZE,
};
#[doc(inline)]
pub use spec::{
    ExtractDoc, HeaderOverlay, LevelSpec, OptionGroup, OptionPositions, Overlays, RecordSpec,
    SectionSpec, ShotsBlock, ShtSpec, FORMAT_TAG,
};
