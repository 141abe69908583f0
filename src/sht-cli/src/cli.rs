//! CLI argument definitions for sht
//!
//! All clap-derived structs and enums for CLI parsing.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sht")]
#[command(about = "Lossless TH15 .sht shot-data compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dump a .sht to a lossless JSON spec
    #[command(visible_alias = "d")]
    Dump {
        /// Path to input .sht file
        input: PathBuf,

        /// Path to output JSON spec
        output: PathBuf,
    },

    /// Build a .sht from a JSON spec (raw spans + optional overlays)
    #[command(visible_alias = "b")]
    Build {
        /// Path to input JSON spec
        input: PathBuf,

        /// Path to output .sht file
        output: PathBuf,
    },

    /// Dump then build in-memory, yielding an identical copy
    #[command(visible_alias = "r")]
    Repack {
        /// Path to input .sht file
        input: PathBuf,

        /// Path to output .sht file
        output: PathBuf,
    },

    /// Dump a lossless spec enriched with semantic blocks (legacy alias of dumpu)
    Dumpx {
        /// Path to input .sht file
        input: PathBuf,

        /// Path to output JSON spec
        output: PathBuf,
    },

    /// Dump a unified spec: lossless spans plus option_positions and shots_88
    Dumpu {
        /// Path to input .sht file
        input: PathBuf,

        /// Path to output JSON spec
        output: PathBuf,
    },

    /// Extract option positions and shot details to per-file JSON
    #[command(visible_alias = "x")]
    Extract {
        /// Input .sht files (all *.sht in the current directory if omitted)
        files: Vec<PathBuf>,

        /// JSON rendering style
        #[arg(short, long, value_enum, default_value = "compact")]
        style: Style,
    },

    /// Write per-level text reports of the 88-byte records
    #[command(visible_alias = "l")]
    Levels {
        /// Input .sht files (all *.sht in the current directory if omitted)
        files: Vec<PathBuf>,
    },

    /// Find candidate 88-byte template chunks by float-pattern search
    #[command(visible_alias = "k")]
    Chunks {
        /// Path to input .sht file
        input: PathBuf,

        /// Path to output markdown report (default <stem>_88byte_templates.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Style {
    /// Single-line JSON
    Compact,
    /// Indented JSON
    Pretty,
    /// Compact overall, one record per line
    Records,
}
