mod cli;
mod commands;
mod file_io;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    // Usage errors exit 2 via clap; rejected input and I/O failures are
    // mapped to the same status so scripts can treat them alike.
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Dump { input, output } => {
            commands::lossless::dump(&input, &output)?;
        }

        Commands::Build { input, output } => {
            commands::lossless::build(&input, &output)?;
        }

        Commands::Repack { input, output } => {
            commands::lossless::repack(&input, &output)?;
        }

        Commands::Dumpx { input, output } | Commands::Dumpu { input, output } => {
            commands::lossless::dump_enriched(&input, &output)?;
        }

        Commands::Extract { files, style } => {
            commands::views::extract(&files, style)?;
        }

        Commands::Levels { files } => {
            commands::views::levels(&files)?;
        }

        Commands::Chunks { input, output } => {
            commands::views::chunks(&input, output.as_deref())?;
        }
    }

    Ok(())
}
