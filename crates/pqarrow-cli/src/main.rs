//! CLI tool for converting directories of Parquet files to Arrow IPC (and back).

mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum, error::ErrorKind};
use pqarrow_core::{ConvertedFile, DataDir, convert_to_columnar, convert_to_interchange};
use snafu::ResultExt;

use crate::error::{CliResult, ConvertSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Direction {
    /// Parquet files in <PARQUET_FOLDER> become Arrow files (+ metadata) in <ARROW_FOLDER>
    ToArrow,
    /// Arrow files in <ARROW_FOLDER> become Parquet files in <PARQUET_FOLDER>
    ToParquet,
}

#[derive(Debug, Parser)]
#[command(
    name = "pqarrow",
    version,
    about = "Convert a folder of Parquet files to Arrow IPC files with metadata sidecars"
)]
struct Cli {
    /// Folder holding (or receiving) `.arrow` files and `.metadata.json` sidecars
    arrow_folder: PathBuf,

    /// Folder holding (or receiving) `.parquet` files
    parquet_folder: PathBuf,

    /// Which way to convert
    #[arg(long, value_enum, default_value_t = Direction::ToArrow)]
    direction: Direction,
}

fn print_progress(file: &ConvertedFile) {
    println!("{file}");
}

async fn cmd_to_arrow(parquet_folder: &Path, arrow_folder: &Path) -> CliResult<()> {
    let source = DataDir::local(parquet_folder);
    let dest = DataDir::local(arrow_folder);

    let report = convert_to_interchange(&source, &dest, print_progress)
        .await
        .context(ConvertSnafu {
            source_dir: parquet_folder.display().to_string(),
            dest_dir: arrow_folder.display().to_string(),
        })?;

    log::info!(
        "converted {} parquet file(s) into {}",
        report.len(),
        arrow_folder.display()
    );
    Ok(())
}

async fn cmd_to_parquet(arrow_folder: &Path, parquet_folder: &Path) -> CliResult<()> {
    let source = DataDir::local(arrow_folder);
    let dest = DataDir::local(parquet_folder);

    let report = convert_to_columnar(&source, &dest, print_progress)
        .await
        .context(ConvertSnafu {
            source_dir: arrow_folder.display().to_string(),
            dest_dir: parquet_folder.display().to_string(),
        })?;

    log::info!(
        "converted {} arrow file(s) into {}",
        report.len(),
        parquet_folder.display()
    );
    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.direction {
        Direction::ToArrow => cmd_to_arrow(&cli.parquet_folder, &cli.arrow_folder).await,
        Direction::ToParquet => cmd_to_parquet(&cli.arrow_folder, &cli.parquet_folder).await,
    }
}

fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            // Usage errors exit with 1 rather than clap's default of 2.
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = parse_args();
    if let Err(e) = run(cli).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
