//! Print per-component line counts of a source tree as LaTeX table rows.

use std::path::PathBuf;

use clap::Parser;
use codestats::{ClocCounter, CodeStatsResult, ReportConfig, write_report};

#[derive(Debug, Parser)]
#[command(
    name = "codestats",
    version,
    about = "Count lines of code per component with cloc and print LaTeX table rows"
)]
struct Cli {
    /// Root of the source tree; component directories are relative to it
    root: PathBuf,

    /// JSON file replacing the built-in languages and components
    #[arg(long)]
    config: Option<PathBuf>,

    /// cloc language definition file (passed as --force-lang-def)
    #[arg(long)]
    lang_defs: Option<PathBuf>,
}

fn run(cli: Cli) -> CodeStatsResult<()> {
    let config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };

    let mut counter = ClocCounter::new(cli.root);
    if let Some(defs) = cli.lang_defs {
        counter = counter.with_lang_defs(defs);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let totals = write_report(&config, &counter, &mut out)?;
    log::info!(
        "counted {} lines of code across {} components",
        totals.overall(),
        config.components.len()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
