use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carbon_factors::defra::preprocess::{preprocess_workbook, DEFAULT_WORKBOOK_PATH};
use carbon_factors::defra::tidy::DEFAULT_TIDY_CSV;

#[derive(Parser)]
#[command(name = "preprocess-defra")]
#[command(about = "Flatten the DEFRA workbook into the tidy factor CSV", long_about = None)]
struct Cli {
    /// Path to the conversion-factor workbook (flat format)
    #[arg(long, default_value = DEFAULT_WORKBOOK_PATH)]
    workbook: PathBuf,

    /// Where to write the tidy CSV
    #[arg(long, default_value = DEFAULT_TIDY_CSV)]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let rows = preprocess_workbook(&cli.workbook, &cli.output)?;
    info!("Done: {} factor rows retained", rows);
    Ok(())
}
