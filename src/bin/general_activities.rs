use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carbon_factors::defra::general::generate_general_activities;
use carbon_factors::defra::tidy::DEFAULT_TIDY_CSV;
use carbon_factors::emit::DEFAULT_OUTPUT_DIR;

#[derive(Parser)]
#[command(name = "general-activities")]
#[command(about = "Generate generalActivities.js from the tidy DEFRA table", long_about = None)]
struct Cli {
    /// Path to the tidy factor CSV
    #[arg(long, default_value = DEFAULT_TIDY_CSV)]
    tidy_csv: PathBuf,

    /// Directory receiving the generated module
    #[arg(long, env = "ACTIVITIES_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    out_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let path = generate_general_activities(&cli.tidy_csv, &cli.out_dir)?;
    info!("generalActivities.js written to: {}", path.display());
    Ok(())
}
