use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carbon_factors::emit::DEFAULT_OUTPUT_DIR;
use carbon_factors::food::{generate_food_activities, DEFAULT_FOOD_CSV};

#[derive(Parser)]
#[command(name = "food-activities")]
#[command(about = "Generate foodActivities.js from the Clark et al. 2022 dataset", long_about = None)]
struct Cli {
    /// Path to the food-impact CSV
    #[arg(long, default_value = DEFAULT_FOOD_CSV)]
    input: PathBuf,

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
    let path = generate_food_activities(&cli.input, &cli.out_dir)?;
    info!("JS file created: {}", path.display());
    Ok(())
}
