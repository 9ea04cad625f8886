use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use carbon_factors::defra::categories::generate_category_activities;
use carbon_factors::defra::general::generate_general_activities;
use carbon_factors::defra::preprocess::{preprocess_workbook, DEFAULT_WORKBOOK_PATH};
use carbon_factors::defra::tidy::DEFAULT_TIDY_CSV;
use carbon_factors::emit::DEFAULT_OUTPUT_DIR;
use carbon_factors::food::{generate_food_activities, DEFAULT_FOOD_CSV};

/// Regenerates every activity module: food, the DEFRA tidy table, general
/// household activities, and the per-category modules, in that order.
#[derive(Parser)]
#[command(name = "carbon-factors")]
#[command(about = "Regenerate all activity data modules from the source datasets", long_about = None)]
struct Cli {
    /// Path to the Clark et al. 2022 food-impact CSV
    #[arg(long, default_value = DEFAULT_FOOD_CSV)]
    food_csv: PathBuf,

    /// Path to the DEFRA conversion-factor workbook
    #[arg(long, default_value = DEFAULT_WORKBOOK_PATH)]
    workbook: PathBuf,

    /// Where the intermediate tidy CSV is written
    #[arg(long, default_value = DEFAULT_TIDY_CSV)]
    tidy_csv: PathBuf,

    /// Directory receiving the generated JS modules
    #[arg(long, env = "ACTIVITIES_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    out_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,carbon_factors=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    info!("Generating food activities from {}", cli.food_csv.display());
    let food_module = generate_food_activities(&cli.food_csv, &cli.out_dir)?;
    info!("JS file created: {}", food_module.display());

    info!("Pre-processing workbook {}", cli.workbook.display());
    preprocess_workbook(&cli.workbook, &cli.tidy_csv)?;

    info!("Generating general activities");
    let general_module = generate_general_activities(&cli.tidy_csv, &cli.out_dir)?;
    info!("JS file created: {}", general_module.display());

    info!("Generating category activities");
    let written = generate_category_activities(&cli.tidy_csv, &cli.out_dir)?;
    for path in &written {
        info!("JS file created: {}", path.display());
    }

    info!("Done: {} category modules written", written.len());
    Ok(())
}
