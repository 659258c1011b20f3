#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the case-count pipeline.
//!
//! Uses `indicatif-log-bridge` (via [`progress::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! progress bars never fight for the terminal.

mod config;
mod pipeline;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use covid_tracker_location::identity::resolve_opt;
use covid_tracker_series_models::GapPolicy;
use covid_tracker_snapshot::registry::all_schemas;

use crate::config::{Overrides, PipelineConfig, SinkKind};

#[derive(Parser)]
#[command(
    name = "covid_tracker",
    about = "Builds per-location case-count series from daily snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline
    Run {
        /// Pipeline configuration file (TOML)
        #[arg(long, default_value = "covid_tracker.toml")]
        config: PathBuf,
        /// Reference file listing every location (overrides `reference_file`)
        #[arg(long)]
        reference_file: Option<PathBuf>,
        /// Directory of daily snapshot CSVs (overrides `snapshots_dir`)
        #[arg(long)]
        snapshots_dir: Option<PathBuf>,
        /// Country population CSV (overrides `population_file`)
        #[arg(long)]
        population_file: Option<PathBuf>,
        /// Output directory (overrides `output_dir`)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Delta policy across missing dates: `last_seen` or `null_across_gap`
        #[arg(long)]
        gap_policy: Option<GapPolicy>,
        /// Publishing sink: `none`, `local` or `s3`
        #[arg(long)]
        sink: Option<SinkKind>,
        /// S3 bucket (overrides `publish.bucket`)
        #[arg(long)]
        bucket: Option<String>,
    },
    /// List known snapshot schema variants
    Schemas,
    /// Print the location identity for a country and optional province
    Resolve {
        /// Country or region name
        country: String,
        /// Province or state name
        province: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            reference_file,
            snapshots_dir,
            population_file,
            output_dir,
            gap_policy,
            sink,
            bucket,
        } => {
            let multi = progress::init_logger();
            let config = PipelineConfig::load(
                &config,
                Overrides {
                    reference_file,
                    snapshots_dir,
                    population_file,
                    output_dir,
                    gap_policy,
                    sink,
                    bucket,
                },
            )?;
            let summary = pipeline::run(&config, &multi).await?;
            log::info!(
                "{} snapshots, {} daily records, {} series, {} locations, {} countries",
                summary.snapshots,
                summary.daily_records,
                summary.series,
                summary.locations,
                summary.countries,
            );
            if let Some(report) = &summary.publish {
                println!("Published: {report}");
            }
        }
        Commands::Schemas => {
            println!("{:<16} {:<28} DETECT", "ID", "NAME");
            println!("{}", "-".repeat(72));
            for schema in all_schemas()? {
                println!(
                    "{:<16} {:<28} {}",
                    schema.id(),
                    schema.name(),
                    schema.detect.join(", ")
                );
            }
        }
        Commands::Resolve { country, province } => {
            println!("{}", resolve_opt(&country, province.as_deref()));
        }
    }

    Ok(())
}
