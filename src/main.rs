//! aquametrics - growth & feed-conversion analytics
//!
//! # Usage
//!
//! ```bash
//! # Summary statistics for an ad-hoc sample
//! aquametrics stats --weights 45.2,47.1,44.8,46.0,48.3
//!
//! # Replay a scenario file through the recorder and print the batch analysis
//! aquametrics replay scenarios/trout.json
//!
//! # Generate a synthetic scenario and replay it
//! simulation --days 120 > trout.json && aquametrics replay trout.json --json
//!
//! # Print the effective configuration
//! aquametrics print-config
//! ```
//!
//! # Environment Variables
//!
//! - `AQUAMETRICS_CONFIG`: Path to the TOML configuration file
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use aquametrics::config::{self, EngineConfig};
use aquametrics::scenario::Scenario;
use aquametrics::statistics::StatisticsEngine;
use aquametrics::types::IndividualObservation;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "aquametrics")]
#[command(about = "Aquaculture growth and feed-conversion analytics")]
#[command(version)]
struct CliArgs {
    /// Configuration file (overrides AQUAMETRICS_CONFIG / ./aquametrics.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "AQUAMETRICS_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Summary statistics for a list of sampled weights
    Stats {
        /// Comma-separated weights in grams
        #[arg(long, value_delimiter = ',', required = true)]
        weights: Vec<f64>,
        /// Comma-separated lengths in cm, in the same order as the weights
        #[arg(long, value_delimiter = ',')]
        lengths: Vec<f64>,
    },

    /// Replay a JSON scenario and print the batch analysis
    Replay {
        /// Scenario file
        path: PathBuf,
        /// Print the full replay outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    PrintConfig,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display()))?,
        None => EngineConfig::load(),
    };
    Ok(config)
}

fn run_stats(config: &EngineConfig, weights: &[f64], lengths: &[f64]) -> Result<()> {
    if !lengths.is_empty() && lengths.len() != weights.len() {
        bail!(
            "--lengths has {} values but --weights has {}",
            lengths.len(),
            weights.len()
        );
    }
    let observations: Vec<IndividualObservation> = weights
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let obs = IndividualObservation::new(i as u32 + 1, *w);
            match lengths.get(i) {
                Some(l) => obs.with_length(*l),
                None => obs,
            }
        })
        .collect();

    let stats = StatisticsEngine::new(&config.statistics)
        .calculate(&observations)
        .context("Sample rejected")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn run_replay(config: &EngineConfig, path: &PathBuf, json: bool) -> Result<()> {
    let scenario = Scenario::load(path)?;
    info!(
        scenario = %scenario.name,
        samples = scenario.samples.len(),
        feed_kg = scenario.total_feed_kg(),
        "Replaying scenario"
    );
    let outcome = scenario.replay(config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        outcome.print_summary();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let engine_config = load_config(args.config.as_ref())?;
    engine_config.validate().context("Invalid configuration")?;
    config::init(engine_config);
    let cfg = config::get();

    match &args.command {
        SubCommand::Stats { weights, lengths } => run_stats(cfg, weights, lengths),
        SubCommand::Replay { path, json } => run_replay(cfg, path, *json),
        SubCommand::PrintConfig => {
            print!("{}", cfg.to_toml()?);
            Ok(())
        }
    }
}
